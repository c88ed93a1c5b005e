//! Audio assembly: stitching per-line WAV files into one narration file.

pub mod wav;

pub use wav::{WAV_HEADER_LEN, WavSummary, concat_wav_files};
