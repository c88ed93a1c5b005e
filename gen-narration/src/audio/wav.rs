//! Concatenation of canonical 44-byte-header PCM WAV files.
//!
//! All inputs must share the same format and carry no extension chunks.
//! The first file's header is reused verbatim; only the two size fields are
//! patched afterwards. Formats are not cross-checked.

use crate::error::{NarrationError, Result};
use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

/// Length of the canonical RIFF/WAVE header.
pub const WAV_HEADER_LEN: u64 = 44;

/// Offset of the RIFF chunk size field.
const RIFF_SIZE_OFFSET: u64 = 4;

/// Offset of the data chunk size field.
const DATA_SIZE_OFFSET: u64 = 40;

/// Header bytes counted by the RIFF size besides the data payload.
const RIFF_SIZE_OVERHEAD: u64 = WAV_HEADER_LEN - 8;

/// Result of a concatenation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSummary {
    /// Number of input files
    pub files: usize,
    /// Total PCM payload bytes written
    pub data_bytes: u64,
}

/// Concatenate `inputs` in order into `output`.
pub fn concat_wav_files<P: AsRef<Path>>(inputs: &[P], output: &Path) -> Result<WavSummary> {
    if inputs.is_empty() {
        return Err(NarrationError::wav(output, "no input files to concatenate"));
    }

    let file = File::create(output).map_err(|e| NarrationError::io("create", output, e))?;
    let mut writer = BufWriter::new(file);
    let mut data_bytes: u64 = 0;

    for (i, input) in inputs.iter().enumerate() {
        let input = input.as_ref();
        data_bytes += append_wav(&mut writer, input, i == 0)?;
    }

    let riff_size = u32::try_from(data_bytes + RIFF_SIZE_OVERHEAD)
        .map_err(|_| NarrationError::wav(output, "combined audio exceeds the 4 GiB WAV limit"))?;

    patch_sizes(&mut writer, riff_size, data_bytes as u32)
        .map_err(|e| NarrationError::io("update header of", output, e))?;

    log::debug!(
        "Concatenated {} WAV files into {} ({} data bytes)",
        inputs.len(),
        output.display(),
        data_bytes
    );

    Ok(WavSummary {
        files: inputs.len(),
        data_bytes,
    })
}

/// Append one input. The header is copied only for the first file.
/// Returns the number of payload bytes appended.
fn append_wav<W: Write>(writer: &mut W, input: &Path, include_header: bool) -> Result<u64> {
    let mut file = File::open(input).map_err(|e| NarrationError::io("open", input, e))?;
    let len = file
        .metadata()
        .map_err(|e| NarrationError::io("stat", input, e))?
        .len();

    if len < WAV_HEADER_LEN {
        return Err(NarrationError::wav(
            input,
            format!("{} bytes is shorter than the {}-byte header", len, WAV_HEADER_LEN),
        ));
    }

    if !include_header {
        file.seek(SeekFrom::Start(WAV_HEADER_LEN))
            .map_err(|e| NarrationError::io("seek", input, e))?;
    }

    io::copy(&mut file, writer).map_err(|e| NarrationError::io("copy", input, e))?;

    Ok(len - WAV_HEADER_LEN)
}

fn patch_sizes<W: Write + Seek>(writer: &mut W, riff_size: u32, data_size: u32) -> io::Result<()> {
    writer.seek(SeekFrom::Start(RIFF_SIZE_OFFSET))?;
    writer.write_all(&riff_size.to_le_bytes())?;
    writer.seek(SeekFrom::Start(DATA_SIZE_OFFSET))?;
    writer.write_all(&data_size.to_le_bytes())?;
    writer.flush()
}
