//! gen-narration - Japanese script segmentation and VOICEVOX narration
//!
//! The `text` module turns a document into ordered script lines sized for
//! speech synthesis. The remaining modules drive synthesis of those lines
//! and stitch the resulting audio back together.

pub mod audio;
pub mod config;
pub mod error;
pub mod files;
pub mod pipeline;
pub mod text;

pub use config::NarrationConfig;
pub use error::{NarrationError, Result};
pub use text::{DEFAULT_MAX_LENGTH, ScriptLine, Segmenter};
