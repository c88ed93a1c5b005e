//! Script line generation for TTS: normalization, tokenization, clause
//! formatting and document segmentation.

pub mod clause;
pub mod formatter;
pub mod normalize;
pub mod segmenter;
pub mod tokenizer;

pub use segmenter::{DEFAULT_MAX_LENGTH, Segmenter};
pub use tokenizer::{Tokenizer, TokenizerKind, create_tokenizer};

use std::sync::Arc;
use tokenizer::UnicodeWordTokenizer;

/// A script line paired with its position in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// Position in document order (0-indexed)
    pub index: usize,
    /// The line text, possibly empty
    pub text: String,
}

impl ScriptLine {
    /// Create a new script line.
    pub fn new(index: usize, text: String) -> Self {
        Self { index, text }
    }

    /// Whether this line carries no speakable text.
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

/// Attach document-order indices to segmented lines.
pub fn number_lines(lines: Vec<String>) -> Vec<ScriptLine> {
    lines
        .into_iter()
        .enumerate()
        .map(|(index, text)| ScriptLine::new(index, text))
        .collect()
}

/// Segment `document` with the default word-boundary tokenizer.
pub fn segment(document: &str, max_length: usize) -> Vec<String> {
    Segmenter::new(Arc::new(UnicodeWordTokenizer))
        .with_max_length(max_length)
        .segment(document)
}
