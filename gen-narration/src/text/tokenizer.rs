//! Word tokenization behind a narrow analyzer interface.
//!
//! Analyzers report every token they produce, including any internal
//! sentence-boundary markers. [`tokenize`] is the adapter the formatter uses:
//! it drops the markers and hands back content surfaces only.

use crate::error::{NarrationError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// A single analyzer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Surface text as it appears in the input
    pub surface: String,
    /// Analyzer-internal boundary marker, never shown to callers
    pub is_structural_marker: bool,
}

impl Token {
    /// A content token.
    pub fn word(surface: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            is_structural_marker: false,
        }
    }

    /// A structural marker token.
    pub fn marker(surface: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            is_structural_marker: true,
        }
    }
}

/// Morphological analysis capability.
pub trait Tokenizer: Send + Sync {
    /// Split `text` into tokens, in order.
    fn analyze(&self, text: &str) -> Vec<Token>;

    /// Analyzer name for display.
    fn name(&self) -> &'static str;
}

/// Content token surfaces of `text`, in order. Empty input yields no tokens.
pub fn tokenize(tokenizer: &dyn Tokenizer, text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    tokenizer
        .analyze(text)
        .into_iter()
        .filter(|t| !t.is_structural_marker && !t.surface.is_empty())
        .map(|t| t.surface)
        .collect()
}

/// UAX #29 word boundaries.
///
/// Katakana runs stay together; kanji and hiragana break per character.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeWordTokenizer;

impl Tokenizer for UnicodeWordTokenizer {
    fn analyze(&self, text: &str) -> Vec<Token> {
        text.split_word_bounds().map(Token::word).collect()
    }

    fn name(&self) -> &'static str {
        "unicode"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Hiragana,
    Katakana,
    Kanji,
    Latin,
    Digit,
    Space,
    Other,
}

impl CharClass {
    fn of(c: char) -> Self {
        match c {
            '\u{3041}'..='\u{309F}' => Self::Hiragana,
            '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' | '\u{FF66}'..='\u{FF9F}' => {
                Self::Katakana
            }
            '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}' | '々' => {
                Self::Kanji
            }
            '0'..='9' | '\u{FF10}'..='\u{FF19}' => Self::Digit,
            'A'..='Z' | 'a'..='z' | '\u{FF21}'..='\u{FF3A}' | '\u{FF41}'..='\u{FF5A}' => {
                Self::Latin
            }
            c if c.is_whitespace() => Self::Space,
            _ => Self::Other,
        }
    }
}

/// Runs of the same script class form one token.
///
/// Symbols that fit no class are emitted one character at a time.
/// Dictionary-free and fully deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharClassTokenizer;

impl Tokenizer for CharClassTokenizer {
    fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut start = 0;
        let mut current: Option<CharClass> = None;

        for (idx, c) in text.char_indices() {
            let class = CharClass::of(c);
            if let Some(prev) = current {
                if prev != class || class == CharClass::Other {
                    tokens.push(Token::word(&text[start..idx]));
                    start = idx;
                }
            }
            current = Some(class);
        }

        if start < text.len() {
            tokens.push(Token::word(&text[start..]));
        }
        tokens
    }

    fn name(&self) -> &'static str {
        "char-class"
    }
}

/// Morphological analysis with a compiled vibrato system dictionary
/// (e.g. IPADIC or UniDic builds). `.zst` dictionaries are decompressed on load.
pub struct DictionaryTokenizer {
    tokenizer: vibrato::Tokenizer,
}

impl DictionaryTokenizer {
    /// Load a dictionary. Any failure here is a configuration error.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            NarrationError::Configuration(format!(
                "cannot open dictionary {}: {}",
                path.display(),
                e
            ))
        })?;
        let reader = BufReader::new(file);

        let is_zstd = path.extension().is_some_and(|ext| ext == "zst");
        let reader: Box<dyn Read> = if is_zstd {
            Box::new(zstd::Decoder::new(reader).map_err(|e| {
                NarrationError::Configuration(format!(
                    "cannot decompress dictionary {}: {}",
                    path.display(),
                    e
                ))
            })?)
        } else {
            Box::new(reader)
        };

        let dict = vibrato::Dictionary::read(reader).map_err(|e| {
            NarrationError::Configuration(format!(
                "invalid dictionary {}: {}",
                path.display(),
                e
            ))
        })?;

        log::info!("Loaded tokenizer dictionary {}", path.display());
        Ok(Self {
            tokenizer: vibrato::Tokenizer::new(dict),
        })
    }
}

impl Tokenizer for DictionaryTokenizer {
    fn analyze(&self, text: &str) -> Vec<Token> {
        let mut worker = self.tokenizer.new_worker();
        worker.reset_sentence(text);
        worker.tokenize();
        worker.token_iter().map(|t| Token::word(t.surface())).collect()
    }

    fn name(&self) -> &'static str {
        "dictionary"
    }
}

/// Selectable analyzers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TokenizerKind {
    #[default]
    Unicode,
    CharClass,
    Dictionary,
}

impl TokenizerKind {
    /// Name as written in the config file and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unicode => "unicode",
            Self::CharClass => "char-class",
            Self::Dictionary => "dictionary",
        }
    }
}

impl std::fmt::Display for TokenizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the configured analyzer. Runs once at startup; errors are fatal.
pub fn create_tokenizer(
    kind: TokenizerKind,
    dictionary: Option<&Path>,
) -> Result<Arc<dyn Tokenizer>> {
    match kind {
        TokenizerKind::Unicode => Ok(Arc::new(UnicodeWordTokenizer)),
        TokenizerKind::CharClass => Ok(Arc::new(CharClassTokenizer)),
        TokenizerKind::Dictionary => {
            let path = dictionary.ok_or_else(|| {
                NarrationError::Configuration(
                    "the dictionary tokenizer requires a dictionary path".to_string(),
                )
            })?;
            Ok(Arc::new(DictionaryTokenizer::from_path(path)?))
        }
    }
}
