//! Clause punctuation and clause splitting within a physical line.

/// A clause-ending punctuation mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseMark {
    /// 句点 "。"
    Period,
    /// 読点 "、"
    Comma,
}

impl ClauseMark {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Period => "。",
            Self::Comma => "、",
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '。' => Some(Self::Period),
            '、' => Some(Self::Comma),
            _ => None,
        }
    }

    /// Parse a string consisting of exactly one mark.
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
    }
}

/// A piece of a physical line ending at a clause mark, or the mark-free
/// remainder of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clause<'a> {
    /// Clause text, including the trailing mark if any
    pub text: &'a str,
    /// The mark that ends this clause
    pub mark: Option<ClauseMark>,
}

impl<'a> Clause<'a> {
    /// Clause text without its trailing mark.
    pub fn body(&self) -> &'a str {
        match self.mark {
            Some(mark) => self.text.strip_suffix(mark.as_str()).unwrap_or(self.text),
            None => self.text,
        }
    }
}

/// Iterator over the clauses of a line, in order.
///
/// Each step consumes up to and including the earliest remaining mark, or
/// the whole remainder when no mark is left. Never yields an empty clause.
pub struct Clauses<'a> {
    rest: &'a str,
}

impl<'a> Clauses<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { rest: line }
    }
}

impl<'a> Iterator for Clauses<'a> {
    type Item = Clause<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        let next_mark = self
            .rest
            .char_indices()
            .find_map(|(idx, c)| ClauseMark::from_char(c).map(|mark| (idx, mark)));

        let clause = match next_mark {
            Some((idx, mark)) => {
                let end = idx + mark.as_str().len();
                let clause = Clause {
                    text: &self.rest[..end],
                    mark: Some(mark),
                };
                self.rest = &self.rest[end..];
                clause
            }
            None => {
                let clause = Clause {
                    text: self.rest,
                    mark: None,
                };
                self.rest = "";
                clause
            }
        };

        Some(clause)
    }
}
