//! Positioned character tokens and node spans.

use serde::{Deserialize, Serialize};

/// One positioned unit of extracted text.
///
/// Tokens arrive from the document access layer already ordered by natural
/// reading order (page-major, then top-to-bottom/left-to-right) and with
/// footers and page numbers excluded. The `bold` flag is absent from some
/// layout revisions; consumers must treat an all-plain stream as valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub x: f64,
    pub y: f64,
    pub text: char,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub page: usize,
}

impl Token {
    pub fn new(x: f64, y: f64, text: char) -> Self {
        Token {
            x,
            y,
            text,
            bold: false,
            page: 0,
        }
    }
}

/// A contiguous half-open index range `[start, end)` into the token stream,
/// covering one node's full extent: its own text plus all descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must not exceed end");
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies entirely within this span.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}
