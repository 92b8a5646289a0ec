//! Column Calibrator.
//!
//! Marker columns drift between document revisions, so thresholds are
//! derived per document from the first occurrence of each level's opening
//! marker rather than hard-coded. Bold tokens are preferred as the search
//! haystack; layout revisions from 2024 onwards carry no font metadata, in
//! which case the full token set is searched instead. That fallback is a
//! required degradation path, not an error.

use crate::paper::diagnostics::CalibrationError;
use crate::paper::token::{Token, TokenStream};

/// Threshold used when the question marker search is bypassed in tests.
pub const QUESTION_START_X: f64 = 49.6063;
/// Default sub-question threshold when no "(a)" is found.
pub const SUBQUESTION_START_X: f64 = 72.0;
/// Default sub-sub-question window when no "(i)" is found.
pub const SUBSUB_WINDOW: (f64, f64) = (90.0, 100.0);

/// Per-document x-thresholds, one per nesting level.
///
/// The sub-sub level keeps a window rather than a single threshold: that
/// marker's horizontal offset jitters across documents because the deepest
/// indentation is centered rather than flush.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Columns {
    pub question_x: f64,
    pub subquestion_x: f64,
    pub subsub_window: (f64, f64),
}

impl Default for Columns {
    fn default() -> Self {
        Columns {
            question_x: QUESTION_START_X,
            subquestion_x: SUBQUESTION_START_X,
            subsub_window: SUBSUB_WINDOW,
        }
    }
}

/// Derives per-level thresholds from the first marker occurrences.
#[derive(Debug, Clone)]
pub struct ColumnCalibrator {
    defaults: Columns,
    window_offsets: (f64, f64),
}

impl ColumnCalibrator {
    pub fn new() -> Self {
        ColumnCalibrator {
            defaults: Columns::default(),
            window_offsets: (-20.0, 10.0),
        }
    }

    /// Override the constants used for levels whose marker is absent.
    pub fn with_defaults(mut self, defaults: Columns) -> Self {
        self.defaults = defaults;
        self
    }

    /// Override the window derived around the first "(i)" marker.
    pub fn with_window_offsets(mut self, offsets: (f64, f64)) -> Self {
        self.window_offsets = offsets;
        self
    }

    /// Calibrate against `stream`.
    ///
    /// The level-1 marker "1" is load-bearing: if it cannot be found the
    /// document is rejected. Deeper markers fall back to the defaults, and
    /// "(i)" is only searched once "(a)" has been located, since a document
    /// without sub-questions cannot have sub-sub-questions either.
    pub fn calibrate(&self, stream: &TokenStream) -> Result<Columns, CalibrationError> {
        let mut haystack: Vec<&Token> =
            stream.tokens().iter().filter(|token| token.bold).collect();
        if haystack.is_empty() {
            haystack = stream.tokens().iter().collect();
        }
        let text: Vec<char> = haystack.iter().map(|token| token.text).collect();

        let first_one =
            find_literal(&text, "1").ok_or(CalibrationError { marker: "1" })?;

        let mut columns = self.defaults;
        columns.question_x = haystack[first_one].x;

        if let Some(first_a) = find_literal(&text, "(a)") {
            columns.subquestion_x = haystack[first_a].x;
            if let Some(first_i) = find_literal(&text, "(i)") {
                let x = haystack[first_i].x;
                columns.subsub_window = (x + self.window_offsets.0, x + self.window_offsets.1);
            }
        }

        Ok(columns)
    }
}

impl Default for ColumnCalibrator {
    fn default() -> Self {
        Self::new()
    }
}

/// First index where `needle` starts within the character sequence.
///
/// Works on token-index space directly so the match position maps back to
/// a token without byte-offset bookkeeping.
fn find_literal(haystack: &[char], needle: &str) -> Option<usize> {
    let needle: Vec<char> = needle.chars().collect();
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .find(|&start| haystack[start..start + needle.len()] == needle[..])
}
