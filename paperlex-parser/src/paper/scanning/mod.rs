//! Marker Scanner.
//!
//! A single left-to-right walk per nesting level over a token sub-range.
//! A token starts a new sibling only when two independent conditions hold:
//! its x-coordinate falls in the level's column class, AND the tokens from
//! that position onward spell the marker literal expected next in the
//! level's sequence. Either condition alone is far too weak — body text is
//! full of stray digits and parentheses, and the right literal at the
//! wrong column is a cross-reference, not a sibling.
//!
//! Returning no split points is a normal outcome: the node is a leaf at
//! this level.

pub mod sequence;

pub use sequence::{Level, MarkerSequence};

use tracing::debug;

use crate::paper::diagnostics::ScanError;
use crate::paper::token::{Span, Token, TokenStream};

/// Longest lookahead ever taken when testing a candidate. "(viii)" is the
/// longest marker the grammar can produce.
pub const MAX_MARKER_LEN: usize = 8;

/// Column position class a candidate token must fall in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnClass {
    /// Within `tolerance` of a calibrated threshold.
    Threshold { x: f64, tolerance: f64 },
    /// Rounded x inside an inclusive window. The deepest level needs the
    /// wider net: its indentation is centered, not flush.
    Window { low: f64, high: f64 },
    /// No column constraint; the candidate must be bold instead. Used for
    /// multiple-choice option letters, which sit wherever the option text
    /// happens to start.
    BoldMarker,
}

impl ColumnClass {
    fn admits(&self, token: &Token, bold_present: bool) -> bool {
        match *self {
            ColumnClass::Threshold { x, tolerance } => (token.x - x).abs() <= tolerance,
            ColumnClass::Window { low, high } => {
                let rounded = token.x.round();
                low <= rounded && rounded <= high
            }
            // Streams without font metadata carry no bold flags at all;
            // there the filter degrades to every token, mirroring the
            // calibrator's fallback.
            ColumnClass::BoldMarker => token.bold || !bold_present,
        }
    }
}

/// Walks token ranges and emits sibling start indices.
#[derive(Debug)]
pub struct MarkerScanner<'a> {
    stream: &'a TokenStream,
    bold_present: bool,
}

impl<'a> MarkerScanner<'a> {
    pub fn new(stream: &'a TokenStream) -> Self {
        let bold_present = stream.tokens().iter().any(|token| token.bold);
        MarkerScanner {
            stream,
            bold_present,
        }
    }

    /// Scan `span` for sibling markers of one level.
    ///
    /// Returns the ordered token indices where a new sibling begins; an
    /// empty result means the node is a leaf at this level. A
    /// marker-shaped candidate past the level's hard bound is a
    /// [`ScanError::SequenceOverflow`].
    pub fn scan(
        &self,
        span: Span,
        column: ColumnClass,
        sequence: MarkerSequence,
    ) -> Result<Vec<usize>, ScanError> {
        let mut starts = Vec::new();
        for index in span.start..span.end {
            let token = &self.stream.tokens()[index];
            if !column.admits(token, self.bold_present) {
                continue;
            }
            match sequence.literal(starts.len()) {
                Some(literal) => {
                    if self.lookahead_spells(index, span.end, &literal) {
                        debug!(level = %sequence.level(), index, marker = %literal, "marker matched");
                        starts.push(index);
                    }
                }
                None => {
                    let lookahead = self.lookahead_chars(index, span.end);
                    if sequence.matches_shape(&lookahead) {
                        return Err(ScanError::SequenceOverflow {
                            level: sequence.level(),
                            token_index: index,
                        });
                    }
                }
            }
        }
        Ok(starts)
    }

    /// Convert sibling start indices into spans. Each span reaches to the
    /// next sibling's start; the last one extends to the parent's end.
    pub fn sibling_spans(starts: &[usize], parent_end: usize) -> Vec<Span> {
        starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = starts.get(i + 1).copied().unwrap_or(parent_end);
                Span::new(start, end)
            })
            .collect()
    }

    /// Whether the tokens at `index` spell `literal` (prefix match, as the
    /// running question counter "1" must also open "10" through "19").
    fn lookahead_spells(&self, index: usize, limit: usize, literal: &str) -> bool {
        let mut position = index;
        for expected in literal.chars() {
            if position >= limit {
                return false;
            }
            if self.stream.tokens()[position].text != expected {
                return false;
            }
            position += 1;
        }
        true
    }

    fn lookahead_chars(&self, index: usize, limit: usize) -> Vec<char> {
        self.stream.tokens()[index..limit.min(index + MAX_MARKER_LEN)]
            .iter()
            .map(|token| token.text)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::testing::LayoutBuilder;

    const QUESTION_COLUMN: ColumnClass = ColumnClass::Threshold {
        x: 49.6,
        tolerance: 5.0,
    };

    #[test]
    fn finds_sequential_question_markers() {
        let stream = LayoutBuilder::new()
            .line(49.6, "1")
            .line(62.0, "First question body")
            .line(49.6, "2")
            .line(62.0, "Second question body")
            .build();
        let scanner = MarkerScanner::new(&stream);
        let starts = scanner
            .scan(stream.full_span(), QUESTION_COLUMN, MarkerSequence::Numbers)
            .unwrap();
        assert_eq!(starts.len(), 2);
        assert_eq!(stream.tokens()[starts[0]].text, '1');
        assert_eq!(stream.tokens()[starts[1]].text, '2');
    }

    #[test]
    fn column_mismatch_rejects_the_right_literal() {
        // A "2" in flowing body text must not start a question.
        let stream = LayoutBuilder::new()
            .line(49.6, "1")
            .line(62.0, "Add 2 drops of iodine")
            .build();
        let scanner = MarkerScanner::new(&stream);
        let starts = scanner
            .scan(stream.full_span(), QUESTION_COLUMN, MarkerSequence::Numbers)
            .unwrap();
        assert_eq!(starts.len(), 1);
    }

    #[test]
    fn sequence_mismatch_rejects_the_right_column() {
        // "3" at the question column while "2" is expected: not a sibling.
        let stream = LayoutBuilder::new()
            .line(49.6, "1")
            .line(62.0, "Body")
            .line(49.6, "3")
            .build();
        let scanner = MarkerScanner::new(&stream);
        let starts = scanner
            .scan(stream.full_span(), QUESTION_COLUMN, MarkerSequence::Numbers)
            .unwrap();
        assert_eq!(starts.len(), 1);
    }

    #[test]
    fn no_match_means_leaf() {
        let stream = LayoutBuilder::new().line(62.0, "Only body text").build();
        let scanner = MarkerScanner::new(&stream);
        let starts = scanner
            .scan(stream.full_span(), QUESTION_COLUMN, MarkerSequence::Numbers)
            .unwrap();
        assert!(starts.is_empty());
    }

    #[test]
    fn window_class_uses_rounded_x() {
        let stream = LayoutBuilder::new().line(89.7, "(i)").build();
        let scanner = MarkerScanner::new(&stream);
        let starts = scanner
            .scan(
                stream.full_span(),
                ColumnClass::Window {
                    low: 90.0,
                    high: 100.0,
                },
                MarkerSequence::Romans,
            )
            .unwrap();
        // 89.7 rounds to 90, inside the window.
        assert_eq!(starts.len(), 1);
    }

    #[test]
    fn bold_marker_class_requires_bold_when_present() {
        let stream = LayoutBuilder::new()
            .bold(60.0, "A")
            .line(66.0, "first option")
            .line(60.0, "B")
            .build();
        let scanner = MarkerScanner::new(&stream);
        let starts = scanner
            .scan(
                stream.full_span(),
                ColumnClass::BoldMarker,
                MarkerSequence::Choices,
            )
            .unwrap();
        // The plain "B" does not count on a stream that has bold tokens.
        assert_eq!(starts.len(), 1);
    }

    #[test]
    fn bold_marker_class_degrades_without_font_metadata() {
        let stream = LayoutBuilder::new()
            .line(60.0, "A")
            .line(66.0, "first option")
            .line(60.0, "B")
            .build();
        let scanner = MarkerScanner::new(&stream);
        let starts = scanner
            .scan(
                stream.full_span(),
                ColumnClass::BoldMarker,
                MarkerSequence::Choices,
            )
            .unwrap();
        assert_eq!(starts.len(), 2);
    }

    #[test]
    fn overflow_past_the_roman_bound_is_explicit() {
        let mut builder = LayoutBuilder::new();
        for roman in crate::paper::ast::key::ROMAN_NUMERALS {
            builder = builder.line(95.0, &format!("({})", roman)).line(120.0, "text");
        }
        let stream = builder.line(95.0, "(xi)").line(120.0, "one too many").build();
        let scanner = MarkerScanner::new(&stream);
        let err = scanner
            .scan(
                stream.full_span(),
                ColumnClass::Window {
                    low: 90.0,
                    high: 100.0,
                },
                MarkerSequence::Romans,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ScanError::SequenceOverflow {
                level: Level::SubSubQuestion,
                ..
            }
        ));
    }

    #[test]
    fn sibling_spans_cover_the_parent_range() {
        let spans = MarkerScanner::sibling_spans(&[3, 10, 20], 30);
        assert_eq!(
            spans,
            vec![Span::new(3, 10), Span::new(10, 20), Span::new(20, 30)]
        );
    }
}
