//! Tree Builder.
//!
//! Recursively instantiates nodes from sibling spans. At each level the
//! scanner is asked for the next level's markers inside the current span:
//! a non-empty result splits the span into an own-text prefix plus one
//! child span per marker; an empty result makes the whole span leaf text.
//! Sibling identity (number, letter, numeral) is positional — the scanner
//! already guaranteed the markers appeared in sequence.
//!
//! Image capture is a side channel: when a document access handle is
//! supplied, each root node requests one whole-question render per page
//! its span touches. A failed render is a diagnostic, never an abort.

use tracing::warn;

use crate::paper::ast::key::ROMAN_NUMERALS;
use crate::paper::ast::{MultipleChoiceQuestion, Question, SubQuestion, SubSubQuestion};
use crate::paper::calibration::Columns;
use crate::paper::diagnostics::{Diagnostic, ScanError};
use crate::paper::scanning::{ColumnClass, MarkerScanner, MarkerSequence};
use crate::paper::source::{DocumentAccess, ImageRef};
use crate::paper::token::{Span, TokenStream};

/// Default column tolerance in layout units.
pub const COLUMN_TOLERANCE: f64 = 5.0;
/// Default padding around a span's token extent when rendering.
pub const IMAGE_MARGIN: f64 = 20.0;

/// Builds one document's tree from calibrated columns.
pub struct TreeBuilder<'a> {
    stream: &'a TokenStream,
    scanner: MarkerScanner<'a>,
    columns: Columns,
    tolerance: f64,
    image_margin: f64,
    access: Option<&'a dyn DocumentAccess>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(stream: &'a TokenStream, columns: Columns) -> Self {
        TreeBuilder {
            stream,
            scanner: MarkerScanner::new(stream),
            columns,
            tolerance: COLUMN_TOLERANCE,
            image_margin: IMAGE_MARGIN,
            access: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_image_margin(mut self, margin: f64) -> Self {
        self.image_margin = margin;
        self
    }

    /// Enable the whole-question render side channel.
    pub fn with_access(mut self, access: &'a dyn DocumentAccess) -> Self {
        self.access = Some(access);
        self
    }

    /// Build the nested three-level tree.
    pub fn build_structured(mut self) -> Result<(Vec<Question>, Vec<Diagnostic>), ScanError> {
        let full = self.stream.full_span();
        let starts = self
            .scanner
            .scan(full, self.question_class(), MarkerSequence::Numbers)?;
        let spans = MarkerScanner::sibling_spans(&starts, full.end);

        let mut questions = Vec::new();
        for (index, span) in spans.into_iter().enumerate() {
            questions.push(self.build_question(span, index as u32 + 1)?);
        }
        Ok((questions, self.diagnostics))
    }

    /// Build the flat multiple-choice form.
    pub fn build_multiple_choice(
        mut self,
    ) -> Result<(Vec<MultipleChoiceQuestion>, Vec<Diagnostic>), ScanError> {
        let full = self.stream.full_span();
        let starts = self
            .scanner
            .scan(full, self.question_class(), MarkerSequence::Numbers)?;
        let spans = MarkerScanner::sibling_spans(&starts, full.end);

        let mut questions = Vec::new();
        for (index, span) in spans.into_iter().enumerate() {
            questions.push(self.build_choice_question(span, index as u32 + 1)?);
        }
        Ok((questions, self.diagnostics))
    }

    fn build_question(&mut self, span: Span, number: u32) -> Result<Question, ScanError> {
        let images = self.render_images(span, number);

        let starts =
            self.scanner
                .scan(span, self.subquestion_class(), MarkerSequence::Letters)?;

        let mut question = if starts.is_empty() {
            Question::new(number, self.stream.text_of(span))
        } else {
            let mut question =
                Question::new(number, self.stream.text_of(Span::new(span.start, starts[0])));
            for (index, sub_span) in MarkerScanner::sibling_spans(&starts, span.end)
                .into_iter()
                .enumerate()
            {
                let letter = (b'a' + index as u8) as char;
                question
                    .subquestions
                    .push(self.build_subquestion(sub_span, letter)?);
            }
            question
        };
        question.images = images;
        Ok(question)
    }

    fn build_subquestion(&mut self, span: Span, letter: char) -> Result<SubQuestion, ScanError> {
        let starts = self
            .scanner
            .scan(span, self.subsub_class(), MarkerSequence::Romans)?;

        if starts.is_empty() {
            return Ok(SubQuestion::new(letter, self.stream.text_of(span)));
        }

        let mut sub = SubQuestion::new(
            letter,
            self.stream.text_of(Span::new(span.start, starts[0])),
        );
        for (index, subsub_span) in MarkerScanner::sibling_spans(&starts, span.end)
            .into_iter()
            .enumerate()
        {
            sub.subsubquestions.push(SubSubQuestion::new(
                ROMAN_NUMERALS[index],
                self.stream.text_of(subsub_span),
            ));
        }
        Ok(sub)
    }

    fn build_choice_question(
        &mut self,
        span: Span,
        number: u32,
    ) -> Result<MultipleChoiceQuestion, ScanError> {
        let images = self.render_images(span, number);

        let starts = self
            .scanner
            .scan(span, ColumnClass::BoldMarker, MarkerSequence::Choices)?;

        let mut question = if starts.is_empty() {
            MultipleChoiceQuestion::new(number, self.stream.text_of(span))
        } else {
            let mut question = MultipleChoiceQuestion::new(
                number,
                self.stream.text_of(Span::new(span.start, starts[0])),
            );
            question.options = MarkerScanner::sibling_spans(&starts, span.end)
                .into_iter()
                .map(|option_span| self.stream.text_of(option_span))
                .collect();
            question
        };
        question.images = images;
        Ok(question)
    }

    fn render_images(&mut self, span: Span, number: u32) -> Vec<ImageRef> {
        let Some(access) = self.access else {
            return Vec::new();
        };
        let Some((first_page, last_page)) = self.stream.pages_of(span) else {
            return Vec::new();
        };

        let mut images = Vec::new();
        for page in first_page..=last_page {
            let Some(bbox) = self.stream.bbox_on_page(span, page) else {
                continue;
            };
            match access.render_region(page, bbox.padded(self.image_margin)) {
                Ok(image) => images.push(image),
                Err(err) => {
                    warn!(page, question = number, %err, "whole-question render failed");
                    self.diagnostics.push(Diagnostic::RegionRenderFailed {
                        page,
                        question: number,
                    });
                }
            }
        }
        images
    }

    fn question_class(&self) -> ColumnClass {
        ColumnClass::Threshold {
            x: self.columns.question_x,
            tolerance: self.tolerance,
        }
    }

    fn subquestion_class(&self) -> ColumnClass {
        ColumnClass::Threshold {
            x: self.columns.subquestion_x,
            tolerance: self.tolerance,
        }
    }

    fn subsub_class(&self) -> ColumnClass {
        ColumnClass::Window {
            low: self.columns.subsub_window.0,
            high: self.columns.subsub_window.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::testing::{LayoutBuilder, RecordingAccess};

    fn columns() -> Columns {
        Columns {
            question_x: 49.6,
            subquestion_x: 72.0,
            subsub_window: (90.0, 100.0),
        }
    }

    #[test]
    fn question_without_markers_is_a_leaf() {
        let stream = LayoutBuilder::new()
            .line(49.6, "1")
            .line(62.0, "State one use of glucose.")
            .build();
        let (questions, diagnostics) = TreeBuilder::new(&stream, columns())
            .build_structured()
            .unwrap();
        assert_eq!(questions.len(), 1);
        assert!(questions[0].subquestions.is_empty());
        assert!(questions[0].text.contains("glucose"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn render_side_channel_records_failures_without_aborting() {
        let stream = LayoutBuilder::new()
            .line(49.6, "1")
            .line(62.0, "Body on page zero")
            .page_break()
            .line(62.0, "continued on page one")
            .line(49.6, "2")
            .line(62.0, "Second question")
            .build();
        let access = RecordingAccess::failing_on_page(0);
        let (questions, diagnostics) = TreeBuilder::new(&stream, columns())
            .with_access(&access)
            .build_structured()
            .unwrap();
        assert_eq!(questions.len(), 2);
        // Question 1 spans pages 0 and 1: page 0 fails, page 1 renders.
        assert_eq!(questions[0].images.len(), 1);
        assert_eq!(questions[1].images.len(), 1);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::RegionRenderFailed {
                page: 0,
                question: 1
            }]
        );
    }
}
