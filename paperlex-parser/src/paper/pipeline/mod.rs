//! Per-document processing pipeline.
//!
//! The stages run strictly in order with no suspension points:
//!
//!     calibrate -> scan -> build -> align -> aggregate
//!
//! A [`Pipeline`] owns one document's worth of state. Processing several
//! documents in parallel is fine as long as each gets its own instance;
//! nothing is shared between runs.
//!
//! Only calibration and scanning abort a document. Everything downstream
//! degrades into diagnostics carried on the [`ParseOutcome`] next to the
//! best-effort tree, so batch callers never lose a whole run to one bad
//! answer table.

use tracing::debug;

use crate::paper::aggregation::aggregate;
use crate::paper::alignment::{align, AnswerRow, StrategyChoice};
use crate::paper::ast::Paper;
use crate::paper::building::{TreeBuilder, COLUMN_TOLERANCE, IMAGE_MARGIN};
use crate::paper::calibration::{ColumnCalibrator, Columns};
use crate::paper::diagnostics::{Diagnostic, PipelineError};
use crate::paper::source::DocumentAccess;
use crate::paper::token::TokenStream;

/// Which grammar to segment a document with. The two forms are mutually
/// exclusive per document; the caller knows which paper series it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperKind {
    Structured,
    MultipleChoice,
}

/// Tunable constants for one pipeline instance.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Column tolerance around calibrated thresholds.
    pub column_tolerance: f64,
    /// Constants used for levels whose marker is never found.
    pub default_columns: Columns,
    /// Window derived around the first "(i)" marker.
    pub subsub_window_offsets: (f64, f64),
    /// Padding around a span's token extent when rendering.
    pub image_margin: f64,
    /// Alignment strategy chain.
    pub strategy: StrategyChoice,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            column_tolerance: COLUMN_TOLERANCE,
            default_columns: Columns::default(),
            subsub_window_offsets: (-20.0, 10.0),
            image_margin: IMAGE_MARGIN,
            strategy: StrategyChoice::default(),
        }
    }
}

/// Best-effort result for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub paper: Paper,
    pub diagnostics: Vec<Diagnostic>,
}

/// The per-document pipeline.
pub struct Pipeline {
    options: EngineOptions,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline {
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Pipeline { options }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Segment a document without reconciling answers.
    pub fn segment(
        &self,
        stream: &TokenStream,
        kind: PaperKind,
        access: Option<&dyn DocumentAccess>,
    ) -> Result<ParseOutcome, PipelineError> {
        let columns = self.calibrate(stream)?;
        debug!(?columns, "calibrated");

        let mut builder = TreeBuilder::new(stream, columns)
            .with_tolerance(self.options.column_tolerance)
            .with_image_margin(self.options.image_margin);
        if let Some(access) = access {
            builder = builder.with_access(access);
        }

        let (paper, diagnostics) = match kind {
            PaperKind::Structured => {
                let (questions, diagnostics) = builder.build_structured()?;
                (Paper::Structured(questions), diagnostics)
            }
            PaperKind::MultipleChoice => {
                let (questions, diagnostics) = builder.build_multiple_choice()?;
                (Paper::MultipleChoice(questions), diagnostics)
            }
        };
        debug!(questions = paper.question_count(), "segmented");

        Ok(ParseOutcome { paper, diagnostics })
    }

    /// Full run: segment, reconcile against `rows`, aggregate upward.
    pub fn run(
        &self,
        stream: &TokenStream,
        kind: PaperKind,
        rows: &[AnswerRow],
        access: Option<&dyn DocumentAccess>,
    ) -> Result<ParseOutcome, PipelineError> {
        let mut outcome = self.segment(stream, kind, access)?;

        let alignment_diagnostics = align(&mut outcome.paper, rows, self.options.strategy);
        outcome.diagnostics.extend(alignment_diagnostics);

        aggregate(&mut outcome.paper);
        debug!(
            diagnostics = outcome.diagnostics.len(),
            "pipeline finished"
        );
        Ok(outcome)
    }

    fn calibrate(&self, stream: &TokenStream) -> Result<Columns, PipelineError> {
        let columns = ColumnCalibrator::new()
            .with_defaults(self.options.default_columns)
            .with_window_offsets(self.options.subsub_window_offsets)
            .calibrate(stream)?;
        Ok(columns)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
