//! Error taxonomy and the recoverable diagnostic list.
//!
//! Only calibration and scanning failures abort a document. Everything the
//! aligner or the image side channel trips over is recovered locally:
//! skipped, logged, and recorded as a [`Diagnostic`] handed back to the
//! caller next to the best-effort tree.

use std::fmt;

use serde::Serialize;

use crate::paper::scanning::Level;

/// A required opening marker could not be located during calibration.
///
/// Fatal for the document: without the level-1 threshold no segmentation
/// is possible and no partial tree is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationError {
    pub marker: &'static str,
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "calibration failed: opening marker {:?} not found in the document",
            self.marker
        )
    }
}

impl std::error::Error for CalibrationError {}

/// Errors raised by the marker scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// A marker-shaped candidate appeared after a bounded sequence was
    /// exhausted (past '(z)' or '(x)'). The grammar has no representation
    /// for such a sibling, so the document is rejected rather than
    /// truncated.
    SequenceOverflow { level: Level, token_index: usize },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::SequenceOverflow { level, token_index } => write!(
                f,
                "{} marker sequence exceeded its bound at token {}",
                level, token_index
            ),
        }
    }
}

impl std::error::Error for ScanError {}

/// Fatal pipeline failure for one document.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Calibration(CalibrationError),
    Scan(ScanError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Calibration(err) => write!(f, "{}", err),
            PipelineError::Scan(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<CalibrationError> for PipelineError {
    fn from(err: CalibrationError) -> Self {
        PipelineError::Calibration(err)
    }
}

impl From<ScanError> for PipelineError {
    fn from(err: ScanError) -> Self {
        PipelineError::Scan(err)
    }
}

/// A recoverable condition noted while annotating one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Diagnostic {
    /// An answer row's key did not match the composite-key grammar; the
    /// row was skipped.
    KeyDecodeFailed { key: String },
    /// A decoded key has no corresponding tree node; the row was skipped.
    AssignmentMiss { key: String },
    /// The tolerant merge passed a node for which no answer row exists.
    UnansweredNode { path: String },
    /// Alignment finished without a single assignment.
    AlignmentFailure,
    /// The whole-question region render failed for one page.
    RegionRenderFailed { page: usize, question: u32 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::KeyDecodeFailed { key } => {
                write!(f, "failed to decode answer key {:?}", key)
            }
            Diagnostic::AssignmentMiss { key } => {
                write!(f, "answer row {} has no matching question node", key)
            }
            Diagnostic::UnansweredNode { path } => {
                write!(f, "question node {} has no answer in the table", path)
            }
            Diagnostic::AlignmentFailure => {
                write!(f, "alignment produced no assignments")
            }
            Diagnostic::RegionRenderFailed { page, question } => {
                write!(f, "region render failed on page {} for question {}", page, question)
            }
        }
    }
}
