//! Interfaces to the external collaborators.
//!
//! The engine never opens documents itself. Token acquisition and region
//! rendering are delegated through [`DocumentAccess`], and answer rows
//! through [`AnswerSource`]; both are synchronous calls owned by the
//! caller, which may retry or cache as it sees fit.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::paper::alignment::AnswerRow;
use crate::paper::token::Token;

/// Axis-aligned bounding box over token coordinates.
///
/// `x0`/`top` hold the minima and `x1`/`bottom` the maxima of the covered
/// token positions; interpretation of the y axis direction is left to the
/// access layer that renders the region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl BBox {
    /// Expand the box by `margin` on every side, clamping at zero.
    pub fn padded(&self, margin: f64) -> BBox {
        BBox {
            x0: (self.x0 - margin).max(0.0),
            top: (self.top - margin).max(0.0),
            x1: self.x1 + margin,
            bottom: self.bottom + margin,
        }
    }
}

/// Opaque handle to a rendered or extracted image, owned by the access
/// layer (typically a file path or storage key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef(pub String);

impl ImageRef {
    pub fn new(handle: impl Into<String>) -> Self {
        ImageRef(handle.into())
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised by external collaborators.
#[derive(Debug, Clone)]
pub enum AccessError {
    /// The requested data could not be read.
    Read(String),
    /// A region render was attempted but failed.
    Render(String),
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::Read(msg) => write!(f, "read failed: {}", msg),
            AccessError::Render(msg) => write!(f, "region render failed: {}", msg),
        }
    }
}

impl std::error::Error for AccessError {}

/// Document access layer consumed by the engine.
///
/// `read_tokens` must return tokens in natural reading order with footers
/// and page numbers already excluded. `render_region` is a side channel:
/// its failure never aborts segmentation.
pub trait DocumentAccess {
    fn read_tokens(&self) -> Result<Vec<Token>, AccessError>;

    fn render_region(&self, page: usize, bbox: BBox) -> Result<ImageRef, AccessError>;
}

/// Answer table extractor consumed by the aligner's callers.
///
/// Implementations must drop tables whose header set lacks the required
/// `Question` and `Answer` field names before rows reach the engine.
pub trait AnswerSource {
    fn extract_rows(&self) -> Result<Vec<AnswerRow>, AccessError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_clamps_at_zero() {
        let bbox = BBox {
            x0: 10.0,
            top: 5.0,
            x1: 100.0,
            bottom: 200.0,
        };
        let padded = bbox.padded(20.0);
        assert_eq!(padded.x0, 0.0);
        assert_eq!(padded.top, 0.0);
        assert_eq!(padded.x1, 120.0);
        assert_eq!(padded.bottom, 220.0);
    }
}
