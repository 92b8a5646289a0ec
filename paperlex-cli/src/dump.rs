//! JSON dump adapters for the external interfaces.
//!
//! The CLI stands in for the real document access layer and answer-table
//! extractor: both inputs arrive as JSON dumps produced upstream. Token
//! dumps carry no renderable pages, so the render side channel reports
//! itself unavailable rather than pretending.

use std::fs;
use std::path::PathBuf;

use paperlex_parser::paper::alignment::AnswerRow;
use paperlex_parser::paper::source::{AccessError, AnswerSource, BBox, DocumentAccess, ImageRef};
use paperlex_parser::paper::token::Token;

/// Document access backed by a token dump file.
pub struct JsonDocument {
    path: PathBuf,
}

impl JsonDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonDocument { path: path.into() }
    }
}

impl DocumentAccess for JsonDocument {
    fn read_tokens(&self) -> Result<Vec<Token>, AccessError> {
        let contents = fs::read_to_string(&self.path)
            .map_err(|err| AccessError::Read(format!("{}: {}", self.path.display(), err)))?;
        serde_json::from_str(&contents)
            .map_err(|err| AccessError::Read(format!("{}: {}", self.path.display(), err)))
    }

    fn render_region(&self, _page: usize, _bbox: BBox) -> Result<ImageRef, AccessError> {
        Err(AccessError::Render(
            "token dumps carry no renderable pages".to_string(),
        ))
    }
}

/// Answer table backed by a row dump file.
pub struct JsonAnswerTable {
    path: PathBuf,
}

impl JsonAnswerTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonAnswerTable { path: path.into() }
    }
}

impl AnswerSource for JsonAnswerTable {
    fn extract_rows(&self) -> Result<Vec<AnswerRow>, AccessError> {
        let contents = fs::read_to_string(&self.path)
            .map_err(|err| AccessError::Read(format!("{}: {}", self.path.display(), err)))?;
        serde_json::from_str(&contents)
            .map_err(|err| AccessError::Read(format!("{}: {}", self.path.display(), err)))
    }
}
