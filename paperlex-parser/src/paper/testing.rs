//! Test support: synthetic layouts and a recording document-access fake.
//!
//! Unit and integration tests describe documents as lines of text placed
//! at chosen columns instead of hand-writing token vectors. The builder
//! mimics what the document access layer produces: one token per
//! character, x advancing by a fixed glyph width, y decreasing line by
//! line, page indices non-decreasing.

use std::cell::RefCell;

use crate::paper::source::{AccessError, BBox, DocumentAccess, ImageRef};
use crate::paper::token::{Token, TokenStream};

/// Horizontal advance per glyph. Wider than the scanner's column
/// tolerance so text flowing after a marker never lands in its column
/// class.
pub const GLYPH_WIDTH: f64 = 6.0;
/// Vertical advance per line.
pub const LINE_HEIGHT: f64 = 14.0;
/// Baseline of the first line on a page.
pub const TOP_Y: f64 = 760.0;

/// Builds a [`TokenStream`] from positioned lines of text.
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    tokens: Vec<Token>,
    y: Option<f64>,
    page: usize,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        LayoutBuilder {
            tokens: Vec::new(),
            y: None,
            page: 0,
        }
    }

    /// Append a line of plain text starting at column `x`.
    pub fn line(self, x: f64, text: &str) -> Self {
        self.push_line(x, text, false)
    }

    /// Append a line of bold text starting at column `x`.
    pub fn bold(self, x: f64, text: &str) -> Self {
        self.push_line(x, text, true)
    }

    /// Continue on the next page.
    pub fn page_break(mut self) -> Self {
        self.page += 1;
        self.y = None;
        self
    }

    pub fn build(self) -> TokenStream {
        TokenStream::new(self.tokens)
    }

    fn push_line(mut self, x: f64, text: &str, bold: bool) -> Self {
        let y = match self.y {
            None => TOP_Y,
            Some(current) => current - LINE_HEIGHT,
        };
        self.y = Some(y);
        for (offset, ch) in text.chars().enumerate() {
            self.tokens.push(Token {
                x: x + offset as f64 * GLYPH_WIDTH,
                y,
                text: ch,
                bold,
                page: self.page,
            });
        }
        self
    }
}

/// Document-access fake that records render requests and can be told to
/// fail on a given page.
#[derive(Debug, Default)]
pub struct RecordingAccess {
    pub fail_on_page: Option<usize>,
    rendered: RefCell<Vec<(usize, BBox)>>,
}

impl RecordingAccess {
    pub fn new() -> Self {
        RecordingAccess::default()
    }

    pub fn failing_on_page(page: usize) -> Self {
        RecordingAccess {
            fail_on_page: Some(page),
            rendered: RefCell::new(Vec::new()),
        }
    }

    pub fn rendered(&self) -> Vec<(usize, BBox)> {
        self.rendered.borrow().clone()
    }
}

impl DocumentAccess for RecordingAccess {
    fn read_tokens(&self) -> Result<Vec<Token>, AccessError> {
        Ok(Vec::new())
    }

    fn render_region(&self, page: usize, bbox: BBox) -> Result<ImageRef, AccessError> {
        if self.fail_on_page == Some(page) {
            return Err(AccessError::Render(format!("page {} unavailable", page)));
        }
        self.rendered.borrow_mut().push((page, bbox));
        Ok(ImageRef::new(format!("render/page-{}.png", page)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_advance_down_and_pages_reset_y() {
        let stream = LayoutBuilder::new()
            .line(50.0, "ab")
            .line(50.0, "c")
            .page_break()
            .line(50.0, "d")
            .build();
        let tokens = stream.tokens();
        assert_eq!(tokens[0].y, TOP_Y);
        assert_eq!(tokens[1].x, 50.0 + GLYPH_WIDTH);
        assert_eq!(tokens[2].y, TOP_Y - LINE_HEIGHT);
        assert_eq!(tokens[3].page, 1);
        assert_eq!(tokens[3].y, TOP_Y);
    }

    #[test]
    fn recording_access_reports_and_fails_as_told() {
        let access = RecordingAccess::failing_on_page(2);
        let bbox = BBox {
            x0: 0.0,
            top: 0.0,
            x1: 10.0,
            bottom: 10.0,
        };
        assert!(access.render_region(1, bbox).is_ok());
        assert!(access.render_region(2, bbox).is_err());
        assert_eq!(access.rendered().len(), 1);
    }
}
