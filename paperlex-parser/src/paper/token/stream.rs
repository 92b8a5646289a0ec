//! The per-document token stream and its range helpers.

use crate::paper::source::BBox;
use crate::paper::token::{Span, Token};

/// An ordered, immutable stream of positioned tokens for one document.
///
/// All segmentation state is expressed as index ranges into this stream;
/// the stream itself is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        TokenStream { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// The span covering the whole stream.
    pub fn full_span(&self) -> Span {
        Span::new(0, self.tokens.len())
    }

    /// Concatenated text of the tokens in `span`.
    pub fn text_of(&self, span: Span) -> String {
        self.tokens[span.start..span.end]
            .iter()
            .map(|token| token.text)
            .collect()
    }

    /// First and last page index touched by `span`, or `None` for an empty
    /// span. Pages are non-decreasing in reading order.
    pub fn pages_of(&self, span: Span) -> Option<(usize, usize)> {
        if span.is_empty() {
            return None;
        }
        let first = self.tokens[span.start].page;
        let last = self.tokens[span.end - 1].page;
        Some((first, last))
    }

    /// Bounding box of the tokens of `span` that sit on `page`, or `None`
    /// when the span has no token on that page.
    pub fn bbox_on_page(&self, span: Span, page: usize) -> Option<BBox> {
        let mut bbox: Option<BBox> = None;
        for token in &self.tokens[span.start..span.end] {
            if token.page != page {
                continue;
            }
            let updated = match bbox {
                None => BBox {
                    x0: token.x,
                    top: token.y,
                    x1: token.x,
                    bottom: token.y,
                },
                Some(current) => BBox {
                    x0: current.x0.min(token.x),
                    top: current.top.min(token.y),
                    x1: current.x1.max(token.x),
                    bottom: current.bottom.max(token.y),
                },
            };
            bbox = Some(updated);
        }
        bbox
    }
}
