//! Core token types shared across calibration, scanning, and building.

pub mod core;
pub mod stream;

pub use core::{Span, Token};
pub use stream::TokenStream;
