//! # paperlex-parser
//!
//! Segmentation and reconciliation engine for typeset examination papers.
//!
//! The engine receives an ordered stream of positioned characters from a
//! document access layer and turns it into a question tree by combining two
//! signals: the column a character sits in, and the marker literal expected
//! next in sequence at that nesting level. The tree is then reconciled
//! against an independently extracted answer table and missing parent
//! answers are synthesized bottom-up.
//!
//! The pipeline is strictly sequential per document:
//!
//!     calibrate -> scan -> build -> align -> aggregate
//!
//! Each stage lives in its own module under [`paper`]; the
//! [`paper::pipeline`] module ties them together and is the recommended
//! entry point.

pub mod paper;
