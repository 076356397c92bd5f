//! Shared PDF handling utilities
//!
//! Turns an uploaded contract into the single flat string the review
//! pipeline feeds to the language model. Pages are read in order, each
//! text-showing operator is one content item, items on a page are joined
//! with spaces and pages with newlines. No OCR, no layout reconstruction.

pub mod extractor;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use extractor::{ExtractError, TextExtractor};
