//! Extraction backend response types
//!
//! These types are backend-agnostic and used across all implementations.

use serde::{Deserialize, Serialize};

use crate::models::ParsedDocument;

/// Result of a document extraction call
///
/// `raw_text` is the full text the vision capability read off the image,
/// retained for audit; `parsed` is the type-tagged structured payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentExtraction {
    pub raw_text: String,
    pub parsed: ParsedDocument,
}
