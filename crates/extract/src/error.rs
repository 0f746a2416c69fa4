// ABOUTME: Error taxonomy for extraction runs.
// ABOUTME: Terminal kinds fold into ExtractionResult::failure and never escape the extractor.

use std::fmt;
use thiserror::Error;

/// Terminal failures for a single extraction call.
///
/// Exactly one of these can end a run; per-record failures are logged and
/// skipped without surfacing here.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Network error, timeout, or a non-2xx HTTP status.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The body was handed to the feed mapper but is not well-formed XML.
    #[error("feed XML parse error: {0}")]
    Parse(String),

    /// Parsing succeeded but no repeating unit was located.
    #[error("no extractable structure: {0}")]
    StructureNotFound(String),
}

impl ExtractError {
    /// Creates a Fetch error from an underlying transport error.
    pub fn fetch(err: impl fmt::Display) -> Self {
        ExtractError::Fetch(err.to_string())
    }

    /// Creates a Parse error from an underlying XML error.
    pub fn parse(err: impl fmt::Display) -> Self {
        ExtractError::Parse(err.to_string())
    }

    /// Creates a StructureNotFound error with a custom message.
    pub fn structure(msg: impl Into<String>) -> Self {
        ExtractError::StructureNotFound(msg.into())
    }

    /// Returns true if this is a fetch-layer failure.
    pub fn is_fetch(&self) -> bool {
        matches!(self, ExtractError::Fetch(_))
    }

    /// Returns true if this is a malformed-document failure.
    pub fn is_parse(&self) -> bool {
        matches!(self, ExtractError::Parse(_))
    }

    /// Returns true if the document was valid but carried nothing to extract.
    pub fn is_structure_not_found(&self) -> bool {
        matches!(self, ExtractError::StructureNotFound(_))
    }
}
