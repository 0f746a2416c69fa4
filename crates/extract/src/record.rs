// ABOUTME: Result types produced by an extraction run.
// ABOUTME: NormalizedRecord is the fixed-shape row; ExtractionResult wraps records plus run metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single board post or feed item in normalized form.
///
/// Constructed once per structural unit and immutable afterwards. Fields
/// the source does not carry stay at their documented defaults instead of
/// failing the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// 1-based position in source order, assigned during extraction.
    pub sequence_number: String,
    /// May be empty when extraction fails for this unit alone.
    pub title: String,
    /// `YYYY-MM-DD` when the source date parsed, otherwise the raw text.
    pub date: String,
    /// Empty when the source format has no author column.
    pub author: String,
    /// Absolute URL, best-effort resolved.
    pub source_url: String,
    /// `"0"` when the source exposes no view counter.
    pub view_count: String,
    /// Only set for table rows wide enough to carry an attachment column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_attachment: Option<bool>,
}

/// Metadata describing one extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMeta {
    pub total_count: usize,
    pub retrieved_at: DateTime<Utc>,
    pub source_label: String,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The extractor's only output shape.
///
/// Failures degrade into an empty record list plus `meta.error`; they are
/// never raised to the caller. `meta.total_count` always mirrors
/// `records.len()`, and record order mirrors the source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub records: Vec<NormalizedRecord>,
    pub meta: ExtractionMeta,
}

impl ExtractionResult {
    /// Wraps extracted records with fresh run metadata.
    pub fn from_records(
        records: Vec<NormalizedRecord>,
        source_label: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        let total_count = records.len();
        Self {
            records,
            meta: ExtractionMeta {
                total_count,
                retrieved_at: Utc::now(),
                source_label: source_label.into(),
                source_url: source_url.into(),
                error: None,
            },
        }
    }

    /// Builds the degraded shape for a failed run: no records, a message.
    pub fn failure(
        source_label: impl Into<String>,
        source_url: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            records: Vec::new(),
            meta: ExtractionMeta {
                total_count: 0,
                retrieved_at: Utc::now(),
                source_label: source_label.into(),
                source_url: source_url.into(),
                error: Some(error.into()),
            },
        }
    }

    /// Returns true when the run ended in a terminal failure.
    pub fn is_degraded(&self) -> bool {
        self.meta.error.is_some()
    }
}
