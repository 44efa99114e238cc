use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One output row: column name to extracted string value. Later writes to
/// the same column overwrite earlier ones.
pub type Record = HashMap<String, String>;

/// Enough context to diagnose a failed page without reading logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub url: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// The per-URL result of one fetch-parse-extract cycle. The variants are
/// exclusive: a page never contributes both records and a diagnostic.
#[derive(Debug, Clone)]
pub enum PageOutcome {
    Success(Vec<Record>),
    Error(Diagnostic),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    /// At least one record was extracted (failed pages may still be listed
    /// in `errors`).
    Success,
    /// Every attempted page failed.
    Error,
    /// Nothing extracted and nothing failed, e.g. an empty page range.
    NoData,
}

/// Records and diagnostics merged across all fetched pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResult {
    pub status: ExtractionStatus,
    pub records: Vec<Record>,
    pub errors: Vec<Diagnostic>,
}

impl AggregateResult {
    pub fn new() -> Self {
        Self {
            status: ExtractionStatus::NoData,
            records: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Fold one page outcome in. Success outcomes append their records
    /// flattened; error outcomes append their diagnostic.
    pub fn fold(&mut self, outcome: PageOutcome) {
        match outcome {
            PageOutcome::Success(records) => self.records.extend(records),
            PageOutcome::Error(diagnostic) => self.errors.push(diagnostic),
        }
        self.status = self.implied_status();
    }

    fn implied_status(&self) -> ExtractionStatus {
        if !self.records.is_empty() {
            ExtractionStatus::Success
        } else if !self.errors.is_empty() {
            ExtractionStatus::Error
        } else {
            ExtractionStatus::NoData
        }
    }
}

impl Default for AggregateResult {
    fn default() -> Self {
        Self::new()
    }
}
