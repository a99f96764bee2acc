//! DTO definitions for the bulk spreadsheet import pipeline.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One candidate question parsed from a spreadsheet row.
///
/// Every field is optional at parse time so a row with missing cells still
/// reaches validation and is reported per-row instead of breaking the parse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportRow {
    /// Raw theme reference: a theme id or a theme name.
    pub theme: Option<String>,
    pub text: Option<String>,
    pub answer1: Option<String>,
    pub answer2: Option<String>,
    pub answer3: Option<String>,
    pub answer4: Option<String>,
    pub image: Option<String>,
}

/// Why a row was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum RejectReason {
    /// Required fields are missing or blank, or the theme reference does not resolve.
    ValidationFailed,
    /// The text collides with an existing or already-accepted question.
    DuplicateText,
}

/// Rejection entry for a single row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportFailure {
    /// 1-based index of the data row (header excluded).
    pub row: usize,
    pub reason: RejectReason,
    /// Offending field name(s) or the colliding text.
    pub detail: String,
}

/// Aggregate result of one bulk-import invocation.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub total_rows: usize,
    pub succeeded: usize,
    pub rejected: usize,
    /// Ordered list of per-row rejections.
    pub failures: Vec<ImportFailure>,
}

impl ImportOutcome {
    /// Empty outcome, extended row by row as the batch progresses.
    pub fn new() -> Self {
        Self {
            total_rows: 0,
            succeeded: 0,
            rejected: 0,
            failures: Vec::new(),
        }
    }

    /// Count a row as accepted.
    pub fn accept(&mut self) {
        self.total_rows += 1;
        self.succeeded += 1;
    }

    /// Count a row as rejected with its reason.
    pub fn reject(&mut self, row: usize, reason: RejectReason, detail: impl Into<String>) {
        self.total_rows += 1;
        self.rejected += 1;
        self.failures.push(ImportFailure {
            row,
            reason,
            detail: detail.into(),
        });
    }
}

impl Default for ImportOutcome {
    fn default() -> Self {
        Self::new()
    }
}
