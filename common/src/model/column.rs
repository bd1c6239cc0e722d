use serde::{Deserialize, Serialize};

/// Represents the inferred shape of a single dataset column, generated during
/// CSV ingestion on the backend.
///
/// When a user uploads a CSV file, the upload service inspects the header and
/// the first data row and builds a `Vec<ColumnSummary>` describing what was
/// detected. The vector is returned in the upload response so the user can
/// review the detected columns before running a trigger check against them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    /// The trimmed column header title from the CSV file.
    pub title: String,
    /// The kind (`Text`, `Number`, `Bool`) inferred from the content of the
    /// first data row for this column.
    pub kind: ColumnKind,
    /// The textual value from the first data row for this column, giving the
    /// user a concrete example of the data the column holds.
    pub sample: Option<String>,
}

/// The cell kind inferred for a column from its first data row.
///
/// Kinds only drive the structural verification pass; the trigger matcher
/// itself compares everything as lowercased text regardless of kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Number,
    Bool,
}
