use crate::model::row::CellValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Whether any trigger fired for a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    #[serde(rename = "found")]
    Found,
    #[serde(rename = "not found")]
    NotFound,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Found => write!(f, "found"),
            MatchStatus::NotFound => write!(f, "not found"),
        }
    }
}

/// The matcher's output for one input row: the original cells plus the three
/// annotation fields the exporter appends as extra spreadsheet columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedRow {
    pub cells: HashMap<String, CellValue>,
    pub status: MatchStatus,
    /// Name of the first trigger that matched, or empty if none did.
    pub triggered_by: String,
    /// Distinct terms of the firing trigger that were found in the row,
    /// in first-seen order.
    pub matched_keywords: Vec<String>,
}

impl AnnotatedRow {
    /// The matched terms in the comma-joined form used by the exporter.
    pub fn matched_keywords_joined(&self) -> String {
        self.matched_keywords.join(", ")
    }
}
