use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single cell as parsed from an ingested spreadsheet.
///
/// Cells keep the type inferred at ingestion time (number, boolean, blank or
/// free text), but every consumer that needs to compare cell content works on
/// the string form produced by [`CellValue::as_text`]. Coercion is lossy-safe
/// and never fails: a blank cell becomes the empty string, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Blank,
}

impl CellValue {
    /// Coerces the cell to its textual form.
    ///
    /// Integral numbers are rendered without a fractional part so that a cell
    /// ingested as `1000` compares as `"1000"`, not `"1000.0"`.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::Bool(b) => b.to_string(),
            CellValue::Blank => String::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }
}

/// One record from an ingested spreadsheet, keyed by column title.
///
/// Rows are immutable inputs to the trigger matcher: the matcher reads them
/// and produces new annotated rows rather than mutating in place. A column
/// missing from `cells` (short CSV record) reads as a blank cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Row {
    pub cells: HashMap<String, CellValue>,
}

impl Row {
    /// The textual value of `column`, or the empty string if the row has no
    /// cell for it.
    pub fn text(&self, column: &str) -> String {
        self.cells
            .get(column)
            .map(CellValue::as_text)
            .unwrap_or_default()
    }
}
