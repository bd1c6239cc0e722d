use crate::model::trigger::Trigger;
use serde::{Deserialize, Serialize};

/// Metadata part of the multipart CSV upload, sent before the file part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadDataset {
    /// Display name for the dataset (typically the workbook name).
    pub name: String,
}

/// Request payload for the dataset verification endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyDatasetRequest {
    pub dataset_id: String,
}

/// Request payload for starting a trigger check run.
///
/// Triggers are evaluated in the order given; the first trigger that matches
/// a row wins for that row. An empty trigger list is valid and annotates
/// every row as `"not found"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCheckRequest {
    pub dataset_id: String,
    pub triggers: Vec<Trigger>,
}
