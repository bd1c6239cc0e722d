use serde::{Deserialize, Serialize};

/// Status of a background job (dataset verification or trigger check),
/// polled by clients through the per-service `status/{job_id}` endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    /// Progress indicator: rows scanned for verification jobs, a percentage
    /// for trigger check jobs.
    InProgress(u32),
    Completed(String),
    Failed(String),
}
