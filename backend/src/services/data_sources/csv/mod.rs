//! Manages CSV dataset interactions: uploading, verification, and status
//! tracking.
//!
//! Datasets are the row source for trigger checks. This module provides the
//! HTTP endpoints for getting spreadsheet data into the in-memory store and
//! for the asynchronous structural verification that must pass before a
//! check can run.
//!
//! The provided routes are:
//! - `POST /api/data_sources/csv/upload`: multipart/form-data upload. It
//!   expects a `json` field with the dataset metadata followed by a `file`
//!   field with the CSV data. The header is validated, the delimiter
//!   detected, and the rows are parsed into typed cells. Re-uploading bytes
//!   whose MD5 matches an already-stored dataset of the same name returns
//!   the existing dataset instead of a new one.
//!
//! - `POST /api/data_sources/csv/verify`: starts an asynchronous background
//!   job that scans every row for structural problems (missing cells, values
//!   inconsistent with the column kind inferred from the first data row). It
//!   immediately returns a `job_id` the client can poll. On success the
//!   dataset is marked verified.
//!
//! - `GET /api/data_sources/csv/status/{job_id}`: polls the status of a
//!   verification job (`Pending`, `InProgress`, `Completed` or `Failed`)
//!   from the shared `JobsState`.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod get_status;
pub(crate) mod upload;
mod verify;

const API_PATH: &str = "/api/data_sources/csv";

/// Configures and returns the Actix scope for CSV dataset routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        // Route to start a new dataset verification job.
        .route("/verify", post().to(verify::process))
        // Route to get the status of an ongoing verification job.
        .route("/status/{job_id}", get().to(get_status::process))
        // Route to upload a new CSV dataset.
        .route("/upload", post().to(upload::process))
}
