//! # Trigger Check Service Module
//!
//! Aggregates the endpoints for running trigger checks against an uploaded
//! dataset and retrieving their output. The matching pass itself lives in
//! the `matcher` sub-module and is a pure function; everything else here is
//! the job plumbing and serialization around it.
//!
//! ## Sub-modules:
//! - `matcher`: the pure row/trigger matching pass.
//! - `run`: schedules a check as a background job.
//! - `get_status`: polls a check job's status.
//! - `results`: returns the annotated rows of the latest check as JSON.
//! - `export`: serves the annotated rows as a CSV attachment.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod export;
mod get_status;
pub(crate) mod matcher;
mod results;
mod run;

/// The base path for all check-related API endpoints.
const API_PATH: &str = "/api/checks";

/// Configures and returns the Actix `Scope` for all check-related routes.
///
/// # Registered Routes:
///
/// *   **`POST /run`**: starts a trigger check for a verified dataset and
///     returns a `job_id` for polling. `409` when the dataset is unverified
///     or already has a check in flight.
/// *   **`GET /status/{job_id}`**: current `JobStatus` of a check job.
/// *   **`GET /results/{dataset_id}`**: annotated rows of the most recent
///     check, as JSON.
/// *   **`GET /export/{dataset_id}?highlight=true`**: the same rows as a
///     CSV attachment with the three annotation columns appended (plus the
///     highlight marker column when requested).
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/run", post().to(run::process))
        .route("/status/{job_id}", get().to(get_status::process))
        .route("/results/{dataset_id}", get().to(results::process))
        .route("/export/{dataset_id}", get().to(export::process))
}
