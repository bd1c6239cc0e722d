//! Manages the state of long-running, asynchronous background jobs.
//!
//! Two kinds of work run outside the request/response cycle: the structural
//! verification of an uploaded dataset (`services::data_sources::csv::verify`)
//! and the trigger check itself (`services::checks::run`). Both report their
//! progress through the components defined here:
//!
//! - `JobsState`: a clonable, thread-safe struct holding the shared state of
//!   all jobs. It is injected into the Actix application state in `main.rs`.
//! - `JobUpdate`: a message struct used to communicate status changes from a
//!   background job back to the central state manager.
//! - `start_job_updater`: a long-running task that listens for `JobUpdate`
//!   messages on an MPSC channel and updates the shared `JobsState`.

use common::jobs::JobStatus;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// A thread-safe, shareable container for the state of all background jobs.
#[derive(Clone)]
pub struct JobsState {
    /// Map from a unique job ID to its current `JobStatus`.
    ///
    /// This map is the single source of truth for job progress. It is behind
    /// an `Arc<RwLock>` so the status endpoints can read concurrently while
    /// the `start_job_updater` task holds exclusive writes.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Sender half of the update channel.
    ///
    /// Background workers push `JobUpdate` messages through this sender
    /// instead of writing to the `jobs` map directly, which keeps the
    /// blocking workers free of any lock handling.
    pub tx: mpsc::Sender<JobUpdate>,
}

/// A status update for a specific background job.
#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

/// Central job state updater. Spawned once from `main.rs`; drains the update
/// channel and applies each message to the shared `jobs` map.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        jobs.insert(update.job_id.clone(), update.status);
    }
}
