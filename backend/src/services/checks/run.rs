//! # Trigger Check Run Service
//!
//! Provides the `POST /api/checks/run` endpoint, which starts a background
//! job that evaluates a set of user-defined triggers against every row of a
//! verified dataset.
//!
//! ## Workflow:
//!
//! 1.  **HTTP Request**: the `process` handler receives a `RunCheckRequest`
//!     with the dataset id and the ordered trigger list.
//!
//! 2.  **Preconditions**: the dataset must exist, must have passed structural
//!     verification, and must not already have a check in flight (there is
//!     exactly one computation per dataset at a time; the busy flag rejects
//!     re-entrant runs with `409 Conflict`).
//!
//! 3.  **Job Scheduling**: a unique `job_id` is registered as `Pending` in
//!     the shared `JobsState` and returned to the client immediately for
//!     status polling. The rows and columns are snapshotted so the worker
//!     never touches the store.
//!
//! 4.  **Background Processing**: a `spawn_blocking` worker runs the pure
//!     matcher (`matcher::evaluate`) over the full row set in one pass,
//!     chunked only to report progress percentages.
//!
//! 5.  **Completion**: the annotated rows replace the dataset's previous
//!     results, the busy flag clears, and the job completes with a summary
//!     of how many rows matched a trigger.

use crate::job_controller::state::{JobUpdate, JobsState};
use crate::services::checks::matcher;
use crate::store::DatasetsState;
use actix_web::{web, HttpResponse, Responder};
use common::jobs::JobStatus;
use common::model::annotated::{AnnotatedRow, MatchStatus};
use common::model::row::Row;
use common::model::trigger::Trigger;
use common::requests::RunCheckRequest;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Rows evaluated between progress updates.
const CHUNK_SIZE: usize = 10_000;

/// Status update for a check job or its row-chunk sub-tasks.
///
/// Sent from the synchronous worker back to the async listener, which
/// translates it into a `JobUpdate` for the central job controller. The
/// worker never needs to `await` anything.
#[derive(Debug)]
enum CheckUpdate {
    /// Updates the overall status of the check job.
    Job(JobStatus),
    /// Reports how many rows have been evaluated so far, for the
    /// percentage computation.
    Progress { rows_done: usize, total_rows: usize },
}

/// The Actix web handler for `POST /api/checks/run`.
///
/// Validates the dataset's state, marks it busy, and schedules the check.
/// Returns the `job_id` as JSON on success; `404` for an unknown dataset and
/// `409` when the dataset is unverified or already being checked.
pub(crate) async fn process(
    jobs_state: web::Data<JobsState>,
    datasets_state: web::Data<DatasetsState>,
    payload: web::Json<RunCheckRequest>,
) -> impl Responder {
    let req = payload.into_inner();

    // Snapshot the rows under the lock and flip the busy flag in one go.
    let (rows, columns) = {
        let mut datasets = datasets_state.datasets.write().await;
        let dataset = match datasets.get_mut(&req.dataset_id) {
            Some(d) => d,
            None => return HttpResponse::NotFound().body("Dataset not found"),
        };
        if !dataset.verified {
            return HttpResponse::Conflict().body("Dataset has not been verified.");
        }
        if dataset.check_running {
            return HttpResponse::Conflict().body("A check is already running for this dataset.");
        }
        dataset.check_running = true;
        (dataset.rows.clone(), dataset.columns.clone())
    };

    let job_id = schedule_check_job(
        jobs_state,
        datasets_state,
        req.dataset_id,
        req.triggers,
        rows,
        columns,
    )
    .await;
    HttpResponse::Ok().json(serde_json::json!({ "job_id": job_id }))
}

/// Schedules the trigger check to run in the background and returns its
/// `job_id`.
async fn schedule_check_job(
    jobs_state: web::Data<JobsState>,
    datasets_state: web::Data<DatasetsState>,
    dataset_id: String,
    triggers: Vec<Trigger>,
    rows: Vec<Row>,
    columns: Vec<String>,
) -> String {
    let job_id = Uuid::new_v4().to_string();
    // Immediately register the job as Pending.
    jobs_state
        .jobs
        .write()
        .await
        .insert(job_id.clone(), JobStatus::Pending);

    let tx = jobs_state.tx.clone(); // Channel to the central job updater.
    let job_id_clone = job_id.clone();

    tokio::spawn(async move {
        // Dedicated channel for this job's updates.
        let (check_tx, mut check_rx) = mpsc::channel::<CheckUpdate>(100);

        // Listener task: receives `CheckUpdate`s from the blocking worker and
        // translates them into `JobUpdate`s for the central job controller.
        let job_updater_tx = tx.clone();
        let job_id_for_updater = job_id_clone.clone();
        tokio::spawn(async move {
            while let Some(update) = check_rx.recv().await {
                let status = match update {
                    CheckUpdate::Job(job_status) => job_status,
                    CheckUpdate::Progress {
                        rows_done,
                        total_rows,
                    } => {
                        let progress = if total_rows > 0 {
                            (rows_done as f32 / total_rows as f32 * 100.0) as u32
                        } else {
                            100
                        };
                        JobStatus::InProgress(progress)
                    }
                };

                let _ = job_updater_tx
                    .send(JobUpdate {
                        job_id: job_id_for_updater.clone(),
                        status,
                    })
                    .await;
            }
        });

        // Run the matcher on a dedicated thread.
        let handle =
            tokio::task::spawn_blocking(move || run_check_blocking(check_tx, rows, triggers, columns));

        match handle.await {
            Ok(annotated) => {
                let matched = annotated
                    .iter()
                    .filter(|r| r.status == MatchStatus::Found)
                    .count();
                let total = annotated.len();

                // Store the results and clear the busy flag.
                if let Some(dataset) = datasets_state.datasets.write().await.get_mut(&dataset_id)
                {
                    dataset.results = Some(annotated);
                    dataset.check_running = false;
                }

                let _ = tx
                    .send(JobUpdate {
                        job_id: job_id_clone,
                        status: JobStatus::Completed(format!(
                            "Check complete: {} of {} rows matched a trigger",
                            matched, total
                        )),
                    })
                    .await;
            }
            Err(join_err) => {
                if let Some(dataset) = datasets_state.datasets.write().await.get_mut(&dataset_id)
                {
                    dataset.check_running = false;
                }
                let _ = tx
                    .send(JobUpdate {
                        job_id: job_id_clone,
                        status: JobStatus::Failed(format!("Task join error: {}", join_err)),
                    })
                    .await;
            }
        }
    });

    job_id
}

/// The synchronous check pass, designed to run via `spawn_blocking`.
///
/// The matcher itself is pure and infallible; the only work here beyond
/// calling it is chunking the rows so progress percentages can be reported
/// while a large dataset is scanned.
fn run_check_blocking(
    tx: mpsc::Sender<CheckUpdate>,
    rows: Vec<Row>,
    triggers: Vec<Trigger>,
    columns: Vec<String>,
) -> Vec<AnnotatedRow> {
    let _ = tx.blocking_send(CheckUpdate::Job(JobStatus::InProgress(0)));

    let total_rows = rows.len();
    let mut annotated = Vec::with_capacity(total_rows);

    for chunk in rows.chunks(CHUNK_SIZE) {
        annotated.extend(matcher::evaluate(chunk, &triggers, &columns));
        let _ = tx.blocking_send(CheckUpdate::Progress {
            rows_done: annotated.len(),
            total_rows,
        });
    }

    annotated
}
