use crate::job_controller::state::{JobUpdate, JobsState};
use crate::services::data_sources::csv::upload::summarize_columns;
use crate::store::DatasetsState;
use actix_web::{web, HttpResponse, Responder};
use common::jobs::JobStatus;
use common::model::column::{ColumnKind, ColumnSummary};
use common::model::row::{CellValue, Row};
use common::requests::VerifyDatasetRequest;
use rayon::prelude::*;
use std::time::Instant;
use tokio::sync::mpsc;

/// Rows scanned per progress update.
const CHUNK_SIZE: usize = 50_000;

fn validate_value(kind: ColumnKind, value: &CellValue) -> bool {
    match kind {
        ColumnKind::Text => true,
        ColumnKind::Number => matches!(value, CellValue::Number(_) | CellValue::Blank),
        ColumnKind::Bool => matches!(value, CellValue::Bool(_) | CellValue::Blank),
    }
}

/// Scans one chunk of rows in parallel and reports an invalid row as
/// `(1-based spreadsheet row number, column title)`.
///
/// A row is invalid when it is missing a cell for a header column (short
/// record) or when a cell does not fit the kind inferred for its column from
/// the first data row.
fn find_first_invalid(
    chunk: &[Row],
    offset: usize,
    checks: &[ColumnSummary],
) -> Option<(usize, String)> {
    chunk.par_iter().enumerate().find_map_any(|(i, row)| {
        for check in checks {
            match row.cells.get(&check.title) {
                None => return Some((offset + i + 2, check.title.clone())), // +2: header + 1-based
                Some(cell) => {
                    if !validate_value(check.kind, cell) {
                        return Some((offset + i + 2, check.title.clone()));
                    }
                }
            }
        }
        None
    })
}

/// Synchronous verification pass, designed to run via `spawn_blocking`.
///
/// Returns `Ok(true)` when every row is structurally sound, `Ok(false)` when
/// an invalid row was found (the failure has already been reported through
/// `tx`), and `Err` for scheduling-level problems.
fn verify_dataset_blocking(
    tx: mpsc::Sender<JobUpdate>,
    job_id: String,
    checks: Vec<ColumnSummary>,
    rows: Vec<Row>,
) -> Result<bool, String> {
    let start = Instant::now();
    let mut rows_scanned = 0usize;

    for chunk in rows.chunks(CHUNK_SIZE) {
        if let Some((row, title)) = find_first_invalid(chunk, rows_scanned, &checks) {
            let _ = tx.blocking_send(JobUpdate {
                job_id: job_id.clone(),
                status: JobStatus::Failed(format!(
                    "First invalid row at: row {}, column '{}'",
                    row, title
                )),
            });
            log::info!("verify_dataset finished in: {:.2?}", start.elapsed());
            return Ok(false);
        }
        rows_scanned += chunk.len();
        let _ = tx.blocking_send(JobUpdate {
            job_id: job_id.clone(),
            status: JobStatus::InProgress(rows_scanned as u32),
        });
    }

    log::info!("verify_dataset finished in: {:.2?}", start.elapsed());
    Ok(true)
}

pub(crate) async fn process(
    jobs_state: web::Data<JobsState>,
    datasets_state: web::Data<DatasetsState>,
    req: web::Json<VerifyDatasetRequest>,
) -> impl Responder {
    match schedule_verify_job(jobs_state, datasets_state, req.into_inner()).await {
        Ok(job_id) => HttpResponse::Ok().body(job_id),
        Err(err) => HttpResponse::NotFound().body(err),
    }
}

/// Schedules the dataset verification job to run in the background.
///
/// The dataset's rows are snapshotted under a read lock so the blocking
/// worker never touches the store; on success the dataset is marked
/// `verified` from the async side.
async fn schedule_verify_job(
    jobs_state: web::Data<JobsState>,
    datasets_state: web::Data<DatasetsState>,
    req: VerifyDatasetRequest,
) -> Result<String, String> {
    let (checks, rows) = {
        let datasets = datasets_state.datasets.read().await;
        let dataset = datasets
            .get(&req.dataset_id)
            .ok_or_else(|| "Dataset not found".to_string())?;
        (
            summarize_columns(&dataset.columns, &dataset.rows),
            dataset.rows.clone(),
        )
    };

    let job_id = uuid::Uuid::new_v4().to_string();
    jobs_state
        .jobs
        .write()
        .await
        .insert(job_id.clone(), JobStatus::Pending);

    let tx = jobs_state.tx.clone();
    let job_id_clone = job_id.clone();
    let dataset_id = req.dataset_id;
    let ds_state = datasets_state.clone();

    tokio::spawn(async move {
        let tx_block = tx.clone();
        let job_id_for_blocking = job_id_clone.clone();

        let handle = tokio::task::spawn_blocking(move || {
            verify_dataset_blocking(tx_block, job_id_for_blocking, checks, rows)
        });

        match handle.await {
            Ok(Ok(true)) => {
                if let Some(dataset) = ds_state.datasets.write().await.get_mut(&dataset_id) {
                    dataset.verified = true;
                }
                let _ = tx
                    .send(JobUpdate {
                        job_id: job_id_clone,
                        status: JobStatus::Completed("Verification successful".to_string()),
                    })
                    .await;
            }
            // Invalid row found: the worker already reported the failure.
            Ok(Ok(false)) => {}
            Ok(Err(e)) => {
                let _ = tx
                    .send(JobUpdate {
                        job_id: job_id_clone,
                        status: JobStatus::Failed(e),
                    })
                    .await;
            }
            Err(join_err) => {
                let _ = tx
                    .send(JobUpdate {
                        job_id: job_id_clone,
                        status: JobStatus::Failed(format!("join error: {}", join_err)),
                    })
                    .await;
            }
        }
    });

    Ok(job_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn row(cells: &[(&str, CellValue)]) -> Row {
        Row {
            cells: cells
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<HashMap<_, _>>(),
        }
    }

    fn checks() -> Vec<ColumnSummary> {
        vec![
            ColumnSummary {
                title: "A".to_string(),
                kind: ColumnKind::Text,
                sample: None,
            },
            ColumnSummary {
                title: "B".to_string(),
                kind: ColumnKind::Number,
                sample: None,
            },
        ]
    }

    #[test]
    fn validate_value_accepts_blanks_for_any_kind() {
        assert!(validate_value(ColumnKind::Number, &CellValue::Blank));
        assert!(validate_value(ColumnKind::Bool, &CellValue::Blank));
        assert!(validate_value(ColumnKind::Text, &CellValue::Number(1.0)));
        assert!(!validate_value(
            ColumnKind::Number,
            &CellValue::Text("x".to_string())
        ));
    }

    #[test]
    fn clean_rows_pass_the_scan() {
        let rows = vec![
            row(&[
                ("A", CellValue::Text("ok".to_string())),
                ("B", CellValue::Number(1.0)),
            ]),
            row(&[("A", CellValue::Blank), ("B", CellValue::Blank)]),
        ];
        assert_eq!(find_first_invalid(&rows, 0, &checks()), None);
    }

    #[test]
    fn type_drift_is_reported_with_row_and_column() {
        let rows = vec![
            row(&[
                ("A", CellValue::Text("ok".to_string())),
                ("B", CellValue::Number(1.0)),
            ]),
            row(&[
                ("A", CellValue::Text("ok".to_string())),
                ("B", CellValue::Text("not a number".to_string())),
            ]),
        ];
        // Row 2 of the data is spreadsheet row 3 (header + 1-based).
        assert_eq!(
            find_first_invalid(&rows, 0, &checks()),
            Some((3, "B".to_string()))
        );
    }

    #[test]
    fn short_records_are_reported() {
        let rows = vec![row(&[("A", CellValue::Text("ok".to_string()))])];
        assert_eq!(
            find_first_invalid(&rows, 0, &checks()),
            Some((2, "B".to_string()))
        );
    }
}
