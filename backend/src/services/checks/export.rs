use crate::store::DatasetsState;
use actix_web::{web, HttpResponse, Responder};
use common::model::annotated::{AnnotatedRow, MatchStatus};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct ExportQuery {
    /// When set, an extra `highlight` column marks found rows with `X` so
    /// downstream spreadsheet tooling can conditionally format them (CSV
    /// itself carries no cell styling).
    #[serde(default)]
    pub highlight: bool,
}

/// Serializes the annotated rows back to CSV: the original columns in header
/// order plus the three annotation columns, and optionally the highlight
/// marker column.
fn write_annotated_csv(
    columns: &[String],
    results: &[AnnotatedRow],
    highlight: bool,
) -> Result<Vec<u8>, String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<String> = columns.to_vec();
    header.push("status".to_string());
    header.push("triggered_by".to_string());
    header.push("matched_keywords".to_string());
    if highlight {
        header.push("highlight".to_string());
    }
    writer.write_record(&header).map_err(|e| e.to_string())?;

    for row in results {
        let mut record: Vec<String> = columns
            .iter()
            .map(|column| {
                row.cells
                    .get(column)
                    .map(|cell| cell.as_text())
                    .unwrap_or_default()
            })
            .collect();
        record.push(row.status.to_string());
        record.push(row.triggered_by.clone());
        record.push(row.matched_keywords_joined());
        if highlight {
            record.push(if row.status == MatchStatus::Found {
                "X".to_string()
            } else {
                String::new()
            });
        }
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }

    writer
        .into_inner()
        .map_err(|e| e.to_string())
}

/// Actix web handler for `GET /api/checks/export/{dataset_id}`.
///
/// Serves the most recent check results as a `text/csv` attachment. `404`
/// if the dataset is unknown or has no results yet.
pub(crate) async fn process(
    dataset_id: web::Path<String>,
    query: web::Query<ExportQuery>,
    state: web::Data<DatasetsState>,
) -> impl Responder {
    let datasets = state.datasets.read().await;
    let dataset = match datasets.get(&dataset_id.into_inner()) {
        Some(d) => d,
        None => return HttpResponse::NotFound().body("Dataset not found"),
    };
    let results = match &dataset.results {
        Some(r) => r,
        None => {
            return HttpResponse::NotFound().body("No check has been run for this dataset")
        }
    };

    match write_annotated_csv(&dataset.columns, results, query.highlight) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}_check.csv\"", dataset.name),
            ))
            .body(bytes),
        Err(e) => HttpResponse::InternalServerError().body(format!("Export failed: {}", e)),
    }
}
