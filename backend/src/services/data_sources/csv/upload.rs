use crate::store::{Dataset, DatasetsState};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use common::model::column::{ColumnKind, ColumnSummary};
use common::model::row::{CellValue, Row};
use common::requests::UploadDataset;
use futures_util::StreamExt;
use md5::Context;
use regex::Regex;
use serde::Serialize;
use serde_json::from_slice;
use std::collections::HashMap;
use uuid::Uuid;

/// Response body of a successful upload.
#[derive(Serialize)]
pub struct UploadResponse {
    pub dataset_id: String,
    pub md5: String,
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    /// True when the uploaded bytes matched an already-stored dataset of the
    /// same name and no new dataset was created.
    pub unchanged: bool,
}

/// Validate each CSV header cell.
/// - `header_str` is the raw header line (without trailing CR/LF).
/// - `header_re` is the precompiled regex used to validate each cell.
fn validate_header_cells(
    header_str: &str,
    header_re: &Regex,
    delimiter: char,
) -> Result<(), Box<dyn std::error::Error>> {
    for cell in header_str.split(delimiter) {
        let mut f = cell.trim();
        // remove surrounding quotes if any
        if f.starts_with('"') && f.ends_with('"') && f.len() >= 2 {
            f = &f[1..f.len() - 1];
        }
        if f.is_empty() {
            return Err("CSV header cells must not be empty".into());
        }
        if !header_re.is_match(f) {
            return Err(
                "CSV header cells must contain only text, digits, spaces, '-' or '_'".into(),
            );
        }
    }
    Ok(())
}

/// Picks the delimiter that occurs most often on the header line.
pub(crate) fn detect_delimiter(header_line: &str) -> char {
    [',', ';', '\t', '|']
        .iter()
        .max_by_key(|&&d| header_line.matches(d).count())
        .copied()
        .unwrap_or(',')
}

fn normalize_cell(cell: &str) -> String {
    let s = cell.trim();
    // quitar comillas externas simples o dobles
    let s = s
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .map(|s| s.to_string())
        .unwrap_or_else(|| s.to_string());
    s.replace('\u{00A0}', " ").trim().to_string()
}

/// Infers the typed cell value for one raw CSV field.
fn infer_cell(raw: &str) -> CellValue {
    let val = normalize_cell(raw);
    if val.is_empty() {
        CellValue::Blank
    } else if val.eq_ignore_ascii_case("true") {
        CellValue::Bool(true)
    } else if val.eq_ignore_ascii_case("false") {
        CellValue::Bool(false)
    } else if let Ok(n) = val.parse::<f64>() {
        CellValue::Number(n)
    } else {
        CellValue::Text(val)
    }
}

fn kind_of(cell: &CellValue) -> ColumnKind {
    match cell {
        CellValue::Number(_) => ColumnKind::Number,
        CellValue::Bool(_) => ColumnKind::Bool,
        CellValue::Text(_) | CellValue::Blank => ColumnKind::Text,
    }
}

/// Builds the per-column summaries from the header and the first data row.
pub(crate) fn summarize_columns(columns: &[String], rows: &[Row]) -> Vec<ColumnSummary> {
    columns
        .iter()
        .map(|title| {
            let first = rows.first().and_then(|row| row.cells.get(title));
            let kind = first.map(kind_of).unwrap_or(ColumnKind::Text);
            let sample = first.filter(|c| !c.is_blank()).map(|c| c.as_text());
            ColumnSummary {
                title: title.clone(),
                kind,
                sample,
            }
        })
        .collect()
}

/// Parses the uploaded bytes into column titles and typed rows.
///
/// The header is validated before anything else: empty or non-text header
/// cells reject the whole upload. Short records are tolerated here (the
/// missing cells read as blank and the verification job reports them);
/// records wider than the header are rejected outright because the extra
/// cells have no column to land in.
pub(crate) fn parse_dataset(
    bytes: &[u8],
) -> Result<(Vec<String>, Vec<Row>), Box<dyn std::error::Error>> {
    let header_end = bytes
        .iter()
        .position(|&b| b == b'\n')
        .unwrap_or(bytes.len());
    let mut header_line = bytes[..header_end].to_vec();
    if header_line.ends_with(&[b'\r']) {
        header_line.pop();
    }
    let header_str =
        String::from_utf8(header_line).map_err(|_| "Header is not valid UTF-8")?;
    if header_str.trim().is_empty() {
        return Err("CSV file is empty".into());
    }

    let delimiter = detect_delimiter(&header_str);

    // Regex to validate header cells: letters, marks, digits, spaces, hyphen, underscore.
    let header_re =
        Regex::new(r"^[\p{L}\p{M}\p{N}\s\-_]+$").map_err(|e| format!("Regex error: {}", e))?;
    validate_header_cells(&header_str, &header_re, delimiter)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .has_headers(true)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|t| t.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() > columns.len() {
            return Err(format!(
                "Row {} has more cells than the header ({} > {})",
                i + 2,
                record.len(),
                columns.len()
            )
            .into());
        }
        let mut cells = HashMap::new();
        for (j, title) in columns.iter().enumerate() {
            if let Some(raw) = record.get(j) {
                cells.insert(title.clone(), infer_cell(raw));
            }
        }
        rows.push(Row { cells });
    }

    Ok((columns, rows))
}

/// HTTP handler wrapper that converts the internal result to an `HttpResponse`.
///
/// - On success: `200 OK` with the `UploadResponse` as JSON.
/// - On failure: `400 Bad Request` with the error message.
pub async fn process(payload: Multipart, state: web::Data<DatasetsState>) -> impl Responder {
    match upload_dataset(payload, state).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => HttpResponse::BadRequest().body(format!("Error: {}", e)),
    }
}

/// Consumes the multipart payload (a `json` metadata part followed by a
/// `file` part), hashes the uploaded bytes, parses them into a dataset and
/// stores it in the session store.
async fn upload_dataset(
    mut payload: Multipart,
    state: web::Data<DatasetsState>,
) -> Result<UploadResponse, Box<dyn std::error::Error>> {
    let mut meta: Option<UploadDataset> = None;
    let mut md5_hasher = Context::new();
    let mut file_bytes: Vec<u8> = Vec::new();
    let mut file_seen = false;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match field_name.as_deref() {
            Some("file") => {
                if meta.is_none() {
                    return Err("Dataset JSON must be sent before the file".into());
                }
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();
                if !filename.ends_with(".csv") {
                    return Err("The file must end with .csv".into());
                }

                while let Some(chunk) = field.next().await {
                    let chunk = chunk?;
                    // Hash the uploaded bytes as they stream in.
                    md5_hasher.consume(&chunk);
                    file_bytes.extend_from_slice(&chunk);
                }
                file_seen = true;
            }

            Some("json") => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    bytes.extend_from_slice(&chunk?);
                }
                meta = Some(from_slice::<UploadDataset>(&bytes)?);
            }

            _ => {}
        }
    }

    let meta = meta.ok_or("Missing dataset metadata")?;
    if !file_seen {
        return Err("Missing file".into());
    }

    let computed_md5 = format!("{:x}", md5_hasher.finalize());

    // Same name, same bytes: keep the stored dataset (and its verification
    // state) instead of creating a duplicate.
    {
        let datasets = state.datasets.read().await;
        if let Some(existing) = datasets
            .values()
            .find(|d| d.name == meta.name && d.md5 == computed_md5)
        {
            return Ok(UploadResponse {
                dataset_id: existing.id.clone(),
                md5: existing.md5.clone(),
                rows: existing.rows.len(),
                columns: summarize_columns(&existing.columns, &existing.rows),
                unchanged: true,
            });
        }
    }

    let (columns, rows) = parse_dataset(&file_bytes)?;
    let dataset_id = Uuid::new_v4().to_string();
    let summaries = summarize_columns(&columns, &rows);
    let row_count = rows.len();

    state.datasets.write().await.insert(
        dataset_id.clone(),
        Dataset {
            id: dataset_id.clone(),
            name: meta.name,
            md5: computed_md5.clone(),
            columns,
            rows,
            verified: false,
            check_running: false,
            results: None,
        },
    );

    Ok(UploadResponse {
        dataset_id,
        md5: computed_md5,
        rows: row_count,
        columns: summaries,
        unchanged: false,
    })
}
