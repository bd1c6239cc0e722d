//! Session-scoped, in-memory dataset store.
//!
//! There is deliberately no persistence layer: datasets live for the duration
//! of the server session and are discarded on restart, matching the
//! per-session lifecycle of the trigger check workflow (upload, verify, run,
//! export, reset).

use common::model::annotated::AnnotatedRow;
use common::model::row::Row;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One uploaded dataset together with its verification state and the latest
/// trigger check results.
pub struct Dataset {
    pub id: String,
    /// Display name supplied with the upload.
    pub name: String,
    /// MD5 of the uploaded bytes, used to short-circuit re-uploads of an
    /// unchanged file.
    pub md5: String,
    /// Column titles in header order. The matcher searches these; the
    /// exporter writes them back in the same order.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Set by a successful structural verification job. A trigger check can
    /// only run against a verified dataset.
    pub verified: bool,
    /// Busy flag: true while a trigger check job is in flight for this
    /// dataset. A second run is rejected until the first completes.
    pub check_running: bool,
    /// Annotated rows from the most recent trigger check. Re-running a check
    /// replaces the previous results.
    pub results: Option<Vec<AnnotatedRow>>,
}

/// Thread-safe container for all datasets of the current session, shared
/// across the Actix application as `web::Data`.
#[derive(Clone, Default)]
pub struct DatasetsState {
    pub datasets: Arc<RwLock<HashMap<String, Dataset>>>,
}
