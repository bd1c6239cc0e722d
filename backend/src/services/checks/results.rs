use crate::store::DatasetsState;
use actix_web::{web, Responder};

/// Actix web handler for `GET /api/checks/results/{dataset_id}`.
///
/// Returns the annotated rows of the most recent check as JSON, `404` if the
/// dataset is unknown or no check has been run against it yet.
pub(crate) async fn process(
    dataset_id: web::Path<String>,
    state: web::Data<DatasetsState>,
) -> impl Responder {
    let datasets = state.datasets.read().await;
    match datasets.get(&dataset_id.into_inner()) {
        Some(dataset) => match &dataset.results {
            Some(results) => actix_web::HttpResponse::Ok().json(results),
            None => actix_web::HttpResponse::NotFound()
                .body("No check has been run for this dataset"),
        },
        None => actix_web::HttpResponse::NotFound().body("Dataset not found"),
    }
}
