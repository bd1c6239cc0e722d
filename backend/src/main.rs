mod job_controller;
mod services;
mod store;

use crate::job_controller::state::JobsState;
use crate::store::DatasetsState;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let host = "127.0.0.1";
    let port = 8080;

    // Initialize job controller state
    let (tx, rx) = mpsc::channel(100);
    let jobs_state = JobsState {
        jobs: Arc::new(RwLock::new(HashMap::new())),
        tx,
    };

    // Start job updater task
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });

    // In-memory dataset store, scoped to the server session.
    let datasets_state = DatasetsState::default();

    info!("Trigger check service running at http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(web::Data::new(jobs_state.clone()))
            .app_data(web::Data::new(datasets_state.clone()))
            .service(services::data_sources::csv::configure_routes())
            .service(services::checks::configure_routes())
    })
    .bind((host, port))?
    .run()
    .await
}
