use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;
use std::sync::Arc;

mod api;
mod auth;
mod config;
mod docs;
mod events;
mod model;
mod models;
mod routes;
mod store;
mod utils;

use config::Config;
use events::EventBus;
use store::RecordStore;
use store::repos::Repos;

use crate::utils::identifier_cache;
use crate::utils::identifier_filter;
use tracing::info;
use tracing_appender::rolling;
use utoipa_swagger_ui::SwaggerUi;
use crate::docs::ApiDoc;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()

#[get("/")]
async fn index() -> impl Responder {
    "Attendance Management API"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let bus = EventBus::new();
    let store = RecordStore::open(&config.data_dir, bus.clone()).expect("Failed to open record store");
    let repos = Repos::new(Arc::new(store));

    // Follow collection changes in the log.
    let mut change_rx = bus.subscribe();
    actix_web::rt::spawn(async move {
        loop {
            match change_rx.recv().await {
                Ok(event) => tracing::debug!(kind = %event.kind, "collection updated"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let repos_for_filter_warmup = repos.clone();
    let repos_for_cache_warmup = repos.clone();
    // Clone values for the closure (avoid move issues)
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    actix_web::rt::spawn(async move {
        if let Err(e) = identifier_filter::warmup_identifier_filter(&repos_for_filter_warmup, 100) {
            eprintln!("Failed to warmup identifier filter: {:?}", e);
        }
    });

    actix_web::rt::spawn(async move {
        // Warm up taken identifiers in batches of 250
        if let Err(e) = identifier_cache::warmup_identifier_cache(&repos_for_cache_warmup, 250).await
        {
            eprintln!("Failed to warmup identifier cache: {:?}", e);
        }
    });

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(repos.clone()))
            .app_data(Data::new(config.clone()))
            .service(index)
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
