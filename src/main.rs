//! Diária Backend
//!
//! REST backend for the travel allowance request form: keeps the working
//! record and its history in SQLite, improves the activity report through a
//! text generation service and renders the signed-off PDF.

mod api;
mod config;
mod db;
mod document;
mod errors;
mod improve;
mod models;
mod store;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use improve::ReportImprover;
use store::FormStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FormStore>,
    pub improver: Arc<dyn ReportImprover>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Diária Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Report model: {}", config.gemini_model);

    // Initialize database and load the persisted form
    let pool = db::init_database(&config.db_path).await?;
    let storage = Arc::new(Repository::new(pool));
    let store = Arc::new(FormStore::open(storage).await?);

    let improver = improve::from_config(&config)?;

    // Create application state
    let state = AppState { store, improver };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([axum::http::header::CONTENT_DISPOSITION]);

    // API routes
    let api_routes = Router::new()
        // Working record
        .route(
            "/record",
            get(api::get_record)
                .put(api::replace_record)
                .delete(api::clear_record),
        )
        .route("/record/servant", put(api::update_servant))
        .route("/record/trip", put(api::update_trip))
        .route("/record/finance", put(api::update_finance))
        .route("/record/report", put(api::update_report))
        // Report improvement
        .route(
            "/report/improve",
            get(api::improvement_status).post(api::improve_report),
        )
        // Document
        .route("/document", post(api::generate_document))
        // History
        .route("/history", get(api::list_history))
        .route("/history/{index}", get(api::get_history_entry))
        .route("/history/{index}/load", post(api::load_history_entry));

    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
