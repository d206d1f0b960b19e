//! Persistence endpoint for personalized campus dining reports.
//!
//! Clients upload report data (a whole generated page, or the structured
//! `daily_stats` / `ach_state` payload), the server derives a stable short id
//! per student, merges user customizations forward from any stored record,
//! and serves the result at `/r/<id>` for one year.
//!
//!
//!
//! # General Infrastructure
//! - Single axum service in front of a Redis key-value store
//! - One record per report id, every write refreshes the 1 year expiry
//! - Report ids are derived from a salted hash of the client's student key,
//!   so re-uploads land on the same record; without a key or salt, ids are
//!   random and single-shot
//! - No Redis configured means an in-process store, enough for local runs
//!
//!
//!
//! # Trust Model
//! - Profile edits require the report's edit password
//! - Uploads and raw overwrites are unauthenticated, matching the
//!   fire-and-forget save flow of the report page itself
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderName, Method, header::CONTENT_TYPE},
    routing::{get, patch, post, put},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod identity;
pub mod merge;
pub mod models;
pub mod render;
pub mod routes;
pub mod state;

use routes::{index, not_found, overwrite_report, patch_profile, upload_report, view_report};
use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(routes::STUDENT_KEY_HEADER),
            HeaderName::from_static(routes::EDIT_PASSWORD_HEADER),
        ])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/reports", post(upload_report))
        .route("/api/reports/{id}", put(overwrite_report))
        .route("/api/reports/{id}/profile", patch(patch_profile))
        .route("/r/{id}", get(view_report))
        .route("/", get(index))
        .route("/index.html", get(index))
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");
    let app = app(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
