mod auth;
mod client;
mod config;
mod context;
mod dashboard;
mod error;
mod export;
mod metrics;
mod models;
mod reconcile;
mod rollup;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::auth::SessionStore;
use crate::client::{BackendClient, StaticToken};
use crate::config::{Command, Config};
use crate::state::AppState;

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    if state.backend.ping().await {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("admisiones=info,tower_http=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_json);

    let backend = BackendClient::new(
        &config.api_url,
        Duration::from_secs(config.request_timeout),
    )?;

    match config.resolved_command() {
        Command::Serve { listen_addr } => {
            let sessions = SessionStore::with_idle_timeout(chrono::Duration::minutes(
                config.session_idle_minutes,
            ));
            serve(backend, sessions, &listen_addr).await
        }
        Command::Snapshot { nivel, token } => {
            let fetcher = backend.with_credentials(Arc::new(StaticToken::new(token)));
            let overview = dashboard::load_overview(&fetcher, nivel).await?;
            for err in &overview.errors {
                tracing::warn!("{} unavailable: {}", err.section, err.message);
            }
            println!("{}", serde_json::to_string_pretty(&overview)?);
            Ok(())
        }
    }
}

async fn serve(
    backend: BackendClient,
    sessions: SessionStore,
    listen_addr: &str,
) -> anyhow::Result<()> {
    tracing::info!("Using analytics backend at {}", backend.base_url());
    let state = AppState::new(backend, sessions);

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .with_state(state.clone())
        .merge(routes::ui::router(state.clone()))
        .merge(routes::api::router(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!("Listening on {listen_addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
