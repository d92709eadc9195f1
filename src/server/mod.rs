//! HTTP front end.
//!
//! Routes the audit API and automation runs, and serves `public/` with an
//! `index.html` fallback for everything else.

mod api;
mod static_files;

use crate::automations::Registry;
use crate::config::AppConfig;
use crate::intake::AuditIntake;
use crate::ledger::Ledger;
use anyhow::{Context, Result};
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct AppState {
    pub config: AppConfig,
    pub intake: AuditIntake,
    pub registry: Registry,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let intake = AuditIntake::new(Ledger::audit(config.paths.audit_ledger()));
        let registry = Registry::from_config(&config);
        Self {
            config,
            intake,
            registry,
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/audit",
            post(api::submit_audit).get(static_files::serve_static),
        )
        .route("/api/automation/", get(api::unknown_automation))
        .route("/api/automation/*id", get(api::run_automation))
        .fallback(static_files::serve_static)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = std::time::Instant::now();
    let res = next.run(req).await;
    tracing::info!(
        %method,
        path = %path,
        status = res.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    res
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: AppConfig) -> Result<()> {
    std::fs::create_dir_all(&config.paths.data_dir)
        .with_context(|| format!("failed to create {}", config.paths.data_dir.display()))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(
        %addr,
        public = %config.paths.public_dir.display(),
        client = config.client_name(),
        "nexora server listening on http://localhost:{}",
        config.port
    );

    let app = build_router(Arc::new(AppState::new(config)));
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")
}
