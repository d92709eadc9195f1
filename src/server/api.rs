use super::AppState;
use crate::intake::IntakeResponse;
use crate::model::{AuditSubmission, AutomationId, AutomationInput};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct ApiError {
    success: bool,
    error: &'static str,
}

fn api_error(status: StatusCode, error: &'static str) -> Response {
    (
        status,
        Json(ApiError {
            success: false,
            error,
        }),
    )
        .into_response()
}

/// JSON first; anything that is not valid JSON is read as `application/x-www-form-urlencoded`.
/// Valid JSON that is not an object yields an empty submission.
pub fn parse_submission(body: &[u8]) -> AuditSubmission {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => AuditSubmission::from_json(&value).unwrap_or_default(),
        Err(_) => {
            let fields: BTreeMap<String, String> = url::form_urlencoded::parse(body)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            AuditSubmission::from_fields(&fields)
        }
    }
}

pub(super) async fn submit_audit(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let submission = parse_submission(&body);
    let worker = state.clone();
    let receipt = match tokio::task::spawn_blocking(move || worker.intake.submit(&submission)).await {
        Ok(receipt) => receipt,
        Err(e) => {
            tracing::error!(error = %e, "audit intake task failed");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Audit error");
        }
    };
    (StatusCode::OK, Json(IntakeResponse::from(&receipt))).into_response()
}

/// `GET /api/automation/` carries no id at all.
pub(super) async fn unknown_automation() -> Response {
    api_error(StatusCode::NOT_FOUND, "Unknown automation")
}

/// The id is everything after the prefix, so extra segments never match a known automation.
pub(super) async fn run_automation(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    Query(input): Query<AutomationInput>,
) -> Response {
    let id = match raw_id.trim().parse::<AutomationId>() {
        Ok(id) if state.registry.contains(id) => id,
        _ => return api_error(StatusCode::NOT_FOUND, "Unknown automation"),
    };
    if !state.config.toggles.is_enabled(id) {
        return api_error(StatusCode::FORBIDDEN, "Automation disabled");
    }

    let worker = state.clone();
    match tokio::task::spawn_blocking(move || worker.registry.invoke(id, &input)).await {
        Ok(Ok(invocation)) => (StatusCode::OK, Json(invocation.result)).into_response(),
        Ok(Err(e)) => {
            tracing::error!(automation = %id, error = %format!("{e:#}"), "automation crashed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Automation error")
        }
        Err(e) => {
            tracing::error!(automation = %id, error = %e, "automation task failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Automation error")
        }
    }
}
