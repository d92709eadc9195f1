use super::AppState;
use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const ENTRY_DOCUMENT: &str = "index.html";
const HTML: &str = "text/html; charset=utf-8";

pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html") => HTML,
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        _ => "text/plain; charset=utf-8",
    }
}

/// Map a request path onto the public root. `None` for paths that try to leave it.
fn resolve(public_dir: &Path, request_path: &str) -> Option<PathBuf> {
    let mut out = public_dir.to_path_buf();
    let mut any = false;
    for seg in request_path.split('/').filter(|s| !s.is_empty()) {
        if seg == "." || seg == ".." || seg.contains('\\') {
            return None;
        }
        out.push(seg);
        any = true;
    }
    if !any {
        out.push(ENTRY_DOCUMENT);
    }
    Some(out)
}

fn file_response(content_type: &'static str, data: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        Bytes::from(data),
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain")],
        "Not found",
    )
        .into_response()
}

/// Serve a file from `public/`, falling back to the entry document for anything missing.
pub(super) async fn serve_static(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return not_found();
    }
    let public_dir = &state.config.paths.public_dir;

    if let Some(path) = resolve(public_dir, uri.path()) {
        if let Ok(data) = tokio::fs::read(&path).await {
            return file_response(content_type_for(&path), data);
        }
    }

    match tokio::fs::read(public_dir.join(ENTRY_DOCUMENT)).await {
        Ok(data) => file_response(HTML, data),
        Err(_) => not_found(),
    }
}
