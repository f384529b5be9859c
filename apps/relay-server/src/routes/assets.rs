//! Static responder for the bundled browser client.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::AppState;

const HTML: &str = "text/html; charset=utf-8";
const JAVASCRIPT: &str = "application/javascript; charset=utf-8";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index_html))
        .route("/index.html", get(index_html))
        .route("/index.js", get(index_js))
        .fallback(not_found)
}

async fn index_html(State(state): State<AppState>) -> Response {
    serve_file(&state, "index.html", HTML).await
}

async fn index_js(State(state): State<AppState>) -> Response {
    serve_file(&state, "index.js", JAVASCRIPT).await
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

async fn serve_file(state: &AppState, name: &str, content_type: &'static str) -> Response {
    let path = state.config.client_dir.join(name);
    match tokio::fs::read(&path).await {
        Ok(body) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "client asset unavailable");
            (StatusCode::NOT_FOUND, "File not found").into_response()
        }
    }
}
