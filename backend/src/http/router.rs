/// Route table for one HTTP replica
use axum::http::{StatusCode, Uri};
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::http::state::WikiState;
use crate::infrastructure::rendering::escape_html;

/// Builds the wiki router over the given state
pub fn wiki_router(state: WikiState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/wiki/:page", get(handlers::page))
        .route("/save", post(handlers::save))
        .route("/create", post(handlers::create))
        .route("/delete", post(handlers::delete))
        .route("/api/pages", get(handlers::export_pages))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Html<String>) {
    (
        StatusCode::NOT_FOUND,
        Html(format!(
            "<!DOCTYPE html>\n<html>\n<body>\n<h1>404</h1>\n<p>No such route: {}</p>\n<p><a href=\"/\">Home</a></p>\n</body>\n</html>\n",
            escape_html(uri.path())
        )),
    )
}
