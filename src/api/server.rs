//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

use crate::catalog::{Catalog, CatalogError};
use crate::config::Config;

use super::handlers;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub config: Arc<Config>,
}

/// Configure and start the HTTP server
pub async fn start_http_server(catalog: Catalog, config: Arc<Config>) -> Result<()> {
    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let app = build_router(AppState { catalog, config });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🌐 API server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // Allow browser access from the separately-hosted player
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // Health check endpoints (both paths for compatibility)
        .route("/health", get(health_handler))
        .route("/api/health", get(health_handler))
        // Catalog endpoints
        .route("/api/subjects", get(list_subjects_handler))
        .route("/api/subjects/:subject_id/chapters", get(list_chapters_handler))
        .route("/api/subjects/:subject_id/duration", get(subject_duration_handler))
        .route("/api/chapters/:chapter_id/lectures", get(list_lectures_handler))
        .route("/api/chapters/:chapter_id/duration", get(chapter_duration_handler))
        .route("/api/lectures/:lecture_id/toggle-watched", put(toggle_watched_handler))
        // Raw video bytes; ServeDir percent-decodes the request path
        .nest_service("/lectures", ServeDir::new(&state.config.library.root_dir))
        // Landing page
        .route("/", get(index_handler))
        // Add state and middleware
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Map catalog failures to an HTTP status plus error payload
fn error_response(e: CatalogError) -> Response {
    let status = match e {
        CatalogError::LectureNotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({"error": e.to_string()}))).into_response()
}

/// Health check handler
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(handlers::health_check().await)).into_response()
}

/// List subjects handler
async fn list_subjects_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl IntoResponse {
    match handlers::list_subjects(&state.catalog).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(e),
    }
}

/// List chapters handler
async fn list_chapters_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
    axum::extract::Path(subject_id): axum::extract::Path<i64>,
) -> impl IntoResponse {
    match handlers::list_chapters(&state.catalog, subject_id).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(e),
    }
}

/// List lectures handler
async fn list_lectures_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
    axum::extract::Path(chapter_id): axum::extract::Path<i64>,
) -> impl IntoResponse {
    match handlers::list_lectures(&state.catalog, chapter_id).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Toggle watched handler
async fn toggle_watched_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
    axum::extract::Path(lecture_id): axum::extract::Path<i64>,
) -> impl IntoResponse {
    match handlers::toggle_watched(&state.catalog, lecture_id).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Chapter duration handler
async fn chapter_duration_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
    axum::extract::Path(chapter_id): axum::extract::Path<i64>,
) -> impl IntoResponse {
    match handlers::chapter_duration(&state.catalog, chapter_id).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Subject duration handler
async fn subject_duration_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
    axum::extract::Path(subject_id): axum::extract::Path<i64>,
) -> impl IntoResponse {
    match handlers::subject_duration(&state.catalog, subject_id).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Serve a minimal landing page listing the endpoints
async fn index_handler() -> impl IntoResponse {
    let html = r#"<!DOCTYPE html>
<html>
<head>
    <title>Lecture Catalog API</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 40px; }
        .endpoint { background: #f5f5f5; padding: 10px; margin: 10px 0; }
    </style>
</head>
<body>
    <h1>Lecture Catalog API</h1>
    <p>The server is running. Available endpoints:</p>

    <div class="endpoint"><strong>GET /health</strong> - Health check</div>
    <div class="endpoint"><strong>GET /api/subjects</strong> - List subjects</div>
    <div class="endpoint"><strong>GET /api/subjects/:id/chapters</strong> - Chapters of a subject</div>
    <div class="endpoint"><strong>GET /api/subjects/:id/duration</strong> - Subject watched/total seconds</div>
    <div class="endpoint"><strong>GET /api/chapters/:id/lectures</strong> - Lectures of a chapter</div>
    <div class="endpoint"><strong>GET /api/chapters/:id/duration</strong> - Chapter watched/total seconds</div>
    <div class="endpoint"><strong>PUT /api/lectures/:id/toggle-watched</strong> - Flip a watched flag</div>
    <div class="endpoint"><strong>GET /lectures/...</strong> - Raw video bytes</div>
</body>
</html>
"#;
    (StatusCode::OK, [("content-type", "text/html")], html).into_response()
}
