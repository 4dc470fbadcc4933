use crate::config::ApiConfig;
use crate::feed::load_feed;
use crate::message::SubmissionRecord;
use crate::message_store::MessageStore;
use crate::submission::{
    ImageUpload, SubmissionForm, SubmissionService, SubmitError, ValidationError, MAX_IMAGE_BYTES,
};
use anyhow::{Context, Result};
use bytes::BytesMut;
use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument};

const DISPLAY_HTML: &str = include_str!("../static/display.html");
const SUBMIT_HTML: &str = include_str!("../static/submit.html");

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub message_store: Arc<dyn MessageStore>,
    pub submissions: SubmissionService,
}

/// Successful submission response
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: SubmissionRecord,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: error.into() })).into_response()
}

impl IntoResponse for SubmitError {
    fn into_response(self) -> Response {
        let status = match self {
            SubmitError::Validation(_) => StatusCode::BAD_REQUEST,
            SubmitError::Upload(_) | SubmitError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error_response(status, self.to_string())
    }
}

/// Create the API router
pub fn create_router(state: AppState, config: &ApiConfig) -> Router {
    let cors = if config.cors_enabled {
        if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(display_page))
        .route("/submit", get(submit_page).post(submit))
        .route("/messages", get(list_messages))
        .route("/api/submit", post(submit))
        .route("/api/messages", get(list_messages))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn display_page() -> Html<&'static str> {
    Html(DISPLAY_HTML)
}

async fn submit_page() -> Html<&'static str> {
    Html(SUBMIT_HTML)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "wall-service"
    }))
}

/// Readiness check endpoint
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.message_store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "store": "connected"
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "not_ready",
                "store": "disconnected",
                "error": e.to_string()
            })),
        ),
    }
}

/// Full feed, oldest first, never cached
async fn list_messages(State(state): State<AppState>) -> impl IntoResponse {
    let feed = load_feed(state.message_store.as_ref()).await;

    (
        [
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-store, no-cache, must-revalidate, proxy-revalidate"),
            ),
            (header::PRAGMA, HeaderValue::from_static("no-cache")),
            (header::EXPIRES, HeaderValue::from_static("0")),
            (
                HeaderName::from_static("surrogate-control"),
                HeaderValue::from_static("no-store"),
            ),
        ],
        Json(feed),
    )
}

/// Accept one multipart submission
#[instrument(skip(state, multipart))]
async fn submit(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(e) => {
            error!(error = %e, "Submission is not a multipart form");
            let message = format!("Invalid form data: {}", e.body_text());
            return error_response(StatusCode::BAD_REQUEST, message);
        }
    };

    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(FormError::ImageTooLarge) => {
            return SubmitError::from(ValidationError::ImageTooLarge).into_response();
        }
        Err(FormError::Multipart(e)) => {
            error!(error = %e, "Malformed submission body");
            let message = format!("Invalid form data: {}", e.body_text());
            return error_response(StatusCode::BAD_REQUEST, message);
        }
    };

    match state.submissions.submit(form).await {
        Ok(record) => Json(SubmitResponse {
            success: true,
            message: record,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

enum FormError {
    Multipart(MultipartError),
    /// Image over the size rule, or a body cut short by the request limit
    ImageTooLarge,
}

impl From<MultipartError> for FormError {
    fn from(e: MultipartError) -> Self {
        // Only an image part can outgrow the body limit
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            FormError::ImageTooLarge
        } else {
            FormError::Multipart(e)
        }
    }
}

/// Collect the `name`, `message` and `image` parts; other parts are ignored
///
/// The image is read at most one byte past the size limit. An oversized image
/// ends the form there, so validation sees it without buffering the rest.
async fn read_form(mut multipart: Multipart) -> Result<SubmissionForm, FormError> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart.next_field().await? {
        let part = field.name().unwrap_or_default().to_string();
        match part.as_str() {
            "name" => form.name = Some(field.text().await?),
            "message" => form.message = Some(field.text().await?),
            "image" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let file_name = field.file_name().unwrap_or_default().to_string();
                let (bytes, complete) = read_capped(field, MAX_IMAGE_BYTES + 1).await?;
                form.image = Some(ImageUpload {
                    bytes: bytes.freeze(),
                    content_type,
                    file_name,
                });
                if !complete {
                    break;
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Read a part up to `cap` bytes; the flag is false when the part was longer
async fn read_capped(mut field: Field<'_>, cap: usize) -> Result<(BytesMut, bool), FormError> {
    let mut buf = BytesMut::new();

    while let Some(chunk) = field.chunk().await? {
        buf.extend_from_slice(&chunk);
        if buf.len() >= cap {
            buf.truncate(cap);
            return Ok((buf, false));
        }
    }

    Ok((buf, true))
}

/// Serve the API until `shutdown` resolves
pub async fn start_api_server(
    state: AppState,
    config: &ApiConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let router = create_router(state, config);
    let addr = format!("{}:{}", config.host, config.port);

    info!(address = %addr, "Starting wall API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server error")?;

    Ok(())
}
