//! HTTP transport for the inbox workflow.
//!
//! Routes:
//! - `POST /inbox` — create an entry (`201`, `400` on blank message)
//! - `GET /inbox` — list entries, newest first
//! - `PATCH /inbox/{id}` — set status (`400` on unknown status, `404` on unknown id)
//! - `DELETE /inbox/{id}` — remove an entry (always `200`, idempotent)
//! - `GET /health` — liveness probe
//!
//! Every client error, including malformed bodies and ids, is a `400` or
//! `404` with an `{"error": "<message>"}` body.

use std::net::SocketAddr;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::models::alert::lenient_priority;
use crate::models::inbox::InboxEntry;
use crate::workflow::InboxWorkflow;
use crate::{AppError, Result};

/// Handler for `GET /health` — returns 200 OK with a plain-text body.
async fn health() -> &'static str {
    "ok"
}

/// Request body for `POST /inbox`.
#[derive(Debug, Deserialize)]
struct CreateRequest {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, deserialize_with = "lenient_priority")]
    priority: Option<String>,
}

/// Request body for `PATCH /inbox/{id}`.
#[derive(Debug, Deserialize)]
struct StatusRequest {
    #[serde(default)]
    status: Option<String>,
}

/// Maps domain errors onto HTTP status codes with a JSON body.
struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(AppError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if !self.0.is_client_error() {
            error!(err = %self.0, "inbox request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Extractor results; rejections surface as `400` validation errors.
type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;
type EntryId = std::result::Result<Path<i64>, PathRejection>;

async fn list_entries(
    State(workflow): State<InboxWorkflow>,
) -> ApiResult<Json<Vec<InboxEntry>>> {
    Ok(Json(workflow.list().await?))
}

async fn create_entry(
    State(workflow): State<InboxWorkflow>,
    body: JsonBody<CreateRequest>,
) -> ApiResult<(StatusCode, Json<InboxEntry>)> {
    let Json(body) = body?;
    let entry = workflow
        .create(body.message.as_deref().unwrap_or_default(), body.priority.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_status(
    State(workflow): State<InboxWorkflow>,
    id: EntryId,
    body: JsonBody<StatusRequest>,
) -> ApiResult<Json<InboxEntry>> {
    let (Path(id), Json(body)) = (id?, body?);
    let status = body
        .status
        .ok_or_else(|| AppError::Validation("status is required".into()))?;
    Ok(Json(workflow.set_status(id, &status).await?))
}

async fn remove_entry(
    State(workflow): State<InboxWorkflow>,
    id: EntryId,
) -> ApiResult<Json<serde_json::Value>> {
    let Path(id) = id?;
    let removed = workflow.remove(id).await?;
    Ok(Json(json!({ "success": removed })))
}

/// Build the inbox router.
#[must_use]
pub fn router(workflow: InboxWorkflow) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/inbox", get(list_entries).post(create_entry))
        .route("/inbox/{id}", patch(update_status).delete(remove_entry))
        .with_state(workflow)
}

/// Bind the HTTP listener on `127.0.0.1:port`.
///
/// # Errors
///
/// Returns `AppError::Http` if the port cannot be bound.
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::Http(format!("failed to bind {addr}: {err}")))
}

/// Serve the inbox API on `listener` until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Http` if the server fails.
pub async fn serve(
    listener: TcpListener,
    workflow: InboxWorkflow,
    ct: CancellationToken,
) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "inbox http server listening");
    }

    axum::serve(listener, router(workflow))
        .with_graceful_shutdown(ct.cancelled_owned())
        .await
        .map_err(|err| AppError::Http(format!("server error: {err}")))?;

    info!("inbox http server stopped");
    Ok(())
}
