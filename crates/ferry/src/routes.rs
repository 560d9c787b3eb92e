use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use ferry_fetch::{DownloadService, Error, HttpClient, JobId, ProgressReport, StartRequest, StoredFile};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

type Shared<C> = Arc<DownloadService<C>>;

pub fn router<C: HttpClient>(service: Shared<C>) -> Router {
    Router::new()
        .route("/download", post(start::<C>))
        .route("/download-progress/{id}", get(progress::<C>))
        .route("/cancel-download/{id}", get(cancel::<C>))
        .route("/download-file/{name}", get(download_file::<C>))
        .route("/download-slow/{name}", get(download_slow::<C>))
        .route("/delete-file/{name}", get(delete_file::<C>))
        .with_state(service)
}

/// Failure of a request, rendered as `{"error": ...}`.
enum ApiError {
    Service(Error),
    /// Path segment that is not a job id, so it cannot name a live job.
    MalformedId(String),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self { Self::Service(e) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let service_error = match self {
            Self::Service(e) => e,
            Self::MalformedId(raw) => {
                let message = format!("no live download with id {raw}");
                return (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response();
            }
        };

        let (status, message) = match service_error {
            Error::Validation(message) => (StatusCode::BAD_REQUEST, message),
            e @ (Error::NotFound(_) | Error::FileNotFound(_)) => (StatusCode::NOT_FOUND, e.to_string()),
            e => {
                error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Started {
    message:         &'static str,
    final_file_name: String,
    id:              JobId,
}

async fn start<C: HttpClient>(
    State(service): State<Shared<C>>,
    body: Result<Json<StartRequest>, JsonRejection>,
) -> ApiResult<Json<Started>> {
    let Json(request) = body.map_err(|e| Error::Validation(e.body_text()))?;
    let started = service.start(request)?;

    Ok(Json(Started {
        message:         "Download started",
        final_file_name: started.file_name,
        id:              started.id,
    }))
}

async fn progress<C: HttpClient>(
    State(service): State<Shared<C>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProgressReport>> {
    Ok(Json(service.progress(job_id(&id)?)?))
}

async fn cancel<C: HttpClient>(State(service): State<Shared<C>>, Path(id): Path<String>) -> ApiResult<Response> {
    service.cancel(job_id(&id)?)?;
    Ok(Json(json!({ "message": "Download canceled" })).into_response())
}

async fn download_file<C: HttpClient>(State(service): State<Shared<C>>, Path(name): Path<String>) -> ApiResult<Response> {
    Ok(attachment(service.open_stored(&name).await?))
}

#[derive(Debug, Deserialize)]
struct SlowParams {
    rate: Option<u64>,
}

async fn download_slow<C: HttpClient>(
    State(service): State<Shared<C>>,
    Path(name): Path<String>,
    Query(params): Query<SlowParams>,
) -> ApiResult<Response> {
    Ok(attachment(service.open_stored_throttled(&name, params.rate).await?))
}

async fn delete_file<C: HttpClient>(State(service): State<Shared<C>>, Path(name): Path<String>) -> Json<serde_json::Value> {
    let removal = service.delete_stored(&name).await;
    Json(json!({ "removed": removal.removed }))
}

fn job_id(raw: &str) -> ApiResult<JobId> { raw.parse().map_err(|_| ApiError::MalformedId(raw.to_string())) }

fn attachment(file: StoredFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.file_name.replace('"', "\\\""));

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/octet-stream")
        .header(CONTENT_LENGTH, file.len)
        .header(CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(file.body))
        .unwrap_or_else(|e| {
            error!(error = %e, "failed to build file response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}
