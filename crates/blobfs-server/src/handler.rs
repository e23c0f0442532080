//! Request handlers. Each one maps a route onto a single storage call.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use blobfs_protocol::{HealthResponse, SetResponse};
use blobfs_store::BlobStorage;
use blobfs_types::{BlobError, ContentType, MimePolicy};
use tokio_util::io::ReaderStream;

use crate::error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn BlobStorage>,
    pub mime_policy: MimePolicy,
}

impl AppState {
    pub fn new(storage: Arc<dyn BlobStorage>, mime_policy: MimePolicy) -> Self {
        Self { storage, mime_policy }
    }
}

/// Validate the `Content-Type` header and body of an Add or Set request.
fn upload_type(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<ContentType, ApiError> {
    let mime = headers
        .get(header::CONTENT_TYPE)
        .ok_or_else(|| BlobError::BadRequest("missing Content-Type header".into()))?
        .to_str()
        .map_err(|_| BlobError::BadRequest("Content-Type header is not ASCII".into()))?;
    let content_type = state.mime_policy.resolve(mime)?;
    if body.is_empty() {
        return Err(BlobError::BadRequest("request body is empty".into()).into());
    }
    Ok(content_type)
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

pub async fn add_blob(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let content_type = upload_type(&state, &headers, &body)?;
    state.storage.add(content_type, &path, body).await?;
    Ok(StatusCode::CREATED)
}

pub async fn set_blob(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SetResponse>, ApiError> {
    let content_type = upload_type(&state, &headers, &body)?;
    let written = state.storage.set(content_type, &path, body).await?;
    Ok(Json(SetResponse { written }))
}

/// Stream a blob back with its stored MIME type.
pub async fn get_blob(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let blob = state.storage.get(&path).await?;
    let body = Body::from_stream(ReaderStream::new(blob.reader));
    Ok(([(header::CONTENT_TYPE, blob.content_type.mime())], body).into_response())
}

pub async fn del_blob(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.storage.del(&path).await?;
    Ok(StatusCode::OK)
}

pub async fn make_bucket(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.storage.mkdir(&path).await?;
    Ok(StatusCode::CREATED)
}

/// List a bucket as `[[mime, name], ...]`, or 204 when it is empty.
pub async fn list_bucket(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let listing = state.storage.lsdir(&path).await?;
    if listing.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(listing).into_response())
}

pub async fn remove_bucket(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.storage.rmdir(&path).await?;
    Ok(StatusCode::OK)
}
