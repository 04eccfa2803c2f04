use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::Response,
};
use tracing::instrument;

use crate::AppState;
use crate::errors::Result;
use crate::ingest;
use crate::response::{JsonResponse, write_json};

/// Store every file part of a multipart body.
#[instrument(skip_all)]
pub async fn upload_files(State(state): State<AppState>, request: Request) -> Result<Response> {
    let uploads = &state.config.uploads;
    let files = ingest::upload_files(request, &uploads.dir, &uploads.upload_spec(), true).await?;

    let message = format!("{} file(s) uploaded", files.len());
    let payload = JsonResponse::success(message, Some(serde_json::to_value(&files)?));
    Ok(write_json(StatusCode::CREATED, &payload, None)?)
}

/// Store the first file part of a multipart body; later parts are never read.
#[instrument(skip_all)]
pub async fn upload_one_file(State(state): State<AppState>, request: Request) -> Result<Response> {
    let uploads = &state.config.uploads;
    let file = ingest::upload_one_file(request, &uploads.dir, &uploads.upload_spec()).await?;

    let payload = JsonResponse::success("file uploaded", Some(serde_json::to_value(&file)?));
    Ok(write_json(StatusCode::CREATED, &payload, None)?)
}
