use axum::{
    extract::{Path, Query, State},
    response::Response,
};

use crate::AppState;
use crate::api::models::downloads::DownloadQuery;
use crate::download::download_file;
use crate::errors::Result;

pub async fn download(State(state): State<AppState>, Path(file): Path<String>, Query(query): Query<DownloadQuery>) -> Result<Response> {
    let display_name = query.name.as_deref().unwrap_or(&file);
    download_file(&state.config.downloads.dir, &file, display_name).await
}
