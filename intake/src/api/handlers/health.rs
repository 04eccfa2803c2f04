use axum::{http::StatusCode, response::Response};

use crate::errors::Result;
use crate::response::{JsonResponse, write_json};

pub async fn healthz() -> Result<Response> {
    Ok(write_json(StatusCode::OK, &JsonResponse::success("ok", None), None)?)
}
