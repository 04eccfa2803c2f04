//! JSON response envelope and writers.
//!
//! Every JSON body the service produces, success or failure, goes through
//! [`write_json`]. Errors use [`error_json`], which wraps the message in a
//! [`JsonResponse`] with `error` set.

use std::fmt::Display;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// The uniform wire shape for JSON responses.
///
/// Serializes as `{"error": .., "message": .., "data": ..}` in that order; `data` is
/// omitted when absent and is never set on failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonResponse {
    pub error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonResponse {
    pub fn success(message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            error: false,
            message: message.into(),
            data,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Serialize `payload` into a JSON response with the given status.
///
/// `headers` are applied before `Content-Type: application/json`, so they cannot change
/// the content type.
pub fn write_json<T: Serialize + ?Sized>(status: StatusCode, payload: &T, headers: Option<HeaderMap>) -> Result<Response, serde_json::Error> {
    let body = serde_json::to_vec(payload)?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    if let Some(headers) = headers {
        response.headers_mut().extend(headers);
    }
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(response)
}

/// Build an error envelope carrying `err`'s message.
pub fn error_json(err: impl Display, status: StatusCode) -> Response {
    let payload = JsonResponse::failure(err.to_string());

    match write_json(status, &payload, None) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Failed to serialize error envelope: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
