//! Pushing JSON payloads to remote endpoints.

use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum PushError {
    #[error("invalid remote URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// POST `payload` as JSON to `url` using `client`.
///
/// Any HTTP status counts as success; callers inspect the returned status themselves.
pub async fn push_json<T: Serialize + ?Sized>(
    client: &reqwest::Client,
    url: &str,
    payload: &T,
) -> Result<(reqwest::Response, StatusCode), PushError> {
    let target = Url::parse(url).map_err(|source| PushError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    let body = serde_json::to_vec(payload)?;

    let response = client
        .post(target)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .map_err(|source| PushError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    Ok((response, status))
}
