use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::AppState;
use crate::errors::{Error, Result};
use crate::ingest::read_json;

/// JSON body extractor that enforces the configured size limit and unknown-field policy.
///
/// Unlike [`axum::Json`] it does not require a JSON content type, rejects trailing values
/// after the first document, and reports failures through [`Error::Decode`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictJson<T>(pub T);

impl<T> FromRequest<AppState> for StrictJson<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &AppState) -> Result<Self> {
        let spec = state.config.json.json_spec();
        let value = read_json(req.into_body(), &spec).await?;
        Ok(Self(value))
    }
}
