//! Strict JSON body decoding.
//!
//! A body is accepted only if it is at most `max_body_size` bytes, holds exactly one JSON
//! value, and that value fits the target type without coercion. Unless the policy allows
//! them, object keys the target type has no field for are rejected too.
//!
//! Decoding runs in two passes over the buffered body. The first checks the syntax of the
//! leading value without building anything, so a malformed value is always reported as
//! malformed even when an earlier field also has the wrong type. The second builds the
//! target, tracking the field path for type errors and any keys the target ignored. Only
//! once the first value has decoded cleanly is the rest of the body checked for a second
//! value, so problems inside the first value are reported ahead of trailing data.

use std::io;
use std::pin::pin;

use axum::body::Body;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use thiserror::Error;

/// Default ceiling for JSON bodies (1 MiB).
pub const DEFAULT_MAX_BODY_SIZE: u64 = 1024 * 1024;

/// Per-call JSON decoding policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonIngestSpec {
    /// Bodies longer than this are rejected without being decoded
    pub max_body_size: u64,
    /// Accept object keys that have no matching field in the target type
    pub allow_unknown_fields: bool,
}

impl Default for JsonIngestSpec {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            allow_unknown_fields: false,
        }
    }
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("body must not be empty")]
    EmptyBody,

    /// Not valid JSON; `offset` is the zero-based byte position where parsing failed
    #[error("body contains badly-formed JSON (at byte {offset})")]
    MalformedSyntax { offset: usize },

    /// Valid JSON, but a value has the wrong type for the target. `None` is the top level.
    #[error("body contains incorrect JSON type{}", describe_field(.field))]
    WrongFieldType { field: Option<String> },

    /// Valid JSON of the right types that the target still refuses, e.g. a missing
    /// required field or an unknown enum variant
    #[error("body contains an invalid value{}: {detail}", describe_field(.field))]
    InvalidValue { field: Option<String>, detail: String },

    #[error("body contains unknown key \"{key}\"")]
    UnknownField { key: String },

    #[error("body must only contain a single JSON value")]
    MultipleValues,

    #[error("body must not be larger than {limit} bytes")]
    TooLarge { limit: u64 },

    /// The body could not be read from the transport
    #[error("failed to read body: {0}")]
    Io(#[source] io::Error),
}

fn describe_field(field: &Option<String>) -> String {
    match field {
        Some(field) => format!(" for field \"{field}\""),
        None => String::new(),
    }
}

/// Read an HTTP body under the size limit in `spec` and decode it into `T`.
pub async fn read_json<T: DeserializeOwned>(body: Body, spec: &JsonIngestSpec) -> Result<T, DecodeError> {
    let bytes = read_limited(body.into_data_stream(), spec.max_body_size).await?;
    decode_json(&bytes, spec)
}

/// Collect a byte stream, failing as soon as more than `limit` bytes have arrived.
pub async fn read_limited<S, E>(stream: S, limit: u64) -> Result<Vec<u8>, DecodeError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let mut stream = pin!(stream);
    let mut buffer = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DecodeError::Io(io::Error::other(e)))?;

        if (buffer.len() + chunk.len()) as u64 > limit {
            return Err(DecodeError::TooLarge { limit });
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer)
}

/// Decode an already-buffered body into `T`.
///
/// On failure nothing is returned; there is no partially populated `T`.
pub fn decode_json<T: DeserializeOwned>(input: &[u8], spec: &JsonIngestSpec) -> Result<T, DecodeError> {
    if input.len() as u64 > spec.max_body_size {
        return Err(DecodeError::TooLarge { limit: spec.max_body_size });
    }

    if input.iter().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r')) {
        return Err(DecodeError::EmptyBody);
    }

    let mut de = serde_json::Deserializer::from_slice(input);
    IgnoredAny::deserialize(&mut de).map_err(|e| parse_error(input, e))?;

    let mut unknown: Option<String> = None;
    let mut record_unknown = |path: serde_ignored::Path<'_>| {
        if unknown.is_none() {
            unknown = Some(path.to_string());
        }
    };

    let mut de = serde_json::Deserializer::from_slice(input);
    let result: Result<T, _> = if spec.allow_unknown_fields {
        serde_path_to_error::deserialize(&mut de)
    } else {
        serde_path_to_error::deserialize(serde_ignored::Deserializer::new(&mut de, &mut record_unknown))
    };

    // Decoding stops at the first error, so a recorded key always precedes it in the body
    if let Some(key) = unknown {
        return Err(DecodeError::UnknownField { key });
    }

    let value = result.map_err(|e| typed_error(input, e))?;
    de.end().map_err(|_| DecodeError::MultipleValues)?;

    Ok(value)
}

/// Sort a data error from the typed pass into the taxonomy.
///
/// serde_json does not expose the kind of a data error, only its message, so the split follows
/// serde's standard wording: `invalid type: ..` and out-of-range integers (`invalid value:
/// integer ..`, e.g. `300` for a `u8`) are [`DecodeError::WrongFieldType`]; anything else the
/// target rejects (missing fields, unknown variants, custom validation) is
/// [`DecodeError::InvalidValue`] carrying the message.
fn typed_error(input: &[u8], err: serde_path_to_error::Error<serde_json::Error>) -> DecodeError {
    let path = err.path().to_string();
    let field = (path != ".").then_some(path);
    let inner = err.into_inner();

    if inner.classify() != Category::Data {
        return parse_error(input, inner);
    }

    let message = inner.to_string();
    let detail = message.rsplit_once(" at line ").map_or(message.as_str(), |(detail, _)| detail);

    if detail.starts_with("invalid type:") || detail.starts_with("invalid value: integer") {
        DecodeError::WrongFieldType { field }
    } else {
        DecodeError::InvalidValue {
            field,
            detail: detail.to_string(),
        }
    }
}

fn parse_error(input: &[u8], err: serde_json::Error) -> DecodeError {
    match err.classify() {
        Category::Io => DecodeError::Io(io::Error::other(err)),
        Category::Syntax | Category::Eof | Category::Data => DecodeError::MalformedSyntax {
            offset: byte_offset(input, err.line(), err.column()),
        },
    }
}

/// Convert serde_json's one-based line/column into a zero-based byte offset.
fn byte_offset(input: &[u8], line: usize, column: usize) -> usize {
    let line_start = if line <= 1 {
        0
    } else {
        input
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == b'\n')
            .nth(line - 2)
            .map_or(input.len(), |(i, _)| i + 1)
    };

    (line_start + column.saturating_sub(1)).min(input.len())
}
