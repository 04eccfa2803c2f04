use crate::ingest::{DecodeError, UploadError};
use crate::response::error_json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} {id} not found")]
    NotFound { resource: String, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Multipart upload rejected or failed
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// JSON request body rejected
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Response payload could not be serialized
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Upload(upload_err) => match upload_err {
                UploadError::NotMultipart { .. } | UploadError::NoFile | UploadError::DisallowedType { .. } => StatusCode::BAD_REQUEST,
                UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                UploadError::IoFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Decode(decode_err) => match decode_err {
                DecodeError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                DecodeError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
                DecodeError::EmptyBody
                | DecodeError::MalformedSyntax { .. }
                | DecodeError::WrongFieldType { .. }
                | DecodeError::InvalidValue { .. }
                | DecodeError::UnknownField { .. }
                | DecodeError::MultipleValues => StatusCode::BAD_REQUEST,
            },
            Error::Serialize(_) | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} {id} not found"),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Upload(UploadError::IoFailure(_)) => "Failed to store uploaded file".to_string(),
            Error::Upload(upload_err) => upload_err.to_string(),
            Error::Decode(DecodeError::Io(_)) => "Failed to read request body".to_string(),
            Error::Decode(decode_err) => decode_err.to_string(),
            Error::Serialize(_) | Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log full error details for debugging - different log levels based on severity
        if status.is_server_error() {
            tracing::error!("Internal service error: {:#}", self);
        } else if status == StatusCode::PAYLOAD_TOO_LARGE {
            tracing::warn!("Payload rejected: {}", self);
        } else {
            tracing::debug!("Client error: {}", self);
        }

        error_json(self.user_message(), status)
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
