//! HTTP request handlers for all API endpoints.
//!
//! Handlers translate between HTTP and the ingestion layer: they pick the policy from
//! configuration, call into [`crate::ingest`] or a collaborator, and wrap the result in the
//! response envelope. Failures are returned as [`crate::errors::Error`], which renders and logs
//! itself.
//!
//! - [`uploads`]: multipart file uploads
//! - [`echo`]: strict JSON decoding round trip
//! - [`downloads`]: attachment downloads
//! - [`health`]: liveness

pub mod downloads;
pub mod echo;
pub mod health;
pub mod uploads;
