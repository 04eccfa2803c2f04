//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//! - **[`extract`]**: Extractors that apply the configured ingestion policy
//!
//! # API Structure
//!
//! - `POST /api/v1/uploads`: store every file part of a multipart body
//! - `POST /api/v1/uploads/single`: store the first file part only
//! - `POST /api/v1/echo`: strictly decode a JSON body and send it back
//! - `GET /api/v1/downloads/{file}`: download a file as an attachment
//! - `GET /healthz`: liveness
//!
//! Every JSON body, success or failure, uses the [`crate::response::JsonResponse`] envelope.

pub mod extract;
pub mod handlers;
pub mod models;
