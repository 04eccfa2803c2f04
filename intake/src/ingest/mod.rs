//! Ingestion of untrusted request payloads.
//!
//! - [`upload`]: multipart file uploads, classified by content and streamed to disk
//! - [`json`]: strict, size-bounded JSON body decoding
//!
//! Both paths take their policy as a per-call spec and report failures as values. They
//! never log failures or build HTTP responses; see [`crate::errors`] for that.

pub mod dir;
pub mod json;
pub mod sniff;
pub mod upload;

pub use dir::ensure_dir;
pub use json::{DecodeError, JsonIngestSpec, decode_json, read_json};
pub use sniff::classify;
pub use upload::{UploadError, UploadSpec, UploadedFile, upload_files, upload_one_file};
