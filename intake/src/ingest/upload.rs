//! Multipart upload validation and persistence.
//!
//! Each file part is classified from its own bytes, checked against the caller's
//! allow-list, and streamed to disk under either its original name or a random one.
//! Parts are first written to hidden temporary files in the target directory and only
//! renamed to their stored names once every part of the call has been accepted, so a
//! rejected call leaves the directory as it found it, existing files included. A
//! filesystem failure while moving the accepted files into place can leave the ones
//! already moved.

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use axum::extract::Request;
use axum::http::header::CONTENT_TYPE;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use multer::{Field, Multipart};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::ingest::dir::ensure_dir;
use crate::ingest::sniff::{Replayed, sniff_stream};
use crate::random::random_string;

/// Length of generated file names, not counting the extension.
pub const RANDOM_NAME_LEN: usize = 32;

/// How many random names to try before giving up on finding a free one.
const MAX_NAME_ATTEMPTS: usize = 5;

/// Suffix of the hidden files parts are written to before they are moved into place.
const STAGING_SUFFIX: &str = ".part";

/// Per-call upload policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSpec {
    /// MIME types accepted after sniffing. Empty accepts anything.
    pub allowed_types: Vec<String>,
    /// Maximum bytes per file. `u64::MAX` means unbounded.
    pub max_upload_size: u64,
    /// Store files under a random name (keeping the extension) instead of the client's.
    pub rename_on_conflict: bool,
}

impl Default for UploadSpec {
    fn default() -> Self {
        Self {
            allowed_types: Vec::new(),
            max_upload_size: u64::MAX,
            rename_on_conflict: true,
        }
    }
}

impl UploadSpec {
    /// Whether content classified as `mime` may be stored.
    pub fn allows(&self, mime: &str) -> bool {
        self.allowed_types.is_empty() || self.allowed_types.iter().any(|allowed| allowed.trim().eq_ignore_ascii_case(mime))
    }
}

/// A file part that was stored successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// File name exactly as the client sent it
    pub original_name: String,
    /// Name of the file inside the target directory
    pub new_name: String,
    pub size_bytes: u64,
}

#[derive(Error, Debug)]
pub enum UploadError {
    /// The body could not be parsed as `multipart/form-data`
    #[error("request is not a valid multipart form: {reason}")]
    NotMultipart { reason: String },

    /// The form contained no file parts
    #[error("no file was uploaded")]
    NoFile,

    /// Sniffed content type is not on the allow-list
    #[error("the uploaded file type {actual} is not permitted (allowed: {})", .allowed.join(", "))]
    DisallowedType { actual: String, allowed: Vec<String> },

    /// A single file exceeded the configured size limit
    #[error("the uploaded file is too big (limit is {limit} bytes)")]
    TooLarge { limit: u64 },

    /// Reading the body or writing to disk failed
    #[error("failed to store uploaded file: {0}")]
    IoFailure(#[source] io::Error),
}

/// Store every file part of a multipart request in `target_dir`.
///
/// With `multiple` unset only the first file part is read; the rest of the body is left
/// unconsumed. Files are returned in the order their parts appeared.
pub async fn upload_files(
    request: Request,
    target_dir: impl AsRef<Path>,
    spec: &UploadSpec,
    multiple: bool,
) -> Result<Vec<UploadedFile>, UploadError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let body = request.into_body().into_data_stream();
    upload_multipart(&content_type, body, target_dir.as_ref(), spec, multiple).await
}

/// Store the first file part of a multipart request in `target_dir`.
pub async fn upload_one_file(request: Request, target_dir: impl AsRef<Path>, spec: &UploadSpec) -> Result<UploadedFile, UploadError> {
    let mut files = upload_files(request, target_dir, spec, false).await?;
    files.pop().ok_or(UploadError::NoFile)
}

/// Transport-independent core of [`upload_files`]: `content_type` is the request's
/// `Content-Type` header and `body` its raw byte stream.
pub async fn upload_multipart<S, O, E>(
    content_type: &str,
    body: S,
    target_dir: &Path,
    spec: &UploadSpec,
    multiple: bool,
) -> Result<Vec<UploadedFile>, UploadError>
where
    S: Stream<Item = Result<O, E>> + Send + 'static,
    O: Into<Bytes> + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let boundary = multer::parse_boundary(content_type).map_err(|e| UploadError::NotMultipart { reason: e.to_string() })?;
    let mut multipart = Multipart::new(body, boundary);

    // Parts are written under temporary names and only moved into place once every part has
    // been accepted. Until defused, the guard removes the temporary files, including when the
    // future is dropped mid-upload.
    let mut staged = scopeguard::guard(Vec::<StagedPart>::new(), |parts| {
        for part in parts {
            let _ = std::fs::remove_file(&part.temp_path);
        }
    });

    let mut dir_ready = false;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        // Parts without a file name are ordinary form values
        let Some(original_name) = field.file_name().filter(|name| !name.is_empty()).map(str::to_string) else {
            continue;
        };

        let (mime, chunks) = sniff_stream(Box::pin(field)).await.map_err(multipart_error)?;

        if !spec.allows(mime) {
            return Err(UploadError::DisallowedType {
                actual: mime.to_string(),
                allowed: spec.allowed_types.clone(),
            });
        }

        if !dir_ready {
            ensure_dir(target_dir).await.map_err(UploadError::IoFailure)?;
            dir_ready = true;
        }

        let (_, temp_path, file) = create_unique(target_dir, staging_name).await?;
        staged.push(StagedPart {
            original_name,
            temp_path,
            mime,
            size_bytes: 0,
        });

        let size_bytes = copy_limited(chunks, file, spec.max_upload_size).await?;
        if let Some(part) = staged.last_mut() {
            part.size_bytes = size_bytes;
        }

        if !multiple {
            break;
        }
    }

    if staged.is_empty() {
        return Err(UploadError::NoFile);
    }

    let mut uploaded = Vec::with_capacity(staged.len());
    for part in staged.iter() {
        let new_name = commit_staged(target_dir, part, spec.rename_on_conflict).await?;

        tracing::debug!(
            original_name = %part.original_name,
            new_name = %new_name,
            mime = part.mime,
            size_bytes = part.size_bytes,
            "Stored uploaded file"
        );

        uploaded.push(UploadedFile {
            original_name: part.original_name.clone(),
            new_name,
            size_bytes: part.size_bytes,
        });
    }

    // Every staged file has been moved into place
    let _ = scopeguard::ScopeGuard::into_inner(staged);
    Ok(uploaded)
}

/// A fully written part waiting under its temporary name.
struct StagedPart {
    original_name: String,
    temp_path: PathBuf,
    mime: &'static str,
    size_bytes: u64,
}

type FieldChunks = Replayed<Pin<Box<Field<'static>>>, multer::Error>;

async fn copy_limited(mut chunks: FieldChunks, mut file: File, limit: u64) -> Result<u64, UploadError> {
    let mut total = 0u64;

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(multipart_error)?;
        total = total.saturating_add(chunk.len() as u64);

        if total > limit {
            return Err(UploadError::TooLarge { limit });
        }

        file.write_all(&chunk).await.map_err(UploadError::IoFailure)?;
    }

    file.flush().await.map_err(UploadError::IoFailure)?;
    file.sync_all().await.map_err(UploadError::IoFailure)?;

    Ok(total)
}

fn staging_name() -> String {
    format!(".{}{STAGING_SUFFIX}", random_string(RANDOM_NAME_LEN))
}

/// Move a staged part to its stored name and return that name.
///
/// Original names replace any existing file of the same name. Random names are reserved with
/// create-new semantics first, so a generated name never replaces anything.
async fn commit_staged(dir: &Path, part: &StagedPart, rename: bool) -> Result<String, UploadError> {
    let safe_name = safe_file_name(&part.original_name);

    if !rename && let Some(name) = safe_name {
        fs::rename(&part.temp_path, dir.join(name)).await.map_err(UploadError::IoFailure)?;
        return Ok(name.to_string());
    }

    let extension = safe_name.map(extension_of).unwrap_or_default();
    let (name, path, reservation) = create_unique(dir, || format!("{}{}", random_string(RANDOM_NAME_LEN), extension)).await?;
    drop(reservation);

    if let Err(e) = fs::rename(&part.temp_path, &path).await {
        let _ = fs::remove_file(&path).await;
        return Err(UploadError::IoFailure(e));
    }

    Ok(name)
}

/// Create a file in `dir` that did not exist before, drawing names from `make_name` until one
/// is free.
async fn create_unique(dir: &Path, make_name: impl Fn() -> String) -> Result<(String, PathBuf, File), UploadError> {
    for _ in 0..MAX_NAME_ATTEMPTS {
        let name = make_name();
        let path = dir.join(&name);

        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok((name, path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(UploadError::IoFailure(e)),
        }
    }

    Err(UploadError::IoFailure(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free file name after {MAX_NAME_ATTEMPTS} attempts"),
    )))
}

/// Final path component of a client-supplied file name, if it is usable as-is.
fn safe_file_name(name: &str) -> Option<&str> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    match base {
        "" | "." | ".." => None,
        _ if base.contains('\0') => None,
        _ => Some(base),
    }
}

/// `.ext` of `name` when the extension is plain alphanumerics, otherwise empty.
fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

fn multipart_error(err: multer::Error) -> UploadError {
    match err {
        multer::Error::StreamReadFailed(source) => UploadError::IoFailure(io::Error::other(source)),
        other => UploadError::NotMultipart { reason: other.to_string() },
    }
}
