//! Serving stored files as attachments.

use std::io;
use std::path::{Component, Path};

use axum::body::Body;
use axum::http::{HeaderValue, header};
use axum::response::Response;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::errors::{Error, Result};

/// Stream `file` from `dir` as a download named `display_name`.
///
/// `file` must be a plain file name; anything that could resolve outside `dir` is
/// treated as not found.
pub async fn download_file(dir: &Path, file: &str, display_name: &str) -> Result<Response> {
    let not_found = || Error::NotFound {
        resource: "File".to_string(),
        id: file.to_string(),
    };

    let mut components = Path::new(file).components();
    if !matches!((components.next(), components.next()), (Some(Component::Normal(_)), None)) {
        return Err(not_found());
    }

    let path = dir.join(file);
    let handle = match File::open(&path).await {
        Ok(handle) => handle,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => {
            return Err(Error::Internal {
                operation: format!("open {}: {e}", path.display()),
            });
        }
    };

    let metadata = handle.metadata().await.map_err(|e| Error::Internal {
        operation: format!("stat {}: {e}", path.display()),
    })?;
    if !metadata.is_file() {
        return Err(not_found());
    }

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    let disposition = format!("attachment; filename=\"{}\"", quoted_file_name(display_name));

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CONTENT_LENGTH, metadata.len())
        .header(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_str(&disposition).map_err(|e| Error::BadRequest {
                message: format!("Invalid download name: {e}"),
            })?,
        )
        .body(Body::from_stream(ReaderStream::new(handle)))
        .map_err(|e| Error::Internal {
            operation: format!("build download response: {e}"),
        })
}

/// Restrict a display name to what fits inside a quoted header parameter.
fn quoted_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' { c } else { '_' })
        .collect()
}
