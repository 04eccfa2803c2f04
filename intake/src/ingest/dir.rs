//! Target directory provisioning for upload writes.

use std::io;
use std::path::Path;

use tokio::fs;

/// Permission bits for directories created by [`ensure_dir`] (rwxr-xr-x).
#[cfg(unix)]
const DIR_MODE: u32 = 0o755;

/// Ensure `path` exists as a directory, creating it and any missing ancestors.
///
/// Calling this on an existing directory is a no-op, including when another caller
/// creates it concurrently. Fails if `path` exists but is not a directory.
pub async fn ensure_dir(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();

    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => return Ok(()),
        Ok(_) => {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} exists and is not a directory", path.display()),
            ));
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);

    match builder.create(path).await {
        Ok(()) => Ok(()),
        // Lost a race with another creator
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false) => Ok(()),
        Err(e) => Err(e),
    }
}
