use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadQuery {
    /// Name offered to the client in `Content-Disposition`; defaults to the stored name
    pub name: Option<String>,
}
