use serde::{Deserialize, Serialize};

/// Body accepted by `POST /api/v1/echo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoRequest {
    pub message: String,
    #[serde(default)]
    pub tags: Vec<String>,
}
