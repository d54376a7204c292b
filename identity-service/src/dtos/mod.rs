pub mod auth;
pub mod user;

use serde::{Deserialize, Serialize};

/// Error body as rendered by `AppError`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
