//! Shared handler helpers.

use serde::Serialize;

/// `{message, ...}` summary body for mutating endpoints that return no
/// row, plus bulk operations that report counts.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BulkOutcome {
    pub processed: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}
