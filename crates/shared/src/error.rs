use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body the prediction service returns alongside a non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid value '{value}' for field {field} (expected one of: {expected})")]
    UnknownChoice {
        field: &'static str,
        value: String,
        expected: String,
    },
}
