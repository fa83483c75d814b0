use thiserror::Error;

/// The one message a user sees for any failed prediction.
pub const FAILURE_NOTICE: &str = "Failed to get prediction. Please check console for details.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Service,
    NoResponse,
    MalformedResponse,
    RequestSetup,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictionError {
    #[error("server responded with error status {status}: {detail}")]
    Service { status: u16, detail: String },
    #[error("no response received: {0}")]
    NoResponse(String),
    #[error("malformed prediction response: {0}")]
    MalformedResponse(String),
    #[error("request setup error: {0}")]
    RequestSetup(String),
}

impl PredictionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PredictionError::Service { .. } => FailureKind::Service,
            PredictionError::NoResponse(_) => FailureKind::NoResponse,
            PredictionError::MalformedResponse(_) => FailureKind::MalformedResponse,
            PredictionError::RequestSetup(_) => FailureKind::RequestSetup,
        }
    }

    pub fn user_notice(&self) -> &'static str {
        FAILURE_NOTICE
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_builder() {
            PredictionError::RequestSetup(err.to_string())
        } else if err.is_decode() {
            PredictionError::MalformedResponse(err.to_string())
        } else {
            PredictionError::NoResponse(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error("a prediction request is already in flight")]
    InFlight,
}
