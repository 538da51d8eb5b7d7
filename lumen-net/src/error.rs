use lumen_api::limits::LimitError;
use lumen_api::status::StatusClass;

/// Transport-level failure. Cloneable so one outcome can be handed to every
/// caller waiting on the same request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("network: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("decode: {0}")]
    Decode(String),

    #[error("response too large: {actual} bytes (max {max})")]
    TooLarge { max: usize, actual: usize },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server refused a create because the record already exists.
    pub fn is_conflict(&self) -> bool {
        match self {
            ApiError::Server { status, message } => match StatusClass::of(*status) {
                StatusClass::Conflict => true,
                StatusClass::ClientError => message.to_ascii_lowercase().contains("already"),
                _ => false,
            },
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<LimitError> for ApiError {
    fn from(e: LimitError) -> Self {
        match e {
            LimitError::TooLarge { max, actual } => ApiError::TooLarge { max, actual },
        }
    }
}
