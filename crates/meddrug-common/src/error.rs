use thiserror::Error;

/// Failure of a single backend call: either the backend answered with a
/// non-success status or no response arrived at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    /// HTTP status when the backend answered; `None` for network failures.
    pub status: Option<u16>,
}

impl TransportError {
    pub const NETWORK_UNREACHABLE: &'static str = "network unreachable";

    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self { message: message.into(), status: Some(status) }
    }

    pub fn network() -> Self {
        Self { message: Self::NETWORK_UNREACHABLE.to_string(), status: None }
    }

    pub fn is_network(&self) -> bool {
        self.status.is_none()
    }
}

/// The backend body matched none of the response shapes we know for the
/// requested kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("response body is not a JSON object")]
    NotAnObject,

    #[error("response matches no known {facet} shape")]
    UnrecognizedShape { facet: &'static str },

    #[error("{facet} response is missing field `{field}`")]
    MissingField { facet: &'static str, field: &'static str },

    #[error("{facet} field `{field}` is invalid: {reason}")]
    InvalidValue { facet: &'static str, field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Unexpected backend response: {0}")]
    Normalization(#[from] NormalizationError),

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Operation already in progress: {0}")]
    Concurrency(String),
}

impl SessionError {
    /// Errors that reach the user notification channel. Validation, state and
    /// concurrency errors are answered locally to the caller.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, SessionError::Transport(_) | SessionError::Normalization(_))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid backend base URL `{url}`: {reason}")]
    BaseUrl { url: String, reason: String },
}

pub type Result<T> = std::result::Result<T, SessionError>;
