use thiserror::Error;

/// Fallback text when the server gives no usable message.
pub const DEFAULT_ERROR_MESSAGE: &str = "Request failed.";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    /// The credential was missing, invalid or expired. The session has
    /// already been torn down when a caller sees this.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
}

impl ApiError {
    /// User-facing text. For HTTP failures this is the server's `message`
    /// verbatim when it sent one.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthorized { message } | Self::Http { message, .. } => message,
            Self::Config(message)
            | Self::Network(message)
            | Self::Timeout(message)
            | Self::Parse(message)
            | Self::Serialization(message) => message,
        }
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
