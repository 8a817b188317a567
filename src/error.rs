//! Custom error types for mark-issues.

use thiserror::Error;

/// Main error type for mark-issues operations.
#[derive(Error, Debug)]
pub enum MarkIssuesError {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid webhook event: {0}")]
    InvalidEvent(String),

    // Network/API errors
    #[error("{service} request to {url} failed with status {status}")]
    Upstream {
        service: String,
        status: u16,
        url: String,
    },

    #[error("Network request failed: {0}")]
    NetworkError(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    // Parsing errors
    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("Response decode error: {0}")]
    ResponseDecodeError(String),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Regular expression error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] log::SetLoggerError),

    // Generic wrapper for other errors
    #[error(transparent)]
    Other(#[from] color_eyre::Report),
}

/// Result type alias using MarkIssuesError
pub type Result<T> = std::result::Result<T, MarkIssuesError>;

impl MarkIssuesError {
    /// Create an upstream error for a non-2xx response
    pub fn upstream(
        service: impl Into<String>,
        status: u16,
        url: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            service: service.into(),
            status,
            url: url.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an invalid event error
    pub fn invalid_event(msg: impl Into<String>) -> Self {
        Self::InvalidEvent(msg.into())
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }
}

// Wraps in Other variant for generic I/O errors
impl From<std::io::Error> for MarkIssuesError {
    fn from(err: std::io::Error) -> Self {
        Self::Other(color_eyre::Report::from(err))
    }
}

// Status errors are upstream failures, unreadable bodies are decode
// failures, everything else is transport
impl From<reqwest::Error> for MarkIssuesError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::ResponseDecodeError(err.to_string());
        }

        match err.status() {
            Some(status) if err.is_status() => Self::Upstream {
                service: "http".into(),
                status: status.as_u16(),
                url: err
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_default(),
            },
            _ => Self::NetworkError(err.to_string()),
        }
    }
}
