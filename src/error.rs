//! Error types and handling for the `TravelBook` service

use std::time::Duration;

use thiserror::Error;

/// Main error type for the `TravelBook` service
#[derive(Error, Debug)]
pub enum TravelBookError {
    /// Configuration-related errors, including missing API credentials
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Transport failures before any HTTP status was received
    #[error("Network error: {message}")]
    Network { message: String },

    /// The upstream API rejected our credentials (HTTP 401)
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    /// The upstream API throttled us (HTTP 429)
    #[error("Rate limit error: {message}")]
    RateLimit { message: String },

    /// Any other non-success status from an upstream API
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The upstream response could not be decoded
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// An external call did not finish within its deadline
    #[error("Timed out after {limit:?}: {operation}")]
    Timeout { operation: String, limit: Duration },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl TravelBookError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new authentication error
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a new rate limit error
    pub fn rate_limit<S: Into<String>>(message: S) -> Self {
        Self::RateLimit {
            message: message.into(),
        }
    }

    /// Create a new API status error
    pub fn api<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(operation: S, limit: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            limit,
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Map an upstream HTTP status to the matching error variant
    pub fn from_status<S: Into<String>>(status: u16, service: &str, body: S) -> Self {
        match status {
            401 => Self::authentication(format!("{service} rejected the access token")),
            429 => Self::rate_limit(format!("{service} rate limit exceeded")),
            _ => Self::api(status, format!("{service}: {}", body.into())),
        }
    }

    /// Whether the failure came from the upstream service rather than local input
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::Authentication { .. }
                | Self::RateLimit { .. }
                | Self::Api { .. }
                | Self::Parse { .. }
                | Self::Timeout { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TravelBookError::Config { message } => {
                format!("Configuration error: {message}")
            }
            TravelBookError::Network { .. } | TravelBookError::Timeout { .. } => {
                "Unable to connect to external services. Please check your internet connection."
                    .to_string()
            }
            TravelBookError::Authentication { .. } => {
                "The travel API refused our credentials. Please check your API key and secret."
                    .to_string()
            }
            TravelBookError::RateLimit { .. } => {
                "Too many requests to the travel API. Please try again shortly.".to_string()
            }
            TravelBookError::Api { .. } | TravelBookError::Parse { .. } => {
                "The travel API returned an unexpected response.".to_string()
            }
            TravelBookError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            TravelBookError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for TravelBookError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::parse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::api(status.as_u16(), err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for TravelBookError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(err) => err.into(),
            reqwest_middleware::Error::Middleware(err) => Self::network(err.to_string()),
        }
    }
}
