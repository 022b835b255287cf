//! Error types for service API calls.
//!
//! Errors are categorized so callers can tell a service that is down apart
//! from one that answered with something unexpected.

use std::fmt;

/// Result type alias for arrkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Service unreachable, timed out, or answered with a non-2xx status.
    Network,
    /// Credentials were rejected.
    Auth,
    /// Something the caller asked for does not exist on the service.
    NotFound,
    /// The service answered with a body we could not understand.
    Format,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Service unreachable",
            Self::Auth => "Authentication failed",
            Self::NotFound => "Not found",
            Self::Format => "Unexpected response",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check that the service is running and the URL is correct",
            Self::Auth => "Check the API key or credentials in your state file",
            Self::NotFound => "The service may be an older version without this endpoint",
            Self::Format => "The service version may not be supported",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to a service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed (transport error, timeout, or non-2xx status).
    #[error("HTTP request failed: {message}")]
    HttpError {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// Invalid response body.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Prowlarr has no application schema for the implementation.
    #[error("no schema found for implementation '{implementation}' in Prowlarr")]
    SchemaNotFound {
        /// Implementation name, e.g. "Radarr".
        implementation: String,
    },

    /// Seedr rejected the credentials.
    #[error("Seedr authentication failed for '{email}'")]
    Auth {
        /// Account email.
        email: String,
    },

    /// Seedr answered with an error payload.
    #[error("Seedr API error for '{email}': {message}")]
    Api {
        /// Account email.
        email: String,
        /// Error reported by the API.
        message: String,
    },

    /// Entity missing on the service (mock backends report this for bad ids).
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// Requested id.
        id: i64,
    },
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::HttpError {
            message: message.into(),
            status,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::HttpError {
                status: Some(401 | 403),
                ..
            } => ErrorCategory::Auth,
            Error::HttpError {
                status: Some(404), ..
            } => ErrorCategory::NotFound,
            Error::HttpError { .. } => ErrorCategory::Network,
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::SchemaNotFound { .. } => ErrorCategory::NotFound,
            Error::Auth { .. } => ErrorCategory::Auth,
            Error::Api { .. } => ErrorCategory::Other,
            Error::NotFound { .. } => ErrorCategory::NotFound,
        }
    }

    /// HTTP status code, if the error carries one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpError { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::HttpError {
                message: format!("HTTP {}", code),
                status: Some(code),
            },
            ureq::Error::Json(e) => Self::InvalidResponse(e.to_string()),
            other => Self::HttpError {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_advice() {
        assert!(!ErrorCategory::Network.advice().is_empty());
        assert!(!ErrorCategory::Auth.advice().is_empty());
        assert!(!ErrorCategory::Format.advice().is_empty());
    }

    #[test]
    fn test_error_category_display() {
        let display = format!("{}", ErrorCategory::Network);
        assert!(display.contains("unreachable"));
    }

    #[test]
    fn test_http_status_categories() {
        assert_eq!(
            Error::http("HTTP 401", Some(401)).category(),
            ErrorCategory::Auth
        );
        assert_eq!(
            Error::http("HTTP 404", Some(404)).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            Error::http("HTTP 503", Some(503)).category(),
            ErrorCategory::Network
        );
        assert_eq!(
            Error::http("connection refused", None).category(),
            ErrorCategory::Network
        );
    }

    #[test]
    fn test_schema_not_found_message() {
        let err = Error::SchemaNotFound {
            implementation: "Radarr".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(err.to_string().contains("'Radarr'"));
    }

    #[test]
    fn test_from_ureq_status() {
        let err: Error = ureq::Error::StatusCode(500).into();
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[test]
    fn test_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.category(), ErrorCategory::Format);
    }
}
