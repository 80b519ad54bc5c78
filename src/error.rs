use thiserror::Error;

/// Type alias for Result with GmailError
pub type Result<T> = std::result::Result<T, GmailError>;

/// Error types for the auto-responder
#[derive(Error, Debug)]
pub enum GmailError {
    /// Gmail API returned an error
    #[error("Gmail API error: {0}")]
    ApiError(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Too many requests (429)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Network-related error (connection issues, timeouts, etc.)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server returned 5xx error
    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden (403)
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// A message is missing a field required to process it
    #[error("Malformed message {message_id}: missing {field}")]
    MalformedMessage { message_id: String, field: String },

    /// Label-related errors
    #[error("Label error: {0}")]
    LabelError(String),

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl GmailError {
    /// Shorthand for a missing message field
    pub fn malformed(message_id: &str, field: &str) -> Self {
        GmailError::MalformedMessage {
            message_id: message_id.to_string(),
            field: field.to_string(),
        }
    }

    /// Check if the error is transient, i.e. the next poll may well succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GmailError::RateLimited(_)
                | GmailError::ServerError { .. }
                | GmailError::NetworkError(_)
        )
    }
}

impl From<google_gmail1::Error> for GmailError {
    fn from(error: google_gmail1::Error) -> Self {
        match error {
            // HTTP response with status code (non-success responses)
            google_gmail1::Error::Failure(ref response) => {
                let status = response.status();
                let status_code = status.as_u16();
                let message = format!(
                    "HTTP {}: {}",
                    status_code,
                    status.canonical_reason().unwrap_or("Unknown")
                );

                match status_code {
                    429 => GmailError::RateLimited(message),
                    404 => GmailError::NotFound(message),
                    400 => GmailError::BadRequest(message),
                    403 => GmailError::Forbidden(message),
                    500..=599 => GmailError::ServerError {
                        status: status_code,
                        message,
                    },
                    _ => GmailError::ApiError(message),
                }
            }
            google_gmail1::Error::BadRequest(ref err) => GmailError::BadRequest(format!("{}", err)),
            google_gmail1::Error::MissingToken(ref err) => {
                GmailError::AuthError(format!("No access token: {}", err))
            }
            google_gmail1::Error::HttpError(ref err) => {
                GmailError::NetworkError(format!("Connection error: {}", err))
            }
            google_gmail1::Error::Io(err) => GmailError::NetworkError(err.to_string()),
            _ => GmailError::ApiError(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(GmailError::RateLimited("HTTP 429".to_string()).is_transient());
        assert!(GmailError::ServerError {
            status: 503,
            message: "Service unavailable".to_string(),
        }
        .is_transient());
        assert!(GmailError::NetworkError("Connection timeout".to_string()).is_transient());
    }

    #[test]
    fn test_permanent_errors() {
        assert!(!GmailError::BadRequest("Invalid query".to_string()).is_transient());
        assert!(!GmailError::Forbidden("Access denied".to_string()).is_transient());
        assert!(!GmailError::malformed("msg-1", "From").is_transient());
        assert!(!GmailError::AuthError("Invalid token".to_string()).is_transient());
    }

    #[test]
    fn test_malformed_message_display() {
        let error = GmailError::malformed("18c2f", "Message-ID");
        assert_eq!(
            error.to_string(),
            "Malformed message 18c2f: missing Message-ID"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "credentials.json");
        let error: GmailError = io.into();
        assert!(matches!(error, GmailError::IoError(_)));
        assert!(error.to_string().contains("credentials.json"));
    }
}
