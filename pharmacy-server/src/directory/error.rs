//! Directory API error types.

/// Errors from the duty-pharmacy directory API.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Authentication failed
    #[error("unauthorized: check DUTY_API_KEY")]
    Unauthorized,

    /// API returned an error status
    #[error("directory error {status}: {message}")]
    Api { status: u16, message: String },

    /// HTTP succeeded but the envelope reported failure
    #[error("directory rejected the request: {message}")]
    Rejected { message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// No pharmacy with the requested identifier
    #[error("pharmacy not found: {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DirectoryError::Api {
            status: 500,
            message: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "directory error 500: Internal Server Error");

        let err = DirectoryError::Rejected {
            message: "unknown city".into(),
        };
        assert!(err.to_string().contains("unknown city"));

        let err = DirectoryError::NotFound("abc123".into());
        assert_eq!(err.to_string(), "pharmacy not found: abc123");
    }
}
