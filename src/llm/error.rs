//! LLM backend errors

use std::fmt;

/// Errors that can occur while talking to a chat model
#[derive(Debug, Clone)]
pub enum BackendError {
    /// API request failed with the given message
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// Request timed out after the specified duration (in seconds)
    TimeoutError { seconds: u64 },

    /// The model answered, but with nothing usable
    InvalidResponse {
        message: String,
        raw_response: Option<String>,
    },

    /// Generic error for other cases
    Other { message: String },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::ApiError {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "API error ({}): {}", code, message)
                } else {
                    write!(f, "API error: {}", message)
                }
            }
            BackendError::TimeoutError { seconds } => {
                write!(f, "Request timed out after {} seconds", seconds)
            }
            BackendError::InvalidResponse { message, .. } => {
                write!(f, "Invalid response from LLM: {}", message)
            }
            BackendError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let with_code = BackendError::ApiError {
            message: "quota exceeded".to_string(),
            status_code: Some(429),
        };
        assert_eq!(with_code.to_string(), "API error (429): quota exceeded");

        let without_code = BackendError::ApiError {
            message: "connection reset".to_string(),
            status_code: None,
        };
        assert_eq!(without_code.to_string(), "API error: connection reset");
    }

    #[test]
    fn test_timeout_display() {
        let err = BackendError::TimeoutError { seconds: 60 };
        assert_eq!(err.to_string(), "Request timed out after 60 seconds");
    }

    #[test]
    fn test_invalid_response_display_omits_raw_body() {
        let err = BackendError::InvalidResponse {
            message: "empty completion".to_string(),
            raw_response: Some("{\"choices\": []}".to_string()),
        };
        assert_eq!(err.to_string(), "Invalid response from LLM: empty completion");

        let other = BackendError::Other {
            message: "no scripted response".to_string(),
        };
        assert_eq!(other.to_string(), "Error: no scripted response");
    }
}
