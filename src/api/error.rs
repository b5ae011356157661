use serde_json::Value;

/// Errors from remote API calls.
///
/// Every variant renders to the user-facing string the UI shows; commands
/// forward `to_string()` as the rejection reason. Client-side validation
/// failures never reach this layer — they are rejected before any request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport failure, no response received.
    #[error("Network error. Please check your connection and try again.")]
    Network(String),
    /// HTTP error status; the server's message is surfaced verbatim
    /// when present.
    #[error("{message}")]
    Server { status: u16, message: String },
    /// 401 — the stored token has been cleared; the user must log in again.
    #[error("Session expired. Please log in again.")]
    Unauthorized,
    /// Response arrived but did not match any known shape.
    #[error("Unexpected response from server.")]
    Decode(String),
}

/// Fallback shown when an error response has no usable message body.
pub const GENERIC_SERVER_ERROR: &str = "Something went wrong. Please try again.";

/// Extract the server's error message from a response body, falling back
/// to the generic string. Probes the message keys the API actually uses.
pub fn server_message(body: Option<&Value>) -> String {
    let Some(body) = body else {
        return GENERIC_SERVER_ERROR.to_string();
    };
    for key in ["message", "error", "detail"] {
        if let Some(msg) = body.get(key).and_then(Value::as_str) {
            if !msg.trim().is_empty() {
                return msg.to_string();
            }
        }
    }
    GENERIC_SERVER_ERROR.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_message_prefers_message_key() {
        let body = json!({"message": "Invalid PIN", "error": "other"});
        assert_eq!(server_message(Some(&body)), "Invalid PIN");
    }

    #[test]
    fn server_message_falls_back_through_keys() {
        let body = json!({"error": "Subdomain not found"});
        assert_eq!(server_message(Some(&body)), "Subdomain not found");
    }

    #[test]
    fn server_message_generic_when_absent_or_blank() {
        assert_eq!(server_message(None), GENERIC_SERVER_ERROR);
        let body = json!({"message": "  "});
        assert_eq!(server_message(Some(&body)), GENERIC_SERVER_ERROR);
        let body = json!({"count": 3});
        assert_eq!(server_message(Some(&body)), GENERIC_SERVER_ERROR);
    }

    #[test]
    fn error_display_is_user_facing() {
        let err = ApiError::Server {
            status: 400,
            message: "Invalid PIN".into(),
        };
        assert_eq!(err.to_string(), "Invalid PIN");
        assert!(ApiError::Network("timed out".into())
            .to_string()
            .starts_with("Network error"));
    }
}
