//! Error taxonomy for listing and detail fetches

use serde::{Deserialize, Serialize};

/// Why a fetch did not produce a page
///
/// Carried inside [`crate::listing::FetchState::Failed`], so it must stay cheap to
/// clone and compare.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum FetchError {
    /// The request never completed (DNS, connection refused, reset...)
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status
    #[error("HTTP error: {0}")]
    Http(u16),

    /// The body could not be decoded into the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The request exceeded the configured deadline
    #[error("Request timed out")]
    Timeout,
}

impl FetchError {
    /// Client errors are worth surfacing differently from transient ones
    pub fn is_client_error(&self) -> bool {
        matches!(self, FetchError::Http(status) if (400..500).contains(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(FetchError::Http(500).to_string(), "HTTP error: 500");
        assert_eq!(FetchError::Timeout.to_string(), "Request timed out");
        assert_eq!(
            FetchError::Network("connection refused".to_string()).to_string(),
            "Network error: connection refused"
        );
    }

    #[test]
    fn test_client_error_classification() {
        assert!(FetchError::Http(404).is_client_error());
        assert!(!FetchError::Http(500).is_client_error());
        assert!(!FetchError::Timeout.is_client_error());
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let json = serde_json::to_value(FetchError::Http(503)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "Http", "detail": 503}));

        let json = serde_json::to_value(FetchError::Timeout).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "Timeout"}));
    }
}
