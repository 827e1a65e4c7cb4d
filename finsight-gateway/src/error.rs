//! Failure classification shared by every gateway call.

use std::fmt;

/// Gateway failures split into exactly two classes: throttling, which is
/// surfaced distinctly to the user, and everything else.
#[derive(Debug)]
pub enum GatewayError {
    RateLimited,
    Remote(anyhow::Error),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::RateLimited => write!(f, "rate limited by the model service"),
            GatewayError::Remote(e) => write!(f, "model service call failed: {e}"),
        }
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GatewayError::RateLimited => None,
            GatewayError::Remote(e) => e.source(),
        }
    }
}

/// The single rate-limit predicate: an HTTP 429 status, or an error string
/// containing one of the throttling markers. Matching is case-sensitive.
pub fn is_rate_limit(status: Option<u16>, detail: &str) -> bool {
    status == Some(429)
        || detail.contains("429")
        || detail.contains("RESOURCE_EXHAUSTED")
        || detail.contains("quota")
}

impl GatewayError {
    /// Classify a non-success HTTP response.
    pub fn from_response(status: u16, body: &str) -> Self {
        if is_rate_limit(Some(status), body) {
            GatewayError::RateLimited
        } else {
            GatewayError::Remote(anyhow::anyhow!("HTTP {status}: {body}"))
        }
    }

    /// Classify a transport-level failure.
    pub fn from_transport(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        if is_rate_limit(status, &err.to_string()) {
            GatewayError::RateLimited
        } else {
            GatewayError::Remote(err.into())
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GatewayError::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_429_is_rate_limited() {
        assert!(is_rate_limit(Some(429), ""));
        assert!(!is_rate_limit(Some(500), "internal error"));
    }

    #[test]
    fn test_marker_substrings_are_rate_limited() {
        assert!(is_rate_limit(None, "server returned 429"));
        assert!(is_rate_limit(None, "RESOURCE_EXHAUSTED: try later"));
        assert!(is_rate_limit(None, "quota exceeded for project"));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert!(!is_rate_limit(None, "resource_exhausted"));
        assert!(!is_rate_limit(None, "Quota exceeded"));
    }

    #[test]
    fn test_plain_failures_are_not_rate_limited() {
        assert!(!is_rate_limit(None, "connection reset by peer"));
    }

    #[test]
    fn test_from_response_classification() {
        assert!(GatewayError::from_response(429, "slow down").is_rate_limited());
        assert!(GatewayError::from_response(500, "RESOURCE_EXHAUSTED").is_rate_limited());
        assert!(!GatewayError::from_response(503, "unavailable").is_rate_limited());
    }
}
