//! Mapping of HTTP failures to [`UpstreamError`]
//!
//! Transient means safe to retry: rate limiting, service busy, and network
//! failures that happened before a response arrived.

use crate::domain::UpstreamError;
use reqwest::StatusCode;

/// Dataverse service-protection limit error codes
pub const SERVICE_PROTECTION_CODES: [&str; 3] = ["0x80072321", "0x80072322", "0x80072326"];

const BUSY_PHRASES: [&str; 2] = ["too many requests", "server is busy"];

/// Longest body excerpt carried in an error message
const MAX_BODY_EXCERPT: usize = 512;

/// Classify a non-success response.
pub fn classify_response(status: StatusCode, body: &str) -> UpstreamError {
    let message = excerpt(body);

    if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
        return UpstreamError::Transient {
            signature: status.as_u16().to_string(),
            message,
        };
    }

    if let Some(signature) = transient_signature(body) {
        return UpstreamError::Transient { signature, message };
    }

    if status.is_client_error() {
        UpstreamError::ClientError {
            status: status.as_u16(),
            message,
        }
    } else if status.is_server_error() {
        UpstreamError::ServerError {
            status: status.as_u16(),
            message,
        }
    } else {
        UpstreamError::InvalidResponse(format!("unexpected status {status}: {message}"))
    }
}

/// Classify a failure raised by the HTTP client itself.
pub fn classify_transport(error: &reqwest::Error) -> UpstreamError {
    if error.is_timeout() {
        UpstreamError::Transient {
            signature: "timeout".to_string(),
            message: error.to_string(),
        }
    } else if error.is_connect() {
        UpstreamError::Transient {
            signature: "connect".to_string(),
            message: error.to_string(),
        }
    } else {
        UpstreamError::RequestFailed(error.to_string())
    }
}

/// Service-protection code or busy phrase found in a body, if any
pub fn transient_signature(body: &str) -> Option<String> {
    if let Some(code) = SERVICE_PROTECTION_CODES
        .iter()
        .find(|code| body.contains(*code))
    {
        return Some((*code).to_string());
    }

    let lower = body.to_ascii_lowercase();
    BUSY_PHRASES
        .iter()
        .any(|phrase| lower.contains(phrase))
        .then(|| "busy".to_string())
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= MAX_BODY_EXCERPT {
        return trimmed.to_string();
    }
    let mut end = MAX_BODY_EXCERPT;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn is_transient(e: &UpstreamError) -> bool {
        matches!(e, UpstreamError::Transient { .. })
    }

    #[test_case(429, "" ; "too many requests status")]
    #[test_case(503, "" ; "service unavailable status")]
    #[test_case(400, r#"{"error":{"code":"0x80072322","message":"Number of requests exceeded"}}"# ; "request count limit")]
    #[test_case(500, r#"{"error":{"code":"0x80072321","message":"Combined execution time"}}"# ; "execution time limit")]
    #[test_case(400, r#"{"error":{"code":"0x80072326","message":"Concurrent requests"}}"# ; "concurrency limit")]
    #[test_case(500, "The Server Is Busy, try later" ; "busy phrase any case")]
    #[test_case(502, "Too Many Requests" ; "rate phrase on other status")]
    fn test_transient_responses(status: u16, body: &str) {
        let err = classify_response(StatusCode::from_u16(status).unwrap(), body);
        assert!(is_transient(&err), "{err:?}");
    }

    #[test]
    fn test_client_and_server_errors_are_permanent() {
        let err = classify_response(StatusCode::BAD_REQUEST, r#"{"error":{"code":"0x0"}}"#);
        assert!(matches!(err, UpstreamError::ClientError { status: 400, .. }));

        let err = classify_response(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(err, UpstreamError::ServerError { status: 500, .. }));
    }

    #[test]
    fn test_signature_recorded() {
        match classify_response(StatusCode::TOO_MANY_REQUESTS, "slow down") {
            UpstreamError::Transient { signature, message } => {
                assert_eq!(signature, "429");
                assert_eq!(message, "slow down");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "é".repeat(1000);
        match classify_response(StatusCode::BAD_REQUEST, &body) {
            UpstreamError::ClientError { message, .. } => {
                assert!(message.ends_with("..."));
                assert!(message.len() <= MAX_BODY_EXCERPT + 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
