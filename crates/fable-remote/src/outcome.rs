//! # Remote Outcome
//!
//! The single classification every HTTP response passes through before any
//! other layer sees it. Downstream code matches on three cases and never
//! touches `reqwest` types directly.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

/// Cap on error-body text carried into an outcome. HTML error pages from
/// proxies can be large and are useless past the first line.
const MAX_ERROR_BODY_LEN: usize = 512;

// =============================================================================
// Types
// =============================================================================

/// Outcome of one remote call, after normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutcome<T> {
    /// 2xx response with a successfully decoded body.
    Success(T),

    /// The server answered with a non-2xx status.
    HttpError {
        /// HTTP status code.
        status: u16,
        /// Human-readable message extracted from the response body.
        message: String,
    },

    /// The request never produced a server answer, or the answer was
    /// unusable (timeout, DNS, TLS, malformed body).
    TransportFailure(TransportError),
}

impl<T> RemoteOutcome<T> {
    /// Maps the success payload, leaving failures untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RemoteOutcome<U> {
        match self {
            RemoteOutcome::Success(value) => RemoteOutcome::Success(f(value)),
            RemoteOutcome::HttpError { status, message } => {
                RemoteOutcome::HttpError { status, message }
            }
            RemoteOutcome::TransportFailure(err) => RemoteOutcome::TransportFailure(err),
        }
    }

    /// True for the success case.
    pub fn is_success(&self) -> bool {
        matches!(self, RemoteOutcome::Success(_))
    }
}

/// A failure that prevented getting (or reading) a server answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct TransportError {
    pub kind: TransportKind,
    pub message: String,
}

/// Coarse classification of transport failures, for logging and UI copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// The request or connect timed out.
    Timeout,
    /// TCP/TLS/DNS level connection failure.
    Connect,
    /// 2xx answer whose body failed to decode.
    Decode,
    /// Anything else reqwest reports.
    Other,
}

/// Shape the backend uses for error bodies: `{"message": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

// =============================================================================
// Normalization
// =============================================================================

/// Normalizes a reqwest result into a [`RemoteOutcome`], decoding a 2xx body
/// as JSON `T`.
pub async fn normalize<T: DeserializeOwned>(
    result: Result<reqwest::Response, reqwest::Error>,
) -> RemoteOutcome<T> {
    let response = match result {
        Ok(response) => response,
        Err(err) => return RemoteOutcome::TransportFailure(classify(&err)),
    };

    let status = response.status();
    if !status.is_success() {
        return http_error(status.as_u16(), response).await;
    }

    match response.json::<T>().await {
        Ok(value) => RemoteOutcome::Success(value),
        Err(err) => {
            debug!(error = %err, "failed to decode response body");
            RemoteOutcome::TransportFailure(TransportError {
                kind: TransportKind::Decode,
                message: err.to_string(),
            })
        }
    }
}

/// Normalizes a reqwest result for endpoints whose success body is empty
/// (or irrelevant, like DELETE).
pub async fn normalize_empty(
    result: Result<reqwest::Response, reqwest::Error>,
) -> RemoteOutcome<()> {
    let response = match result {
        Ok(response) => response,
        Err(err) => return RemoteOutcome::TransportFailure(classify(&err)),
    };

    let status = response.status();
    if !status.is_success() {
        return http_error(status.as_u16(), response).await;
    }

    RemoteOutcome::Success(())
}

async fn http_error<T>(status: u16, response: reqwest::Response) -> RemoteOutcome<T> {
    let message = match response.text().await {
        Ok(body) => extract_message(status, &body),
        Err(_) => default_message(status),
    };

    debug!(status, %message, "server returned error status");
    RemoteOutcome::HttpError { status, message }
}

/// Pulls a human-readable message out of an error body: the backend's JSON
/// `message` field when present, the raw text otherwise, a canned string
/// when the body is empty.
fn extract_message(status: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.message;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return default_message(status);
    }

    let mut message = trimmed.to_string();
    message.truncate(MAX_ERROR_BODY_LEN);
    message
}

fn default_message(status: u16) -> String {
    format!("HTTP {status}")
}

fn classify(err: &reqwest::Error) -> TransportError {
    let kind = if err.is_timeout() {
        TransportKind::Timeout
    } else if err.is_connect() {
        TransportKind::Connect
    } else if err.is_decode() {
        TransportKind::Decode
    } else {
        TransportKind::Other
    };

    TransportError {
        kind,
        message: err.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> reqwest::Response {
        http::Response::builder()
            .status(status)
            .body(body.to_string())
            .unwrap()
            .into()
    }

    #[tokio::test]
    async fn test_success_decodes_json() {
        let outcome: RemoteOutcome<Vec<i64>> = normalize(Ok(response(200, "[1,2,3]"))).await;
        assert_eq!(outcome, RemoteOutcome::Success(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_http_error_extracts_json_message() {
        let outcome: RemoteOutcome<Vec<i64>> =
            normalize(Ok(response(404, r#"{"message":"story not found"}"#))).await;
        assert_eq!(
            outcome,
            RemoteOutcome::HttpError {
                status: 404,
                message: "story not found".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_http_error_falls_back_to_raw_body() {
        let outcome: RemoteOutcome<Vec<i64>> =
            normalize(Ok(response(502, "Bad Gateway"))).await;
        assert_eq!(
            outcome,
            RemoteOutcome::HttpError {
                status: 502,
                message: "Bad Gateway".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_http_error_empty_body_gets_canned_message() {
        let outcome: RemoteOutcome<Vec<i64>> = normalize(Ok(response(500, ""))).await;
        assert_eq!(
            outcome,
            RemoteOutcome::HttpError {
                status: 500,
                message: "HTTP 500".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_transport_failure() {
        let outcome: RemoteOutcome<Vec<i64>> = normalize(Ok(response(200, "not json"))).await;
        match outcome {
            RemoteOutcome::TransportFailure(err) => {
                assert_eq!(err.kind, TransportKind::Decode);
            }
            other => panic!("expected transport failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_normalize_empty_ignores_body() {
        let outcome = normalize_empty(Ok(response(204, ""))).await;
        assert_eq!(outcome, RemoteOutcome::Success(()));

        let outcome = normalize_empty(Ok(response(403, r#"{"message":"not yours"}"#))).await;
        assert_eq!(
            outcome,
            RemoteOutcome::HttpError {
                status: 403,
                message: "not yours".to_string(),
            }
        );
    }

    #[test]
    fn test_map_preserves_failures() {
        let outcome: RemoteOutcome<i64> = RemoteOutcome::HttpError {
            status: 500,
            message: "boom".to_string(),
        };
        let mapped = outcome.map(|n| n.to_string());
        assert_eq!(
            mapped,
            RemoteOutcome::HttpError {
                status: 500,
                message: "boom".to_string(),
            }
        );
    }
}
