//! Failure kinds of the YouTube API client.

use crate::youtube_api::types::GoogleErrorResponse;
use reqwest::StatusCode;

/// An error from a single YouTube Data API call.
///
/// Callers decide what to retry; [`ApiError::is_transient`] separates timeouts, network
/// failures and 5xx/429 responses from permanent 4xx and malformed responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing YouTube API key")]
    MissingApiKey,

    #[error("YouTube API {endpoint} accepts at most {max} ids per call, got {got}")]
    TooManyIds {
        endpoint: &'static str,
        max: usize,
        got: usize,
    },

    #[error("YouTube API {endpoint} request timed out")]
    Timeout {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("send request to YouTube API {endpoint}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("YouTube API {endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("parse YouTube API {endpoint} response as JSON")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("YouTube API {endpoint} returned malformed data: {detail}")]
    Malformed {
        endpoint: &'static str,
        detail: String,
    },

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },
}

impl ApiError {
    pub(crate) fn from_transport(endpoint: &'static str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            ApiError::Timeout { endpoint, source }
        } else {
            ApiError::Transport { endpoint, source }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout { .. })
    }

    /// The HTTP status, for errors that came from a non-2xx response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the same call might succeed if made again later.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Timeout { .. } | ApiError::Transport { .. } => true,
            ApiError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    /// The machine-readable `reason` of the first error in a Google error response body,
    /// e.g. `quotaExceeded` or `playlistNotFound`.
    pub fn reason(&self) -> Option<String> {
        let ApiError::Status { body, .. } = self else {
            return None;
        };
        let response: GoogleErrorResponse = serde_json::from_str(body).ok()?;
        response
            .error
            .errors
            .into_iter()
            .map(|e| e.reason)
            .find(|r| !r.is_empty())
    }

    /// Whether the API reported that a playlist does not exist.
    ///
    /// Channels without any uploads have an uploads playlist id that 404s.
    pub fn is_playlist_not_found(&self) -> bool {
        let ApiError::Status { status, body, .. } = self else {
            return false;
        };
        if *status != StatusCode::NOT_FOUND {
            return false;
        }
        if self.reason().as_deref() == Some("playlistNotFound") {
            return true;
        }
        let body = body.to_ascii_lowercase();
        body.contains("playlistnotfound") || body.contains("playlistid")
    }
}
