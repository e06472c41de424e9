//! Shared types and parsing helpers for the YouTube API client.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A pointer to a single video, used for "last upload" and "last livestream".
///
/// The timestamp is the publish time for uploads and the actual start time for livestreams
/// found through the uploads playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentPointer {
    pub video_id: String,
    pub at: DateTime<Utc>,
    pub is_live_stream: bool,
}

/// The most recent upload and most recent livestream of a channel.
///
/// Both are `None` when the channel has no (visible) uploads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentContent {
    pub last_upload: Option<RecentPointer>,
    pub last_live: Option<RecentPointer>,
}

/// Error envelope returned by Google APIs on non-2xx responses.
///
/// See: <https://developers.google.com/youtube/v3/docs/errors>
#[derive(Debug, Deserialize)]
pub(crate) struct GoogleErrorResponse {
    pub error: GoogleError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleError {
    #[serde(default)]
    pub errors: Vec<GoogleErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleErrorDetail {
    #[serde(default)]
    pub reason: String,
}

/// Parses one of the API's stringified counters (`"12345"`).
///
/// Absent, empty, or unparseable values are `None`, never zero.
pub(crate) fn parse_count(value: Option<&str>) -> Option<i64> {
    value.filter(|s| !s.is_empty())?.parse().ok()
}

/// Parses an RFC 3339 timestamp and normalizes it to UTC.
pub(crate) fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value.filter(|s| !s.is_empty())?;
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Treats empty strings from the API the same as absent fields.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
