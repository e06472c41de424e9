//! YouTube Search API types.

use serde::Deserialize;
use std::fmt;

/// Response structure for the `search.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/search/list>
#[derive(Debug, Default, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub id: SearchResultId,
    /// Only present when the `snippet` part was requested.
    pub snippet: Option<SearchSnippet>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResultId {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchSnippet {
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
}

/// The `eventType` filter of `search.list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Live,
    Upcoming,
    Completed,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Live => "live",
            EventType::Upcoming => "upcoming",
            EventType::Completed => "completed",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
