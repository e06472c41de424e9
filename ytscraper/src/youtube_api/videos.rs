//! YouTube Videos API types.

use crate::youtube_api::types::{parse_count, parse_timestamp};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Response structure for the `videos.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos/list>
#[derive(Debug, Default, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<Video>,
}

/// A `video` resource with the `snippet` and `liveStreamingDetails` parts.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#resource>
#[derive(Debug, Default, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub snippet: VideoSnippet,
    /// Only present for videos that are, were, or will be livestreams.
    #[serde(rename = "liveStreamingDetails")]
    pub live_streaming_details: Option<LiveStreamingDetails>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "channelId", default)]
    pub channel_id: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

/// Thumbnail images keyed by quality. Any of them may be missing.
#[derive(Debug, Default, Deserialize)]
pub struct Thumbnails {
    pub maxres: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub default: Option<Thumbnail>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Thumbnail {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LiveStreamingDetails {
    #[serde(rename = "scheduledStartTime")]
    pub scheduled_start_time: Option<String>,
    #[serde(rename = "actualStartTime")]
    pub actual_start_time: Option<String>,
    /// Only reported while the broadcast is live.
    #[serde(rename = "concurrentViewers")]
    pub concurrent_viewers: Option<String>,
}

impl Thumbnails {
    /// Picks the best available thumbnail: maxres, then high, medium, default.
    pub fn best_url(&self) -> &str {
        [&self.maxres, &self.high, &self.medium, &self.default]
            .into_iter()
            .flatten()
            .map(|t| t.url.as_str())
            .find(|url| !url.is_empty())
            .unwrap_or_default()
    }
}

/// The subset of a video this crate stores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoDetails {
    pub video_id: String,
    pub title: String,
    pub channel_id: String,
    pub thumbnail_url: String,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub concurrent_viewers: Option<i64>,
}

impl From<Video> for VideoDetails {
    fn from(video: Video) -> Self {
        let live = video.live_streaming_details.unwrap_or_default();
        Self {
            thumbnail_url: video.snippet.thumbnails.best_url().to_string(),
            video_id: video.id,
            title: video.snippet.title,
            channel_id: video.snippet.channel_id,
            scheduled_start_time: parse_timestamp(live.scheduled_start_time.as_deref()),
            actual_start_time: parse_timestamp(live.actual_start_time.as_deref()),
            concurrent_viewers: parse_count(live.concurrent_viewers.as_deref()),
        }
    }
}
