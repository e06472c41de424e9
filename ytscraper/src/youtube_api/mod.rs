//! YouTube Data API v3 client library.
//!
//! Only the public, API-key authenticated read endpoints are covered. They are the ones the
//! ingestion tasks need to snapshot channel metrics and to discover live and upcoming
//! streams:
//!
//! | Operation | Endpoint(s) | Quota units |
//! |---|---|---|
//! | [`YouTubeClient::fetch_channel_infos`] | `channels.list` | 1 |
//! | [`YouTubeClient::fetch_recent_from_uploads`] | `playlistItems.list` + `videos.list` | 2 |
//! | [`YouTubeClient::fetch_recent_via_search`] | 2 × `search.list` | 200 |
//! | [`YouTubeClient::search_event_video_ids`] | `search.list` | 100 |
//! | [`YouTubeClient::fetch_videos`] | `videos.list` | 1 |
//!
//! # Uploads playlist vs search
//!
//! Every channel has an "uploads" playlist listing its public videos newest first. Walking
//! that playlist is far cheaper than `search.list`, so the daily snapshot uses it by
//! default. The two paths pick their "last livestream" differently: the playlist path takes
//! the video with the latest actual start time among the most recent uploads, the search
//! path takes the newest completed event. They are kept separate rather than unified.
//!
//! # Errors
//!
//! All operations fail with an [`ApiError`], which keeps timeouts, transport failures,
//! non-2xx responses and undecodable bodies apart. Nothing here retries.

pub mod channels;
pub mod client;
pub mod error;
pub mod playlist_items;
pub mod search;
#[cfg(test)]
pub(crate) mod stub;
pub mod types;
pub mod videos;

pub use channels::{ChannelInfo, ChannelStats};
pub use client::{MAX_IDS_PER_CALL, YouTubeClient};
pub use error::ApiError;
pub use search::EventType;
pub use types::{RecentContent, RecentPointer};
pub use videos::VideoDetails;

use async_trait::async_trait;
use std::collections::HashMap;

/// The source-API operations the ingestion tasks depend on.
///
/// [`YouTubeClient`] is the production implementation; tests substitute in-memory fakes.
#[async_trait]
pub trait SourceApi: Send + Sync {
    async fn fetch_channel_infos(
        &self,
        channel_ids: &[String],
    ) -> Result<HashMap<String, ChannelInfo>, ApiError>;

    async fn fetch_recent_from_uploads(
        &self,
        uploads_playlist_id: &str,
        lookback: u32,
    ) -> Result<RecentContent, ApiError>;

    async fn fetch_recent_via_search(&self, channel_id: &str) -> Result<RecentContent, ApiError>;

    async fn search_event_video_ids(
        &self,
        channel_id: &str,
        event_type: EventType,
        max_results: u32,
    ) -> Result<Vec<String>, ApiError>;

    async fn fetch_videos(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>, ApiError>;
}

#[async_trait]
impl SourceApi for YouTubeClient {
    async fn fetch_channel_infos(
        &self,
        channel_ids: &[String],
    ) -> Result<HashMap<String, ChannelInfo>, ApiError> {
        YouTubeClient::fetch_channel_infos(self, channel_ids).await
    }

    async fn fetch_recent_from_uploads(
        &self,
        uploads_playlist_id: &str,
        lookback: u32,
    ) -> Result<RecentContent, ApiError> {
        YouTubeClient::fetch_recent_from_uploads(self, uploads_playlist_id, lookback).await
    }

    async fn fetch_recent_via_search(&self, channel_id: &str) -> Result<RecentContent, ApiError> {
        YouTubeClient::fetch_recent_via_search(self, channel_id).await
    }

    async fn search_event_video_ids(
        &self,
        channel_id: &str,
        event_type: EventType,
        max_results: u32,
    ) -> Result<Vec<String>, ApiError> {
        YouTubeClient::search_event_video_ids(self, channel_id, event_type, max_results).await
    }

    async fn fetch_videos(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>, ApiError> {
        YouTubeClient::fetch_videos(self, video_ids).await
    }
}
