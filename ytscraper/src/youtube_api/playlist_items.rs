//! YouTube PlaylistItems API types.

use serde::Deserialize;

/// Response structure for the `playlistItems.list` API call.
///
/// Items of an uploads playlist come back newest first.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems/list>
#[derive(Debug, Default, Deserialize)]
pub struct PlaylistItemListResponse {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaylistItem {
    #[serde(rename = "contentDetails", default)]
    pub content_details: PlaylistItemContentDetails,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaylistItemContentDetails {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
    /// Missing for private or deleted videos that still sit in the playlist.
    #[serde(rename = "videoPublishedAt")]
    pub video_published_at: Option<String>,
}
