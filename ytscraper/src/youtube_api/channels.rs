//! YouTube Channels API types.

use crate::youtube_api::types::{non_empty, parse_count};
use serde::Deserialize;

/// Response structure for the `channels.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels/list>
#[derive(Debug, Default, Deserialize)]
pub struct ChannelListResponse {
    /// A list of channels that match the request criteria.
    ///
    /// Channels that do not exist (or are not visible) are simply left out.
    #[serde(default)]
    pub items: Vec<ChannelResource>,
}

/// A `channel` resource, restricted to the parts this crate requests.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#resource>
#[derive(Debug, Default, Deserialize)]
pub struct ChannelResource {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub snippet: ChannelSnippet,
    #[serde(default)]
    pub statistics: ChannelStatistics,
    #[serde(rename = "contentDetails", default)]
    pub content_details: ChannelContentDetails,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChannelSnippet {
    /// The country with which the channel is associated, if the owner set one.
    pub country: Option<String>,
}

/// Statistics about the channel.
///
/// The API sends counters as strings and omits `subscriberCount` when it is hidden.
#[derive(Debug, Default, Deserialize)]
pub struct ChannelStatistics {
    #[serde(rename = "subscriberCount")]
    pub subscriber_count: Option<String>,
    #[serde(rename = "viewCount")]
    pub view_count: Option<String>,
    #[serde(rename = "videoCount")]
    pub video_count: Option<String>,
    #[serde(rename = "hiddenSubscriberCount")]
    pub hidden_subscriber_count: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChannelContentDetails {
    #[serde(rename = "relatedPlaylists", default)]
    pub related_playlists: RelatedPlaylists,
}

#[derive(Debug, Default, Deserialize)]
pub struct RelatedPlaylists {
    /// The ID of the playlist that contains the channel's uploaded videos.
    #[serde(default)]
    pub uploads: String,
}

/// Channel-level metrics captured once per day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelStats {
    pub subscriber_count: Option<i64>,
    pub view_count: Option<i64>,
    pub video_count: Option<i64>,
    pub hidden_subscriber_count: Option<bool>,
    pub country: Option<String>,
}

/// Stats plus the uploads playlist for a single channel from a batched lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelInfo {
    pub channel_id: String,
    pub stats: ChannelStats,
    /// Empty when the API did not report an uploads playlist.
    pub uploads_playlist_id: String,
}

impl ChannelResource {
    pub(crate) fn stats(&self) -> ChannelStats {
        ChannelStats {
            subscriber_count: parse_count(self.statistics.subscriber_count.as_deref()),
            view_count: parse_count(self.statistics.view_count.as_deref()),
            video_count: parse_count(self.statistics.video_count.as_deref()),
            hidden_subscriber_count: self.statistics.hidden_subscriber_count,
            country: non_empty(self.snippet.country.clone()),
        }
    }
}

impl From<ChannelResource> for ChannelInfo {
    fn from(resource: ChannelResource) -> Self {
        Self {
            stats: resource.stats(),
            uploads_playlist_id: resource.content_details.related_playlists.uploads,
            channel_id: resource.id,
        }
    }
}
