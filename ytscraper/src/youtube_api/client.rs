//! Core YouTube Data API client functionality.

use crate::youtube_api::channels::{ChannelInfo, ChannelListResponse, ChannelStats};
use crate::youtube_api::error::ApiError;
use crate::youtube_api::playlist_items::PlaylistItemListResponse;
use crate::youtube_api::search::{EventType, SearchListResponse};
use crate::youtube_api::types::{RecentContent, RecentPointer, parse_timestamp};
use crate::youtube_api::videos::{VideoDetails, VideoListResponse};
use eyre::Context;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::instrument;

/// Production endpoint of the YouTube Data API v3.
pub const API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Largest number of ids `channels.list` and `videos.list` accept in one call.
pub const MAX_IDS_PER_CALL: usize = 50;

/// Uploads lookback used when the caller passes zero.
const DEFAULT_UPLOADS_LOOKBACK: u32 = 8;

/// Search result cap used when the caller passes zero.
const DEFAULT_SEARCH_RESULTS: u32 = 5;

/// Client for the public (API-key authenticated) parts of the YouTube Data API v3.
///
/// The client is stateless apart from its credential and the underlying connection pool,
/// so it is cheap to clone and safe to share between tasks. Every request is bounded by
/// the timeout configured on the HTTP client.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl YouTubeClient {
    /// Creates a client whose requests time out after `timeout`.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> eyre::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client for YouTube API")?;
        Ok(Self::with_http_client(api_key, client))
    }

    /// Creates a client on top of an existing HTTP client.
    pub fn with_http_client(api_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: API_BASE_URL.to_string(),
            client,
        }
    }

    /// Points the client at a different API root (used against local stubs).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Issues a GET against `endpoint` and decodes the JSON body.
    ///
    /// Non-2xx responses become [`ApiError::Status`] carrying the response body, so that
    /// callers can inspect the Google error `reason`.
    #[instrument(skip(self, query_params), level = tracing::Level::TRACE)]
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query_params: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        if self.api_key.is_empty() {
            return Err(ApiError::MissingApiKey);
        }

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);
        let response = self
            .client
            .get(&url)
            .query(query_params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ApiError::from_transport(endpoint, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_transport(endpoint, e))?;

        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint,
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        serde_json::from_slice(&body).map_err(|source| ApiError::Decode { endpoint, source })
    }

    /// Fetches stats and the uploads playlist for up to 50 channels in one `channels.list`
    /// call.
    ///
    /// Channels the API does not return are absent from the map. Callers must treat an id
    /// they asked for but did not get back as a failure of their own.
    ///
    /// # API Cost
    ///
    /// 1 quota unit.
    #[instrument(
        skip(self, channel_ids),
        fields(count = channel_ids.len()),
        err(level = tracing::Level::WARN)
    )]
    pub async fn fetch_channel_infos(
        &self,
        channel_ids: &[String],
    ) -> Result<HashMap<String, ChannelInfo>, ApiError> {
        if channel_ids.is_empty() {
            return Ok(HashMap::new());
        }
        if channel_ids.len() > MAX_IDS_PER_CALL {
            return Err(ApiError::TooManyIds {
                endpoint: "channels",
                max: MAX_IDS_PER_CALL,
                got: channel_ids.len(),
            });
        }

        let ids = channel_ids.join(",");
        let query_params = [
            ("part", "statistics,snippet,contentDetails"),
            ("id", ids.as_str()),
        ];
        let response: ChannelListResponse = self.get_json("channels", &query_params).await?;

        let infos: HashMap<_, _> = response
            .items
            .into_iter()
            .filter(|item| !item.id.is_empty())
            .map(|item| (item.id.clone(), ChannelInfo::from(item)))
            .collect();

        tracing::debug!(
            requested = channel_ids.len(),
            returned = infos.len(),
            "fetched channel infos"
        );

        Ok(infos)
    }

    /// Fetches the stats of a single channel.
    ///
    /// Unlike [`Self::fetch_channel_infos`], a channel missing from the response is an
    /// [`ApiError::NotFound`].
    #[instrument(skip(self), err(level = tracing::Level::WARN))]
    pub async fn fetch_channel_stats(&self, channel_id: &str) -> Result<ChannelStats, ApiError> {
        let query_params = [("part", "statistics,snippet"), ("id", channel_id)];
        let response: ChannelListResponse = self.get_json("channels", &query_params).await?;

        response
            .items
            .first()
            .map(|item| item.stats())
            .ok_or_else(|| ApiError::NotFound {
                resource: "channel",
                id: channel_id.to_string(),
            })
    }

    /// Finds the latest upload and the latest livestream through a channel's uploads
    /// playlist.
    ///
    /// Reads up to `lookback` of the newest playlist items; the first usable item is the last
    /// upload. All of them are then looked up with `videos.list`, and the one with the latest
    /// actual start time is the last livestream, which need not be the newest upload.
    ///
    /// Returns an empty [`RecentContent`] when the playlist id is empty, the playlist holds no
    /// usable items, or the API says the playlist does not exist.
    ///
    /// # API Cost
    ///
    /// 1 unit for `playlistItems.list` plus 1 unit for `videos.list`, much cheaper than the
    /// 200 units of [`Self::fetch_recent_via_search`].
    #[instrument(skip(self), err(level = tracing::Level::WARN))]
    pub async fn fetch_recent_from_uploads(
        &self,
        uploads_playlist_id: &str,
        lookback: u32,
    ) -> Result<RecentContent, ApiError> {
        if uploads_playlist_id.is_empty() {
            return Ok(RecentContent::default());
        }
        let lookback = match lookback {
            0 => DEFAULT_UPLOADS_LOOKBACK,
            n => n.min(MAX_IDS_PER_CALL as u32),
        };

        let max_results = lookback.to_string();
        let query_params = [
            ("part", "contentDetails"),
            ("playlistId", uploads_playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        let response: PlaylistItemListResponse =
            match self.get_json("playlistItems", &query_params).await {
                Ok(response) => response,
                Err(e) if e.is_playlist_not_found() => {
                    tracing::debug!(playlist = %uploads_playlist_id, "uploads playlist not found");
                    return Ok(RecentContent::default());
                }
                Err(e) => return Err(e),
            };

        // newest first, as returned by the API
        let uploads: Vec<RecentPointer> = response
            .items
            .into_iter()
            .filter_map(|item| {
                let details = item.content_details;
                let video_id = details.video_id.filter(|id| !id.is_empty())?;
                let at = parse_timestamp(details.video_published_at.as_deref())?;
                Some(RecentPointer {
                    video_id,
                    at,
                    is_live_stream: false,
                })
            })
            .collect();

        let Some(last_upload) = uploads.first().cloned() else {
            return Ok(RecentContent::default());
        };

        let ids: Vec<String> = uploads.iter().map(|u| u.video_id.clone()).collect();
        let videos = self.fetch_videos(&ids).await?;
        let actual_starts: HashMap<&str, _> = videos
            .iter()
            .filter_map(|v| Some((v.video_id.as_str(), v.actual_start_time?)))
            .collect();

        let mut last_live: Option<RecentPointer> = None;
        for upload in &uploads {
            let Some(&started) = actual_starts.get(upload.video_id.as_str()) else {
                continue;
            };
            if last_live.as_ref().is_none_or(|best| started > best.at) {
                last_live = Some(RecentPointer {
                    video_id: upload.video_id.clone(),
                    at: started,
                    is_live_stream: true,
                });
            }
        }

        Ok(RecentContent {
            last_upload: Some(last_upload),
            last_live,
        })
    }

    /// Finds the latest upload and the latest completed livestream with `search.list`.
    ///
    /// The newest search hit wins in both cases, and the pointer time is the search
    /// snippet's publish time.
    ///
    /// # API Cost
    ///
    /// 200 quota units (two searches).
    #[instrument(skip(self), err(level = tracing::Level::WARN))]
    pub async fn fetch_recent_via_search(
        &self,
        channel_id: &str,
    ) -> Result<RecentContent, ApiError> {
        let last_upload = self.search_latest(channel_id, None).await?;
        let last_live = self
            .search_latest(channel_id, Some(EventType::Completed))
            .await?
            .map(|pointer| RecentPointer {
                is_live_stream: true,
                ..pointer
            });
        Ok(RecentContent {
            last_upload,
            last_live,
        })
    }

    /// Returns the ids of a channel's videos with the given event type, newest first.
    ///
    /// # API Cost
    ///
    /// 100 quota units.
    #[instrument(skip(self), err(level = tracing::Level::WARN))]
    pub async fn search_event_video_ids(
        &self,
        channel_id: &str,
        event_type: EventType,
        max_results: u32,
    ) -> Result<Vec<String>, ApiError> {
        let max_results = match max_results {
            0 => DEFAULT_SEARCH_RESULTS,
            n => n,
        }
        .to_string();
        let query_params = [
            ("part", "id"),
            ("channelId", channel_id),
            ("maxResults", max_results.as_str()),
            ("order", "date"),
            ("type", "video"),
            ("eventType", event_type.as_str()),
        ];
        let response: SearchListResponse = self.get_json("search", &query_params).await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id.filter(|id| !id.is_empty()))
            .collect())
    }

    /// Fetches title, thumbnail and live-streaming details for up to 50 videos.
    ///
    /// Ids beyond the first 50 are ignored.
    ///
    /// # API Cost
    ///
    /// 1 quota unit.
    #[instrument(
        skip(self, video_ids),
        fields(count = video_ids.len()),
        err(level = tracing::Level::WARN)
    )]
    pub async fn fetch_videos(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>, ApiError> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }
        let video_ids = &video_ids[..video_ids.len().min(MAX_IDS_PER_CALL)];

        let ids = video_ids.join(",");
        let query_params = [("part", "snippet,liveStreamingDetails"), ("id", ids.as_str())];
        let response: VideoListResponse = self.get_json("videos", &query_params).await?;

        Ok(response
            .items
            .into_iter()
            .filter(|video| !video.id.is_empty())
            .map(VideoDetails::from)
            .collect())
    }

    async fn search_latest(
        &self,
        channel_id: &str,
        event_type: Option<EventType>,
    ) -> Result<Option<RecentPointer>, ApiError> {
        let mut query_params = vec![
            ("part", "snippet"),
            ("channelId", channel_id),
            ("maxResults", "1"),
            ("order", "date"),
            ("type", "video"),
        ];
        if let Some(event_type) = event_type {
            query_params.push(("eventType", event_type.as_str()));
        }
        let response: SearchListResponse = self.get_json("search", &query_params).await?;

        let Some(item) = response.items.into_iter().next() else {
            return Ok(None);
        };
        let video_id = item.id.video_id.unwrap_or_default();
        let published_at = item
            .snippet
            .and_then(|s| s.published_at)
            .unwrap_or_default();
        if video_id.is_empty() || published_at.is_empty() {
            return Ok(None);
        }

        let at = parse_timestamp(Some(published_at.as_str())).ok_or_else(|| ApiError::Malformed {
            endpoint: "search",
            detail: format!("unparseable publishedAt {published_at:?}"),
        })?;

        Ok(Some(RecentPointer {
            video_id,
            at,
            is_live_stream: false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube_api::stub::{CapturedLogs, StubApi, query_param};
    use chrono::{TimeZone, Utc};
    use hyper::StatusCode;
    use pretty_assertions::assert_eq;

    fn client(stub: &StubApi) -> YouTubeClient {
        YouTubeClient::new("test-key", Duration::from_secs(5))
            .unwrap()
            .with_base_url(stub.base_url())
    }

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("id{i}")).collect()
    }

    #[tokio::test]
    async fn channel_infos_leave_out_unknown_channels() {
        let stub = StubApi::start(|path, _| {
            assert_eq!(path, "/channels");
            (
                StatusCode::OK,
                r#"{"items": [
                    {"id": "UC1", "snippet": {"country": "JP"},
                     "statistics": {"subscriberCount": "10", "viewCount": "200", "videoCount": "3", "hiddenSubscriberCount": false},
                     "contentDetails": {"relatedPlaylists": {"uploads": "UU1"}}},
                    {"id": "UC2", "statistics": {}}
                ]}"#
                    .to_string(),
            )
        })
        .await;

        let infos = client(&stub)
            .fetch_channel_infos(&["UC1".into(), "UC2".into(), "UC3".into()])
            .await
            .unwrap();

        assert_eq!(infos.len(), 2);
        assert!(!infos.contains_key("UC3"));
        let uc1 = &infos["UC1"];
        assert_eq!(uc1.stats.subscriber_count, Some(10));
        assert_eq!(uc1.stats.country.as_deref(), Some("JP"));
        assert_eq!(uc1.uploads_playlist_id, "UU1");
        let uc2 = &infos["UC2"];
        assert_eq!(uc2.stats, ChannelStats::default());
        assert_eq!(uc2.uploads_playlist_id, "");

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(query_param(&requests[0], "id").as_deref(), Some("UC1,UC2,UC3"));
        assert_eq!(query_param(&requests[0], "key").as_deref(), Some("test-key"));
    }

    #[tokio::test]
    async fn channel_infos_reject_oversized_batches() {
        let stub = StubApi::start(|_, _| (StatusCode::OK, "{}".into())).await;
        let err = client(&stub)
            .fetch_channel_infos(&ids(51))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::TooManyIds { got: 51, .. }), "{err:?}");
        assert!(stub.requests().is_empty());
    }

    #[tokio::test]
    async fn single_channel_stats_not_found() {
        let stub = StubApi::start(|_, _| (StatusCode::OK, r#"{"items": []}"#.into())).await;
        let err = client(&stub).fetch_channel_stats("UCx").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn recent_from_empty_playlist_id_makes_no_calls() {
        let stub = StubApi::start(|_, _| (StatusCode::OK, "{}".into())).await;
        let recent = client(&stub).fetch_recent_from_uploads("", 25).await.unwrap();
        assert_eq!(recent, RecentContent::default());
        assert!(stub.requests().is_empty());
    }

    #[tokio::test]
    async fn recent_from_missing_playlist_is_empty() {
        let stub = StubApi::start(|_, _| {
            (
                StatusCode::NOT_FOUND,
                r#"{"error": {"code": 404, "errors": [{"reason": "playlistNotFound"}]}}"#.into(),
            )
        })
        .await;
        let recent = client(&stub)
            .fetch_recent_from_uploads("UUgone", 25)
            .await
            .unwrap();
        assert_eq!(recent, RecentContent::default());
    }

    #[tokio::test]
    async fn missing_playlist_is_not_logged_as_a_failure() {
        let stub = StubApi::start(|_, query| {
            if query.contains("playlistId=UUgone") {
                (
                    StatusCode::NOT_FOUND,
                    r#"{"error": {"code": 404, "errors": [{"reason": "playlistNotFound"}]}}"#.into(),
                )
            } else {
                (StatusCode::INTERNAL_SERVER_ERROR, "backend error".into())
            }
        })
        .await;
        let yt = client(&stub);
        let (logs, _guard) = CapturedLogs::install(tracing::Level::INFO);

        let recent = yt.fetch_recent_from_uploads("UUgone", 25).await.unwrap();
        assert_eq!(recent, RecentContent::default());
        let output = logs.contents();
        assert!(!output.contains("ERROR"), "{output}");
        assert!(!output.contains("WARN"), "{output}");

        // a real failure is reported once, at warn
        yt.fetch_recent_from_uploads("UUbroken", 25).await.unwrap_err();
        let output = logs.contents();
        assert_eq!(output.matches("WARN").count(), 1, "{output}");
        assert!(!output.contains("ERROR"), "{output}");
    }

    #[tokio::test]
    async fn last_live_is_latest_actual_start_not_newest_upload() {
        let stub = StubApi::start(|path, _| match path {
            "/playlistItems" => (
                StatusCode::OK,
                r#"{"items": [
                    {"contentDetails": {"videoId": "new", "videoPublishedAt": "2024-05-03T12:00:00Z"}},
                    {"contentDetails": {"videoId": "private"}},
                    {"contentDetails": {"videoId": "live-late", "videoPublishedAt": "2024-05-02T12:00:00Z"}},
                    {"contentDetails": {"videoId": "live-early", "videoPublishedAt": "2024-05-01T12:00:00Z"}}
                ]}"#
                .into(),
            ),
            "/videos" => (
                StatusCode::OK,
                r#"{"items": [
                    {"id": "new", "snippet": {"title": "upload"}},
                    {"id": "live-early", "snippet": {"title": "a"}, "liveStreamingDetails": {"actualStartTime": "2024-05-01T10:00:00Z"}},
                    {"id": "live-late", "snippet": {"title": "b"}, "liveStreamingDetails": {"actualStartTime": "2024-05-02T10:00:00Z"}}
                ]}"#
                .into(),
            ),
            other => panic!("unexpected path {other}"),
        })
        .await;

        let recent = client(&stub)
            .fetch_recent_from_uploads("UU1", 4)
            .await
            .unwrap();

        assert_eq!(
            recent,
            RecentContent {
                last_upload: Some(RecentPointer {
                    video_id: "new".into(),
                    at: Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap(),
                    is_live_stream: false,
                }),
                last_live: Some(RecentPointer {
                    video_id: "live-late".into(),
                    at: Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap(),
                    is_live_stream: true,
                }),
            }
        );

        let requests = stub.requests();
        assert_eq!(query_param(&requests[0], "maxResults").as_deref(), Some("4"));
        assert_eq!(
            query_param(&requests[1], "id").as_deref(),
            Some("new,live-late,live-early")
        );
    }

    #[tokio::test]
    async fn lookback_defaults_and_caps() {
        let stub = StubApi::start(|_, _| (StatusCode::OK, r#"{"items": []}"#.into())).await;
        let yt = client(&stub);
        yt.fetch_recent_from_uploads("UU1", 0).await.unwrap();
        yt.fetch_recent_from_uploads("UU1", 500).await.unwrap();
        let requests = stub.requests();
        assert_eq!(query_param(&requests[0], "maxResults").as_deref(), Some("8"));
        assert_eq!(query_param(&requests[1], "maxResults").as_deref(), Some("50"));
    }

    #[tokio::test]
    async fn search_preserves_upstream_order() {
        let stub = StubApi::start(|_, _| {
            (
                StatusCode::OK,
                r#"{"items": [
                    {"id": {"kind": "youtube#video", "videoId": "b"}},
                    {"id": {"kind": "youtube#channel"}},
                    {"id": {"videoId": "a"}},
                    {"id": {"videoId": "c"}}
                ]}"#
                .into(),
            )
        })
        .await;
        let found = client(&stub)
            .search_event_video_ids("UC1", EventType::Upcoming, 3)
            .await
            .unwrap();
        assert_eq!(found, vec!["b", "a", "c"]);

        let request = &stub.requests()[0];
        assert_eq!(query_param(request, "eventType").as_deref(), Some("upcoming"));
        assert_eq!(query_param(request, "order").as_deref(), Some("date"));
        assert_eq!(query_param(request, "maxResults").as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn fetch_videos_truncates_to_fifty_ids() {
        let stub = StubApi::start(|_, _| (StatusCode::OK, r#"{"items": []}"#.into())).await;
        let yt = client(&stub);
        assert!(yt.fetch_videos(&[]).await.unwrap().is_empty());
        assert!(stub.requests().is_empty());

        yt.fetch_videos(&ids(60)).await.unwrap();
        let requested = query_param(&stub.requests()[0], "id").unwrap();
        assert_eq!(requested.split(',').count(), 50);
        assert!(requested.ends_with("id49"));
    }

    #[tokio::test]
    async fn fetch_videos_reads_live_details() {
        let stub = StubApi::start(|_, _| {
            (
                StatusCode::OK,
                r#"{"items": [{
                    "id": "v1",
                    "snippet": {"title": "Live now", "channelId": "UC1",
                                "thumbnails": {"high": {"url": "https://i.ytimg.com/hq.jpg"}, "default": {"url": "https://i.ytimg.com/d.jpg"}}},
                    "liveStreamingDetails": {"scheduledStartTime": "2024-05-01T09:00:00Z", "actualStartTime": "2024-05-01T09:02:00Z", "concurrentViewers": "1234"}
                }]}"#
                .into(),
            )
        })
        .await;
        let videos = client(&stub).fetch_videos(&["v1".into()]).await.unwrap();
        assert_eq!(
            videos,
            vec![VideoDetails {
                video_id: "v1".into(),
                title: "Live now".into(),
                channel_id: "UC1".into(),
                thumbnail_url: "https://i.ytimg.com/hq.jpg".into(),
                scheduled_start_time: Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()),
                actual_start_time: Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 2, 0).unwrap()),
                concurrent_viewers: Some(1234),
            }]
        );
    }

    #[tokio::test]
    async fn error_kinds_are_distinguishable() {
        let stub = StubApi::start(|path, _| match path {
            "/search" => (StatusCode::SERVICE_UNAVAILABLE, "backend error".into()),
            "/videos" => (StatusCode::OK, "<html>not json</html>".into()),
            _ => (
                StatusCode::FORBIDDEN,
                r#"{"error": {"code": 403, "errors": [{"reason": "quotaExceeded"}]}}"#.into(),
            ),
        })
        .await;
        let yt = client(&stub);

        let err = yt
            .search_event_video_ids("UC1", EventType::Live, 3)
            .await
            .unwrap_err();
        assert!(err.is_transient(), "{err:?}");
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert!(err.to_string().contains("backend error"));

        let err = yt.fetch_videos(&["v1".into()]).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { endpoint: "videos", .. }), "{err:?}");

        let err = yt.fetch_channel_infos(&["UC1".into()]).await.unwrap_err();
        assert!(!err.is_transient());
        assert_eq!(err.reason().as_deref(), Some("quotaExceeded"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn slow_responses_time_out_as_transient() {
        let stub = StubApi::start(|path, _| match path {
            "/videos" => {
                std::thread::sleep(Duration::from_millis(1500));
                (StatusCode::OK, r#"{"items": []}"#.into())
            }
            _ => (StatusCode::NOT_FOUND, "no such endpoint".into()),
        })
        .await;
        let yt = YouTubeClient::new("test-key", Duration::from_millis(200))
            .unwrap()
            .with_base_url(stub.base_url());

        let err = yt.fetch_videos(&["v1".into()]).await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout { endpoint: "videos", .. }), "{err:?}");
        assert!(err.is_timeout());
        assert!(err.is_transient());
        assert_eq!(err.status(), None);

        let err = yt
            .search_event_video_ids("UC1", EventType::Live, 3)
            .await
            .unwrap_err();
        assert!(!err.is_timeout(), "{err:?}");
        assert!(!err.is_transient());
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_sending() {
        let stub = StubApi::start(|_, _| (StatusCode::OK, "{}".into())).await;
        let yt = YouTubeClient::new("", Duration::from_secs(5))
            .unwrap()
            .with_base_url(stub.base_url());
        let err = yt.fetch_videos(&["v1".into()]).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingApiKey));
        assert!(stub.requests().is_empty());
    }

    #[tokio::test]
    async fn recent_via_search_uses_completed_events_for_live() {
        let stub = StubApi::start(|_, query| {
            if query.contains("eventType=completed") {
                (
                    StatusCode::OK,
                    r#"{"items": [{"id": {"videoId": "stream"}, "snippet": {"publishedAt": "2024-04-30T20:00:00Z"}}]}"#.into(),
                )
            } else {
                (
                    StatusCode::OK,
                    r#"{"items": [{"id": {"videoId": "upload"}, "snippet": {"publishedAt": "2024-05-01T08:00:00Z"}}]}"#.into(),
                )
            }
        })
        .await;
        let recent = client(&stub).fetch_recent_via_search("UC1").await.unwrap();
        assert_eq!(recent.last_upload.unwrap().video_id, "upload");
        let live = recent.last_live.unwrap();
        assert_eq!(live.video_id, "stream");
        assert!(live.is_live_stream);
        assert_eq!(live.at, Utc.with_ymd_and_hms(2024, 4, 30, 20, 0, 0).unwrap());
    }
}
