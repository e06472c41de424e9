//! In-memory stand-ins for the registry, the sinks and the source API.

use crate::db::{Channel, ChannelRegistry, DailyStats, DailyStatsStore};
use crate::livestreams::{ReconcilePlan, Stream, StreamCache};
use crate::youtube_api::{
    ApiError, ChannelInfo, EventType, RecentContent, SourceApi, VideoDetails,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub(crate) fn channel(id: &str) -> Channel {
    Channel {
        youtube_channel_id: id.to_string(),
        name: format!("Channel {id}"),
        symbol: None,
        icon: None,
    }
}

pub(crate) fn api_failure(endpoint: &'static str) -> ApiError {
    ApiError::Malformed {
        endpoint,
        detail: "injected failure".to_string(),
    }
}

#[derive(Default)]
pub(crate) struct FakeRegistry {
    pub channels: Vec<Channel>,
}

#[async_trait]
impl ChannelRegistry for FakeRegistry {
    async fn list_active_channels(&self) -> eyre::Result<Vec<Channel>> {
        Ok(self.channels.clone())
    }
}

/// Rows keyed by (channel, day), like the real table's primary key.
#[derive(Default)]
pub(crate) struct FakeStatsStore {
    pub rows: Mutex<BTreeMap<(String, DateTime<Utc>), DailyStats>>,
    pub upserts: Mutex<usize>,
    pub fail_upsert_for: HashSet<String>,
}

impl FakeStatsStore {
    pub fn row(&self, channel_id: &str) -> Option<DailyStats> {
        let rows = self.rows.lock().unwrap();
        rows.iter()
            .find(|((id, _), _)| id == channel_id)
            .map(|(_, row)| row.clone())
    }

    pub fn upsert_count(&self) -> usize {
        *self.upserts.lock().unwrap()
    }
}

#[async_trait]
impl DailyStatsStore for FakeStatsStore {
    async fn existing_daily_stats_channel_ids(
        &self,
        day: DateTime<Utc>,
    ) -> eyre::Result<HashSet<String>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .keys()
            .filter(|(_, time)| *time == day)
            .map(|(id, _)| id.clone())
            .collect())
    }

    async fn upsert_daily_stats(&self, stats: &DailyStats) -> eyre::Result<()> {
        if self.fail_upsert_for.contains(&stats.youtube_channel_id) {
            eyre::bail!("injected upsert failure");
        }
        *self.upserts.lock().unwrap() += 1;
        self.rows.lock().unwrap().insert(
            (stats.youtube_channel_id.clone(), stats.time),
            stats.clone(),
        );
        Ok(())
    }
}

/// Canned source API responses plus a log of the calls made.
#[derive(Default)]
pub(crate) struct FakeApi {
    pub infos: HashMap<String, ChannelInfo>,
    pub fail_infos: bool,
    /// Recent content by uploads playlist id (uploads path) or channel id (search path).
    pub recent: HashMap<String, RecentContent>,
    pub fail_recent_for: HashSet<String>,
    pub live: HashMap<String, Vec<String>>,
    pub upcoming: HashMap<String, Vec<String>>,
    pub fail_search_for: HashSet<String>,
    pub videos: HashMap<String, VideoDetails>,
    /// Tripped by every `fetch_channel_infos` call, to interrupt a run mid-way.
    pub cancel_on_infos: Option<CancellationToken>,

    pub info_batches: Mutex<Vec<Vec<String>>>,
    pub recent_calls: Mutex<Vec<String>>,
    pub video_calls: Mutex<Vec<Vec<String>>>,
}

impl FakeApi {
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.info_batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    fn recent_for(&self, key: &str) -> Result<RecentContent, ApiError> {
        self.recent_calls.lock().unwrap().push(key.to_string());
        if self.fail_recent_for.contains(key) {
            return Err(api_failure("playlistItems"));
        }
        Ok(self.recent.get(key).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl SourceApi for FakeApi {
    async fn fetch_channel_infos(
        &self,
        channel_ids: &[String],
    ) -> Result<HashMap<String, ChannelInfo>, ApiError> {
        self.info_batches.lock().unwrap().push(channel_ids.to_vec());
        if let Some(cancel) = &self.cancel_on_infos {
            cancel.cancel();
        }
        if self.fail_infos {
            return Err(api_failure("channels"));
        }
        Ok(channel_ids
            .iter()
            .filter_map(|id| Some((id.clone(), self.infos.get(id)?.clone())))
            .collect())
    }

    async fn fetch_recent_from_uploads(
        &self,
        uploads_playlist_id: &str,
        _lookback: u32,
    ) -> Result<RecentContent, ApiError> {
        self.recent_for(uploads_playlist_id)
    }

    async fn fetch_recent_via_search(&self, channel_id: &str) -> Result<RecentContent, ApiError> {
        self.recent_for(channel_id)
    }

    async fn search_event_video_ids(
        &self,
        channel_id: &str,
        event_type: EventType,
        max_results: u32,
    ) -> Result<Vec<String>, ApiError> {
        if self.fail_search_for.contains(channel_id) {
            return Err(api_failure("search"));
        }
        let ids = match event_type {
            EventType::Live => self.live.get(channel_id),
            EventType::Upcoming => self.upcoming.get(channel_id),
            EventType::Completed => None,
        };
        Ok(ids
            .into_iter()
            .flatten()
            .take(max_results as usize)
            .cloned()
            .collect())
    }

    async fn fetch_videos(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>, ApiError> {
        self.video_calls.lock().unwrap().push(video_ids.to_vec());
        Ok(video_ids
            .iter()
            .filter_map(|id| self.videos.get(id).cloned())
            .collect())
    }
}

/// A cache that applies [`ReconcilePlan`]s to in-memory hashes.
#[derive(Default)]
pub(crate) struct FakeCache {
    pub hashes: Mutex<HashMap<String, BTreeMap<String, String>>>,
    pub fail_for: HashSet<String>,
}

impl FakeCache {
    pub fn seed(&self, channel_id: &str, fields: &[(&str, &str)]) {
        self.hashes.lock().unwrap().insert(
            channel_id.to_string(),
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
    }

    pub fn streams(&self, channel_id: &str) -> BTreeMap<String, Stream> {
        let hashes = self.hashes.lock().unwrap();
        hashes
            .get(channel_id)
            .into_iter()
            .flatten()
            .map(|(k, v)| (k.clone(), serde_json::from_str(v).unwrap()))
            .collect()
    }

    pub fn raw(&self, channel_id: &str) -> BTreeMap<String, String> {
        self.hashes
            .lock()
            .unwrap()
            .get(channel_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl StreamCache for FakeCache {
    async fn replace_channel_streams(
        &self,
        channel_id: &str,
        streams: &[Stream],
    ) -> eyre::Result<()> {
        if self.fail_for.contains(channel_id) {
            eyre::bail!("injected cache failure");
        }
        let mut hashes = self.hashes.lock().unwrap();
        let hash = hashes.entry(channel_id.to_string()).or_default();
        let existing: Vec<String> = hash.keys().cloned().collect();
        let plan = ReconcilePlan::new(&existing, streams)?;
        for field in plan.deletes {
            hash.remove(&field);
        }
        hash.extend(plan.upserts);
        Ok(())
    }
}
