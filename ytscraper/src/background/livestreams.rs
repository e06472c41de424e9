//! Periodic discovery of live and upcoming streams.

use super::{ChannelFailures, bounded, is_cancelled, pause};
use crate::config::LivestreamSettings;
use crate::db::{Channel, ChannelRegistry};
use crate::livestreams::{Stream, StreamCache, StreamStatus, watch_url};
use crate::youtube_api::{EventType, SourceApi, VideoDetails};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

const TASK: &str = "livestream poll";

/// What a poll without channel failures found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub channels: usize,
    pub live: usize,
    pub upcoming: usize,
}

/// The livestream poller.
#[derive(Clone)]
pub struct LivestreamTask {
    registry: Arc<dyn ChannelRegistry>,
    api: Arc<dyn SourceApi>,
    cache: Arc<dyn StreamCache>,
    settings: LivestreamSettings,
}

impl LivestreamTask {
    pub fn new(
        registry: Arc<dyn ChannelRegistry>,
        api: Arc<dyn SourceApi>,
        cache: Arc<dyn StreamCache>,
        settings: LivestreamSettings,
    ) -> Self {
        Self {
            registry,
            api,
            cache,
            settings,
        }
    }

    pub async fn poll_once(&self, cancel: &CancellationToken) -> eyre::Result<PollSummary> {
        self.poll_at(Utc::now(), cancel).await
    }

    /// Polls every active channel once, stamping cached streams with `now`.
    ///
    /// Fails with [`ChannelFailures`] if any channel could not be refreshed; the cache
    /// entries of the other channels are still replaced.
    pub async fn poll_at(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> eyre::Result<PollSummary> {
        let limit = self.settings.call_timeout;
        let channels = bounded(
            "list active channels",
            limit,
            self.registry.list_active_channels(),
        )
        .await?;

        let mut summary = PollSummary {
            channels: channels.len(),
            ..PollSummary::default()
        };
        let total = channels.len();
        let mut failed = 0;
        for (i, ch) in channels.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(super::Cancelled.into());
            }
            let channel_id = ch.youtube_channel_id.as_str();

            let live_ids = match self
                .api
                .search_event_video_ids(channel_id, EventType::Live, self.settings.live_max_results)
                .await
            {
                Ok(ids) => ids,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(channel = %channel_id, error = %e, "live search failed");
                    continue;
                }
            };
            let upcoming_ids = match self
                .api
                .search_event_video_ids(
                    channel_id,
                    EventType::Upcoming,
                    self.settings.upcoming_max_results,
                )
                .await
            {
                Ok(ids) => ids,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(channel = %channel_id, error = %e, "upcoming search failed");
                    continue;
                }
            };

            let combined: Vec<String> = live_ids.iter().chain(&upcoming_ids).cloned().collect();
            let videos = match self.api.fetch_videos(&combined).await {
                Ok(videos) => videos,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(channel = %channel_id, error = %e, "video details lookup failed");
                    continue;
                }
            };

            let streams = build_streams(ch, &live_ids, videos, now);
            if let Err(e) = bounded(
                "replace cached streams",
                limit,
                self.cache.replace_channel_streams(channel_id, &streams),
            )
            .await
            {
                failed += 1;
                tracing::warn!(channel = %channel_id, error = %format_args!("{e:#}"), "cache update failed");
                continue;
            }

            summary.live += live_ids.len();
            summary.upcoming += upcoming_ids.len();
            tracing::info!(
                channel = %channel_id,
                live = live_ids.len(),
                upcoming = upcoming_ids.len(),
                "ok ({}/{})",
                i + 1,
                total
            );

            if i + 1 < total {
                pause(self.settings.request_delay, cancel).await?;
            }
        }

        if failed > 0 {
            return Err(ChannelFailures {
                task: TASK,
                failed,
                total,
            }
            .into());
        }
        Ok(summary)
    }

    /// Polls immediately and then every poll interval until cancelled.
    pub async fn run_poller(&self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.settings.poll_interval.as_secs(),
            "livestream polling enabled"
        );
        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("livestream poller stopped");
                    return;
                }
                _ = ticker.tick() => {}
            }

            let result = self.poll_once(&cancel).await;
            if is_cancelled(&result) {
                tracing::info!("livestream poll cancelled");
                continue;
            }
            match result {
                Ok(summary) => tracing::debug!(?summary, "livestream poll finished"),
                Err(e) => tracing::error!(error = %format_args!("{e:#}"), "livestream poll failed"),
            }
        }
    }
}

/// Spawns [`LivestreamTask::run_poller`] onto the runtime.
pub fn spawn_livestream_task(
    task: LivestreamTask,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move { task.run_poller(cancel).await })
}

/// Turns the videos found for `channel` into cache records.
///
/// A video is live if its id came back from the live search, otherwise upcoming.
pub fn build_streams(
    channel: &Channel,
    live_ids: &[String],
    videos: Vec<VideoDetails>,
    updated_at: DateTime<Utc>,
) -> Vec<Stream> {
    let live: HashSet<&str> = live_ids.iter().map(String::as_str).collect();
    let icon = channel.icon.clone().filter(|icon| !icon.is_empty());

    videos
        .into_iter()
        .map(|video| {
            let status = if live.contains(video.video_id.as_str()) {
                StreamStatus::Live
            } else {
                StreamStatus::Upcoming
            };
            Stream {
                video_url: watch_url(&video.video_id),
                video_id: video.video_id,
                status,
                title: video.title,
                thumbnail_url: video.thumbnail_url,
                channel_id: channel.youtube_channel_id.clone(),
                channel_name: channel.name.clone(),
                channel_icon: icon.clone(),
                scheduled_start_time: video.scheduled_start_time,
                actual_start_time: video.actual_start_time,
                concurrent_viewers: video.concurrent_viewers,
                updated_at,
            }
        })
        .collect()
}
