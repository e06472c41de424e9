//! The once-a-day channel metrics snapshot.
//!
//! A run lists the active channels, drops those that already have a row for today (UTC),
//! looks up the rest in batches of [`MAX_IDS_PER_CALL`] and then, channel by channel, finds
//! the latest upload and livestream and upserts one row. Failures are counted per channel
//! and never abort the run; whatever succeeded stays written.

use super::schedule::{next_daily_run_utc, utc_midnight};
use super::{ChannelFailures, bounded, is_cancelled, pause};
use crate::config::{DailyStatsSettings, RecentLookup};
use crate::db::{Channel, ChannelRegistry, DailyStats, DailyStatsStore};
use crate::youtube_api::{ChannelStats, MAX_IDS_PER_CALL, RecentContent, SourceApi};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const TASK: &str = "daily stats";

/// Quota units per `search.list` call.
const SEARCH_LIST_COST: u64 = 100;

/// API calls made by one run, for the quota estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaUsage {
    pub channels_list: u64,
    pub playlist_items_list: u64,
    pub videos_list: u64,
    pub search_list: u64,
}

impl QuotaUsage {
    pub fn estimated_units(&self) -> u64 {
        self.channels_list
            + self.playlist_items_list
            + self.videos_list
            + self.search_list * SEARCH_LIST_COST
    }
}

/// What a run without channel failures did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub active: usize,
    pub skipped: usize,
    pub written: usize,
    pub batches: usize,
    pub quota: QuotaUsage,
}

/// The daily snapshot and its scheduler.
#[derive(Clone)]
pub struct DailyStatsTask {
    registry: Arc<dyn ChannelRegistry>,
    store: Arc<dyn DailyStatsStore>,
    api: Arc<dyn SourceApi>,
    settings: DailyStatsSettings,
}

impl DailyStatsTask {
    pub fn new(
        registry: Arc<dyn ChannelRegistry>,
        store: Arc<dyn DailyStatsStore>,
        api: Arc<dyn SourceApi>,
        settings: DailyStatsSettings,
    ) -> Self {
        Self {
            registry,
            store,
            api,
            settings,
        }
    }

    /// Runs one snapshot for the current UTC day.
    pub async fn run_once(&self, cancel: &CancellationToken) -> eyre::Result<RunSummary> {
        self.run_at(Utc::now(), cancel).await
    }

    /// Runs one snapshot as if started at `now`.
    ///
    /// Fails with [`ChannelFailures`] if any channel could not be written, and with
    /// [`super::Cancelled`] if `cancel` trips mid-run.
    pub async fn run_at(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> eyre::Result<RunSummary> {
        let day = utc_midnight(now);
        let limit = self.settings.call_timeout;

        let channels = bounded(
            "list active channels",
            limit,
            self.registry.list_active_channels(),
        )
        .await?;
        if channels.is_empty() {
            tracing::info!("no active channels in yt.youtube_channels");
            return Ok(RunSummary::default());
        }

        let existing = bounded(
            "list existing daily stats",
            limit,
            self.store.existing_daily_stats_channel_ids(day),
        )
        .await?;

        let mut summary = RunSummary {
            active: channels.len(),
            ..RunSummary::default()
        };
        let to_process: Vec<&Channel> = channels
            .iter()
            .filter(|ch| {
                let done = existing.contains(&ch.youtube_channel_id);
                if done {
                    tracing::debug!(
                        channel = %ch.youtube_channel_id,
                        day = %day.date_naive(),
                        "skipping channel that already has stats for today"
                    );
                }
                !done
            })
            .collect();
        summary.skipped = channels.len() - to_process.len();

        if to_process.is_empty() {
            tracing::info!(day = %day.date_naive(), "all active channels already have stats");
            return Ok(summary);
        }
        if let Some(limit) = self.settings.quota_daily_limit {
            tracing::info!(units = limit, "quota limit configured");
        }

        let total = to_process.len();
        let mut failed = 0;
        for (batch_index, batch) in to_process.chunks(MAX_IDS_PER_CALL).enumerate() {
            if cancel.is_cancelled() {
                return Err(super::Cancelled.into());
            }
            let batch_start = batch_index * MAX_IDS_PER_CALL;
            tracing::info!(
                "batch {}-{} of {} channels",
                batch_start + 1,
                batch_start + batch.len(),
                total
            );
            summary.batches += 1;

            let ids: Vec<String> = batch
                .iter()
                .map(|ch| ch.youtube_channel_id.clone())
                .collect();
            summary.quota.channels_list += 1;
            let infos = match self.api.fetch_channel_infos(&ids).await {
                Ok(infos) => infos,
                Err(e) => {
                    failed += batch.len();
                    tracing::warn!(error = %e, channels = batch.len(), "channel batch lookup failed");
                    continue;
                }
            };

            for (i, ch) in batch.iter().enumerate() {
                if cancel.is_cancelled() {
                    return Err(super::Cancelled.into());
                }
                let position = batch_start + i + 1;
                let channel_id = ch.youtube_channel_id.as_str();

                let Some(info) = infos.get(channel_id) else {
                    failed += 1;
                    tracing::warn!(channel = %channel_id, "channel missing from batch response");
                    continue;
                };

                let recent = match self.settings.recent_lookup {
                    RecentLookup::Uploads => {
                        summary.quota.playlist_items_list += 1;
                        summary.quota.videos_list += 1;
                        self.api
                            .fetch_recent_from_uploads(
                                &info.uploads_playlist_id,
                                self.settings.uploads_lookback,
                            )
                            .await
                    }
                    RecentLookup::Search => {
                        summary.quota.search_list += 2;
                        self.api.fetch_recent_via_search(channel_id).await
                    }
                };
                let recent = match recent {
                    Ok(recent) => recent,
                    Err(e) => {
                        failed += 1;
                        tracing::warn!(channel = %channel_id, error = %e, "recent content lookup failed");
                        continue;
                    }
                };

                let row = daily_row(day, now, channel_id, &info.stats, recent);
                if let Err(e) = bounded(
                    "upsert daily stats",
                    limit,
                    self.store.upsert_daily_stats(&row),
                )
                .await
                {
                    failed += 1;
                    tracing::warn!(channel = %channel_id, error = %format_args!("{e:#}"), "upsert failed");
                    continue;
                }
                summary.written += 1;

                if self.settings.log_stats {
                    tracing::info!(
                        channel = %channel_id,
                        subscribers = ?row.subscriber_count,
                        views = ?row.view_count,
                        videos = ?row.video_count,
                        hidden_subscribers = ?row.hidden_subscriber_count,
                        country = ?row.country,
                        last_upload = ?row.last_upload_video_id,
                        last_upload_at = ?row.last_upload_at,
                        last_live = ?row.last_live_video_id,
                        last_live_at = ?row.last_live_at,
                        "channel stats"
                    );
                }
                tracing::info!(
                    channel = %channel_id,
                    subscribers = ?row.subscriber_count,
                    views = ?row.view_count,
                    videos = ?row.video_count,
                    "ok ({position}/{total})"
                );

                if position < total {
                    pause(self.settings.request_delay, cancel).await?;
                }
            }
        }

        if failed > 0 {
            return Err(ChannelFailures {
                task: TASK,
                failed,
                total: channels.len(),
            }
            .into());
        }

        let quota = summary.quota;
        tracing::info!(
            units = quota.estimated_units(),
            channels_list = quota.channels_list,
            playlist_items_list = quota.playlist_items_list,
            videos_list = quota.videos_list,
            search_list = quota.search_list,
            "estimated quota used this run"
        );
        Ok(summary)
    }

    /// Runs a snapshot now, then once a day at the configured UTC time, until cancelled.
    pub async fn run_scheduler(&self, cancel: CancellationToken) {
        tracing::info!("running daily stats immediately on startup");
        log_outcome("startup", self.run_once(&cancel).await);

        loop {
            let now = Utc::now();
            let next = next_daily_run_utc(
                now,
                self.settings.run_at_hour,
                self.settings.run_at_minute,
            );
            let wait = (next - now).to_std().unwrap_or_default();
            tracing::info!(
                next = %next.to_rfc3339(),
                wait_secs = wait.as_secs(),
                "next daily stats run scheduled"
            );

            if pause(wait, &cancel).await.is_err() {
                tracing::info!("daily stats scheduler stopped");
                return;
            }

            tracing::info!("starting scheduled daily stats run");
            log_outcome("scheduled", self.run_once(&cancel).await);
        }
    }
}

/// Spawns [`DailyStatsTask::run_scheduler`] onto the runtime.
pub fn spawn_daily_stats_task(
    task: DailyStatsTask,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move { task.run_scheduler(cancel).await })
}

fn log_outcome(run: &'static str, result: eyre::Result<RunSummary>) {
    if is_cancelled(&result) {
        tracing::info!(run, "daily stats run cancelled");
        return;
    }
    match result {
        Ok(summary) => tracing::debug!(run, ?summary, "daily stats run finished"),
        Err(e) => tracing::error!(run, error = %format_args!("{e:#}"), "daily stats run failed"),
    }
}

fn daily_row(
    day: DateTime<Utc>,
    scraped_at: DateTime<Utc>,
    channel_id: &str,
    stats: &ChannelStats,
    recent: RecentContent,
) -> DailyStats {
    let (last_upload_at, last_upload_video_id) = match recent.last_upload {
        Some(p) => (Some(p.at), Some(p.video_id)),
        None => (None, None),
    };
    let (last_live_at, last_live_video_id) = match recent.last_live {
        Some(p) => (Some(p.at), Some(p.video_id)),
        None => (None, None),
    };

    DailyStats {
        time: day,
        youtube_channel_id: channel_id.to_string(),
        subscriber_count: stats.subscriber_count,
        view_count: stats.view_count,
        video_count: stats.video_count,
        hidden_subscriber_count: stats.hidden_subscriber_count,
        last_upload_at,
        last_upload_video_id,
        last_live_at,
        last_live_video_id,
        country: stats.country.clone(),
        scraped_at,
    }
}
