//! The live/upcoming stream cache.
//!
//! Each channel owns one Redis hash holding one field per stream that the most recent poll
//! saw as live or upcoming. Every successful poll replaces the hash's field set wholesale,
//! so streams that ended or were cancelled disappear on the next poll.

pub mod redis;
pub mod types;

pub use self::redis::{RedisStore, STREAM_TTL, key_for_channel};
pub use types::{Stream, StreamStatus, watch_url};

use async_trait::async_trait;
use eyre::Context;
use std::collections::HashSet;

/// The cache sink of the livestream poller.
#[async_trait]
pub trait StreamCache: Send + Sync {
    /// Makes `streams` the exact set of streams cached for `channel_id` and refreshes the
    /// entry's expiry.
    async fn replace_channel_streams(
        &self,
        channel_id: &str,
        streams: &[Stream],
    ) -> eyre::Result<()>;
}

/// The writes that turn a channel's cached field set into a freshly observed one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// `(video id, serialized stream)` pairs to write, in observation order.
    pub upserts: Vec<(String, String)>,
    /// Cached video ids that are no longer live or upcoming.
    pub deletes: Vec<String>,
}

impl ReconcilePlan {
    /// Diffs the currently cached fields against the streams just observed.
    pub fn new(existing: &[String], streams: &[Stream]) -> eyre::Result<Self> {
        let keep: HashSet<&str> = streams.iter().map(|s| s.video_id.as_str()).collect();

        let upserts = streams
            .iter()
            .map(|s| -> eyre::Result<(String, String)> {
                let payload = serde_json::to_string(s)
                    .with_context(|| format!("marshal stream {}", s.video_id))?;
                Ok((s.video_id.clone(), payload))
            })
            .collect::<eyre::Result<_>>()?;

        let deletes = existing
            .iter()
            .filter(|field| !keep.contains(field.as_str()))
            .cloned()
            .collect();

        Ok(Self { upserts, deletes })
    }
}
