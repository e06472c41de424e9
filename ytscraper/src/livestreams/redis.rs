use super::{ReconcilePlan, Stream, StreamCache};
use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, IntoConnectionInfo};
use async_trait::async_trait;
use eyre::Context;
use std::time::Duration;

/// How long a channel's streams survive without a successful poll.
///
/// Upcoming streams can be scheduled days ahead, so this is generous. Every write refreshes
/// it.
pub const STREAM_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Cache key holding all streams of one channel.
///
/// The `{...}` hash tag keeps every operation on a channel's key on the same Redis Cluster
/// slot.
pub fn key_for_channel(channel_id: &str) -> String {
    format!("nasfaq_livestreams:{{{channel_id}}}")
}

/// [`StreamCache`] backed by Redis hashes.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connects to Redis and checks the connection with a `PING`.
    ///
    /// `password`, if given, replaces whatever password the URL carries.
    pub async fn connect(
        redis_url: &str,
        password: Option<&str>,
        timeout: Duration,
    ) -> eyre::Result<Self> {
        let mut info = redis_url
            .into_connection_info()
            .context("parse REDIS_URL")?;
        if let Some(password) = password {
            info.redis.password = Some(password.to_string());
        }
        let client = ::redis::Client::open(info).context("create Redis client")?;

        let conn = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .context("connect to Redis timed out")?
            .context("connect to Redis")?;

        let mut ping = conn.clone();
        let _: String = tokio::time::timeout(timeout, ::redis::cmd("PING").query_async(&mut ping))
            .await
            .context("Redis PING timed out")?
            .context("Redis PING")?;

        Ok(Self { conn })
    }
}

/// A single MULTI/EXEC transaction applying `plan` to `key` and refreshing its expiry.
fn reconcile_pipeline(key: &str, plan: &ReconcilePlan) -> ::redis::Pipeline {
    let mut pipe = ::redis::pipe();
    pipe.atomic();
    // one field per HSET for servers that predate multi-field HSET
    for (field, payload) in &plan.upserts {
        pipe.hset(key, field, payload).ignore();
    }
    if !plan.deletes.is_empty() {
        pipe.hdel(key, &plan.deletes).ignore();
    }
    pipe.expire(key, STREAM_TTL.as_secs() as i64).ignore();
    pipe
}

#[async_trait]
impl StreamCache for RedisStore {
    async fn replace_channel_streams(
        &self,
        channel_id: &str,
        streams: &[Stream],
    ) -> eyre::Result<()> {
        let key = key_for_channel(channel_id);
        let mut conn = self.conn.clone();

        let existing: Vec<String> = conn
            .hkeys(&key)
            .await
            .with_context(|| format!("redis HKEYS {key}"))?;

        let plan = ReconcilePlan::new(&existing, streams)?;

        let () = reconcile_pipeline(&key, &plan)
            .query_async(&mut conn)
            .await
            .with_context(|| format!("redis pipeline exec {key}"))?;

        tracing::debug!(
            channel = %channel_id,
            written = plan.upserts.len(),
            deleted = plan.deletes.len(),
            "reconciled cached streams"
        );

        Ok(())
    }
}
