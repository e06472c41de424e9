//! PostgreSQL access: the channel registry and the daily stats time series.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::Context;
use sqlx::PgPool;
use sqlx::Row;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

/// A tracked channel from `yt.youtube_channels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub youtube_channel_id: String,
    pub name: String,
    pub symbol: Option<String>,
    pub icon: Option<String>,
}

/// One row of `yt.youtube_channel_daily_stats`, keyed by (channel, UTC day).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyStats {
    /// UTC midnight of the day the stats belong to.
    pub time: DateTime<Utc>,
    pub youtube_channel_id: String,

    pub subscriber_count: Option<i64>,
    pub view_count: Option<i64>,
    pub video_count: Option<i64>,
    pub hidden_subscriber_count: Option<bool>,

    pub last_upload_at: Option<DateTime<Utc>>,
    pub last_upload_video_id: Option<String>,
    pub last_live_at: Option<DateTime<Utc>>,
    pub last_live_video_id: Option<String>,

    pub country: Option<String>,

    pub scraped_at: DateTime<Utc>,
}

/// Read access to the set of tracked channels.
#[async_trait]
pub trait ChannelRegistry: Send + Sync {
    /// All active channels, ordered by name.
    async fn list_active_channels(&self) -> eyre::Result<Vec<Channel>>;
}

/// The time-series sink of the daily snapshot.
#[async_trait]
pub trait DailyStatsStore: Send + Sync {
    /// Ids of the channels that already have a row for `day`.
    async fn existing_daily_stats_channel_ids(
        &self,
        day: DateTime<Utc>,
    ) -> eyre::Result<HashSet<String>>;

    /// Inserts the row, or overwrites every field of the existing row for the same
    /// (channel, day).
    async fn upsert_daily_stats(&self, stats: &DailyStats) -> eyre::Result<()>;
}

/// [`ChannelRegistry`] and [`DailyStatsStore`] backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registers a channel, or updates and re-activates an existing one.
    pub async fn upsert_channel(&self, channel: &Channel) -> eyre::Result<()> {
        sqlx::query(
            "INSERT INTO yt.youtube_channels ( \
                youtube_channel_id, name, symbol, icon, is_active, updated_at \
             ) VALUES ($1, $2, $3, $4, TRUE, now()) \
             ON CONFLICT (youtube_channel_id) DO UPDATE SET \
                name = EXCLUDED.name, \
                symbol = EXCLUDED.symbol, \
                icon = EXCLUDED.icon, \
                is_active = TRUE, \
                updated_at = now()",
        )
        .bind(&channel.youtube_channel_id)
        .bind(&channel.name)
        .bind(&channel.symbol)
        .bind(&channel.icon)
        .execute(&self.pool)
        .await
        .with_context(|| format!("upsert channel (id={})", channel.youtube_channel_id))?;
        Ok(())
    }

    /// Creates the `yt` schema and its tables if they do not exist yet.
    pub async fn apply_schema(&self) -> eyre::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("apply database migrations")
    }
}

/// Connects to PostgreSQL.
///
/// A `schema` query parameter on the URL is not understood by the server; it is removed and
/// applied as the connection's `search_path` instead.
pub async fn connect(database_url: &str, acquire_timeout: Duration) -> eyre::Result<PgPool> {
    let (database_url, schema) = normalize_database_url(database_url);
    let mut options =
        PgConnectOptions::from_str(&database_url).context("parse DATABASE_URL")?;
    if let Some(schema) = schema {
        options = options.options([("search_path", schema)]);
    }

    PgPoolOptions::new()
        .acquire_timeout(acquire_timeout)
        .connect_with(options)
        .await
        .context("connect to PostgreSQL")
}

/// Splits a `schema=` query parameter off a database URL.
fn normalize_database_url(database_url: &str) -> (String, Option<String>) {
    let Ok(mut url) = url::Url::parse(database_url) else {
        return (database_url.to_string(), None);
    };
    let mut schema = None;
    let rest: Vec<(String, String)> = url
        .query_pairs()
        .filter_map(|(k, v)| {
            if k == "schema" {
                schema = Some(v.into_owned());
                None
            } else {
                Some((k.into_owned(), v.into_owned()))
            }
        })
        .collect();
    let Some(schema) = schema.filter(|s| !s.is_empty()) else {
        return (database_url.to_string(), None);
    };

    if rest.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(rest);
    }
    (url.to_string(), Some(schema))
}

#[async_trait]
impl ChannelRegistry for PgStore {
    async fn list_active_channels(&self) -> eyre::Result<Vec<Channel>> {
        let rows = sqlx::query(
            "SELECT youtube_channel_id, name, symbol, icon \
             FROM yt.youtube_channels \
             WHERE is_active = true \
             ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("query active channels")?;

        rows.iter()
            .map(|row| -> Result<Channel, sqlx::Error> {
                Ok(Channel {
                    youtube_channel_id: row.try_get("youtube_channel_id")?,
                    name: row.try_get("name")?,
                    symbol: row.try_get("symbol")?,
                    icon: row.try_get("icon")?,
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .context("scan channel")
    }
}

#[async_trait]
impl DailyStatsStore for PgStore {
    async fn existing_daily_stats_channel_ids(
        &self,
        day: DateTime<Utc>,
    ) -> eyre::Result<HashSet<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT youtube_channel_id \
             FROM yt.youtube_channel_daily_stats \
             WHERE time = $1",
        )
        .bind(day)
        .fetch_all(&self.pool)
        .await
        .context("query existing daily stats ids")?;

        Ok(ids.into_iter().collect())
    }

    async fn upsert_daily_stats(&self, s: &DailyStats) -> eyre::Result<()> {
        sqlx::query(
            "INSERT INTO yt.youtube_channel_daily_stats ( \
                time, youtube_channel_id, \
                subscriber_count, view_count, video_count, hidden_subscriber_count, \
                last_upload_at, last_upload_video_id, last_live_at, last_live_video_id, \
                country, scraped_at \
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (youtube_channel_id, time) DO UPDATE SET \
                subscriber_count = EXCLUDED.subscriber_count, \
                view_count = EXCLUDED.view_count, \
                video_count = EXCLUDED.video_count, \
                hidden_subscriber_count = EXCLUDED.hidden_subscriber_count, \
                last_upload_at = EXCLUDED.last_upload_at, \
                last_upload_video_id = EXCLUDED.last_upload_video_id, \
                last_live_at = EXCLUDED.last_live_at, \
                last_live_video_id = EXCLUDED.last_live_video_id, \
                country = EXCLUDED.country, \
                scraped_at = EXCLUDED.scraped_at",
        )
        .bind(s.time)
        .bind(&s.youtube_channel_id)
        .bind(s.subscriber_count)
        .bind(s.view_count)
        .bind(s.video_count)
        .bind(s.hidden_subscriber_count)
        .bind(s.last_upload_at)
        .bind(&s.last_upload_video_id)
        .bind(s.last_live_at)
        .bind(&s.last_live_video_id)
        .bind(&s.country)
        .bind(s.scraped_at)
        .execute(&self.pool)
        .await
        .with_context(|| {
            format!(
                "upsert stats (channel={} time={})",
                s.youtube_channel_id,
                s.time.to_rfc3339()
            )
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_param_becomes_search_path() {
        let (url, schema) =
            normalize_database_url("postgres://u:p@db:5432/app?schema=yt&sslmode=disable");
        assert_eq!(url, "postgres://u:p@db:5432/app?sslmode=disable");
        assert_eq!(schema.as_deref(), Some("yt"));

        let (url, schema) = normalize_database_url("postgres://u:p@db:5432/app?schema=yt");
        assert_eq!(url, "postgres://u:p@db:5432/app");
        assert_eq!(schema.as_deref(), Some("yt"));
    }

    #[test]
    fn urls_without_schema_are_untouched() {
        let original = "postgres://u:p@db:5432/app?sslmode=require";
        assert_eq!(normalize_database_url(original), (original.to_string(), None));

        let empty = "postgres://u:p@db/app?schema=";
        assert_eq!(normalize_database_url(empty), (empty.to_string(), None));

        assert_eq!(
            normalize_database_url("not a url"),
            ("not a url".to_string(), None)
        );
    }
}
