//! Process configuration, read from environment variables.

use eyre::Context;
use std::str::FromStr;
use std::time::Duration;

/// How the daily snapshot finds each channel's latest upload and livestream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecentLookup {
    /// Walk the uploads playlist (2 quota units per channel).
    #[default]
    Uploads,
    /// Use `search.list` (200 quota units per channel).
    Search,
}

impl FromStr for RecentLookup {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uploads" => Ok(RecentLookup::Uploads),
            "search" => Ok(RecentLookup::Search),
            other => eyre::bail!("expected `uploads` or `search`, got {other:?}"),
        }
    }
}

/// Settings of the daily stats snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyStatsSettings {
    pub run_at_hour: u32,
    pub run_at_minute: u32,
    /// Pause after each successfully processed channel.
    pub request_delay: Duration,
    /// Bound on every registry and sink call.
    pub call_timeout: Duration,
    pub uploads_lookback: u32,
    pub recent_lookup: RecentLookup,
    /// Informational only; logged at the start of each run, never enforced.
    pub quota_daily_limit: Option<u32>,
    pub log_stats: bool,
}

/// Settings of the livestream poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivestreamSettings {
    pub enabled: bool,
    pub poll_interval: Duration,
    pub live_max_results: u32,
    pub upcoming_max_results: u32,
    /// Pause after each successfully polled channel.
    pub request_delay: Duration,
    /// Bound on every registry and sink call.
    pub call_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub redis_password: Option<String>,
    pub youtube_api_key: String,
    /// Bound on every YouTube API request.
    pub request_timeout: Duration,
    pub daily: DailyStatsSettings,
    pub live: LivestreamSettings,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let required = |key: &str| get(key).ok_or_else(|| eyre::eyre!("missing {key}"));
        let parsed = |key: &str, default: u64| -> eyre::Result<u64> {
            match get(key) {
                None => Ok(default),
                Some(v) => v
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid {key}={v:?}")),
            }
        };

        let database_url = required("DATABASE_URL")?;
        let youtube_api_key = required("YOUTUBE_API_KEY")?;
        let redis_url = required("REDIS_URL")?;
        let redis_password = get("REDIS_PASSWORD");

        let run_at_hour = parsed("SCRAPE_AT_UTC_HOUR", 3)?;
        if run_at_hour > 23 {
            eyre::bail!("invalid SCRAPE_AT_UTC_HOUR={run_at_hour}: must be 0-23");
        }
        let run_at_minute = parsed("SCRAPE_AT_UTC_MIN", 0)?;
        if run_at_minute > 59 {
            eyre::bail!("invalid SCRAPE_AT_UTC_MIN={run_at_minute}: must be 0-59");
        }

        let request_delay = Duration::from_millis(parsed("REQUEST_DELAY_MS", 150)?);
        let request_timeout = Duration::from_secs(parsed("REQUEST_TIMEOUT_SECS", 20)?);
        if request_timeout.is_zero() {
            eyre::bail!("invalid REQUEST_TIMEOUT_SECS=0: must be positive");
        }
        let poll_interval = Duration::from_secs(parsed("LIVE_POLL_SECONDS", 300)?);
        if poll_interval.is_zero() {
            eyre::bail!("invalid LIVE_POLL_SECONDS=0: must be positive");
        }

        let small = |key: &str, default: u64| -> eyre::Result<u32> {
            u32::try_from(parsed(key, default)?).with_context(|| format!("invalid {key}: too large"))
        };
        let live_max_results = small("LIVE_MAX_RESULTS", 3)?;
        let upcoming_max_results = small("UPCOMING_MAX_RESULTS", 3)?;
        let uploads_lookback = small("UPLOADS_LOOKBACK", 25)?;
        let quota_daily_limit = Some(small("YOUTUBE_DAILY_QUOTA_LIMIT", 0)?).filter(|&l| l > 0);

        let recent_lookup = match get("RECENT_LOOKUP") {
            None => RecentLookup::default(),
            Some(v) => v
                .parse()
                .with_context(|| format!("invalid RECENT_LOOKUP={v:?}"))?,
        };

        let enabled = get("LIVE_POLL_ENABLED").is_none_or(|v| !v.eq_ignore_ascii_case("false"));
        let log_stats = get("LOG_YT_STATS").is_some_and(|v| v.eq_ignore_ascii_case("true"));

        Ok(Self {
            database_url,
            redis_url,
            redis_password,
            youtube_api_key,
            request_timeout,
            daily: DailyStatsSettings {
                run_at_hour: run_at_hour as u32,
                run_at_minute: run_at_minute as u32,
                request_delay,
                call_timeout: request_timeout,
                uploads_lookback,
                recent_lookup,
                quota_daily_limit,
                log_stats,
            },
            live: LivestreamSettings {
                enabled,
                poll_interval,
                live_max_results,
                upcoming_max_results,
                request_delay,
                call_timeout: request_timeout,
            },
        })
    }
}

/// Loads a dotenv file into the environment, if there is one.
///
/// `ENV_FILE` names a file whose values override the environment; otherwise `.env` in the
/// working directory is loaded without overriding anything already set.
pub fn load_dotenv() {
    if let Ok(env_file) = std::env::var("ENV_FILE") {
        match dotenvy::from_filename_override(&env_file) {
            Ok(_) => tracing::info!(path = %env_file, "loaded environment file"),
            Err(e) => tracing::warn!(path = %env_file, error = %e, "failed to load ENV_FILE"),
        }
    } else if let Ok(path) = dotenvy::dotenv() {
        tracing::info!(path = %path.display(), "loaded environment file");
    }
}
