use eyre::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use ytscraper::background::daily_stats::{DailyStatsTask, spawn_daily_stats_task};
use ytscraper::background::livestreams::{LivestreamTask, spawn_livestream_task};
use ytscraper::db::{self, PgStore};
use ytscraper::livestreams::RedisStore;
use ytscraper::youtube_api::YouTubeClient;
use ytscraper::{Config, config};

const REDIS_PING_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> eyre::Result<()> {
    ytscraper::init_tracing();
    config::load_dotenv();
    let config = Config::from_env().context("load configuration")?;

    let pool = db::connect(&config.database_url, config.request_timeout).await?;
    let store = Arc::new(PgStore::new(pool));
    store.apply_schema().await?;

    let cache = RedisStore::connect(
        &config.redis_url,
        config.redis_password.as_deref(),
        REDIS_PING_TIMEOUT,
    )
    .await?;
    let api = Arc::new(YouTubeClient::new(
        config.youtube_api_key.clone(),
        config.request_timeout,
    )?);

    let cancel = CancellationToken::new();
    tokio::spawn(trip_on_shutdown_signal(cancel.clone()));

    let daily = DailyStatsTask::new(store.clone(), store.clone(), api.clone(), config.daily);
    let daily = spawn_daily_stats_task(daily, cancel.clone());

    let live = if config.live.enabled {
        let task = LivestreamTask::new(store, api, Arc::new(cache), config.live);
        Some(spawn_livestream_task(task, cancel.clone()))
    } else {
        tracing::info!("livestream polling disabled via LIVE_POLL_ENABLED");
        None
    };

    daily.await.context("daily stats task panicked")?;
    if let Some(live) = live {
        live.await.context("livestream task panicked")?;
    }
    tracing::info!("shut down");
    Ok(())
}

async fn trip_on_shutdown_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::warn!(error = %e, "cannot listen for Ctrl-C");
                return;
            }
        }
        _ = terminate => {}
    }
    tracing::info!("shutdown requested");
    cancel.cancel();
}
