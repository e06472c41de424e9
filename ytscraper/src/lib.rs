//! Ingestion of YouTube channel metrics and livestream status.
//!
//! Two background tasks share a channel registry in PostgreSQL:
//!
//! - [`background::daily_stats`] snapshots every active channel's subscriber, view and video
//!   counts plus its latest upload and livestream once per UTC day, into a time-series table.
//! - [`background::livestreams`] polls each channel for live and upcoming streams on a short
//!   interval and mirrors them into a per-channel Redis hash.

pub mod background;
pub mod config;
pub mod db;
pub mod livestreams;
pub mod youtube_api;

pub use config::Config;

/// Installs the global `tracing` subscriber: `RUST_LOG` if set, `INFO` otherwise.
pub fn init_tracing() {
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(false)
        .init();
}
