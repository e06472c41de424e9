//! The two long-running ingestion tasks and the helpers they share.
//!
//! Both tasks process channels strictly one at a time and pause between channels, which is
//! the only rate limiting against the upstream API. They share nothing but the
//! [`CancellationToken`] used to stop them.

pub mod daily_stats;
#[cfg(test)]
pub(crate) mod fakes;
pub mod livestreams;
pub mod schedule;

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A run in which some channels could not be processed.
///
/// Work done for the other channels is kept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{task} completed with {failed}/{total} channel failures")]
pub struct ChannelFailures {
    pub task: &'static str,
    pub failed: usize,
    pub total: usize,
}

/// A run that was interrupted by shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cancelled")]
pub struct Cancelled;

/// Whether `result` failed only because the run was interrupted.
pub fn is_cancelled<T>(result: &eyre::Result<T>) -> bool {
    matches!(result, Err(e) if e.downcast_ref::<Cancelled>().is_some())
}

/// Awaits a registry or sink call, failing if it takes longer than `limit`.
pub(crate) async fn bounded<T>(
    what: &'static str,
    limit: Duration,
    call: impl Future<Output = eyre::Result<T>>,
) -> eyre::Result<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(eyre::eyre!("{what} timed out after {limit:?}")),
    }
}

/// Sleeps for `duration` unless cancelled first.
///
/// Returns `Err(Cancelled)` if the token trips before the sleep completes.
pub(crate) async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<(), Cancelled> {
    if duration.is_zero() {
        return if cancel.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        };
    }
    tokio::select! {
        _ = cancel.cancelled() => Err(Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
