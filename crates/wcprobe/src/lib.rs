//! Write-concern propagation probe.
//!
//! Provides the coordination between one writer and many watchers:
//! - [`ReplicaObserver`]: tails one member's change feed from a resumable
//!   checkpoint and narrates every tagged write it sees
//! - [`TestOrchestrator`]: spawns the observers, waits for all of them, runs
//!   the write script per connection variant and drains them on shutdown
//! - [`control`]: JSON frames exchanged over bounded per-observer links

pub mod control;
pub mod error;
pub mod observer;
pub mod orchestrator;
pub mod settings;

pub use control::{Command, Report};
pub use error::{Error, Result};
pub use observer::{
    ExpectationState, Observation, ObserverReport, ReconnectBackoff, ReplicaObserver,
    ResumeCheckpoint, SessionState,
};
pub use orchestrator::{RunReport, TestOrchestrator};
pub use settings::{ObserverSettings, ProbeSettings, cluster_spec};

use std::future::Future;
use std::time::Duration;

/// Awaits a store call, failing with [`Error::Timeout`] once `limit` elapses.
pub(crate) async fn bounded<T, F>(
    limit: Option<Duration>,
    operation: &'static str,
    call: F,
) -> Result<T>
where
    F: Future<Output = wcprobe_store::Result<T>>,
{
    match limit {
        Some(after) => tokio::time::timeout(after, call)
            .await
            .map_err(|_| Error::Timeout { operation, after })?
            .map_err(Error::from),
        None => call.await.map_err(Error::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wcprobe_store::StoreError;

    #[tokio::test]
    async fn bounded_passes_results_through() {
        let ok = bounded(Some(Duration::from_secs(1)), "noop", async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err: Result<()> = bounded(None, "noop", async { Err(StoreError::Closed) }).await;
        assert!(matches!(err, Err(Error::Store(StoreError::Closed))));
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        };
        let result = bounded(Some(Duration::from_millis(10)), "log tip", slow).await;
        assert!(matches!(
            result,
            Err(Error::Timeout {
                operation: "log tip",
                ..
            })
        ));
    }
}
