//! The outage data source seam.

mod dtek;

use std::path::PathBuf;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use crate::models::OutageRecord;

pub use dtek::DtekObserver;

/// Errors produced while observing the remote outage source. All of them are
/// transient from the poll loop's perspective: logged and retried next cycle.
#[derive(Debug, Error)]
pub enum ObserverError {
    /// The HTTP request to the source failed after retries.
    #[error("source request failed: {0}")]
    Request(#[from] reqwest_middleware::Error),

    /// The source responded but the payload could not be decoded.
    #[error("failed to decode source response: {0}")]
    Decode(#[from] reqwest::Error),

    /// The source returned a non-success HTTP status.
    #[error("source returned status {0}")]
    Status(u16),

    /// A timestamp in the payload did not match the expected wall-clock
    /// format, or is not a valid local time in the source zone.
    #[error("invalid source timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// The offending raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The snapshot image could not be rendered.
    #[error("snapshot rendering failed: {0}")]
    Snapshot(String),

    /// Spawning or waiting on the renderer process failed.
    #[error("snapshot process error: {0}")]
    Io(#[from] std::io::Error),

    /// The fetch did not settle within the configured timeout.
    #[error("observer fetch timed out")]
    Timeout,
}

/// One complete observation: the current outage record (if any) and the
/// rendered snapshot image to attach to notifications.
#[derive(Debug, Clone)]
pub struct Observation {
    /// The normalized outage record; `None` when the source reported nothing.
    pub record: Option<OutageRecord>,
    /// Path of the freshly rendered snapshot image.
    pub snapshot_path: PathBuf,
}

/// Blocking fetch contract: returns only once both the outage data and the
/// snapshot render have settled, or a definitive failure occurred. No partial
/// results.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Observer: Send + Sync {
    /// Obtains a fresh observation for the configured address.
    async fn fetch(&self) -> Result<Observation, ObserverError>;
}
