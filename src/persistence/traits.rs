//! The state-store seam consumed by the executor and the poll loop.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::{models::SavedNotification, persistence::error::PersistenceError};

/// Load/store access to the single persisted notification record.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationStateStore: Send + Sync {
    /// Retrieves the last saved notification state. `None` is the valid
    /// first-run condition, not an error.
    async fn load_state(&self) -> Result<Option<SavedNotification>, PersistenceError>;

    /// Overwrites the saved notification state wholesale.
    async fn save_state(&self, state: &SavedNotification) -> Result<(), PersistenceError>;

    /// Releases storage resources before shutdown.
    async fn cleanup(&self) -> Result<(), PersistenceError>;
}
