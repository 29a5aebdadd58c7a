//! SQLite-backed implementation of the notification state store.
//!
//! The state is one JSON document in a generic `application_state` key-value
//! table, written wholesale on every save.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};

use crate::{
    models::SavedNotification,
    persistence::{error::PersistenceError, traits::NotificationStateStore},
};

/// Key under which the saved notification state is stored.
const STATE_KEY: &str = "saved_notification";

/// A state repository backed by a SQLite database file.
pub struct SqliteStateRepository {
    pool: SqlitePool,
}

impl SqliteStateRepository {
    /// Connects to the database at `database_url`, creating the file if it
    /// does not exist.
    #[tracing::instrument(level = "info")]
    pub async fn new(database_url: &str) -> Result<Self, PersistenceError> {
        tracing::debug!(database_url, "Connecting to SQLite database.");
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| PersistenceError::InvalidInput(e.to_string()))?
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await.map_err(|e| {
            PersistenceError::OperationFailed(format!("failed to connect to database: {e}"))
        })?;
        tracing::info!(database_url, "Connected to SQLite database.");
        Ok(Self { pool })
    }

    /// Runs the embedded database migrations.
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn run_migrations(&self) -> Result<(), PersistenceError> {
        sqlx::migrate!("./migrations").run(&self.pool).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run database migrations.");
            PersistenceError::MigrationError(e.to_string())
        })?;
        tracing::debug!("Database migrations completed.");
        Ok(())
    }

    /// Closes the connection pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("SQLite connection pool closed.");
    }
}

#[async_trait]
impl NotificationStateStore for SqliteStateRepository {
    #[tracing::instrument(skip(self), level = "debug")]
    async fn load_state(&self) -> Result<Option<SavedNotification>, PersistenceError> {
        let row: Option<String> =
            sqlx::query_scalar("SELECT value FROM application_state WHERE key = ?")
                .bind(STATE_KEY)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PersistenceError::OperationFailed(e.to_string()))?;

        match row {
            Some(value) => serde_json::from_str(&value)
                .map(Some)
                .map_err(|e| PersistenceError::SerializationError(e.to_string())),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self, state), level = "debug")]
    async fn save_state(&self, state: &SavedNotification) -> Result<(), PersistenceError> {
        let value = serde_json::to_string(state)
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))?;

        sqlx::query(
            "INSERT INTO application_state (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(STATE_KEY)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| PersistenceError::OperationFailed(e.to_string()))?;

        Ok(())
    }

    async fn cleanup(&self) -> Result<(), PersistenceError> {
        self.close().await;
        Ok(())
    }
}
