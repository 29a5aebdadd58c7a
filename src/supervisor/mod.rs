//! The poll loop driving observation, reconciliation and execution.
//!
//! The supervisor owns the application lifecycle: it listens for shutdown
//! signals, runs exactly one reconciliation cycle at a time, and sleeps the
//! configured interval between cycles. The sleep races the cancellation
//! token, so shutdown latency is bounded by signal delivery, not by the
//! polling interval. Cycle failures are transient by definition: they are
//! logged and the loop simply waits for the next attempt.

mod builder;

use std::sync::Arc;

use thiserror::Error;
use tokio::signal;
use tokio_util::sync::CancellationToken;

pub use builder::SupervisorBuilder;

use crate::{
    config::AppConfig,
    executor::{ActionExecutor, ExecutorError},
    models::SavedNotification,
    observer::{Observer, ObserverError},
    persistence::traits::NotificationStateStore,
    reconciler,
};

/// Errors raised while assembling the supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// No configuration was provided to the builder.
    #[error("missing configuration for supervisor")]
    MissingConfig,

    /// No observer was provided to the builder.
    #[error("missing observer for supervisor")]
    MissingObserver,

    /// No action executor was provided to the builder.
    #[error("missing action executor for supervisor")]
    MissingExecutor,

    /// No state store was provided to the builder.
    #[error("missing state store for supervisor")]
    MissingStateStore,
}

/// A failure of one reconciliation cycle. Never fatal to the process.
#[derive(Debug, Error)]
pub enum CycleError {
    /// The observer could not produce an observation.
    #[error("observation failed: {0}")]
    Observer(#[from] ObserverError),

    /// Executing the decided action failed.
    #[error("action execution failed: {0}")]
    Executor(#[from] ExecutorError),
}

/// The primary runtime manager: runs cycles until cancelled, then cleans up.
pub struct Supervisor {
    config: Arc<AppConfig>,
    observer: Arc<dyn Observer>,
    executor: ActionExecutor,
    state: Arc<dyn NotificationStateStore>,
    cancellation_token: CancellationToken,
}

impl Supervisor {
    /// Returns a new [`SupervisorBuilder`].
    pub fn builder() -> SupervisorBuilder {
        SupervisorBuilder::new()
    }

    /// Runs the poll loop until a shutdown signal arrives or the token is
    /// cancelled, then releases resources.
    pub async fn run(self) -> Result<(), SupervisorError> {
        let signal_token = self.cancellation_token.clone();
        let signal_handle = tokio::spawn(async move {
            let ctrl_c = signal::ctrl_c();
            #[cfg(unix)]
            let terminate = async {
                signal::unix::signal(signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler")
                    .recv()
                    .await;
            };
            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => tracing::info!("SIGINT received, initiating graceful shutdown."),
                _ = terminate => tracing::info!("SIGTERM received, initiating graceful shutdown."),
            }
            signal_token.cancel();
        });

        tracing::info!(
            interval = ?self.config.polling_interval_secs,
            street = %self.config.street,
            house = %self.config.house,
            "Starting outage watch loop."
        );

        loop {
            if self.cancellation_token.is_cancelled() {
                break;
            }

            tracing::debug!("Checking for updates...");
            if let Err(e) = self.run_once().await {
                tracing::error!(error = %e, "Cycle failed, retrying on the next interval.");
            }

            tokio::select! {
                _ = self.cancellation_token.cancelled() => break,
                _ = tokio::time::sleep(self.config.polling_interval_secs) => {}
            }
        }

        signal_handle.abort();

        let cleanup = async {
            if let Err(e) = self.state.cleanup().await {
                tracing::error!(error = %e, "State store cleanup failed, continuing shutdown.");
            }
        };
        if tokio::time::timeout(self.config.shutdown_timeout_secs, cleanup).await.is_err() {
            tracing::warn!(
                timeout = ?self.config.shutdown_timeout_secs,
                "Cleanup did not finish within the shutdown timeout."
            );
        }

        tracing::info!("Supervisor shutdown complete.");
        Ok(())
    }

    /// Runs a single observe → decide → execute cycle. The cycle, including
    /// its persistence write, completes before this returns; the loop never
    /// overlaps two cycles.
    pub async fn run_once(&self) -> Result<(), CycleError> {
        let observation = self.observer.fetch().await?;

        // A broken state file must not halt notifications: degrade to the
        // first-run condition and risk a duplicate message instead.
        let previous = match self.state.load_state().await {
            Ok(Some(state)) => state,
            Ok(None) => SavedNotification::default(),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Could not load previous state, proceeding as if none exists."
                );
                SavedNotification::default()
            }
        };

        let action = reconciler::decide(&previous, observation.record.as_ref());
        tracing::debug!(?action, "Reconciliation decision made.");

        self.executor.execute(action, &observation.snapshot_path).await?;
        Ok(())
    }
}
