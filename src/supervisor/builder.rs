//! Builder wiring the supervisor's collaborators together.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{Supervisor, SupervisorError};
use crate::{
    config::AppConfig, executor::ActionExecutor, observer::Observer,
    persistence::traits::NotificationStateStore,
};

/// Assembles a [`Supervisor`] from its required components.
#[derive(Default)]
pub struct SupervisorBuilder {
    config: Option<AppConfig>,
    observer: Option<Arc<dyn Observer>>,
    executor: Option<ActionExecutor>,
    state: Option<Arc<dyn NotificationStateStore>>,
    cancellation_token: Option<CancellationToken>,
}

impl SupervisorBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application configuration.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the outage observer.
    pub fn observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Sets the action executor.
    pub fn executor(mut self, executor: ActionExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Sets the notification state store.
    pub fn state(mut self, state: Arc<dyn NotificationStateStore>) -> Self {
        self.state = Some(state);
        self
    }

    /// Overrides the cancellation token. Mainly for tests; by default the
    /// supervisor creates its own token and cancels it on SIGINT/SIGTERM.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Builds the supervisor, failing if a component is missing.
    pub fn build(self) -> Result<Supervisor, SupervisorError> {
        Ok(Supervisor {
            config: Arc::new(self.config.ok_or(SupervisorError::MissingConfig)?),
            observer: self.observer.ok_or(SupervisorError::MissingObserver)?,
            executor: self.executor.ok_or(SupervisorError::MissingExecutor)?,
            state: self.state.ok_or(SupervisorError::MissingStateStore)?,
            cancellation_token: self.cancellation_token.unwrap_or_default(),
        })
    }
}
