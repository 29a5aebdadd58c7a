//! Carries out reconciliation actions against the notification channel and
//! persists the outcome.
//!
//! One action fully executes, including its persistence write, before the
//! next poll cycle begins. Primary channel failures without a fallback
//! surface as cycle failures; best-effort operations (decorating a message
//! that is being retired) only log.

use std::{path::Path, sync::Arc};

use thiserror::Error;

use crate::{
    models::{OutageSnapshot, SavedNotification},
    notifier::{NotificationChannel, NotifierError},
    persistence::{error::PersistenceError, traits::NotificationStateStore},
    reconciler::Action,
    render::CaptionRenderer,
};

/// Errors surfaced by action execution. Either kind fails the cycle; retry is
/// deferred to the next scheduled poll.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// A primary channel operation failed with no remaining fallback.
    #[error("channel operation failed: {0}")]
    Channel(#[from] NotifierError),

    /// The resulting state could not be persisted.
    #[error("state persistence failed: {0}")]
    Store(#[from] PersistenceError),
}

/// Executes [`Action`]s decided by the reconciler.
pub struct ActionExecutor {
    channel: Arc<dyn NotificationChannel>,
    store: Arc<dyn NotificationStateStore>,
    renderer: CaptionRenderer,
}

impl ActionExecutor {
    /// Creates an executor over the given channel, store and renderer.
    pub fn new(
        channel: Arc<dyn NotificationChannel>,
        store: Arc<dyn NotificationStateStore>,
        renderer: CaptionRenderer,
    ) -> Self {
        Self { channel, store, renderer }
    }

    /// Performs the channel I/O implied by `action` and persists the
    /// resulting saved state. `photo` is the rendered snapshot attached to
    /// any message that is sent or edited.
    pub async fn execute(&self, action: Action, photo: &Path) -> Result<(), ExecutorError> {
        match action {
            Action::NoOp => Ok(()),
            Action::Close { previous } => self.close(previous).await,
            Action::Update { previous, current } => {
                self.update(previous, current.into(), photo).await
            }
            Action::Supersede { previous, current } => {
                self.supersede(previous, current.into(), photo).await
            }
            Action::Create { current } => self.create(current.into(), photo).await,
        }
    }

    /// Marks the live message as resolved and resets the saved state. The
    /// caption edit is best-effort: the message may already be gone, and a
    /// failure here must not keep the stale state alive.
    async fn close(&self, previous: SavedNotification) -> Result<(), ExecutorError> {
        tracing::info!(message_id = previous.message_id, "Outage cleared, closing notification.");

        let caption = self.renderer.closed(previous.snapshot.as_ref());
        if let Err(e) = self.channel.edit_caption(previous.message_id, &caption).await {
            tracing::warn!(
                message_id = previous.message_id,
                error = %e,
                "Failed to edit closed notification, continuing."
            );
        }

        self.store.save_state(&SavedNotification::default()).await?;
        Ok(())
    }

    /// Edits the live message in place; falls back to a threaded reply when
    /// the edit is rejected (message too old or deleted). If the reply also
    /// fails the state is reset so the next cycle starts fresh, and the
    /// failure surfaces.
    async fn update(
        &self,
        previous: SavedNotification,
        current: OutageSnapshot,
        photo: &Path,
    ) -> Result<(), ExecutorError> {
        tracing::info!(message_id = previous.message_id, "Updating existing notification.");

        let caption = self.renderer.active(&current);
        let message_id =
            match self.channel.edit_photo(previous.message_id, photo, &caption).await {
                Ok(()) => previous.message_id,
                Err(edit_err) => {
                    tracing::warn!(
                        message_id = previous.message_id,
                        error = %edit_err,
                        "Edit rejected (message may be too old or deleted), replying instead."
                    );
                    match self.channel.send_photo_reply(previous.message_id, photo, &caption).await
                    {
                        Ok(new_id) => new_id,
                        Err(send_err) => {
                            if let Err(save_err) =
                                self.store.save_state(&SavedNotification::default()).await
                            {
                                tracing::error!(
                                    error = %save_err,
                                    "Failed to reset state after update failure."
                                );
                            }
                            return Err(send_err.into());
                        }
                    }
                }
            };

        self.store.save_state(&with_snapshot(message_id, current)).await?;
        Ok(())
    }

    /// Retires the live message (best-effort) and opens a replacement as a
    /// threaded reply; a rejected reply degrades to a plain send. Nothing is
    /// persisted unless one of the sends succeeds.
    async fn supersede(
        &self,
        previous: SavedNotification,
        current: OutageSnapshot,
        photo: &Path,
    ) -> Result<(), ExecutorError> {
        tracing::info!(
            message_id = previous.message_id,
            "End time changed, superseding notification."
        );

        if let Some(old) = previous.snapshot.as_ref() {
            let old_caption = self.renderer.superseded_old(old);
            if let Err(e) = self.channel.edit_caption(previous.message_id, &old_caption).await {
                tracing::warn!(
                    message_id = previous.message_id,
                    error = %e,
                    "Failed to retire superseded notification, continuing."
                );
            }
        }

        let reply_caption = self.renderer.superseded_new(&current);
        let message_id = match self
            .channel
            .send_photo_reply(previous.message_id, photo, &reply_caption)
            .await
        {
            Ok(new_id) => new_id,
            Err(reply_err) => {
                tracing::warn!(
                    message_id = previous.message_id,
                    error = %reply_err,
                    "Reply rejected, sending a plain notification instead."
                );
                self.channel.send_photo(photo, &self.renderer.active(&current)).await?
            }
        };

        self.store.save_state(&with_snapshot(message_id, current)).await?;
        Ok(())
    }

    /// Sends a brand-new notification. A failed send propagates without any
    /// state change.
    async fn create(&self, current: OutageSnapshot, photo: &Path) -> Result<(), ExecutorError> {
        tracing::info!("Sending new notification.");

        let caption = self.renderer.active(&current);
        let message_id = self.channel.send_photo(photo, &caption).await?;

        tracing::info!(message_id, "Notification created.");
        self.store.save_state(&with_snapshot(message_id, current)).await?;
        Ok(())
    }
}

fn with_snapshot(message_id: i64, snapshot: OutageSnapshot) -> SavedNotification {
    SavedNotification { message_id, snapshot: Some(snapshot) }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::{
        notifier::MockNotificationChannel,
        persistence::traits::MockNotificationStateStore,
        test_helpers::OutageRecordBuilder,
    };

    fn renderer() -> CaptionRenderer {
        CaptionRenderer::new("%H:%M %d.%m.%Y", chrono_tz::Europe::Kyiv)
    }

    fn photo() -> PathBuf {
        PathBuf::from("data/current_outage.png")
    }

    fn api_error() -> NotifierError {
        NotifierError::Api { status: 400, description: "message to edit not found".to_string() }
    }

    fn executor(
        channel: MockNotificationChannel,
        store: MockNotificationStateStore,
    ) -> ActionExecutor {
        ActionExecutor::new(Arc::new(channel), Arc::new(store), renderer())
    }

    #[tokio::test]
    async fn noop_touches_nothing() {
        // No expectations registered: any channel or store call would panic.
        let executor = executor(MockNotificationChannel::new(), MockNotificationStateStore::new());
        executor.execute(Action::NoOp, &photo()).await.unwrap();
    }

    #[tokio::test]
    async fn close_strikes_message_and_resets_state() {
        let record = OutageRecordBuilder::new().build();
        let previous = SavedNotification::for_message(42, &record);

        let mut channel = MockNotificationChannel::new();
        channel
            .expect_edit_caption()
            .withf(|id, caption| *id == 42 && caption.contains("<del>"))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut store = MockNotificationStateStore::new();
        store
            .expect_save_state()
            .withf(|state| *state == SavedNotification::default())
            .times(1)
            .returning(|_| Ok(()));

        executor(channel, store).execute(Action::Close { previous }, &photo()).await.unwrap();
    }

    #[tokio::test]
    async fn close_resets_state_even_when_edit_fails() {
        // The best-effort edit must never block the reset.
        let record = OutageRecordBuilder::new().build();
        let previous = SavedNotification::for_message(42, &record);

        let mut channel = MockNotificationChannel::new();
        channel.expect_edit_caption().times(1).returning(|_, _| Err(api_error()));

        let mut store = MockNotificationStateStore::new();
        store
            .expect_save_state()
            .withf(|state| !state.has_live_message() && state.snapshot.is_none())
            .times(1)
            .returning(|_| Ok(()));

        executor(channel, store).execute(Action::Close { previous }, &photo()).await.unwrap();
    }

    #[tokio::test]
    async fn update_edits_in_place_and_keeps_message_id() {
        let old = OutageRecordBuilder::new().build();
        let previous = SavedNotification::for_message(42, &old);
        let current =
            OutageRecordBuilder::new().updated_at(old.updated_at + chrono::Duration::hours(1)).build();

        let mut channel = MockNotificationChannel::new();
        channel
            .expect_edit_photo()
            .withf(|id, _, _| *id == 42)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut store = MockNotificationStateStore::new();
        let expected = SavedNotification::for_message(42, &current);
        store
            .expect_save_state()
            .withf(move |state| *state == expected)
            .times(1)
            .returning(|_| Ok(()));

        executor(channel, store)
            .execute(Action::Update { previous, current }, &photo())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_falls_back_to_reply_when_edit_fails() {
        // The saved state reflects the reply's id, not the failed edit's.
        let old = OutageRecordBuilder::new().build();
        let previous = SavedNotification::for_message(42, &old);
        let current = OutageRecordBuilder::new().text("Група 5").build();

        let mut channel = MockNotificationChannel::new();
        channel.expect_edit_photo().times(1).returning(|_, _, _| Err(api_error()));
        channel
            .expect_send_photo_reply()
            .withf(|reply_to, _, _| *reply_to == 42)
            .times(1)
            .returning(|_, _, _| Ok(77));

        let mut store = MockNotificationStateStore::new();
        let expected = SavedNotification::for_message(77, &current);
        store
            .expect_save_state()
            .withf(move |state| *state == expected)
            .times(1)
            .returning(|_| Ok(()));

        executor(channel, store)
            .execute(Action::Update { previous, current }, &photo())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_with_failed_fallback_resets_state_and_surfaces_error() {
        let old = OutageRecordBuilder::new().build();
        let previous = SavedNotification::for_message(42, &old);
        let current = OutageRecordBuilder::new().text("Група 5").build();

        let mut channel = MockNotificationChannel::new();
        channel.expect_edit_photo().times(1).returning(|_, _, _| Err(api_error()));
        channel.expect_send_photo_reply().times(1).returning(|_, _, _| Err(api_error()));

        let mut store = MockNotificationStateStore::new();
        store
            .expect_save_state()
            .withf(|state| *state == SavedNotification::default())
            .times(1)
            .returning(|_| Ok(()));

        let result = executor(channel, store)
            .execute(Action::Update { previous, current }, &photo())
            .await;
        assert!(matches!(result, Err(ExecutorError::Channel(_))));
    }

    #[tokio::test]
    async fn supersede_retires_old_message_and_replies() {
        let old = OutageRecordBuilder::new().end_time(crate::test_helpers::hour(14)).build();
        let previous = SavedNotification::for_message(42, &old);
        let current = OutageRecordBuilder::new().end_time(crate::test_helpers::hour(16)).build();

        let mut channel = MockNotificationChannel::new();
        channel
            .expect_edit_caption()
            .withf(|id, caption| {
                *id == 42 && caption.contains("<del>") && caption.contains("нижче")
            })
            .times(1)
            .returning(|_, _| Ok(()));
        channel
            .expect_send_photo_reply()
            .withf(|reply_to, _, caption| *reply_to == 42 && caption.contains("змінено"))
            .times(1)
            .returning(|_, _, _| Ok(91));

        let mut store = MockNotificationStateStore::new();
        let expected = SavedNotification::for_message(91, &current);
        store
            .expect_save_state()
            .withf(move |state| *state == expected)
            .times(1)
            .returning(|_| Ok(()));

        executor(channel, store)
            .execute(Action::Supersede { previous, current }, &photo())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn supersede_continues_past_failed_retirement_edit() {
        let old = OutageRecordBuilder::new().build();
        let previous = SavedNotification::for_message(42, &old);
        let current = OutageRecordBuilder::new().end_time(crate::test_helpers::hour(16)).build();

        let mut channel = MockNotificationChannel::new();
        channel.expect_edit_caption().times(1).returning(|_, _| Err(api_error()));
        channel.expect_send_photo_reply().times(1).returning(|_, _, _| Ok(91));

        let mut store = MockNotificationStateStore::new();
        store.expect_save_state().times(1).returning(|_| Ok(()));

        executor(channel, store)
            .execute(Action::Supersede { previous, current }, &photo())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn supersede_falls_back_to_plain_send_when_reply_fails() {
        let old = OutageRecordBuilder::new().build();
        let previous = SavedNotification::for_message(42, &old);
        let current = OutageRecordBuilder::new().end_time(crate::test_helpers::hour(16)).build();

        let mut channel = MockNotificationChannel::new();
        channel.expect_edit_caption().times(1).returning(|_, _| Ok(()));
        channel.expect_send_photo_reply().times(1).returning(|_, _, _| Err(api_error()));
        channel.expect_send_photo().times(1).returning(|_, _| Ok(95));

        let mut store = MockNotificationStateStore::new();
        let expected = SavedNotification::for_message(95, &current);
        store
            .expect_save_state()
            .withf(move |state| *state == expected)
            .times(1)
            .returning(|_| Ok(()));

        executor(channel, store)
            .execute(Action::Supersede { previous, current }, &photo())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn supersede_with_all_sends_failed_saves_nothing() {
        let old = OutageRecordBuilder::new().build();
        let previous = SavedNotification::for_message(42, &old);
        let current = OutageRecordBuilder::new().end_time(crate::test_helpers::hour(16)).build();

        let mut channel = MockNotificationChannel::new();
        channel.expect_edit_caption().times(1).returning(|_, _| Ok(()));
        channel.expect_send_photo_reply().times(1).returning(|_, _, _| Err(api_error()));
        channel.expect_send_photo().times(1).returning(|_, _| Err(api_error()));

        // No save_state expectation: a call would panic.
        let store = MockNotificationStateStore::new();

        let result = executor(channel, store)
            .execute(Action::Supersede { previous, current }, &photo())
            .await;
        assert!(matches!(result, Err(ExecutorError::Channel(_))));
    }

    #[tokio::test]
    async fn create_sends_and_saves_new_message() {
        // The resulting state carries the new id and current's fields.
        let current = OutageRecordBuilder::new().text("Група 3").build();

        let mut channel = MockNotificationChannel::new();
        channel
            .expect_send_photo()
            .withf(|_, caption| caption.contains("Група 3"))
            .times(1)
            .returning(|_, _| Ok(7));

        let mut store = MockNotificationStateStore::new();
        let expected = SavedNotification::for_message(7, &current);
        store
            .expect_save_state()
            .withf(move |state| *state == expected)
            .times(1)
            .returning(|_| Ok(()));

        executor(channel, store).execute(Action::Create { current }, &photo()).await.unwrap();
    }

    #[tokio::test]
    async fn create_failure_propagates_without_saving() {
        let current = OutageRecordBuilder::new().build();

        let mut channel = MockNotificationChannel::new();
        channel.expect_send_photo().times(1).returning(|_, _| Err(api_error()));

        let store = MockNotificationStateStore::new();

        let result = executor(channel, store).execute(Action::Create { current }, &photo()).await;
        assert!(matches!(result, Err(ExecutorError::Channel(_))));
    }
}
