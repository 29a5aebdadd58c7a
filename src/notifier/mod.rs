//! The notification channel seam.

mod telegram;

use std::path::Path;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

pub use telegram::TelegramChannel;

/// Errors produced by a notification channel.
#[derive(Debug, Error)]
pub enum NotifierError {
    /// The channel API rejected the request.
    #[error("channel API error (status {status}): {description}")]
    Api {
        /// HTTP status returned by the API.
        status: u16,
        /// Error description from the API response body.
        description: String,
    },

    /// The API response could not be interpreted.
    #[error("unexpected channel API response: {0}")]
    UnexpectedResponse(String),

    /// A network-level failure while talking to the channel.
    #[error("channel request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The attachment could not be read from disk.
    #[error("failed to read attachment: {0}")]
    Attachment(#[from] std::io::Error),
}

/// The four operations the reconciliation engine needs from a messaging
/// channel. Sends return the identifier of the newly created message.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Sends a new message with a photo attachment and caption.
    async fn send_photo(&self, photo: &Path, caption: &str) -> Result<i64, NotifierError>;

    /// Sends a new photo message as a threaded reply to `reply_to`.
    async fn send_photo_reply(
        &self,
        reply_to: i64,
        photo: &Path,
        caption: &str,
    ) -> Result<i64, NotifierError>;

    /// Replaces both the attachment and the caption of an existing message.
    async fn edit_photo(
        &self,
        message_id: i64,
        photo: &Path,
        caption: &str,
    ) -> Result<(), NotifierError>;

    /// Replaces only the caption of an existing message.
    async fn edit_caption(&self, message_id: i64, caption: &str) -> Result<(), NotifierError>;
}
