//! Telegram Bot API implementation of the notification channel.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::{NotificationChannel, NotifierError};

/// Default Telegram Bot API host.
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Captions use the HTML subset (`<b>`, `<del>`, `<blockquote>`).
const PARSE_MODE: &str = "HTML";

/// Envelope every Bot API response arrives in.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

/// The slice of a Telegram message object we care about.
#[derive(Debug, Deserialize)]
struct MessageRef {
    message_id: i64,
}

/// A notification channel backed by a Telegram bot posting into one chat.
pub struct TelegramChannel {
    client: reqwest::Client,
    base_url: String,
    token: String,
    chat_id: i64,
}

impl TelegramChannel {
    /// Creates a channel for the given bot token and target chat.
    pub fn new(client: reqwest::Client, token: impl Into<String>, chat_id: i64) -> Self {
        Self::with_base_url(client, TELEGRAM_API_BASE, token, chat_id)
    }

    /// Like [`TelegramChannel::new`], but against a custom API host. Used by
    /// integration tests to point at a local mock server.
    pub fn with_base_url(
        client: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
        chat_id: i64,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            chat_id,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Reads the attachment and wraps it into a multipart file part.
    async fn photo_part(photo: &Path) -> Result<Part, NotifierError> {
        let bytes = tokio::fs::read(photo).await?;
        let file_name = photo
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot.png".to_string());
        Ok(Part::bytes(bytes).file_name(file_name).mime_str("image/png")?)
    }

    /// Posts a multipart form to a Bot API method and decodes the envelope.
    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        form: Form,
    ) -> Result<T, NotifierError> {
        let response = self.client.post(self.method_url(method)).multipart(form).send().await?;
        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await?;

        if !status.is_success() || !envelope.ok {
            return Err(NotifierError::Api {
                status: status.as_u16(),
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description provided".to_string()),
            });
        }

        envelope.result.ok_or_else(|| {
            NotifierError::UnexpectedResponse(format!("{method}: ok response without result"))
        })
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    #[tracing::instrument(skip(self, caption), level = "debug")]
    async fn send_photo(&self, photo: &Path, caption: &str) -> Result<i64, NotifierError> {
        let form = Form::new()
            .text("chat_id", self.chat_id.to_string())
            .text("caption", caption.to_string())
            .text("parse_mode", PARSE_MODE)
            .part("photo", Self::photo_part(photo).await?);

        let message: MessageRef = self.call("sendPhoto", form).await?;
        Ok(message.message_id)
    }

    #[tracing::instrument(skip(self, caption), level = "debug")]
    async fn send_photo_reply(
        &self,
        reply_to: i64,
        photo: &Path,
        caption: &str,
    ) -> Result<i64, NotifierError> {
        let form = Form::new()
            .text("chat_id", self.chat_id.to_string())
            .text("reply_to_message_id", reply_to.to_string())
            .text("caption", caption.to_string())
            .text("parse_mode", PARSE_MODE)
            .part("photo", Self::photo_part(photo).await?);

        let message: MessageRef = self.call("sendPhoto", form).await?;
        Ok(message.message_id)
    }

    #[tracing::instrument(skip(self, caption), level = "debug")]
    async fn edit_photo(
        &self,
        message_id: i64,
        photo: &Path,
        caption: &str,
    ) -> Result<(), NotifierError> {
        // editMessageMedia takes the new media as a JSON object referencing a
        // multipart file via the attach:// scheme.
        let media = serde_json::json!({
            "type": "photo",
            "media": "attach://photo",
            "caption": caption,
            "parse_mode": PARSE_MODE,
        });

        let form = Form::new()
            .text("chat_id", self.chat_id.to_string())
            .text("message_id", message_id.to_string())
            .text("media", media.to_string())
            .part("photo", Self::photo_part(photo).await?);

        self.call::<serde_json::Value>("editMessageMedia", form).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, caption), level = "debug")]
    async fn edit_caption(&self, message_id: i64, caption: &str) -> Result<(), NotifierError> {
        let form = Form::new()
            .text("chat_id", self.chat_id.to_string())
            .text("message_id", message_id.to_string())
            .text("caption", caption.to_string())
            .text("parse_mode", PARSE_MODE);

        self.call::<serde_json::Value>("editMessageCaption", form).await?;
        Ok(())
    }
}
