//! Caption rendering for channel messages.
//!
//! Every action that shows outage content goes through [`CaptionRenderer`],
//! so active and resolved messages stay visually consistent. The output uses
//! the Telegram HTML subset: `<b>`, `<del>`, `<blockquote>`.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::models::OutageSnapshot;

/// Annotation appended when a live message is closed.
const CLOSED_NOTE: &str = "<b>Відключення завершено або інформація відсутня.</b>";

/// Annotation appended to a retired message when a revision follows.
const SUPERSEDED_OLD_NOTE: &str =
    "<b>Час завершення змінено. Дивіться нове повідомлення нижче.</b>";

/// Annotation appended to the replacement message after a revision.
const SUPERSEDED_NEW_NOTE: &str = "<b>Час завершення змінено.</b>";

/// Renders message captions in the configured display format and time zone.
#[derive(Debug, Clone)]
pub struct CaptionRenderer {
    time_format: String,
    time_zone: Tz,
}

impl CaptionRenderer {
    /// Creates a renderer. `time_format` is a chrono format string applied to
    /// timestamps after conversion into `time_zone`.
    pub fn new(time_format: impl Into<String>, time_zone: Tz) -> Self {
        Self { time_format: time_format.into(), time_zone }
    }

    fn format_time(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.time_zone).format(&self.time_format).to_string()
    }

    /// The caption body for an active outage.
    pub fn active(&self, snapshot: &OutageSnapshot) -> String {
        format!(
            "<b>Повідомлення від ДТЕК</b>\n\n<blockquote>{}</blockquote>\n\n\
             <b>Період:</b> з {} по {}\n<b>Оновлено:</b> {}",
            snapshot.text,
            self.format_time(snapshot.start_time),
            self.format_time(snapshot.end_time),
            self.format_time(snapshot.updated_at),
        )
    }

    /// The caption for a message whose outage has cleared: the body struck
    /// through, with the close annotation. Without a snapshot only the
    /// annotation remains.
    pub fn closed(&self, snapshot: Option<&OutageSnapshot>) -> String {
        match snapshot {
            Some(snapshot) => format!("<del>{}</del>\n\n{}", self.active(snapshot), CLOSED_NOTE),
            None => CLOSED_NOTE.to_string(),
        }
    }

    /// The caption for a retired message that a revised message replaces.
    pub fn superseded_old(&self, snapshot: &OutageSnapshot) -> String {
        format!("<del>{}</del>\n\n{}", self.active(snapshot), SUPERSEDED_OLD_NOTE)
    }

    /// The caption for the replacement message carrying a revised end time.
    pub fn superseded_new(&self, snapshot: &OutageSnapshot) -> String {
        format!("{}\n\n{}", self.active(snapshot), SUPERSEDED_NEW_NOTE)
    }
}
