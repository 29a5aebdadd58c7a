//! A set of helpers for testing

use chrono::{DateTime, TimeZone, Utc};

use crate::models::OutageRecord;

/// Returns `h:00` UTC on a fixed reference day, the shared anchor for test
/// timestamps.
pub fn hour(h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 15, h, 0, 0).single().expect("valid test timestamp")
}

/// A builder for creating [`OutageRecord`] instances for testing.
pub struct OutageRecordBuilder {
    record: OutageRecord,
}

impl Default for OutageRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OutageRecordBuilder {
    /// Creates a builder for an active outage with plausible defaults.
    pub fn new() -> Self {
        Self {
            record: OutageRecord {
                active: true,
                text: "Застосування графіків аварійних відключень".to_string(),
                start_time: hour(10),
                end_time: hour(14),
                updated_at: hour(9),
                kind: "emergency".to_string(),
            },
        }
    }

    /// Sets whether the outage is shown as active.
    pub fn active(mut self, active: bool) -> Self {
        self.record.active = active;
        self
    }

    /// Sets the outage description.
    pub fn text(mut self, text: &str) -> Self {
        self.record.text = text.to_string();
        self
    }

    /// Sets the outage window start.
    pub fn start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.record.start_time = start_time;
        self
    }

    /// Sets the outage window end.
    pub fn end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.record.end_time = end_time;
        self
    }

    /// Sets the source-side update marker.
    pub fn updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.record.updated_at = updated_at;
        self
    }

    /// Sets the category tag.
    pub fn kind(mut self, kind: &str) -> Self {
        self.record.kind = kind.to_string();
        self
    }

    /// Builds the record.
    pub fn build(self) -> OutageRecord {
        self.record
    }
}
