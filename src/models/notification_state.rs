//! The single persisted record of what was last communicated to the channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::OutageRecord;

/// The outage data that produced the currently live notification. The four
/// fields travel together: either the whole snapshot is present or none of it
/// is, which is why they live in one struct behind a single `Option`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutageSnapshot {
    /// Outage description as it was communicated.
    pub text: String,
    /// Start of the communicated outage window.
    pub start_time: DateTime<Utc>,
    /// End of the communicated outage window.
    pub end_time: DateTime<Utc>,
    /// Source-side update marker of the communicated record.
    pub updated_at: DateTime<Utc>,
}

impl OutageSnapshot {
    /// Compares this snapshot against a freshly observed record.
    ///
    /// Timestamps compare as instants (equal moments in time are equal
    /// regardless of offset or formatting); the text compares as an exact
    /// string, so whitespace-only differences count as a change.
    pub fn matches(&self, current: &OutageRecord) -> bool {
        self.updated_at == current.updated_at
            && self.text == current.text
            && self.start_time == current.start_time
            && self.end_time == current.end_time
    }
}

impl From<&OutageRecord> for OutageSnapshot {
    fn from(record: &OutageRecord) -> Self {
        Self {
            text: record.text.clone(),
            start_time: record.start_time,
            end_time: record.end_time,
            updated_at: record.updated_at,
        }
    }
}

impl From<OutageRecord> for OutageSnapshot {
    fn from(record: OutageRecord) -> Self {
        Self::from(&record)
    }
}

/// The sole persisted entity: the channel message that is currently live and
/// the outage data it shows. Overwritten wholesale at the end of a cycle,
/// never partially mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedNotification {
    /// Identifier of the live notification message; `0` means none.
    #[serde(default)]
    pub message_id: i64,

    /// Snapshot of the record behind `message_id`. Absent exactly when no
    /// notification is live.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<OutageSnapshot>,
}

impl SavedNotification {
    /// Builds the state to persist after a message was successfully sent or
    /// edited for `record`.
    pub fn for_message(message_id: i64, record: &OutageRecord) -> Self {
        Self { message_id, snapshot: Some(OutageSnapshot::from(record)) }
    }

    /// Whether a notification message is currently live on the channel.
    pub fn has_live_message(&self) -> bool {
        self.message_id != 0
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, Utc};

    use super::*;
    use crate::test_helpers::OutageRecordBuilder;

    #[test]
    fn snapshot_matches_identical_record() {
        let record = OutageRecordBuilder::new().build();
        let snapshot = OutageSnapshot::from(&record);
        assert!(snapshot.matches(&record));
    }

    #[test]
    fn snapshot_matches_is_instant_equality_not_string_equality() {
        let record = OutageRecordBuilder::new().build();
        let mut snapshot = OutageSnapshot::from(&record);

        // Same instant expressed in a different zone still matches.
        let kyiv: DateTime<FixedOffset> =
            record.updated_at.with_timezone(&FixedOffset::east_opt(2 * 3600).unwrap());
        snapshot.updated_at = kyiv.with_timezone(&Utc);
        assert!(snapshot.matches(&record));
    }

    #[test]
    fn snapshot_text_comparison_is_exact() {
        let record = OutageRecordBuilder::new().text("Група 3").build();
        let mut snapshot = OutageSnapshot::from(&record);
        snapshot.text = "Група 3 ".to_string();
        assert!(!snapshot.matches(&record));
    }

    #[test]
    fn empty_state_round_trips_without_snapshot_fields() {
        let empty = SavedNotification::default();
        let json = serde_json::to_string(&empty).unwrap();
        assert_eq!(json, r#"{"message_id":0}"#);

        let restored: SavedNotification = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, empty);
    }

    #[test]
    fn populated_state_round_trips() {
        let record = OutageRecordBuilder::new().build();
        let state = SavedNotification::for_message(42, &record);
        assert!(state.has_live_message());

        let json = serde_json::to_string(&state).unwrap();
        let restored: SavedNotification = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
        assert!(restored.snapshot.unwrap().matches(&record));
    }
}
