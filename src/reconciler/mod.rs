//! The state-reconciliation engine.
//!
//! [`decide`] compares the previously communicated state against a freshly
//! observed outage record and returns the action to take. It performs no I/O
//! and owns no clock: everything fallible or blocking lives in the
//! [`ActionExecutor`](crate::executor::ActionExecutor), which is what keeps
//! this logic testable in isolation.

use crate::models::{OutageRecord, SavedNotification};

/// The outcome of one reconciliation decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing changed; the channel is already up to date.
    NoOp,

    /// No notification is live; create one for `current`.
    Create {
        /// The record to announce.
        current: OutageRecord,
    },

    /// A notification is live and the data changed; edit it in place.
    Update {
        /// The live notification being edited.
        previous: SavedNotification,
        /// The record to show instead.
        current: OutageRecord,
    },

    /// The outage window's end time was revised: strike through the live
    /// message and open a new one as a threaded reply, preserving history.
    Supersede {
        /// The live notification being retired.
        previous: SavedNotification,
        /// The record for the replacement message.
        current: OutageRecord,
    },

    /// The outage cleared; mark the live message as resolved and forget it.
    Close {
        /// The live notification being closed.
        previous: SavedNotification,
    },
}

/// Decides what to do given the last communicated state and the current
/// observation. Pure and deterministic; evaluates the cases in order, first
/// match wins.
pub fn decide(previous: &SavedNotification, current: Option<&OutageRecord>) -> Action {
    // Case 1: nothing to report. Close the live message if there is one.
    let current = match current {
        Some(record) if !record.is_blank() => record,
        _ => {
            if previous.has_live_message() {
                return Action::Close { previous: previous.clone() };
            }
            return Action::NoOp;
        }
    };

    // Case 2: identical to what was already communicated.
    if previous.snapshot.as_ref().is_some_and(|snapshot| snapshot.matches(current)) {
        return Action::NoOp;
    }

    // Case 3: data changed while a message is live.
    if previous.has_live_message() {
        let end_time_changed = previous
            .snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.end_time != current.end_time);

        if end_time_changed {
            return Action::Supersede { previous: previous.clone(), current: current.clone() };
        }
        return Action::Update { previous: previous.clone(), current: current.clone() };
    }

    // Case 4: data present but nothing is live yet.
    Action::Create { current: current.clone() }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::test_helpers::{hour, OutageRecordBuilder};

    #[test]
    fn no_outage_and_no_live_message_is_noop() {
        let previous = SavedNotification::default();

        assert_eq!(decide(&previous, None), Action::NoOp);

        let inactive = OutageRecordBuilder::new().active(false).build();
        assert_eq!(decide(&previous, Some(&inactive)), Action::NoOp);

        let empty_text = OutageRecordBuilder::new().text("").build();
        assert_eq!(decide(&previous, Some(&empty_text)), Action::NoOp);
    }

    #[test]
    fn no_outage_with_live_message_closes_it() {
        let record = OutageRecordBuilder::new().build();
        let previous = SavedNotification::for_message(42, &record);

        let action = decide(&previous, None);
        assert_eq!(action, Action::Close { previous: previous.clone() });

        // An inactive record is equivalent to no record at all.
        let inactive = OutageRecordBuilder::new().active(false).build();
        let action = decide(&previous, Some(&inactive));
        assert_eq!(action, Action::Close { previous });
    }

    #[test]
    fn identical_data_is_noop() {
        // All four compared fields equal what was communicated.
        let record = OutageRecordBuilder::new()
            .text("Група 3")
            .start_time(hour(10))
            .end_time(hour(14))
            .updated_at(hour(9))
            .build();
        let previous = SavedNotification::for_message(42, &record);

        assert_eq!(decide(&previous, Some(&record)), Action::NoOp);
    }

    #[test]
    fn decide_is_idempotent_on_unchanged_inputs() {
        let record = OutageRecordBuilder::new().build();
        let previous = SavedNotification::for_message(42, &record);

        let first = decide(&previous, Some(&record));
        let second = decide(&previous, Some(&record));
        assert_eq!(first, second);
        assert_eq!(first, Action::NoOp);
    }

    #[test]
    fn first_observation_creates_a_notification() {
        // Empty previous state, active outage.
        let record = OutageRecordBuilder::new()
            .text("Група 3")
            .start_time(hour(10))
            .end_time(hour(14))
            .updated_at(hour(9))
            .build();

        let action = decide(&SavedNotification::default(), Some(&record));
        assert_eq!(action, Action::Create { current: record });
    }

    #[test]
    fn changed_end_time_supersedes_live_message() {
        // The announced end moved from 14:00 to 16:00.
        let old = OutageRecordBuilder::new()
            .text("Група 3")
            .start_time(hour(10))
            .end_time(hour(14))
            .updated_at(hour(9))
            .build();
        let previous = SavedNotification::for_message(42, &old);

        let revised = OutageRecordBuilder::new()
            .text("Група 3")
            .start_time(hour(10))
            .end_time(hour(16))
            .updated_at(hour(9) + Duration::minutes(30))
            .build();

        let action = decide(&previous, Some(&revised));
        assert_eq!(action, Action::Supersede { previous, current: revised });
    }

    #[test]
    fn changed_data_with_same_end_time_updates_in_place() {
        let old = OutageRecordBuilder::new().text("Група 3").build();
        let previous = SavedNotification::for_message(42, &old);

        let refreshed = OutageRecordBuilder::new()
            .text("Група 3")
            .updated_at(old.updated_at + Duration::minutes(15))
            .build();

        let action = decide(&previous, Some(&refreshed));
        assert_eq!(action, Action::Update { previous, current: refreshed });
    }

    #[test]
    fn changed_data_without_live_message_creates() {
        // State was reset (e.g. after an unrecoverable update failure) but the
        // outage is still on: a fresh message is created, not an edit.
        let record = OutageRecordBuilder::new().build();
        let previous = SavedNotification::default();

        let action = decide(&previous, Some(&record));
        assert_eq!(action, Action::Create { current: record });
    }

    #[test]
    fn timestamps_compare_as_instants_not_strings() {
        use chrono::{FixedOffset, Utc};

        let record = OutageRecordBuilder::new().build();
        let mut previous = SavedNotification::for_message(42, &record);

        // Rewrite the snapshot through a +02:00 offset round trip. The
        // instants are unchanged, so the decision must still be NoOp.
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        if let Some(snapshot) = previous.snapshot.as_mut() {
            snapshot.updated_at = snapshot.updated_at.with_timezone(&offset).with_timezone(&Utc);
            snapshot.end_time = snapshot.end_time.with_timezone(&offset).with_timezone(&Utc);
        }

        assert_eq!(decide(&previous, Some(&record)), Action::NoOp);
    }
}
