//! Data entities shared across the application.

mod notification_state;
mod outage;

pub use notification_state::{OutageSnapshot, SavedNotification};
pub use outage::OutageRecord;
