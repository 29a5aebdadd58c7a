//! The normalized snapshot of remote outage state for one address.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fresh observation of the remote outage status. Produced once per cycle
/// and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutageRecord {
    /// Whether the source currently shows an outage for the address.
    pub active: bool,

    /// Human-readable outage description. An empty string counts as "no
    /// content" and the record is then treated as inactive.
    pub text: String,

    /// Start of the announced outage window. Meaningful only when `active`.
    pub start_time: DateTime<Utc>,

    /// End of the announced outage window. Meaningful only when `active`.
    pub end_time: DateTime<Utc>,

    /// Source-side last-update marker; the primary change-detection key.
    pub updated_at: DateTime<Utc>,

    /// Category tag reported by the source. Informational only, never used
    /// in reconciliation decisions.
    pub kind: String,
}

impl OutageRecord {
    /// Returns true when this record carries no reportable outage, i.e. it is
    /// inactive or has an empty description.
    pub fn is_blank(&self) -> bool {
        !self.active || self.text.is_empty()
    }
}
