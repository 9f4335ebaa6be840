use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityId;

/// A remote write that could not be undone after its companion write
/// failed. The remote store and the in-memory state disagree until an
/// administrator resolves it (typically with a full refresh).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationIssue {
    /// `"reservation"` or `"product"`.
    pub entity: String,
    pub id: EntityId,
    /// The command that left the inconsistency (`reserve_product`, ...).
    pub operation: String,
    pub detail: String,
    pub at: DateTime<Utc>,
}
