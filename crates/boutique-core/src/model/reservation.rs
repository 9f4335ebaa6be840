use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use super::EntityId;

/// `pending` until completed (sale) or cancelled. Both are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// A customer's hold on a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: EntityId,
    pub product_id: EntityId,
    pub customer_name: String,
    pub customer_phone: String,
    pub status: ReservationStatus,
    pub reservation_date: DateTime<Utc>,
}

impl Reservation {
    pub fn is_pending(&self) -> bool {
        self.status == ReservationStatus::Pending
    }
}
