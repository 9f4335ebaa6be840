use serde::Serialize;

/// Point-in-time counts over the in-memory collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub products: usize,
    pub available: usize,
    pub reserved: usize,
    pub sold: usize,
    pub categories: usize,
    pub pending_reservations: usize,
    pub completed_reservations: usize,
    pub cancelled_reservations: usize,
    /// Sum of prices of available products, in local currency.
    pub catalog_value: f64,
}
