// Read-only aggregates. The core never computes these; they are supplied
// from outside (or left empty) and held for consumers.

use serde::{Deserialize, Serialize};

use super::EntityId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub period: String,
    pub total_sales: f64,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub daily: SalesSummary,
    pub weekly: SalesSummary,
    pub monthly: SalesSummary,
    pub yearly: SalesSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: EntityId,
    pub product_name: String,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerReport {
    pub total_customers: u32,
    pub new_customers: u32,
    pub returning_customers: u32,
    #[serde(default)]
    pub top_products: Vec<TopProduct>,
}

/// Both reports, each optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reports {
    pub sales: Option<SalesReport>,
    pub customers: Option<CustomerReport>,
}
