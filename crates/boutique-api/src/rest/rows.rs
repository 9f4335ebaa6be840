// Row shapes as stored remotely (snake_case columns).
//
// Ids and statuses stay as strings here; `boutique-core` parses them into
// domain types and skips rows that do not parse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Categories ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRow {
    pub id: String,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

// ── Products ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
    pub id: String,
    pub reference: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub category_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// ── Reservations ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationRow {
    pub id: String,
    pub product_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub status: String,
    pub reservation_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReservationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// ── Settings ────────────────────────────────────────────────────────

/// The settings singleton. `id` is absent on insert and assigned remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub store_name: String,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub slogan: String,
    #[serde(default)]
    pub whatsapp_number: String,
    pub exchange_rate: f64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn product_row_reads_snake_case_columns() {
        let row: ProductRow = serde_json::from_value(json!({
            "id": "6f1c2a0e-8d4b-4c1e-9f3a-2b7d5e8c1a90",
            "reference": "DRS26-0042",
            "name": "Dress A",
            "price": 100.0,
            "description": "Linen",
            "images": ["a", "b", "c", "d"],
            "category_id": "0d5e7c1b-3a2f-4e6d-8b9c-1f2a3b4c5d6e",
            "status": "available",
            "created_at": "2026-03-01T10:00:00+00:00"
        }))
        .unwrap();

        assert_eq!(row.category_id, "0d5e7c1b-3a2f-4e6d-8b9c-1f2a3b4c5d6e");
        assert_eq!(row.images.len(), 4);
    }

    #[test]
    fn product_row_tolerates_null_free_columns() {
        let row: ProductRow = serde_json::from_value(json!({
            "id": "x",
            "reference": "TOP26-0001",
            "name": "Top",
            "price": 12.5,
            "category_id": "y",
            "status": "sold",
            "created_at": "2026-03-01T10:00:00Z"
        }))
        .unwrap();

        assert!(row.images.is_empty());
        assert!(row.description.is_empty());
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = ProductPatch {
            price: Some(0.0),
            description: Some(String::new()),
            ..ProductPatch::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({ "price": 0.0, "description": "" })
        );
    }

    #[test]
    fn settings_row_omits_missing_id_on_insert() {
        let row = SettingsRow {
            id: None,
            store_name: "Shop".into(),
            logo_url: String::new(),
            slogan: String::new(),
            whatsapp_number: "+505".into(),
            exchange_rate: 36.5,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["exchange_rate"], 36.5);
    }
}
