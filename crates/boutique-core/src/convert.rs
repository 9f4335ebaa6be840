// ── Row-to-domain type conversions ──
//
// Bridges `boutique_api` row types (snake_case columns, string ids and
// statuses) into canonical `boutique_core::model` types and back. Rows
// that fail to parse are dropped with a warning rather than failing a
// whole refresh.

use boutique_api::rest::rows::{
    CategoryRow, ProductPatch, ProductRow, ReservationRow, SettingsRow,
};
use tracing::warn;

use crate::model::{
    Category, EntityId, Product, ProductStatus, Reservation, ReservationStatus, Settings,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Convert every row, logging and skipping the ones that do not parse.
pub(crate) fn convert_rows<R, T>(table: &str, rows: Vec<R>) -> Vec<T>
where
    T: TryFrom<R, Error = String>,
{
    rows.into_iter()
        .filter_map(|row| match T::try_from(row) {
            Ok(entity) => Some(entity),
            Err(reason) => {
                warn!(table, %reason, "skipping malformed row");
                None
            }
        })
        .collect()
}

// ── Category ───────────────────────────────────────────────────────

impl TryFrom<CategoryRow> for Category {
    type Error = String;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: EntityId::from(row.id),
            name: row.name,
            code: row.code,
        })
    }
}

impl From<&Category> for CategoryRow {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id.to_string(),
            name: c.name.clone(),
            code: c.code.clone(),
        }
    }
}

// ── Product ────────────────────────────────────────────────────────

impl TryFrom<ProductRow> for Product {
    type Error = String;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let status: ProductStatus = row
            .status
            .parse()
            .map_err(|_| format!("product {}: unknown status {:?}", row.id, row.status))?;

        Ok(Self {
            id: EntityId::from(row.id),
            reference: row.reference,
            name: row.name,
            price: row.price,
            description: row.description,
            images: row.images,
            category_id: EntityId::from(row.category_id),
            status,
            created_at: row.created_at,
        })
    }
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id.to_string(),
            reference: p.reference.clone(),
            name: p.name.clone(),
            price: p.price,
            description: p.description.clone(),
            images: p.images.clone(),
            category_id: p.category_id.to_string(),
            status: p.status.as_str().to_owned(),
            created_at: p.created_at,
        }
    }
}

/// A patch that only moves the product's status.
pub(crate) fn status_patch(status: ProductStatus) -> ProductPatch {
    ProductPatch {
        status: Some(status.as_str().to_owned()),
        ..ProductPatch::default()
    }
}

// ── Reservation ────────────────────────────────────────────────────

impl TryFrom<ReservationRow> for Reservation {
    type Error = String;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        let status: ReservationStatus = row
            .status
            .parse()
            .map_err(|_| format!("reservation {}: unknown status {:?}", row.id, row.status))?;

        Ok(Self {
            id: EntityId::from(row.id),
            product_id: EntityId::from(row.product_id),
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            status,
            reservation_date: row.reservation_date,
        })
    }
}

impl From<&Reservation> for ReservationRow {
    fn from(r: &Reservation) -> Self {
        Self {
            id: r.id.to_string(),
            product_id: r.product_id.to_string(),
            customer_name: r.customer_name.clone(),
            customer_phone: r.customer_phone.clone(),
            status: r.status.as_str().to_owned(),
            reservation_date: r.reservation_date,
        }
    }
}

// ── Settings ───────────────────────────────────────────────────────

impl From<SettingsRow> for Settings {
    fn from(row: SettingsRow) -> Self {
        Self {
            store_name: row.store_name,
            logo_url: row.logo_url,
            slogan: row.slogan,
            whatsapp_number: row.whatsapp_number,
            exchange_rate: row.exchange_rate,
        }
    }
}

/// Settings as a row; `id` is the existing remote row, if any.
pub(crate) fn settings_row(settings: &Settings, id: Option<String>) -> SettingsRow {
    SettingsRow {
        id,
        store_name: settings.store_name.clone(),
        logo_url: settings.logo_url.clone(),
        slogan: settings.slogan.clone(),
        whatsapp_number: settings.whatsapp_number.clone(),
        exchange_rate: settings.exchange_rate,
    }
}
