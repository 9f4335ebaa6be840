use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use super::EntityId;

/// Minimum number of images a product must carry.
pub const MIN_IMAGES: usize = 4;

/// Where a product is in its sale lifecycle.
///
/// `available --reserve--> reserved --complete--> sold`, and
/// `reserved --cancel--> available`. `sold` is terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProductStatus {
    Available,
    Reserved,
    Sold,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: EntityId,
    /// `{categoryCode}{YY}-{NNNN}`, assigned at creation and never changed.
    pub reference: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub category_id: EntityId,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Available
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("product name must not be empty".into());
    }
    Ok(())
}

pub(crate) fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() || price <= 0.0 {
        return Err(format!("price must be greater than zero, got {price}"));
    }
    Ok(())
}

pub(crate) fn validate_images(images: &[String]) -> Result<(), String> {
    if images.len() < MIN_IMAGES {
        return Err(format!(
            "at least {MIN_IMAGES} images are required, got {}",
            images.len()
        ));
    }
    if images.iter().any(|uri| uri.trim().is_empty()) {
        return Err("image URIs must not be empty".into());
    }
    Ok(())
}
