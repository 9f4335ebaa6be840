//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::sync::Arc;

use boutique_core::{
    Category, Controller, EntityId, Product, ProductStatus, Reservation, ReservationStatus,
};

use crate::cli::{ProductStatusArg, ReservationStatusArg};
use crate::error::CliError;

/// Resolve a product by ID or reference (case-insensitive).
pub fn resolve_product(controller: &Controller, identifier: &str) -> Result<Arc<Product>, CliError> {
    controller
        .product_by_id(&EntityId::from(identifier))
        .or_else(|| {
            controller
                .products_snapshot()
                .iter()
                .find(|p| p.reference.eq_ignore_ascii_case(identifier))
                .cloned()
        })
        .ok_or_else(|| CliError::not_found("product", identifier))
}

/// Resolve a category by ID or code (case-insensitive).
pub fn resolve_category(
    controller: &Controller,
    identifier: &str,
) -> Result<Arc<Category>, CliError> {
    controller
        .category_by_id(&EntityId::from(identifier))
        .or_else(|| controller.store().category_by_code(identifier))
        .ok_or_else(|| CliError::not_found("category", identifier))
}

/// Resolve a reservation by ID, or the pending reservation of a product
/// given by ID or reference.
pub fn resolve_reservation(
    controller: &Controller,
    identifier: &str,
) -> Result<Arc<Reservation>, CliError> {
    if let Some(reservation) = controller.reservation_by_id(&EntityId::from(identifier)) {
        return Ok(reservation);
    }
    resolve_product(controller, identifier)
        .ok()
        .and_then(|product| controller.reservation_by_product_id(&product.id))
        .ok_or_else(|| CliError::not_found("reservation", identifier))
}

/// Short form of a reference or ID for table cells.
pub fn product_label(controller: &Controller, id: &EntityId) -> String {
    controller
        .product_by_id(id)
        .map_or_else(|| id.to_string(), |p| p.reference.clone())
}

pub fn product_status(arg: ProductStatusArg) -> ProductStatus {
    match arg {
        ProductStatusArg::Available => ProductStatus::Available,
        ProductStatusArg::Reserved => ProductStatus::Reserved,
        ProductStatusArg::Sold => ProductStatus::Sold,
    }
}

pub fn reservation_status(arg: ReservationStatusArg) -> ReservationStatus {
    match arg {
        ReservationStatusArg::Pending => ReservationStatus::Pending,
        ReservationStatusArg::Completed => ReservationStatus::Completed,
        ReservationStatusArg::Cancelled => ReservationStatus::Cancelled,
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}
