// ── Command routing ──
//
// One function per mutating operation. Each validates against the
// in-memory state first, then (in a remote session) writes to the remote
// store, then applies the result to memory and the cache. A failed remote
// write leaves memory untouched.

use chrono::Utc;
use tracing::{debug, error, warn};

use boutique_api::RestClient;
use boutique_api::rest::rows::{
    CategoryPatch, CategoryRow, ProductPatch, ProductRow, ReservationPatch, ReservationRow,
};

use super::Controller;
use crate::cache::CacheKey;
use crate::command::{
    AddCategoryRequest, AddProductRequest, Command, CommandResult, ReserveProductRequest,
    UpdateCategoryRequest, UpdateProductRequest, UpdateSettingsRequest,
};
use crate::convert::{settings_row, status_patch};
use crate::error::{ConflictReason, CoreError};
use crate::model::category::normalize_code;
use crate::model::product::{validate_images, validate_name, validate_price};
use crate::model::settings::validate_exchange_rate;
use crate::model::{
    Category, EntityId, Product, ProductStatus, ReconciliationIssue, Reservation,
    ReservationStatus, Settings,
};
use crate::reference;

/// Route a command to its operation.
pub(super) async fn route_command(
    controller: &Controller,
    cmd: Command,
) -> Result<CommandResult, CoreError> {
    let client = controller.rest_client().await;
    let client = client.as_ref();

    match cmd {
        // ── Products ─────────────────────────────────────────────
        Command::AddProduct(req) => add_product(controller, client, req)
            .await
            .map(CommandResult::Product),
        Command::UpdateProduct { id, update } => update_product(controller, client, &id, update)
            .await
            .map(CommandResult::Product),
        Command::DeleteProduct { id } => delete_product(controller, client, &id)
            .await
            .map(|()| CommandResult::Ok),

        // ── Categories ───────────────────────────────────────────
        Command::AddCategory(req) => add_category(controller, client, req)
            .await
            .map(CommandResult::Category),
        Command::UpdateCategory { id, update } => {
            update_category(controller, client, &id, update)
                .await
                .map(CommandResult::Category)
        }
        Command::DeleteCategory { id } => delete_category(controller, client, &id)
            .await
            .map(|()| CommandResult::Ok),

        // ── Reservations ─────────────────────────────────────────
        Command::ReserveProduct(req) => reserve_product(controller, client, req)
            .await
            .map(CommandResult::Reservation),
        Command::CompleteReservation { id } => {
            close_reservation(controller, client, &id, Closing::Complete)
                .await
                .map(CommandResult::Reservation)
        }
        Command::CancelReservation { id } => {
            close_reservation(controller, client, &id, Closing::Cancel)
                .await
                .map(CommandResult::Reservation)
        }

        // ── Settings ─────────────────────────────────────────────
        Command::UpdateSettings(update) => update_settings(controller, client, update)
            .await
            .map(CommandResult::Settings),
    }
}

// ── Products ─────────────────────────────────────────────────────

async fn add_product(
    controller: &Controller,
    client: Option<&RestClient>,
    req: AddProductRequest,
) -> Result<Product, CoreError> {
    let store = controller.store();

    validate_name(&req.name).map_err(CoreError::validation)?;
    validate_price(req.price).map_err(CoreError::validation)?;
    validate_images(&req.images).map_err(CoreError::validation)?;
    let category = store
        .category_by_id(&req.category_id)
        .ok_or_else(|| CoreError::reference("category", &req.category_id))?;

    let now = Utc::now();
    let reference = reference::generate(&category.code, now);
    if let Some(existing) = store.product_by_reference(&reference) {
        warn!(%reference, existing = %existing.id, "generated reference collides with an existing product");
    }

    let mut product = Product {
        id: EntityId::new_v4(),
        reference,
        name: req.name.trim().to_owned(),
        price: req.price,
        description: req.description,
        images: req.images,
        category_id: category.id.clone(),
        status: ProductStatus::Available,
        created_at: now,
    };

    if let Some(client) = client {
        let row = client.insert_product(&ProductRow::from(&product)).await?;
        product = from_row(row)?;
    }

    store.upsert_product(product.clone());
    controller.persist(&[CacheKey::Products]);
    debug!(id = %product.id, reference = %product.reference, "product added");
    Ok(product)
}

async fn update_product(
    controller: &Controller,
    client: Option<&RestClient>,
    id: &EntityId,
    update: UpdateProductRequest,
) -> Result<Product, CoreError> {
    let store = controller.store();
    let existing = store
        .product_by_id(id)
        .ok_or_else(|| CoreError::not_found("product", id))?;

    if update.is_empty() {
        return Ok(Product::clone(&existing));
    }

    if let Some(name) = &update.name {
        validate_name(name).map_err(CoreError::validation)?;
    }
    if let Some(price) = update.price {
        validate_price(price).map_err(CoreError::validation)?;
    }
    if let Some(images) = &update.images {
        validate_images(images).map_err(CoreError::validation)?;
    }
    if let Some(category_id) = &update.category_id {
        if store.category_by_id(category_id).is_none() {
            return Err(CoreError::reference("category", category_id));
        }
    }
    if let Some(target) = update.status {
        check_status_edit(controller, &existing, target)?;
    }

    let mut merged = Product::clone(&existing);
    let mut patch = ProductPatch::default();
    if let Some(name) = update.name {
        merged.name = name.trim().to_owned();
        patch.name = Some(merged.name.clone());
    }
    if let Some(price) = update.price {
        merged.price = price;
        patch.price = Some(price);
    }
    if let Some(description) = update.description {
        patch.description = Some(description.clone());
        merged.description = description;
    }
    if let Some(images) = update.images {
        patch.images = Some(images.clone());
        merged.images = images;
    }
    if let Some(category_id) = update.category_id {
        patch.category_id = Some(category_id.to_string());
        merged.category_id = category_id;
    }
    if let Some(status) = update.status {
        patch.status = Some(status.as_str().to_owned());
        merged.status = status;
    }

    if let Some(client) = client {
        let row = client.update_product(&id.to_string(), &patch).await?;
        merged = from_row(row)?;
    }

    store.upsert_product(merged.clone());
    controller.persist(&[CacheKey::Products]);
    Ok(merged)
}

/// Direct status edits may move a product between `available` and `sold`.
/// `reserved` is only entered through a reservation, and a product with a
/// pending reservation only leaves `reserved` by completing or cancelling it.
fn check_status_edit(
    controller: &Controller,
    existing: &Product,
    target: ProductStatus,
) -> Result<(), CoreError> {
    if target == existing.status {
        return Ok(());
    }
    if target == ProductStatus::Reserved {
        return Err(CoreError::conflict(
            ConflictReason::StatusManagedByReservations,
        ));
    }
    if controller
        .store()
        .pending_reservation_for(&existing.id)
        .is_some()
    {
        return Err(CoreError::conflict(ConflictReason::PendingReservation));
    }
    Ok(())
}

async fn delete_product(
    controller: &Controller,
    client: Option<&RestClient>,
    id: &EntityId,
) -> Result<(), CoreError> {
    let store = controller.store();
    if store.product_by_id(id).is_none() {
        return Err(CoreError::not_found("product", id));
    }
    if store.pending_reservation_for(id).is_some() {
        return Err(CoreError::conflict(ConflictReason::PendingReservation));
    }

    if let Some(client) = client {
        client.delete_product(&id.to_string()).await?;
    }

    store.remove_product(id);
    // Closed reservations would otherwise point at a missing product.
    let history = store.reservations_for_product(id);
    for reservation in &history {
        store.remove_reservation(&reservation.id);
    }

    if history.is_empty() {
        controller.persist(&[CacheKey::Products]);
    } else {
        controller.persist(&[CacheKey::Products, CacheKey::Reservations]);
    }
    debug!(%id, dropped_reservations = history.len(), "product deleted");
    Ok(())
}

// ── Categories ───────────────────────────────────────────────────

fn validate_category_name(name: &str) -> Result<String, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::validation("category name must not be empty"));
    }
    Ok(name.to_owned())
}

/// Codes prefix product references, so two categories may not share one.
fn check_code_free(
    controller: &Controller,
    code: &str,
    except: Option<&EntityId>,
) -> Result<(), CoreError> {
    match controller.store().category_by_code(code) {
        Some(other) if Some(&other.id) != except => Err(CoreError::validation(format!(
            "category code {code} is already used by {}",
            other.name
        ))),
        _ => Ok(()),
    }
}

async fn add_category(
    controller: &Controller,
    client: Option<&RestClient>,
    req: AddCategoryRequest,
) -> Result<Category, CoreError> {
    let name = validate_category_name(&req.name)?;
    let code = normalize_code(&req.code).map_err(CoreError::validation)?;
    check_code_free(controller, &code, None)?;

    let mut category = Category {
        id: EntityId::new_v4(),
        name,
        code,
    };

    if let Some(client) = client {
        let row = client.insert_category(&CategoryRow::from(&category)).await?;
        category = from_row(row)?;
    }

    controller.store().upsert_category(category.clone());
    controller.persist(&[CacheKey::Categories]);
    Ok(category)
}

async fn update_category(
    controller: &Controller,
    client: Option<&RestClient>,
    id: &EntityId,
    update: UpdateCategoryRequest,
) -> Result<Category, CoreError> {
    let store = controller.store();
    let existing = store
        .category_by_id(id)
        .ok_or_else(|| CoreError::not_found("category", id))?;

    let mut merged = Category::clone(&existing);
    let mut patch = CategoryPatch::default();
    if let Some(name) = &update.name {
        merged.name = validate_category_name(name)?;
        patch.name = Some(merged.name.clone());
    }
    if let Some(code) = &update.code {
        let code = normalize_code(code).map_err(CoreError::validation)?;
        check_code_free(controller, &code, Some(id))?;
        patch.code = Some(code.clone());
        merged.code = code;
    }

    if patch.name.is_none() && patch.code.is_none() {
        return Ok(merged);
    }

    if let Some(client) = client {
        let row = client.update_category(&id.to_string(), &patch).await?;
        merged = from_row(row)?;
    }

    store.upsert_category(merged.clone());
    controller.persist(&[CacheKey::Categories]);
    Ok(merged)
}

async fn delete_category(
    controller: &Controller,
    client: Option<&RestClient>,
    id: &EntityId,
) -> Result<(), CoreError> {
    let store = controller.store();
    if store.category_by_id(id).is_none() {
        return Err(CoreError::not_found("category", id));
    }
    if store.category_in_use(id) {
        return Err(CoreError::conflict(ConflictReason::HasProducts));
    }

    if let Some(client) = client {
        client.delete_category(&id.to_string()).await?;
    }

    store.remove_category(id);
    controller.persist(&[CacheKey::Categories]);
    Ok(())
}

// ── Reservations ─────────────────────────────────────────────────

fn required(field: &str, value: &str) -> Result<String, CoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::validation(format!("{field} must not be empty")));
    }
    Ok(value.to_owned())
}

async fn reserve_product(
    controller: &Controller,
    client: Option<&RestClient>,
    req: ReserveProductRequest,
) -> Result<Reservation, CoreError> {
    let store = controller.store();

    let customer_name = required("customer name", &req.customer_name)?;
    let customer_phone = required("customer phone", &req.customer_phone)?;
    let product = store
        .product_by_id(&req.product_id)
        .ok_or_else(|| CoreError::not_found("product", &req.product_id))?;
    if !product.is_available() || store.pending_reservation_for(&product.id).is_some() {
        return Err(CoreError::conflict(ConflictReason::NotAvailable));
    }

    let mut reservation = Reservation {
        id: EntityId::new_v4(),
        product_id: product.id.clone(),
        customer_name,
        customer_phone,
        status: ReservationStatus::Pending,
        reservation_date: Utc::now(),
    };
    let mut updated = Product::clone(&product);
    updated.status = ProductStatus::Reserved;

    if let Some(client) = client {
        let reservation_id = reservation.id.to_string();
        let row = client
            .insert_reservation(&ReservationRow::from(&reservation))
            .await?;

        // The insert is committed from here on: every failure undoes it.
        let second = match from_row(row) {
            Ok(echoed) => {
                reservation = echoed;
                client
                    .update_product(&product.id.to_string(), &status_patch(ProductStatus::Reserved))
                    .await
                    .map_err(CoreError::from)
            }
            Err(e) => Err(e),
        };
        match second {
            Ok(row) => updated = echo_or_local(row, updated, "product"),
            Err(e) => {
                let undo = client.delete_reservation(&reservation_id).await;
                return Err(compensated(
                    controller,
                    "reserve_product",
                    "reservation",
                    &reservation.id,
                    e,
                    undo,
                ));
            }
        }
    }

    store.upsert_reservation(reservation.clone());
    store.upsert_product(updated);
    controller.persist(&[CacheKey::Reservations, CacheKey::Products]);
    debug!(id = %reservation.id, product = %product.reference, "product reserved");
    Ok(reservation)
}

/// How a pending reservation is closed.
#[derive(Debug, Clone, Copy)]
enum Closing {
    /// The customer bought the product.
    Complete,
    /// The hold is released.
    Cancel,
}

impl Closing {
    fn operation(self) -> &'static str {
        match self {
            Self::Complete => "complete_reservation",
            Self::Cancel => "cancel_reservation",
        }
    }

    fn reservation_status(self) -> ReservationStatus {
        match self {
            Self::Complete => ReservationStatus::Completed,
            Self::Cancel => ReservationStatus::Cancelled,
        }
    }

    fn product_status(self) -> ProductStatus {
        match self {
            Self::Complete => ProductStatus::Sold,
            Self::Cancel => ProductStatus::Available,
        }
    }
}

async fn close_reservation(
    controller: &Controller,
    client: Option<&RestClient>,
    id: &EntityId,
    closing: Closing,
) -> Result<Reservation, CoreError> {
    let store = controller.store();
    let operation = closing.operation();
    let target = closing.reservation_status();
    let product_status = closing.product_status();

    let existing = store
        .reservation_by_id(id)
        .ok_or_else(|| CoreError::not_found("reservation", id))?;
    if !existing.is_pending() {
        return Err(CoreError::conflict(ConflictReason::ReservationClosed));
    }
    let product = store
        .product_by_id(&existing.product_id)
        .ok_or_else(|| CoreError::reference("product", &existing.product_id))?;

    let mut reservation = Reservation::clone(&existing);
    reservation.status = target;
    let mut updated = Product::clone(&product);
    updated.status = product_status;

    if let Some(client) = client {
        let reservation_id = id.to_string();
        let row = client
            .update_reservation(&reservation_id, &reservation_patch(target))
            .await?;

        // The reservation update is committed: every failure reopens it.
        let second = match from_row(row) {
            Ok(echoed) => {
                reservation = echoed;
                client
                    .update_product(&product.id.to_string(), &status_patch(product_status))
                    .await
                    .map_err(CoreError::from)
            }
            Err(e) => Err(e),
        };
        match second {
            Ok(row) => updated = echo_or_local(row, updated, "product"),
            Err(e) => {
                let undo = client
                    .update_reservation(
                        &reservation_id,
                        &reservation_patch(ReservationStatus::Pending),
                    )
                    .await
                    .map(|_: ReservationRow| ());
                return Err(compensated(controller, operation, "reservation", id, e, undo));
            }
        }
    }

    store.upsert_reservation(reservation.clone());
    store.upsert_product(updated);
    controller.persist(&[CacheKey::Reservations, CacheKey::Products]);
    debug!(%id, status = %target, "reservation closed");
    Ok(reservation)
}

/// The entity echoed by the last write of a two-write sequence, or the
/// locally built one when the echo cannot be read. Both writes are
/// committed at that point, so the sequence counts as successful.
fn echo_or_local<R, T>(row: R, local: T, entity: &str) -> T
where
    T: TryFrom<R, Error = String>,
{
    match from_row(row) {
        Ok(echoed) => echoed,
        Err(e) => {
            warn!(entity, error = %e, "unreadable echo after a committed write, keeping local copy");
            local
        }
    }
}

fn reservation_patch(status: ReservationStatus) -> ReservationPatch {
    ReservationPatch {
        status: Some(status.as_str().to_owned()),
    }
}

/// Turn a failure after the first write into the caller's error.
///
/// If the undo of the first write succeeded, the original error is
/// returned. If it failed too, the remote store now disagrees with memory:
/// the issue is recorded and `CompensationFailed` returned.
fn compensated(
    controller: &Controller,
    operation: &str,
    entity: &str,
    id: &EntityId,
    err: CoreError,
    undo: Result<(), boutique_api::Error>,
) -> CoreError {
    let Err(undo_err) = undo else {
        debug!(operation, %id, "second write failed, first write undone");
        return err;
    };

    let detail = format!("{err}; undo failed: {undo_err}");
    error!(operation, %id, %detail, "remote store needs reconciliation");
    controller
        .store()
        .push_reconciliation_issue(ReconciliationIssue {
            entity: entity.to_owned(),
            id: id.clone(),
            operation: operation.to_owned(),
            detail: detail.clone(),
            at: Utc::now(),
        });
    CoreError::CompensationFailed {
        operation: operation.to_owned(),
        message: detail,
    }
}

// ── Settings ─────────────────────────────────────────────────────

async fn update_settings(
    controller: &Controller,
    client: Option<&RestClient>,
    update: UpdateSettingsRequest,
) -> Result<Settings, CoreError> {
    let store = controller.store();
    let mut merged = store.settings();

    if let Some(store_name) = update.store_name {
        merged.store_name = required("store name", &store_name)?;
    }
    if let Some(logo_url) = update.logo_url {
        merged.logo_url = logo_url;
    }
    if let Some(slogan) = update.slogan {
        merged.slogan = slogan;
    }
    if let Some(number) = update.whatsapp_number {
        merged.whatsapp_number = required("WhatsApp number", &number)?;
    }
    if let Some(rate) = update.exchange_rate {
        validate_exchange_rate(rate).map_err(CoreError::validation)?;
        merged.exchange_rate = rate;
    }

    if let Some(client) = client {
        let existing_id = client.get_settings().await?.and_then(|row| row.id);
        let row = match existing_id {
            Some(existing_id) => {
                client
                    .update_settings(&existing_id, &settings_row(&merged, Some(existing_id.clone())))
                    .await?
            }
            None => client.insert_settings(&settings_row(&merged, None)).await?,
        };
        merged = Settings::from(row);
    }

    store.set_settings(merged.clone());
    controller.persist(&[CacheKey::Settings]);
    Ok(merged)
}

// ── Helpers ──────────────────────────────────────────────────────

/// Convert a row returned by the remote store.
fn from_row<R, T>(row: R) -> Result<T, CoreError>
where
    T: TryFrom<R, Error = String>,
{
    T::try_from(row).map_err(|reason| CoreError::Remote {
        message: format!("remote store returned an unreadable row: {reason}"),
        code: None,
        status: None,
    })
}
