// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The
// controller's command processor runs them one at a time, so every
// precondition is checked against the in-memory state as it is when the
// command actually runs.

pub mod requests;

use crate::error::CoreError;
use crate::model::{Category, EntityId, Product, Reservation, Settings};

pub use requests::{
    AddCategoryRequest, AddProductRequest, ReserveProductRequest, UpdateCategoryRequest,
    UpdateProductRequest, UpdateSettingsRequest,
};

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// All mutating operations on the storefront.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Products ─────────────────────────────────────────────────────
    AddProduct(AddProductRequest),
    UpdateProduct {
        id: EntityId,
        update: UpdateProductRequest,
    },
    DeleteProduct {
        id: EntityId,
    },

    // ── Categories ───────────────────────────────────────────────────
    AddCategory(AddCategoryRequest),
    UpdateCategory {
        id: EntityId,
        update: UpdateCategoryRequest,
    },
    DeleteCategory {
        id: EntityId,
    },

    // ── Reservations ─────────────────────────────────────────────────
    ReserveProduct(ReserveProductRequest),
    CompleteReservation {
        id: EntityId,
    },
    CancelReservation {
        id: EntityId,
    },

    // ── Settings ─────────────────────────────────────────────────────
    UpdateSettings(UpdateSettingsRequest),
}

impl Command {
    /// Stable operation name, used in notifications and logs.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::AddProduct(_) => "add_product",
            Self::UpdateProduct { .. } => "update_product",
            Self::DeleteProduct { .. } => "delete_product",
            Self::AddCategory(_) => "add_category",
            Self::UpdateCategory { .. } => "update_category",
            Self::DeleteCategory { .. } => "delete_category",
            Self::ReserveProduct(_) => "reserve_product",
            Self::CompleteReservation { .. } => "complete_reservation",
            Self::CancelReservation { .. } => "cancel_reservation",
            Self::UpdateSettings(_) => "update_settings",
        }
    }
}

/// Result of a successfully executed command.
#[derive(Debug, Clone)]
pub enum CommandResult {
    Ok,
    Product(Product),
    Category(Category),
    Reservation(Reservation),
    Settings(Settings),
}
