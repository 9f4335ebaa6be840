// boutique-core: Domain state, local cache, and remote sync for the boutique storefront.

pub mod cache;
pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod link;
pub mod listener;
pub mod model;
pub mod notify;
pub mod reference;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{CacheKey, LocalCache};
pub use command::requests::*;
pub use command::{Command, CommandResult};
pub use config::{CacheLocation, Identity, ReconnectConfig, StoreConfig};
pub use controller::{Controller, SessionState};
pub use error::{ConflictReason, CoreError};
pub use listener::ChangeSubscription;
pub use notify::{Notification, NotificationLevel};
pub use store::{DataStore, StoreSnapshot};
pub use stream::{EntityStream, ProductFilter, ReservationFilter};

// Change-feed types are part of the public surface.
pub use boutique_api::{ChangeEvent, ChangeKind, Table};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Category, CustomerReport, Dashboard, EntityId, Product, ProductStatus, ReconciliationIssue,
    Reports, Reservation, ReservationStatus, SalesReport, SalesSummary, Settings, TopProduct,
};
