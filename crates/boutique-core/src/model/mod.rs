// ── Domain model ──
//
// Canonical representation of every storefront entity. The remote row
// shapes live in `boutique_api::rest::rows`; `crate::convert` bridges them.

pub mod category;
pub mod dashboard;
pub mod entity_id;
pub mod product;
pub mod reconciliation;
pub mod report;
pub mod reservation;
pub mod settings;

// ── Re-exports ──────────────────────────────────────────────────────

pub use category::Category;
pub use dashboard::Dashboard;
pub use entity_id::EntityId;
pub use product::{Product, ProductStatus};
pub use reconciliation::ReconciliationIssue;
pub use report::{CustomerReport, Reports, SalesReport, SalesSummary, TopProduct};
pub use reservation::{Reservation, ReservationStatus};
pub use settings::Settings;
