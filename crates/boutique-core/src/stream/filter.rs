// ── Filter predicates for entity streams ──
//
// Used by catalog listings to narrow snapshots without re-querying.

use crate::model::{EntityId, Product, ProductStatus, Reservation, ReservationStatus};

/// Filter predicate for product collections.
pub enum ProductFilter {
    All,
    ByCategory(EntityId),
    ByStatus(ProductStatus),
    Available,
    /// Case-insensitive substring match over name, reference and description.
    Search(String),
    Custom(Box<dyn Fn(&Product) -> bool + Send + Sync>),
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::ByCategory(id) => product.category_id == *id,
            Self::ByStatus(status) => product.status == *status,
            Self::Available => product.is_available(),
            Self::Search(term) => {
                let needle = term.trim().to_lowercase();
                needle.is_empty()
                    || product.name.to_lowercase().contains(&needle)
                    || product.reference.to_lowercase().contains(&needle)
                    || product.description.to_lowercase().contains(&needle)
            }
            Self::Custom(f) => f(product),
        }
    }
}

/// Filter predicate for reservation collections.
pub enum ReservationFilter {
    All,
    ByStatus(ReservationStatus),
    ByProduct(EntityId),
    Pending,
    Custom(Box<dyn Fn(&Reservation) -> bool + Send + Sync>),
}

impl ReservationFilter {
    pub fn matches(&self, reservation: &Reservation) -> bool {
        match self {
            Self::All => true,
            Self::ByStatus(status) => reservation.status == *status,
            Self::ByProduct(id) => reservation.product_id == *id,
            Self::Pending => reservation.is_pending(),
            Self::Custom(f) => f(reservation),
        }
    }
}
