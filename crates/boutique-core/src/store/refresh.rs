// ── Bulk replacement logic ──
//
// Applies whole-collection snapshots (remote fetches, cache loads, realtime
// re-fetches) to the DataStore. Each collection is replaced in one step:
// incoming entities are upserted and absent keys pruned, so subscribers
// never see a transient empty collection.

use chrono::Utc;

use super::DataStore;
use super::data_store::{category_key, product_key, reservation_key};
use crate::model::{Category, Product, Reservation, Settings};

/// Every mutable collection, fetched or loaded together.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub reservations: Vec<Reservation>,
    /// `None` when no settings row or cache entry exists.
    pub settings: Option<Settings>,
}

impl StoreSnapshot {
    /// `true` when the snapshot carries no entities and no settings.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
            && self.categories.is_empty()
            && self.reservations.is_empty()
            && self.settings.is_none()
    }
}

impl DataStore {
    pub(crate) fn apply_products(&self, products: Vec<Product>) {
        self.products.replace_all(
            products
                .into_iter()
                .map(|p| (product_key(&p.id), p.id.clone(), p))
                .collect(),
        );
    }

    pub(crate) fn apply_categories(&self, categories: Vec<Category>) {
        self.categories.replace_all(
            categories
                .into_iter()
                .map(|c| (category_key(&c.id), c.id.clone(), c))
                .collect(),
        );
    }

    pub(crate) fn apply_reservations(&self, reservations: Vec<Reservation>) {
        self.reservations.replace_all(
            reservations
                .into_iter()
                .map(|r| (reservation_key(&r.id), r.id.clone(), r))
                .collect(),
        );
    }

    /// Replace every collection. Missing settings fall back to defaults.
    ///
    /// `remote` marks the snapshot as a full refresh from the remote store.
    pub(crate) fn apply_snapshot(&self, snap: StoreSnapshot, remote: bool) {
        self.apply_categories(snap.categories);
        self.apply_products(snap.products);
        self.apply_reservations(snap.reservations);
        self.set_settings(snap.settings.unwrap_or_default());

        if remote {
            self.last_refresh.send_replace(Some(Utc::now()));
        }
    }
}
