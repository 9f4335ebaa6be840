// ── Central reactive data store ──
//
// Thread-safe, lock-free storage for all storefront entities.
// Mutations are broadcast to subscribers via `watch` channels.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::collection::EntityCollection;
use crate::model::{
    Category, Dashboard, EntityId, Product, ProductStatus, ReconciliationIssue, Reports,
    Reservation, ReservationStatus, Settings,
};
use crate::stream::EntityStream;

pub(crate) fn product_key(id: &EntityId) -> String {
    format!("prd:{id}")
}

pub(crate) fn category_key(id: &EntityId) -> String {
    format!("cat:{id}")
}

pub(crate) fn reservation_key(id: &EntityId) -> String {
    format!("rsv:{id}")
}

/// Central reactive store for all storefront entities.
///
/// Reads are wait-free snapshot clones. Only the controller's command
/// processor and refresh paths write to it.
pub struct DataStore {
    pub(crate) products: EntityCollection<Product>,
    pub(crate) categories: EntityCollection<Category>,
    pub(crate) reservations: EntityCollection<Reservation>,
    pub(crate) settings: watch::Sender<Settings>,
    pub(crate) reports: watch::Sender<Reports>,
    pub(crate) reconciliation: watch::Sender<Arc<Vec<ReconciliationIssue>>>,
    pub(crate) last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl DataStore {
    pub fn new() -> Self {
        let (settings, _) = watch::channel(Settings::default());
        let (reports, _) = watch::channel(Reports::default());
        let (reconciliation, _) = watch::channel(Arc::new(Vec::new()));
        let (last_refresh, _) = watch::channel(None);

        Self {
            products: EntityCollection::new(),
            categories: EntityCollection::new(),
            reservations: EntityCollection::new(),
            settings,
            reports,
            reconciliation,
            last_refresh,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn products_snapshot(&self) -> Arc<Vec<Arc<Product>>> {
        self.products.snapshot()
    }

    pub fn categories_snapshot(&self) -> Arc<Vec<Arc<Category>>> {
        self.categories.snapshot()
    }

    pub fn reservations_snapshot(&self) -> Arc<Vec<Arc<Reservation>>> {
        self.reservations.snapshot()
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn product_by_id(&self, id: &EntityId) -> Option<Arc<Product>> {
        self.products.get_by_id(id)
    }

    pub fn product_by_reference(&self, reference: &str) -> Option<Arc<Product>> {
        self.products.find(|p| p.reference == reference)
    }

    pub fn category_by_id(&self, id: &EntityId) -> Option<Arc<Category>> {
        self.categories.get_by_id(id)
    }

    pub fn category_by_code(&self, code: &str) -> Option<Arc<Category>> {
        self.categories.find(|c| c.code.eq_ignore_ascii_case(code))
    }

    pub fn reservation_by_id(&self, id: &EntityId) -> Option<Arc<Reservation>> {
        self.reservations.get_by_id(id)
    }

    /// The pending reservation for a product, if any.
    pub fn pending_reservation_for(&self, product_id: &EntityId) -> Option<Arc<Reservation>> {
        self.reservations
            .find(|r| r.product_id == *product_id && r.is_pending())
    }

    /// Every reservation ever made for a product, oldest first.
    pub fn reservations_for_product(&self, product_id: &EntityId) -> Vec<Arc<Reservation>> {
        let mut found: Vec<Arc<Reservation>> = self
            .reservations
            .snapshot()
            .iter()
            .filter(|r| r.product_id == *product_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.reservation_date);
        found
    }

    /// `true` if any product belongs to the category.
    pub fn category_in_use(&self, category_id: &EntityId) -> bool {
        self.products.any(|p| p.category_id == *category_id)
    }

    // ── Count accessors ──────────────────────────────────────────────

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn reservation_count(&self) -> usize {
        self.reservations.len()
    }

    /// `true` when no products, categories, or reservations are held.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.categories.is_empty() && self.reservations.is_empty()
    }

    /// Counts over the current snapshots.
    pub fn dashboard(&self) -> Dashboard {
        let mut dash = Dashboard {
            categories: self.categories.len(),
            ..Dashboard::default()
        };

        for product in self.products.snapshot().iter() {
            dash.products += 1;
            match product.status {
                ProductStatus::Available => {
                    dash.available += 1;
                    dash.catalog_value += product.price;
                }
                ProductStatus::Reserved => dash.reserved += 1,
                ProductStatus::Sold => dash.sold += 1,
            }
        }

        for reservation in self.reservations.snapshot().iter() {
            match reservation.status {
                ReservationStatus::Pending => dash.pending_reservations += 1,
                ReservationStatus::Completed => dash.completed_reservations += 1,
                ReservationStatus::Cancelled => dash.cancelled_reservations += 1,
            }
        }

        dash
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_products(&self) -> EntityStream<Product> {
        EntityStream::new(self.products.subscribe())
    }

    pub fn subscribe_categories(&self) -> EntityStream<Category> {
        EntityStream::new(self.categories.subscribe())
    }

    pub fn subscribe_reservations(&self) -> EntityStream<Reservation> {
        EntityStream::new(self.reservations.subscribe())
    }

    pub fn subscribe_settings(&self) -> watch::Receiver<Settings> {
        self.settings.subscribe()
    }

    pub fn subscribe_reports(&self) -> watch::Receiver<Reports> {
        self.reports.subscribe()
    }

    pub fn subscribe_reconciliation(&self) -> watch::Receiver<Arc<Vec<ReconciliationIssue>>> {
        self.reconciliation.subscribe()
    }

    // ── Singletons ───────────────────────────────────────────────────

    pub fn settings(&self) -> Settings {
        self.settings.borrow().clone()
    }

    pub fn reports(&self) -> Reports {
        self.reports.borrow().clone()
    }

    pub fn reconciliation_issues(&self) -> Arc<Vec<ReconciliationIssue>> {
        self.reconciliation.borrow().clone()
    }

    // ── Single-entity writes ─────────────────────────────────────────

    pub(crate) fn upsert_product(&self, product: Product) {
        let id = product.id.clone();
        self.products.upsert(product_key(&id), id, product);
    }

    pub(crate) fn remove_product(&self, id: &EntityId) -> Option<Arc<Product>> {
        self.products.remove(&product_key(id))
    }

    pub(crate) fn upsert_category(&self, category: Category) {
        let id = category.id.clone();
        self.categories.upsert(category_key(&id), id, category);
    }

    pub(crate) fn remove_category(&self, id: &EntityId) -> Option<Arc<Category>> {
        self.categories.remove(&category_key(id))
    }

    pub(crate) fn upsert_reservation(&self, reservation: Reservation) {
        let id = reservation.id.clone();
        self.reservations
            .upsert(reservation_key(&id), id, reservation);
    }

    pub(crate) fn remove_reservation(&self, id: &EntityId) -> Option<Arc<Reservation>> {
        self.reservations.remove(&reservation_key(id))
    }

    pub(crate) fn set_settings(&self, settings: Settings) {
        self.settings.send_replace(settings);
    }

    pub(crate) fn set_reports(&self, reports: Reports) {
        self.reports.send_replace(reports);
    }

    pub(crate) fn push_reconciliation_issue(&self, issue: ReconciliationIssue) {
        self.reconciliation.send_modify(|issues| {
            let mut next = Vec::clone(issues);
            next.push(issue);
            *issues = Arc::new(next);
        });
    }

    pub(crate) fn clear_reconciliation_issues(&self) {
        self.reconciliation.send_replace(Arc::new(Vec::new()));
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    /// How long ago the last full refresh occurred, or `None` if never refreshed.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_refresh().map(|t| Utc::now() - t)
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
