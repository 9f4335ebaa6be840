// ── Catalog and reservation streams ──
//
// Read-side views over the store. A listing screen takes one, renders
// `current()`, then redraws on every `changed()`.

mod filter;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::{Product, Reservation};

pub use filter::{ProductFilter, ReservationFilter};

/// Every row of one collection, shared with the store.
pub type Rows<T> = Arc<Vec<Arc<T>>>;

/// Live view of the products, categories or reservations held in memory.
///
/// Each local or remote mutation, and each re-fetch triggered by the
/// change feed, publishes a whole new set of rows.
pub struct EntityStream<T: Clone + Send + Sync + 'static> {
    current: Rows<T>,
    receiver: watch::Receiver<Rows<T>>,
}

impl<T: Clone + Send + Sync + 'static> EntityStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<Rows<T>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Rows as of subscription or the last `changed()`.
    pub fn current(&self) -> &Rows<T> {
        &self.current
    }

    /// Wait until the store publishes new rows.
    /// `None` means the store is gone.
    pub async fn changed(&mut self) -> Option<Rows<T>> {
        self.receiver.changed().await.ok()?;
        let rows = self.receiver.borrow_and_update().clone();
        self.current = rows.clone();
        Some(rows)
    }

    pub fn into_stream(self) -> EntityWatchStream<T> {
        EntityWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

impl EntityStream<Product> {
    /// Products in the current rows that pass every filter, newest first.
    pub fn filtered(&self, filters: &[ProductFilter]) -> Vec<Arc<Product>> {
        let mut products: Vec<_> = self
            .current
            .iter()
            .filter(|p| filters.iter().all(|f| f.matches(p)))
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        products
    }
}

impl EntityStream<Reservation> {
    /// Reservations in the current rows that pass every filter, newest first.
    pub fn filtered(&self, filters: &[ReservationFilter]) -> Vec<Arc<Reservation>> {
        let mut reservations: Vec<_> = self
            .current
            .iter()
            .filter(|r| filters.iter().all(|f| f.matches(r)))
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.reservation_date.cmp(&a.reservation_date));
        reservations
    }
}

/// `Stream` form of an [`EntityStream`]: the rows at subscription time,
/// then one item per publish. Intermediate publishes may be skipped.
pub struct EntityWatchStream<T: Clone + Send + Sync + 'static> {
    inner: WatchStream<Rows<T>>,
}

impl<T: Clone + Send + Sync + 'static> Stream for EntityWatchStream<T> {
    type Item = Rows<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
