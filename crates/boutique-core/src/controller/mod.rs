// ── Controller abstraction ──
//
// Session lifecycle for the storefront: initial load from the remote
// store (or the local cache), command routing through a single
// processor task, change-feed reconciliation, and reactive access to
// every collection through the DataStore.

mod ops;

use std::sync::Arc;

use strum::Display;
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use boutique_api::realtime::realtime_url;
use boutique_api::rest::rows::{CategoryRow, ProductRow, ReservationRow};
use boutique_api::{ChangeEvent, RealtimeHandle, RestClient, Table, TransportConfig};

use crate::cache::{CacheKey, LocalCache};
use crate::command::{
    AddCategoryRequest, AddProductRequest, Command, CommandEnvelope, CommandResult,
    ReserveProductRequest, UpdateCategoryRequest, UpdateProductRequest, UpdateSettingsRequest,
};
use crate::config::{Identity, StoreConfig};
use crate::convert::convert_rows;
use crate::error::CoreError;
use crate::listener::{self, ChangeSubscription};
use crate::model::{
    Category, Dashboard, EntityId, Product, ReconciliationIssue, Reports, Reservation, Settings,
};
use crate::notify::Notification;
use crate::store::{DataStore, StoreSnapshot};
use crate::stream::EntityStream;

const COMMAND_CHANNEL_SIZE: usize = 64;
const NOTIFICATION_CHANNEL_SIZE: usize = 256;
const CHANGE_CHANNEL_SIZE: usize = 256;

/// Demo categories seeded into an empty local store.
const DEMO_CATEGORIES: [(&str, &str); 4] = [
    ("Dresses", "DRS"),
    ("Tops", "TOP"),
    ("Bottoms", "BTM"),
    ("Accessories", "ACC"),
];

// ── SessionState ─────────────────────────────────────────────────

/// Session state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    Closed,
    Starting,
    /// Signed in: mutations go to the remote store first.
    Remote,
    /// Nobody signed in: mutations apply to memory and the cache only.
    Local,
}

impl SessionState {
    pub fn is_open(self) -> bool {
        matches!(self, Self::Remote | Self::Local)
    }
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Owns the four mutable
/// collections: every write goes through [`execute`](Self::execute) and
/// is applied by a single command processor task, so preconditions are
/// always checked against the state the command actually runs on.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: StoreConfig,
    store: Arc<DataStore>,
    cache: LocalCache,
    session_state: watch::Sender<SessionState>,
    notification_tx: broadcast::Sender<Arc<Notification>>,
    change_tx: broadcast::Sender<Arc<ChangeEvent>>,
    command_tx: Mutex<mpsc::Sender<CommandEnvelope>>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    /// Child of `cancel`, replaced on every `start()`.
    cancel_child: Mutex<CancellationToken>,
    rest_client: Mutex<Option<RestClient>>,
    realtime: Mutex<Option<RealtimeHandle>>,
    listener: Mutex<Option<ChangeSubscription>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Create a new Controller from configuration. Does NOT load anything --
    /// call [`start()`](Self::start) to open a session.
    pub fn new(config: StoreConfig) -> Self {
        let store = Arc::new(DataStore::new());
        let cache = LocalCache::open(&config.cache);
        let (session_state, _) = watch::channel(SessionState::Closed);
        let (notification_tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_SIZE);
        let (change_tx, _) = broadcast::channel(CHANGE_CHANNEL_SIZE);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store,
                cache,
                session_state,
                notification_tx,
                change_tx,
                command_tx: Mutex::new(command_tx),
                command_rx: Mutex::new(Some(command_rx)),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                rest_client: Mutex::new(None),
                realtime: Mutex::new(None),
                listener: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Access the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Access the underlying DataStore.
    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    /// Access the local cache.
    pub fn cache(&self) -> &LocalCache {
        &self.inner.cache
    }

    // ── Session lifecycle ────────────────────────────────────────

    /// Open a session.
    ///
    /// With an identity, the remote store is the source of truth: all
    /// four collections are fetched, and if that fails the cache is used
    /// instead. Without one, the session runs purely against the cache.
    /// An already-open session is ended first.
    pub async fn start(&self, identity: Option<Identity>) -> Result<SessionState, CoreError> {
        if self.inner.session_state.borrow().is_open() {
            self.end_session().await;
        }
        self.inner.session_state.send_replace(SessionState::Starting);

        // Fresh child token for this session (supports restart).
        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let mode = match self.open(identity, &child).await {
            Ok(mode) => mode,
            Err(e) => {
                *self.inner.rest_client.lock().await = None;
                self.inner.session_state.send_replace(SessionState::Closed);
                return Err(e);
            }
        };

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let ctrl = self.clone();
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(command_processor_task(ctrl, rx)));
        }

        self.inner.session_state.send_replace(mode);
        info!(
            %mode,
            products = self.inner.store.product_count(),
            categories = self.inner.store.category_count(),
            reservations = self.inner.store.reservation_count(),
            "session started"
        );
        Ok(mode)
    }

    async fn open(
        &self,
        identity: Option<Identity>,
        cancel: &CancellationToken,
    ) -> Result<SessionState, CoreError> {
        let Some(identity) = identity else {
            self.load_local()?;
            return Ok(SessionState::Local);
        };

        let config = &self.inner.config;
        let (Some(url), Some(anon_key)) = (&config.url, &config.anon_key) else {
            return Err(CoreError::Config {
                message: "a remote store URL and anon key are required to sign in".into(),
            });
        };

        let transport = TransportConfig::new(anon_key.clone(), config.timeout)
            .with_access_token(identity.access_token.clone());
        let client = RestClient::new(url.as_str(), &transport)?;
        *self.inner.rest_client.lock().await = Some(client.clone());
        debug!(user = %identity.user_id, base = %client.base_url(), "remote store client ready");

        match fetch_all(&client).await {
            Ok(snapshot) => {
                self.inner.store.apply_snapshot(snapshot, true);
                self.persist_all();
            }
            Err(e) => {
                warn!(error = %e, "remote store unreachable, starting from local cache");
                let snapshot = self.inner.cache.load()?;
                self.inner.store.apply_snapshot(snapshot, false);
            }
        }

        if config.realtime_enabled {
            self.spawn_change_feed(url.as_str(), anon_key, &identity, cancel)
                .await;
        }

        Ok(SessionState::Remote)
    }

    /// Seed the store from the cache, or from defaults when it is empty.
    fn load_local(&self) -> Result<(), CoreError> {
        let snapshot = self.inner.cache.load()?;
        if !snapshot.is_empty() {
            self.inner.store.apply_snapshot(snapshot, false);
            return Ok(());
        }

        let categories = if self.inner.config.seed_demo_catalog {
            DEMO_CATEGORIES
                .iter()
                .map(|(name, code)| Category {
                    id: EntityId::new_v4(),
                    name: (*name).to_owned(),
                    code: (*code).to_owned(),
                })
                .collect()
        } else {
            Vec::new()
        };
        debug!(seeded = categories.len(), "empty cache, starting from defaults");

        self.inner.store.apply_snapshot(
            StoreSnapshot {
                categories,
                settings: Some(Settings::default()),
                ..StoreSnapshot::default()
            },
            false,
        );
        self.persist_all();
        Ok(())
    }

    /// Subscribe to the remote change feed for all four tables.
    ///
    /// Non-fatal on failure: the session keeps working without push
    /// updates.
    async fn spawn_change_feed(
        &self,
        base_url: &str,
        anon_key: &secrecy::SecretString,
        identity: &Identity,
        cancel: &CancellationToken,
    ) {
        let ws_url = match realtime_url(base_url, anon_key) {
            Ok(u) => u,
            Err(e) => {
                warn!(error = %e, "invalid realtime URL, change feed disabled");
                return;
            }
        };

        let handle = match RealtimeHandle::connect(
            ws_url,
            Table::ALL.to_vec(),
            Some(identity.access_token.clone()),
            self.inner.config.reconnect.clone(),
            cancel.child_token(),
        ) {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, "realtime connection failed (non-fatal)");
                return;
            }
        };

        let subscription = self.attach_change_feed(handle.subscribe()).await;
        *self.inner.listener.lock().await = Some(subscription);
        *self.inner.realtime.lock().await = Some(handle);
        info!("change feed spawned (handshake in progress)");
    }

    /// Bridge a change feed into the store: every event re-fetches the
    /// affected collection.
    ///
    /// The subscription is cancelled when dropped, when
    /// [`ChangeSubscription::unsubscribe`] is awaited, or when the session
    /// ends.
    pub async fn attach_change_feed(
        &self,
        rx: broadcast::Receiver<Arc<ChangeEvent>>,
    ) -> ChangeSubscription {
        let cancel = self.inner.cancel_child.lock().await.child_token();
        listener::spawn(self.clone(), rx, cancel)
    }

    /// End the session.
    ///
    /// Unsubscribes from the change feed, stops the command processor and
    /// drops the remote client. In-memory state is kept until the next
    /// [`start()`](Self::start).
    pub async fn end_session(&self) {
        // Cancel the child token (not the parent, so start() can run again).
        self.inner.cancel_child.lock().await.cancel();

        if let Some(subscription) = self.inner.listener.lock().await.take() {
            subscription.unsubscribe().await;
        }
        if let Some(handle) = self.inner.realtime.lock().await.take() {
            handle.shutdown();
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        *self.inner.rest_client.lock().await = None;

        // Recreate the command channel; the old receiver was consumed by
        // the processor task.
        {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
            *self.inner.command_tx.lock().await = tx;
            *self.inner.command_rx.lock().await = Some(rx);
        }

        self.inner.session_state.send_replace(SessionState::Closed);
        debug!("session ended");
    }

    /// Shut down permanently. Ends the session and cancels every task.
    pub async fn shutdown(&self) {
        self.end_session().await;
        self.inner.cancel.cancel();
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Re-fetch all four collections and replace them wholesale.
    ///
    /// Nothing is applied unless every fetch succeeds. A no-op for local
    /// sessions.
    pub async fn refresh_data(&self) -> Result<(), CoreError> {
        let Some(client) = self.rest_client().await else {
            debug!("local session, nothing to refresh");
            return Ok(());
        };

        let snapshot = fetch_all(&client).await?;
        self.inner.store.apply_snapshot(snapshot, true);
        self.persist_all();

        debug!(
            products = self.inner.store.product_count(),
            categories = self.inner.store.category_count(),
            reservations = self.inner.store.reservation_count(),
            "data refresh complete"
        );
        Ok(())
    }

    /// Re-fetch one collection and replace it.
    pub async fn refresh_collection(&self, table: Table) -> Result<(), CoreError> {
        let Some(client) = self.rest_client().await else {
            return Ok(());
        };
        let store = &self.inner.store;

        let key = match table {
            Table::Products => {
                store.apply_products(convert_rows(table.as_str(), client.list_products().await?));
                CacheKey::Products
            }
            Table::Categories => {
                store.apply_categories(convert_rows(
                    table.as_str(),
                    client.list_categories().await?,
                ));
                CacheKey::Categories
            }
            Table::Reservations => {
                store.apply_reservations(convert_rows(
                    table.as_str(),
                    client.list_reservations().await?,
                ));
                CacheKey::Reservations
            }
            Table::Settings => {
                let settings = client.get_settings().await?.map(Settings::from);
                store.set_settings(settings.unwrap_or_default());
                CacheKey::Settings
            }
        };

        self.persist(&[key]);
        debug!(%table, "collection refreshed");
        Ok(())
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command.
    ///
    /// Sends the command to the processor task and awaits the result.
    /// Exactly one [`Notification`] is published per call.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        let operation = cmd.operation();

        if !self.inner.session_state.borrow().is_open() {
            let err = CoreError::SessionClosed;
            self.publish(Notification::failure(operation, &err));
            return Err(err);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();
        let command_tx = self.inner.command_tx.lock().await.clone();

        let sent = command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await;

        // The processor publishes once it has run the command. If it never
        // received it, publish the failure here instead.
        if sent.is_err() {
            let err = CoreError::SessionClosed;
            self.publish(Notification::failure(operation, &err));
            return Err(err);
        }
        match rx.await {
            Ok(result) => result,
            Err(_) => {
                let err = CoreError::SessionClosed;
                self.publish(Notification::failure(operation, &err));
                Err(err)
            }
        }
    }

    // ── Typed operations ─────────────────────────────────────────

    pub async fn add_product(&self, req: AddProductRequest) -> Result<Product, CoreError> {
        match self.execute(Command::AddProduct(req)).await? {
            CommandResult::Product(p) => Ok(p),
            other => Err(unexpected("add_product", &other)),
        }
    }

    pub async fn update_product(
        &self,
        id: EntityId,
        update: UpdateProductRequest,
    ) -> Result<Product, CoreError> {
        match self.execute(Command::UpdateProduct { id, update }).await? {
            CommandResult::Product(p) => Ok(p),
            other => Err(unexpected("update_product", &other)),
        }
    }

    pub async fn delete_product(&self, id: EntityId) -> Result<(), CoreError> {
        self.execute(Command::DeleteProduct { id }).await.map(|_| ())
    }

    pub async fn add_category(&self, req: AddCategoryRequest) -> Result<Category, CoreError> {
        match self.execute(Command::AddCategory(req)).await? {
            CommandResult::Category(c) => Ok(c),
            other => Err(unexpected("add_category", &other)),
        }
    }

    pub async fn update_category(
        &self,
        id: EntityId,
        update: UpdateCategoryRequest,
    ) -> Result<Category, CoreError> {
        match self.execute(Command::UpdateCategory { id, update }).await? {
            CommandResult::Category(c) => Ok(c),
            other => Err(unexpected("update_category", &other)),
        }
    }

    pub async fn delete_category(&self, id: EntityId) -> Result<(), CoreError> {
        self.execute(Command::DeleteCategory { id }).await.map(|_| ())
    }

    pub async fn reserve_product(
        &self,
        product_id: EntityId,
        customer_name: impl Into<String>,
        customer_phone: impl Into<String>,
    ) -> Result<Reservation, CoreError> {
        let req = ReserveProductRequest {
            product_id,
            customer_name: customer_name.into(),
            customer_phone: customer_phone.into(),
        };
        match self.execute(Command::ReserveProduct(req)).await? {
            CommandResult::Reservation(r) => Ok(r),
            other => Err(unexpected("reserve_product", &other)),
        }
    }

    pub async fn complete_reservation(&self, id: EntityId) -> Result<Reservation, CoreError> {
        match self.execute(Command::CompleteReservation { id }).await? {
            CommandResult::Reservation(r) => Ok(r),
            other => Err(unexpected("complete_reservation", &other)),
        }
    }

    pub async fn cancel_reservation(&self, id: EntityId) -> Result<Reservation, CoreError> {
        match self.execute(Command::CancelReservation { id }).await? {
            CommandResult::Reservation(r) => Ok(r),
            other => Err(unexpected("cancel_reservation", &other)),
        }
    }

    pub async fn update_settings(
        &self,
        update: UpdateSettingsRequest,
    ) -> Result<Settings, CoreError> {
        match self.execute(Command::UpdateSettings(update)).await? {
            CommandResult::Settings(s) => Ok(s),
            other => Err(unexpected("update_settings", &other)),
        }
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: start, run closure, end the session.
    ///
    /// Disables the change feed since only a single request-response
    /// cycle is needed.
    pub async fn oneshot<F, Fut, T>(
        config: StoreConfig,
        identity: Option<Identity>,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.realtime_enabled = false;

        let controller = Controller::new(cfg);
        controller.start(identity).await?;
        let result = f(controller.clone()).await;
        controller.shutdown().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to session state changes.
    pub fn session_state(&self) -> watch::Receiver<SessionState> {
        self.inner.session_state.subscribe()
    }

    /// Subscribe to per-command notifications.
    pub fn notifications(&self) -> broadcast::Receiver<Arc<Notification>> {
        self.inner.notification_tx.subscribe()
    }

    /// Subscribe to change-feed events, re-broadcast after each
    /// collection has been re-fetched.
    pub fn changes(&self) -> broadcast::Receiver<Arc<ChangeEvent>> {
        self.inner.change_tx.subscribe()
    }

    // ── Read accessors (delegate to DataStore) ───────────────────

    pub fn products_snapshot(&self) -> Arc<Vec<Arc<Product>>> {
        self.inner.store.products_snapshot()
    }

    pub fn categories_snapshot(&self) -> Arc<Vec<Arc<Category>>> {
        self.inner.store.categories_snapshot()
    }

    pub fn reservations_snapshot(&self) -> Arc<Vec<Arc<Reservation>>> {
        self.inner.store.reservations_snapshot()
    }

    pub fn product_by_id(&self, id: &EntityId) -> Option<Arc<Product>> {
        self.inner.store.product_by_id(id)
    }

    pub fn product_by_reference(&self, reference: &str) -> Option<Arc<Product>> {
        self.inner.store.product_by_reference(reference)
    }

    pub fn category_by_id(&self, id: &EntityId) -> Option<Arc<Category>> {
        self.inner.store.category_by_id(id)
    }

    pub fn reservation_by_id(&self, id: &EntityId) -> Option<Arc<Reservation>> {
        self.inner.store.reservation_by_id(id)
    }

    /// The *pending* reservation for a product.
    pub fn reservation_by_product_id(&self, product_id: &EntityId) -> Option<Arc<Reservation>> {
        self.inner.store.pending_reservation_for(product_id)
    }

    pub fn settings(&self) -> Settings {
        self.inner.store.settings()
    }

    pub fn reports(&self) -> Reports {
        self.inner.store.reports()
    }

    /// Replace the externally supplied reports.
    pub fn set_reports(&self, reports: Reports) {
        self.inner.store.set_reports(reports);
    }

    pub fn dashboard(&self) -> Dashboard {
        self.inner.store.dashboard()
    }

    pub fn reconciliation_issues(&self) -> Arc<Vec<ReconciliationIssue>> {
        self.inner.store.reconciliation_issues()
    }

    pub fn clear_reconciliation_issues(&self) {
        self.inner.store.clear_reconciliation_issues();
    }

    // ── Stream accessors (delegate to DataStore) ─────────────────

    pub fn products(&self) -> EntityStream<Product> {
        self.inner.store.subscribe_products()
    }

    pub fn categories(&self) -> EntityStream<Category> {
        self.inner.store.subscribe_categories()
    }

    pub fn reservations(&self) -> EntityStream<Reservation> {
        self.inner.store.subscribe_reservations()
    }

    pub fn settings_watch(&self) -> watch::Receiver<Settings> {
        self.inner.store.subscribe_settings()
    }

    // ── Internal helpers ─────────────────────────────────────────

    async fn rest_client(&self) -> Option<RestClient> {
        self.inner.rest_client.lock().await.clone()
    }

    fn publish(&self, notification: Notification) {
        let _ = self.inner.notification_tx.send(Arc::new(notification));
    }

    pub(crate) fn broadcast_change(&self, event: Arc<ChangeEvent>) {
        let _ = self.inner.change_tx.send(event);
    }

    /// Write the given cache keys; failures are logged, not returned,
    /// since the mutation itself already succeeded.
    fn persist(&self, keys: &[CacheKey]) {
        if let Err(e) = self.inner.cache.persist(&self.inner.store, keys) {
            warn!(error = %e, "cache write failed");
        }
    }

    fn persist_all(&self) {
        if let Err(e) = self.inner.cache.persist_all(&self.inner.store) {
            warn!(error = %e, "cache write failed");
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Run commands one at a time, publishing one notification per command.
async fn command_processor_task(controller: Controller, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = controller.inner.cancel_child.lock().await.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let operation = envelope.command.operation();
                let result = ops::route_command(&controller, envelope.command).await;
                match &result {
                    Ok(value) => controller.publish(Notification::success(operation, value)),
                    Err(e) => {
                        debug!(operation, error = %e, "command failed");
                        controller.publish(Notification::failure(operation, e));
                    }
                }
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Fetch all four tables concurrently; fails if any one fails.
async fn fetch_all(client: &RestClient) -> Result<StoreSnapshot, CoreError> {
    let (categories, products, reservations, settings) = tokio::try_join!(
        client.list_categories(),
        client.list_products(),
        client.list_reservations(),
        client.get_settings(),
    )?;

    Ok(StoreSnapshot {
        categories: convert_rows::<CategoryRow, Category>(Table::Categories.as_str(), categories),
        products: convert_rows::<ProductRow, Product>(Table::Products.as_str(), products),
        reservations: convert_rows::<ReservationRow, Reservation>(
            Table::Reservations.as_str(),
            reservations,
        ),
        settings: settings.map(Settings::from),
    })
}

fn unexpected(operation: &str, result: &CommandResult) -> CoreError {
    CoreError::Internal(format!("{operation} returned unexpected result: {result:?}"))
}
