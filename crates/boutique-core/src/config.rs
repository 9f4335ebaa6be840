// ── Runtime store configuration ──
//
// These types describe *where* the storefront data lives and *who* is
// acting on it. They carry credentials and tuning, but never touch disk.
// The CLI constructs a `StoreConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

pub use boutique_api::ReconnectConfig;

/// Where the local fallback cache lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CacheLocation {
    /// One JSON file per key under this directory.
    Dir(PathBuf),
    /// Process-local only; gone when the controller is dropped.
    #[default]
    Memory,
}

/// Configuration for one storefront session.
///
/// Built by the CLI, passed to `Controller` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Project URL of the remote store (e.g. `https://shop.example.co`).
    /// `None` means local-only.
    pub url: Option<Url>,
    /// Public (anonymous) project key, sent as `apikey` on every request.
    pub anon_key: Option<SecretString>,
    /// Per-request timeout for remote calls.
    pub timeout: Duration,
    /// Subscribe to the realtime change feed while a session is open.
    pub realtime_enabled: bool,
    /// Local fallback cache.
    pub cache: CacheLocation,
    /// Backoff for the realtime socket.
    pub reconnect: ReconnectConfig,
    /// Seed the four demo categories when starting local with an empty cache.
    pub seed_demo_catalog: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            timeout: Duration::from_secs(30),
            realtime_enabled: true,
            cache: CacheLocation::default(),
            reconnect: ReconnectConfig::default(),
            seed_demo_catalog: false,
        }
    }
}

impl StoreConfig {
    /// Local-only configuration backed by the given cache.
    pub fn local(cache: CacheLocation) -> Self {
        Self {
            cache,
            realtime_enabled: false,
            ..Self::default()
        }
    }
}

/// The authenticated-user signal.
///
/// Present when an administrator is signed in; the access token is sent
/// as the bearer on every remote request.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub access_token: SecretString,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, access_token: SecretString) -> Self {
        Self {
            user_id: user_id.into(),
            access_token,
        }
    }
}
