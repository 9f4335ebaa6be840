use thiserror::Error;

/// Top-level error type for the `boutique-api` crate.
///
/// Covers every failure mode of the remote store: transport, the
/// PostgREST error envelope, row lookups, payload decoding, and the
/// realtime socket. `boutique-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Key or access token rejected (HTTP 401/403), or not encodable as a header.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request exceeded the configured timeout.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── REST ────────────────────────────────────────────────────────
    /// Structured error from the REST endpoint (`{message, code, details, hint}`).
    #[error("Remote store error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
        details: Option<String>,
    },

    /// A by-id update or delete matched no row.
    #[error("No row with id {id} in table {table}")]
    RowNotFound { table: String, id: String },

    // ── Realtime ────────────────────────────────────────────────────
    /// Realtime socket connection failed.
    #[error("Realtime connection failed: {0}")]
    RealtimeConnect(String),

    /// Realtime socket closed unexpectedly.
    #[error("Realtime socket closed (code {code}): {reason}")]
    RealtimeClosed { code: u16, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::RealtimeConnect(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } | Self::RowNotFound { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the request ran past its deadline.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Extract the store's error code (Postgres SQLSTATE or PGRST code), if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
