//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use boutique_config::ConfigError;
use boutique_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Remote store ─────────────────────────────────────────────────
    #[error("Could not reach the remote store: {message}")]
    #[diagnostic(
        code(boutique::connection_failed),
        help(
            "Check the store URL and your network connection.\n\
             Use --offline to work against the local cache."
        )
    )]
    ConnectionFailed { message: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(boutique::auth_failed),
        help(
            "Your access token may have expired.\n\
             Store a fresh one with: boutique config init --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No anon key configured for profile '{profile}'")]
    #[diagnostic(
        code(boutique::no_credentials),
        help(
            "Configure credentials with: boutique config init\n\
             Or set the BOUTIQUE_ANON_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    #[error("Remote store error ({code}): {message}")]
    #[diagnostic(code(boutique::api_error))]
    ApiError { code: String, message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(boutique::not_found),
        help("Run: boutique {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{message}")]
    #[diagnostic(code(boutique::conflict), help("{help}"))]
    Conflict { message: String, help: String },

    // ── Consistency ──────────────────────────────────────────────────
    #[error("'{operation}' left the remote store inconsistent: {message}")]
    #[diagnostic(
        code(boutique::reconciliation),
        help(
            "The change could not be rolled back.\n\
             Review it with: boutique reconcile list"
        )
    )]
    Reconciliation { operation: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(boutique::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(boutique::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: boutique config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(boutique::config))]
    Config(ConfigError),

    // ── Session / cache ──────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(code(boutique::session))]
    Session(String),

    #[error("Local cache error: {message}")]
    #[diagnostic(
        code(boutique::cache),
        help("Check permissions on the cache directory, or pass --cache-dir.")
    )]
    Cache { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(boutique::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(boutique::timeout),
        help("Increase timeout with --timeout or check the remote store.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(boutique::json))]
    Json(#[from] serde_json::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::ProfileNotFound { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub(crate) fn not_found(resource_type: &str, identifier: impl Into<String>) -> Self {
        let list_command = match resource_type {
            "category" => "categories list",
            "reservation" => "reservations list",
            _ => "products list",
        };
        Self::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
            list_command: list_command.into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity, identifier } | CoreError::Reference { entity, identifier } => {
                CliError::not_found(entity, identifier)
            }

            CoreError::Conflict { reason } => CliError::Conflict {
                message: reason.describe().into(),
                help: reason.hint().into(),
            },

            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Remote {
                message,
                code,
                status,
            } => match status {
                Some(401 | 403) => CliError::AuthFailed {
                    profile: "current".into(),
                    message,
                },
                None => CliError::ConnectionFailed { message },
                Some(status) => CliError::ApiError {
                    code: code.unwrap_or_else(|| status.to_string()),
                    message,
                },
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::CompensationFailed { operation, message } => {
                CliError::Reconciliation { operation, message }
            }

            CoreError::SessionClosed => CliError::Session("the store session is closed".into()),

            CoreError::Cache { message } => CliError::Cache { message },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}
