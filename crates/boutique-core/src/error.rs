// ── Core error types ──
//
// User-facing errors from boutique-core. These are NOT API-specific --
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<boutique_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use strum::{Display, IntoStaticStr};
use thiserror::Error;

/// Why an operation conflicts with the current domain state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ConflictReason {
    /// The product has a pending reservation.
    PendingReservation,
    /// The category is still referenced by products.
    HasProducts,
    /// The product is not available for reservation.
    NotAvailable,
    /// The reservation is already completed or cancelled.
    ReservationClosed,
    /// `reserved` is only reachable through a reservation.
    StatusManagedByReservations,
}

impl ConflictReason {
    pub fn describe(self) -> &'static str {
        match self {
            Self::PendingReservation => "a pending reservation exists for this product",
            Self::HasProducts => "products still belong to this category",
            Self::NotAvailable => "the product is not available",
            Self::ReservationClosed => "the reservation is no longer pending",
            Self::StatusManagedByReservations => {
                "status `reserved` can only be set by reserving the product"
            }
        }
    }

    /// What the administrator can do about it.
    pub fn hint(self) -> &'static str {
        match self {
            Self::PendingReservation | Self::StatusManagedByReservations => {
                "Complete or cancel the pending reservation first."
            }
            Self::HasProducts => "Move or delete the category's products first.",
            Self::NotAvailable => "Only available products can be reserved.",
            Self::ReservationClosed => "Completed and cancelled reservations are final.",
        }
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Domain errors ────────────────────────────────────────────────
    #[error("{entity} not found: {identifier}")]
    NotFound {
        entity: &'static str,
        identifier: String,
    },

    #[error("{entity} {identifier} does not exist")]
    Reference {
        entity: &'static str,
        identifier: String,
    },

    #[error("Conflict: {}", .reason.describe())]
    Conflict { reason: ConflictReason },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Remote store errors (wrapped, not exposed raw) ───────────────
    #[error("Remote store error: {message}")]
    Remote {
        message: String,
        /// Store-specific error code (SQLSTATE or PGRST code).
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Remote store timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The second write of a two-write operation failed, and so did the
    /// compensating undo of the first. Remote state needs reconciliation.
    #[error("{operation} left the remote store inconsistent: {message}")]
    CompensationFailed { operation: String, message: String },

    // ── Session errors ───────────────────────────────────────────────
    #[error("No open session")]
    SessionClosed,

    // ── Local errors ─────────────────────────────────────────────────
    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn not_found(entity: &'static str, identifier: impl ToString) -> Self {
        Self::NotFound {
            entity,
            identifier: identifier.to_string(),
        }
    }

    pub(crate) fn reference(entity: &'static str, identifier: impl ToString) -> Self {
        Self::Reference {
            entity,
            identifier: identifier.to_string(),
        }
    }

    pub(crate) fn conflict(reason: ConflictReason) -> Self {
        Self::Conflict { reason }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// The conflict reason, if this is a `Conflict`.
    pub fn conflict_reason(&self) -> Option<ConflictReason> {
        match self {
            Self::Conflict { reason } => Some(*reason),
            _ => None,
        }
    }

    /// Returns `true` for failures that originate in the remote store.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Remote { .. } | Self::Timeout { .. } | Self::CompensationFailed { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<boutique_api::Error> for CoreError {
    fn from(err: boutique_api::Error) -> Self {
        match err {
            boutique_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            boutique_api::Error::Transport(ref e) if e.is_timeout() => {
                CoreError::Timeout { timeout_secs: 0 }
            }
            boutique_api::Error::Transport(e) => CoreError::Remote {
                message: e.to_string(),
                code: None,
                status: e.status().map(|s| s.as_u16()),
            },
            boutique_api::Error::Authentication { message } => CoreError::Remote {
                message: format!("authentication failed: {message}"),
                code: None,
                status: Some(401),
            },
            boutique_api::Error::Api {
                status,
                message,
                code,
                details,
            } => CoreError::Remote {
                message: match details {
                    Some(details) => format!("{message}: {details}"),
                    None => message,
                },
                code,
                status: Some(status),
            },
            boutique_api::Error::RowNotFound { table, id } => CoreError::Remote {
                message: format!("no row {id} in remote table {table}"),
                code: None,
                status: Some(404),
            },
            boutique_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            boutique_api::Error::RealtimeConnect(reason) => CoreError::Remote {
                message: format!("realtime connection failed: {reason}"),
                code: None,
                status: None,
            },
            boutique_api::Error::RealtimeClosed { code, reason } => CoreError::Remote {
                message: format!("realtime socket closed (code {code}): {reason}"),
                code: None,
                status: None,
            },
            boutique_api::Error::Deserialization { message, body: _ } => CoreError::Remote {
                message: format!("unexpected response: {message}"),
                code: None,
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_timeout_becomes_timeout() {
        let err: CoreError = boutique_api::Error::Timeout { timeout_secs: 7 }.into();
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 7 }));
        assert!(err.is_remote());
    }

    #[test]
    fn api_error_keeps_status_and_details() {
        let err: CoreError = boutique_api::Error::Api {
            status: 409,
            message: "duplicate key".into(),
            code: Some("23505".into()),
            details: Some("Key (id) exists".into()),
        }
        .into();

        match err {
            CoreError::Remote {
                message,
                code,
                status,
            } => {
                assert_eq!(message, "duplicate key: Key (id) exists");
                assert_eq!(code.as_deref(), Some("23505"));
                assert_eq!(status, Some(409));
            }
            other => panic!("expected Remote, got {other:?}"),
        }
    }

    #[test]
    fn conflict_message_names_the_reason() {
        let err = CoreError::conflict(ConflictReason::HasProducts);
        assert_eq!(
            err.to_string(),
            "Conflict: products still belong to this category"
        );
        assert_eq!(err.conflict_reason(), Some(ConflictReason::HasProducts));
        assert_eq!(ConflictReason::HasProducts.to_string(), "has_products");
    }
}
