// ── Per-command notifications ──
//
// The command processor emits exactly one notification per command:
// a success carrying a short summary, or a failure carrying the error's
// user-readable message.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;

use crate::command::CommandResult;
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Failure,
}

/// Outcome of one mutating operation.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    /// Operation name, e.g. `reserve_product`.
    pub operation: &'static str,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notification {
    pub(crate) fn success(operation: &'static str, result: &CommandResult) -> Self {
        Self {
            level: NotificationLevel::Success,
            operation,
            message: summarize(operation, result),
            at: Utc::now(),
        }
    }

    pub(crate) fn failure(operation: &'static str, err: &CoreError) -> Self {
        Self {
            level: NotificationLevel::Failure,
            operation,
            message: err.to_string(),
            at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.level == NotificationLevel::Success
    }
}

fn summarize(operation: &str, result: &CommandResult) -> String {
    match result {
        CommandResult::Product(p) => match operation {
            "add_product" => format!("Product {} added", p.reference),
            _ => format!("Product {} updated", p.reference),
        },
        CommandResult::Category(c) => match operation {
            "add_category" => format!("Category {} ({}) added", c.name, c.code),
            _ => format!("Category {} ({}) updated", c.name, c.code),
        },
        CommandResult::Reservation(r) => match operation {
            "reserve_product" => format!("Reservation created for {}", r.customer_name),
            "complete_reservation" => format!("Reservation for {} completed", r.customer_name),
            "cancel_reservation" => format!("Reservation for {} cancelled", r.customer_name),
            _ => format!("Reservation for {} updated", r.customer_name),
        },
        CommandResult::Settings(_) => "Settings saved".to_owned(),
        CommandResult::Ok => match operation {
            "delete_product" => "Product deleted".to_owned(),
            "delete_category" => "Category deleted".to_owned(),
            other => format!("{other} succeeded"),
        },
    }
}
