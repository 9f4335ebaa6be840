// REST client for the remote store's row tables.
//
// PostgREST conventions: tables live under /rest/v1/{table}, filters are
// query params (`id=eq.{id}`), and writes return the affected rows when
// asked via `Prefer: return=representation`.

pub mod client;
pub mod rows;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

pub use client::RestClient;

/// The four mutable tables the storefront syncs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Table {
    Categories,
    Products,
    Reservations,
    Settings,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::Categories,
        Table::Products,
        Table::Reservations,
        Table::Settings,
    ];

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}
