// boutique-api: Async Rust client for the boutique remote store (REST tables + realtime feed)

pub mod error;
pub mod realtime;
pub mod rest;
pub mod transport;

pub use error::Error;
pub use realtime::{ChangeEvent, ChangeKind, ReconnectConfig, RealtimeHandle};
pub use rest::{RestClient, Table};
pub use transport::TransportConfig;
