//! Realtime row-change feed with auto-reconnect.
//!
//! Connects to the remote store's realtime socket (Phoenix channel
//! protocol), joins one `postgres_changes` channel per table, and streams
//! parsed [`ChangeEvent`]s through a [`tokio::sync::broadcast`] channel.
//! Reconnects with exponential backoff + jitter and re-joins every channel
//! after each reconnect.
//!
//! # Example
//!
//! ```rust,ignore
//! use boutique_api::realtime::{realtime_url, RealtimeHandle, ReconnectConfig};
//! use boutique_api::Table;
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let ws_url = realtime_url("https://shop.example.co", &anon_key)?;
//!
//! let handle = RealtimeHandle::connect(ws_url, Table::ALL.to_vec(), None, ReconnectConfig::default(), cancel.clone())?;
//! let mut rx = handle.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     println!("{} {}", event.kind, event.table);
//! }
//!
//! handle.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::rest::Table;

// ── Channel capacity / protocol constants ────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const PROTOCOL_VSN: &str = "1.0.0";

// ── ChangeEvent ──────────────────────────────────────────────────────

/// Kind of row change reported by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A single row change on one of the synced tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    /// `id` of the changed row (new record, or old record for deletes).
    #[serde(default)]
    pub record_id: Option<String>,
    #[serde(default)]
    pub commit_timestamp: Option<String>,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for socket reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

/// Build the realtime socket URL from the project URL.
///
/// `https://shop.example.co` -> `wss://shop.example.co/realtime/v1/websocket?apikey=..&vsn=1.0.0`
pub fn realtime_url(base_url: &str, api_key: &SecretString) -> Result<Url, Error> {
    let mut url = Url::parse(base_url)?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(Error::RealtimeConnect(format!(
                "unsupported URL scheme for realtime: {other}"
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|()| Error::RealtimeConnect(format!("cannot switch {base_url} to {scheme}")))?;

    let path = url.path().trim_end_matches('/').to_owned();
    url.set_path(&format!("{path}/realtime/v1/websocket"));
    url.query_pairs_mut()
        .clear()
        .append_pair("apikey", api_key.expose_secret())
        .append_pair("vsn", PROTOCOL_VSN);

    Ok(url)
}

// ── RealtimeHandle ───────────────────────────────────────────────────

/// Handle to a running realtime change feed.
///
/// Call [`shutdown`](Self::shutdown) (or cancel the token passed to
/// [`connect`](Self::connect)) to tear down the background task.
pub struct RealtimeHandle {
    event_rx: broadcast::Receiver<Arc<ChangeEvent>>,
    cancel: CancellationToken,
}

impl RealtimeHandle {
    /// Spawn the reconnection loop for the given tables.
    ///
    /// Returns immediately once the background task is spawned; the first
    /// connection attempt happens asynchronously.
    pub fn connect(
        ws_url: Url,
        tables: Vec<Table>,
        access_token: Option<SecretString>,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Result<Self, Error> {
        if tables.is_empty() {
            return Err(Error::RealtimeConnect("no tables to subscribe to".into()));
        }

        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let session = Session {
            url: ws_url,
            tables,
            access_token,
        };
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            realtime_loop(session, event_tx, reconnect, task_cancel).await;
        });

        Ok(Self { event_rx, cancel })
    }

    /// Get a new broadcast receiver for the change feed.
    ///
    /// If a consumer falls behind, it receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ChangeEvent>> {
        self.event_rx.resubscribe()
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

struct Session {
    url: Url,
    tables: Vec<Table>,
    access_token: Option<SecretString>,
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → join → read → on error, backoff → reconnect.
async fn realtime_loop(
    session: Session,
    event_tx: broadcast::Sender<Arc<ChangeEvent>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&session, &event_tx, &cancel) => result,
        };

        match result {
            // Clean disconnect: reset the attempt counter, still pause once
            // so a server that closes right after every join is not hammered.
            Ok(()) => {
                if cancel.is_cancelled() {
                    break;
                }
                tracing::info!("realtime socket disconnected cleanly, reconnecting");
                attempt = 0;

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(reconnect.initial_delay) => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "realtime socket error");

                if let Some(max) = reconnect.max_retries {
                    if attempt >= max {
                        tracing::error!(
                            max_retries = max,
                            "realtime reconnection limit reached, giving up"
                        );
                        break;
                    }
                }

                let delay = calculate_backoff(attempt, &reconnect);
                tracing::info!(
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    attempt,
                    "waiting before reconnect"
                );

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(delay) => {}
                }

                attempt = attempt.saturating_add(1);
            }
        }
    }

    tracing::debug!("realtime loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one socket connection, join every table channel, and read
/// frames until it drops. Sends a heartbeat every 30s.
async fn connect_and_read(
    session: &Session,
    event_tx: &broadcast::Sender<Arc<ChangeEvent>>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(host = ?session.url.host_str(), "connecting to realtime socket");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(session.url.as_str())
        .await
        .map_err(|e| Error::RealtimeConnect(e.to_string()))?;

    let (mut write, mut read) = ws_stream.split();
    let mut msg_ref: u64 = 0;

    for table in &session.tables {
        msg_ref += 1;
        let join = join_message(*table, session.access_token.as_ref(), msg_ref);
        write
            .send(tungstenite::Message::Text(join.to_string().into()))
            .await
            .map_err(|e| Error::RealtimeConnect(e.to_string()))?;
    }

    tracing::info!(tables = session.tables.len(), "realtime channels joined");

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            _ = heartbeat.tick() => {
                msg_ref += 1;
                write
                    .send(tungstenite::Message::Text(heartbeat_message(msg_ref).to_string().into()))
                    .await
                    .map_err(|e| Error::RealtimeConnect(e.to_string()))?;
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        parse_and_broadcast(&text, event_tx);
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        return match frame {
                            Some(cf) if cf.code != tungstenite::protocol::frame::coding::CloseCode::Normal => {
                                Err(Error::RealtimeClosed {
                                    code: u16::from(cf.code),
                                    reason: cf.reason.as_str().to_owned(),
                                })
                            }
                            _ => {
                                tracing::info!("realtime close frame received");
                                Ok(())
                            }
                        };
                    }
                    Some(Err(e)) => {
                        return Err(Error::RealtimeConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("realtime stream ended");
                        return Ok(());
                    }
                    // Ping is answered by tungstenite; Binary, Pong, Frame ignored.
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

// ── Outgoing messages ────────────────────────────────────────────────

fn topic(table: Table) -> String {
    format!("realtime:public:{table}")
}

fn join_message(table: Table, access_token: Option<&SecretString>, msg_ref: u64) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "config": {
            "postgres_changes": [
                { "event": "*", "schema": "public", "table": table.as_str() }
            ]
        }
    });
    if let Some(token) = access_token {
        payload["access_token"] = serde_json::Value::String(token.expose_secret().to_owned());
    }

    serde_json::json!({
        "topic": topic(table),
        "event": "phx_join",
        "payload": payload,
        "ref": msg_ref.to_string(),
    })
}

fn heartbeat_message(msg_ref: u64) -> serde_json::Value {
    serde_json::json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": msg_ref.to_string(),
    })
}

// ── Incoming message parsing ─────────────────────────────────────────

/// Phoenix frame: `{ topic, event, payload, ref }`.
#[derive(Debug, Deserialize)]
struct PhxFrame {
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
}

/// Parse a text frame and broadcast the change it carries, if any.
///
/// Two payload shapes are accepted: `postgres_changes` events with the
/// change under `payload.data`, and bare `INSERT`/`UPDATE`/`DELETE`
/// events with the change directly in `payload`. Replies, heartbeats and
/// presence traffic are ignored.
fn parse_and_broadcast(text: &str, event_tx: &broadcast::Sender<Arc<ChangeEvent>>) {
    let frame: PhxFrame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse realtime frame");
            return;
        }
    };

    let change = match frame.event.as_str() {
        "postgres_changes" => change_from_raw(&frame.payload["data"]),
        "INSERT" | "UPDATE" | "DELETE" => change_from_raw(&frame.payload),
        "phx_reply" | "phx_close" | "presence_state" | "presence_diff" | "system" => None,
        "phx_error" => {
            tracing::warn!(payload = %frame.payload, "realtime channel error");
            None
        }
        other => {
            tracing::trace!(event = other, "ignoring realtime frame");
            None
        }
    };

    if let Some(change) = change {
        // Send errors just mean no active subscribers right now.
        let _ = event_tx.send(Arc::new(change));
    }
}

/// Build a [`ChangeEvent`] from `{ type, table, record, old_record, commit_timestamp }`.
fn change_from_raw(data: &serde_json::Value) -> Option<ChangeEvent> {
    let kind: ChangeKind = data["type"]
        .as_str()
        .or_else(|| data["eventType"].as_str())?
        .parse()
        .ok()?;
    let table: Table = match data["table"].as_str()?.parse() {
        Ok(t) => t,
        Err(_) => {
            tracing::trace!(table = ?data["table"], "change on an unsynced table");
            return None;
        }
    };

    let record = match kind {
        ChangeKind::Delete => &data["old_record"],
        ChangeKind::Insert | ChangeKind::Update => &data["record"],
    };

    Some(ChangeEvent {
        table,
        kind,
        record_id: record["id"].as_str().map(String::from),
        commit_timestamp: data["commit_timestamp"].as_str().map(String::from),
    })
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from multiple clients.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic jitter seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
