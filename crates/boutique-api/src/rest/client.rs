// Hand-crafted async HTTP client for the remote store's REST surface.
//
// Base path: /rest/v1/
// Auth: `apikey` + `Authorization: Bearer` default headers (see transport.rs)

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::Table;
use super::rows::{
    CategoryPatch, CategoryRow, ProductPatch, ProductRow, ReservationPatch, ReservationRow,
    SettingsRow,
};
use crate::{Error, TransportConfig};

const PREFER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";

// ── Error response shape from the REST endpoint ──────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the remote store's row tables.
///
/// One request per call, no retries: failures propagate to the caller
/// unchanged apart from timeouts, which surface as [`Error::Timeout`].
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl RestClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from the project URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            timeout: Some(transport.timeout),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            timeout: None,
        })
    }

    /// `https://project.example.co` -> `https://project.example.co/rest/v1/`
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/rest/v1") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/rest/v1/"));
        }

        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, table: Table) -> Result<Url, Error> {
        Ok(self.base_url.join(table.as_str())?)
    }

    fn send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.map_or(0, |t| t.as_secs().max(1)),
            }
        } else {
            Error::Transport(err)
        }
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    /// `GET /{table}?select=*`
    pub async fn select_all<T: DeserializeOwned>(&self, table: Table) -> Result<Vec<T>, Error> {
        let url = self.url(table)?;
        debug!("GET {url}");

        let resp = self
            .http
            .get(url)
            .query(&[("select", "*")])
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        self.handle_response(resp).await
    }

    /// `POST /{table}`; returns the inserted row.
    pub async fn insert<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        table: Table,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(table)?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .header(PREFER, RETURN_REPRESENTATION)
            .json(body)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let mut rows: Vec<T> = self.handle_response(resp).await?;
        if rows.is_empty() {
            return Err(Error::Deserialization {
                message: format!("insert into {table} returned no row"),
                body: String::new(),
            });
        }
        Ok(rows.swap_remove(0))
    }

    /// `PATCH /{table}?id=eq.{id}`; returns the updated row.
    pub async fn update<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        table: Table,
        id: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(table)?;
        debug!("PATCH {url} id={id}");

        let resp = self
            .http
            .patch(url)
            .query(&[("id", format!("eq.{id}"))])
            .header(PREFER, RETURN_REPRESENTATION)
            .json(body)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let mut rows: Vec<T> = self.handle_response(resp).await?;
        if rows.is_empty() {
            return Err(Error::RowNotFound {
                table: table.to_string(),
                id: id.to_owned(),
            });
        }
        Ok(rows.swap_remove(0))
    }

    /// `DELETE /{table}?id=eq.{id}`
    pub async fn delete(&self, table: Table, id: &str) -> Result<(), Error> {
        let url = self.url(table)?;
        debug!("DELETE {url} id={id}");

        let resp = self
            .http
            .delete(url)
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        Self::handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await.map_err(|e| self.send_error(e))?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ErrorResponse>(&raw).ok();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Error::Authentication {
                message: parsed
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| status.to_string()),
            };
        }

        match parsed {
            Some(err) => Error::Api {
                status: status.as_u16(),
                message: match err.hint {
                    Some(hint) => format!(
                        "{} ({hint})",
                        err.message.unwrap_or_else(|| status.to_string())
                    ),
                    None => err.message.unwrap_or_else(|| status.to_string()),
                },
                code: err.code,
                details: err.details,
            },
            None => Error::Api {
                status: status.as_u16(),
                message: if raw.is_empty() { status.to_string() } else { raw },
                code: None,
                details: None,
            },
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Categories ───────────────────────────────────────────────────

    pub async fn list_categories(&self) -> Result<Vec<CategoryRow>, Error> {
        self.select_all(Table::Categories).await
    }

    pub async fn insert_category(&self, row: &CategoryRow) -> Result<CategoryRow, Error> {
        self.insert(Table::Categories, row).await
    }

    pub async fn update_category(
        &self,
        id: &str,
        patch: &CategoryPatch,
    ) -> Result<CategoryRow, Error> {
        self.update(Table::Categories, id, patch).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), Error> {
        self.delete(Table::Categories, id).await
    }

    // ── Products ─────────────────────────────────────────────────────

    pub async fn list_products(&self) -> Result<Vec<ProductRow>, Error> {
        self.select_all(Table::Products).await
    }

    pub async fn insert_product(&self, row: &ProductRow) -> Result<ProductRow, Error> {
        self.insert(Table::Products, row).await
    }

    pub async fn update_product(&self, id: &str, patch: &ProductPatch) -> Result<ProductRow, Error> {
        self.update(Table::Products, id, patch).await
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), Error> {
        self.delete(Table::Products, id).await
    }

    // ── Reservations ─────────────────────────────────────────────────

    pub async fn list_reservations(&self) -> Result<Vec<ReservationRow>, Error> {
        self.select_all(Table::Reservations).await
    }

    pub async fn insert_reservation(&self, row: &ReservationRow) -> Result<ReservationRow, Error> {
        self.insert(Table::Reservations, row).await
    }

    pub async fn update_reservation(
        &self,
        id: &str,
        patch: &ReservationPatch,
    ) -> Result<ReservationRow, Error> {
        self.update(Table::Reservations, id, patch).await
    }

    pub async fn delete_reservation(&self, id: &str) -> Result<(), Error> {
        self.delete(Table::Reservations, id).await
    }

    // ── Settings ─────────────────────────────────────────────────────

    /// The settings singleton, or `None` when the table is empty.
    pub async fn get_settings(&self) -> Result<Option<SettingsRow>, Error> {
        let mut rows: Vec<SettingsRow> = self.select_all(Table::Settings).await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.swap_remove(0)))
        }
    }

    pub async fn insert_settings(&self, row: &SettingsRow) -> Result<SettingsRow, Error> {
        self.insert(Table::Settings, row).await
    }

    pub async fn update_settings(&self, id: &str, row: &SettingsRow) -> Result<SettingsRow, Error> {
        self.update(Table::Settings, id, row).await
    }
}
