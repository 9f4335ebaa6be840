//! Shared configuration for the boutique CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `boutique_core::StoreConfig`. The CLI adds
//! `GlobalOpts`-aware wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use boutique_core::{CacheLocation, Identity, StoreConfig};

/// Keyring service name; entries are keyed `{profile}/anon-key` and
/// `{profile}/access-token`.
pub const KEYRING_SERVICE: &str = "boutique";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no anon key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named store profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named store profile.
///
/// A profile without `url` runs against the local cache only.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Remote store project URL (e.g., "https://shop.example.co").
    pub url: Option<String>,

    /// Public anon key (plaintext; prefer keyring or env var).
    pub anon_key: Option<String>,

    /// Environment variable name containing the anon key.
    pub anon_key_env: Option<String>,

    /// Administrator user shown in logs.
    pub user: Option<String>,

    /// Administrator access token (plaintext; prefer keyring).
    pub access_token: Option<String>,

    /// Environment variable name containing the access token.
    pub access_token_env: Option<String>,

    /// Override the cache directory.
    pub cache_dir: Option<PathBuf>,

    /// Subscribe to the realtime change feed (default: true).
    pub realtime: Option<bool>,

    /// Seed demo categories into an empty local store.
    pub seed_demo_catalog: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "boutiquemg", "boutique")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default cache directory for a profile.
pub fn cache_dir(profile_name: &str) -> PathBuf {
    project_dirs()
        .map_or_else(|| dirs_fallback(".cache"), |dirs| dirs.cache_dir().to_path_buf())
        .join(profile_name)
}

fn dirs_fallback(kind: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(kind);
    p.push("boutique");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit path: defaults, then the TOML file, then
/// `BOUTIQUE_*` variables (`__` separates nesting, e.g.
/// `BOUTIQUE_DEFAULTS__TIMEOUT`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("BOUTIQUE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_secret(profile_name: &str, kind: &str) -> Option<SecretString> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{kind}")).ok()?;
    entry.get_password().ok().map(SecretString::from)
}

/// Walk the chain: named env var, system keyring, plaintext.
fn resolve_secret(
    env_name: Option<&str>,
    profile_name: &str,
    kind: &str,
    plaintext: Option<&String>,
) -> Option<SecretString> {
    // 1. Profile's *_env -> env var lookup
    if let Some(val) = env_name.and_then(|name| std::env::var(name).ok()) {
        return Some(SecretString::from(val));
    }

    // 2. System keyring
    if let Some(secret) = keyring_secret(profile_name, kind) {
        return Some(secret);
    }

    // 3. Plaintext in config
    plaintext.map(|v| SecretString::from(v.clone()))
}

/// Resolve the anon key from the credential chain (no CLI flag step).
pub fn resolve_anon_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_secret(
        profile.anon_key_env.as_deref(),
        profile_name,
        "anon-key",
        profile.anon_key.as_ref(),
    )
    .ok_or_else(|| ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve the administrator access token. `None` means unauthenticated.
pub fn resolve_access_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    resolve_secret(
        profile.access_token_env.as_deref(),
        profile_name,
        "access-token",
        profile.access_token.as_ref(),
    )
}

/// The session identity for a profile, if it carries an access token.
pub fn profile_identity(profile: &Profile, profile_name: &str) -> Option<Identity> {
    let token = resolve_access_token(profile, profile_name)?;
    let user = profile.user.clone().unwrap_or_else(|| profile_name.to_owned());
    Some(Identity::new(user, token))
}

/// Parse and validate a remote store URL.
pub fn parse_store_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "url".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// Build a `StoreConfig` from a profile; no CLI flag overrides.
///
/// Profiles without a URL produce a local-only config. With a URL, the
/// anon key must resolve.
pub fn profile_to_store_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<StoreConfig, ConfigError> {
    let (url, anon_key) = match profile.url.as_deref().filter(|u| !u.is_empty()) {
        Some(raw) => (
            Some(parse_store_url(raw)?),
            Some(resolve_anon_key(profile, profile_name)?),
        ),
        None => (None, None),
    };

    let cache = profile
        .cache_dir
        .clone()
        .unwrap_or_else(|| cache_dir(profile_name));

    Ok(StoreConfig {
        url,
        anon_key,
        timeout: Duration::from_secs(profile.timeout.unwrap_or_else(default_timeout)),
        realtime_enabled: profile.realtime.unwrap_or(true),
        cache: CacheLocation::Dir(cache),
        seed_demo_catalog: profile.seed_demo_catalog.unwrap_or(false),
        ..StoreConfig::default()
    })
}
