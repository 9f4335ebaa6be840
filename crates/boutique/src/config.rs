//! CLI configuration: thin wrapper around `boutique_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--url, --anon-key, etc.).

use std::time::Duration;

use secrecy::SecretString;

use boutique_core::{CacheLocation, Identity, StoreConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use boutique_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

/// User id attached to a flag-supplied access token when the profile
/// names none.
const DEFAULT_USER: &str = "admin";

/// Everything needed to open a store session.
#[derive(Debug)]
pub struct Session {
    pub config: StoreConfig,
    pub identity: Option<Identity>,
}

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the session from the config file, profile, and CLI overrides.
///
/// With no profile and no flags this is a local-only session over the
/// default cache directory. `realtime` requests the change feed; it is
/// still off when the profile disables it.
pub fn resolve_session(global: &GlobalOpts, realtime: bool) -> Result<Session, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    let fallback = Profile::default();

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile,
        // An explicitly requested profile must exist.
        None if global.profile.is_some() => {
            let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None => &fallback,
    };

    resolve_profile(profile, &profile_name, global, realtime)
}

/// Translate a `Profile` + global flags into a `Session`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
    realtime: bool,
) -> Result<Session, CliError> {
    let cache_dir = global
        .cache_dir
        .clone()
        .or_else(|| profile.cache_dir.clone())
        .unwrap_or_else(|| boutique_config::cache_dir(profile_name));

    let local = StoreConfig {
        timeout: Duration::from_secs(global.timeout),
        seed_demo_catalog: profile.seed_demo_catalog.unwrap_or(false),
        ..StoreConfig::local(CacheLocation::Dir(cache_dir))
    };

    if global.offline {
        return Ok(Session {
            config: local,
            identity: None,
        });
    }

    // 1. Access token (flag > profile chain). Without one the session is local.
    let identity = match global.access_token {
        Some(ref token) => Some(Identity::new(
            profile.user.clone().unwrap_or_else(|| DEFAULT_USER.into()),
            SecretString::from(token.clone()),
        )),
        None => boutique_config::profile_identity(profile, profile_name),
    };
    let Some(identity) = identity else {
        return Ok(Session {
            config: local,
            identity: None,
        });
    };

    // 2. Store URL (flag > env > profile)
    let url_str = global
        .url
        .as_deref()
        .or(profile.url.as_deref())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| CliError::Validation {
            field: "url".into(),
            reason: "signing in needs a remote store URL (--url or the profile's url)".into(),
        })?;
    let url = boutique_config::parse_store_url(url_str)?;

    // 3. Anon key (flag > profile chain)
    let anon_key = match global.anon_key {
        Some(ref key) => SecretString::from(key.clone()),
        None => boutique_config::resolve_anon_key(profile, profile_name)?,
    };

    Ok(Session {
        config: StoreConfig {
            url: Some(url),
            anon_key: Some(anon_key),
            realtime_enabled: realtime && profile.realtime.unwrap_or(true),
            ..local
        },
        identity: Some(identity),
    })
}
