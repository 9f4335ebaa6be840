//! Config subcommand handlers.

use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Defaults, Profile};
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of the config with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mask = |secret: &Option<String>| secret.as_ref().map(|_| MASK.to_owned());
    Config {
        default_profile: cfg.default_profile.clone(),
        defaults: Defaults {
            output: cfg.defaults.output.clone(),
            color: cfg.defaults.color.clone(),
            timeout: cfg.defaults.timeout,
        },
        profiles: cfg
            .profiles
            .iter()
            .map(|(name, p)| {
                let profile = Profile {
                    url: p.url.clone(),
                    anon_key: mask(&p.anon_key),
                    anon_key_env: p.anon_key_env.clone(),
                    user: p.user.clone(),
                    access_token: mask(&p.access_token),
                    access_token_env: p.access_token_env.clone(),
                    cache_dir: p.cache_dir.clone(),
                    realtime: p.realtime,
                    seed_demo_catalog: p.seed_demo_catalog,
                    timeout: p.timeout,
                };
                (name.clone(), profile)
            })
            .collect(),
    }
}

/// TOML-ish rendering of an already redacted config.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let strings = [
            ("url", &p.url),
            ("anon_key", &p.anon_key),
            ("anon_key_env", &p.anon_key_env),
            ("user", &p.user),
            ("access_token", &p.access_token),
            ("access_token_env", &p.access_token_env),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                let _ = writeln!(out, "{key} = \"{value}\"");
            }
        }
        if let Some(ref dir) = p.cache_dir {
            let _ = writeln!(out, "cache_dir = \"{}\"", dir.display());
        }
        if let Some(realtime) = p.realtime {
            let _ = writeln!(out, "realtime = {realtime}");
        }
        if let Some(seed) = p.seed_demo_catalog {
            let _ = writeln!(out, "seed_demo_catalog = {seed}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out.trim_end().to_owned()
}

fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be 'true' or 'false'".into(),
    })
}

fn profile_not_found(name: String, cfg: &Config) -> CliError {
    let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    available.sort_unstable();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

/// Offer to store a secret in the system keyring or return it for plaintext config.
///
/// Returns `Some(secret)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_keyring_storage(
    secret: &str,
    keyring_key: &str,
    label: &str,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(format!("Where to store the {label}?"))
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        let entry = keyring::Entry::new(boutique_config::KEYRING_SERVICE, keyring_key).map_err(
            |e| CliError::Validation {
                field: "keyring".into(),
                reason: format!("failed to access keyring: {e}"),
            },
        )?;
        entry
            .set_password(secret)
            .map_err(|e| CliError::Validation {
                field: "keyring".into(),
                reason: format!("failed to store {label} in keyring: {e}"),
            })?;
        eprintln!("   ✓ {label} stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret.to_owned()))
    }
}

// ── Init wizard ─────────────────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("Boutique CLI configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let url: String = Input::new()
        .with_prompt("Remote store URL (empty for local only)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let mut profile = Profile::default();

    if !url.trim().is_empty() {
        boutique_config::parse_store_url(url.trim())?;
        profile.url = Some(url.trim().to_owned());

        let anon_key = rpassword::prompt_password("Anon key: ").map_err(prompt_err)?;
        if anon_key.is_empty() {
            return Err(CliError::Validation {
                field: "anon_key".into(),
                reason: "anon key cannot be empty".into(),
            });
        }
        profile.anon_key =
            prompt_keyring_storage(&anon_key, &format!("{profile_name}/anon-key"), "anon key")?;

        let user: String = Input::new()
            .with_prompt("Administrator user")
            .default("admin".into())
            .interact_text()
            .map_err(prompt_err)?;
        profile.user = Some(user);

        let token = rpassword::prompt_password("Access token (empty to stay signed out): ")
            .map_err(prompt_err)?;
        if !token.is_empty() {
            profile.access_token = prompt_keyring_storage(
                &token,
                &format!("{profile_name}/access-token"),
                "access token",
            )?;
        }
    }

    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());

    save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: boutique reports");
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                "config".into()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            match key.as_str() {
                "url" => {
                    boutique_config::parse_store_url(&value)?;
                    profile.url = Some(value);
                }
                "anon_key" | "anon-key" => profile.anon_key = Some(value),
                "anon_key_env" | "anon-key-env" => profile.anon_key_env = Some(value),
                "user" => profile.user = Some(value),
                "access_token_env" | "access-token-env" => {
                    profile.access_token_env = Some(value);
                }
                "cache_dir" | "cache-dir" => profile.cache_dir = Some(value.into()),
                "realtime" => profile.realtime = Some(parse_bool("realtime", &value)?),
                "seed_demo_catalog" | "seed-demo-catalog" => {
                    profile.seed_demo_catalog = Some(parse_bool("seed_demo_catalog", &value)?);
                }
                "timeout" => {
                    profile.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                        field: "timeout".into(),
                        reason: "must be a number (seconds)".into(),
                    })?);
                }
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: url, anon_key, \
                             anon_key_env, user, access_token_env, cache_dir, realtime, \
                             seed_demo_catalog, timeout"
                        ),
                    });
                }
            }

            save_config(&cfg)?;
            output::success(global, &format!("Set {key} on profile '{profile_name}'"));
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(name, &cfg));
            }
            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            output::success(global, &format!("Default profile set to '{name}'"));
            Ok(())
        }
    }
}
