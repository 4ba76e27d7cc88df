// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./bayline.toml` > `~/.config/bayline/bayline.toml` > `/etc/bayline/bayline.toml`
//! with environment variable overrides via `BAYLINE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::BaylineConfig;

/// Config sections, used to map `BAYLINE_<SECTION>_<KEY>` to `section.key`.
const SECTIONS: &[&str] = &["log", "storage", "store", "notifications", "broadcast"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/bayline/bayline.toml` (system-wide)
/// 3. `~/.config/bayline/bayline.toml` (user XDG config)
/// 4. `./bayline.toml` (local directory)
/// 5. `BAYLINE_*` environment variables
pub fn load_config() -> Result<BaylineConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<BaylineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BaylineConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BaylineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BaylineConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the XDG lookup, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(BaylineConfig::default()))
        .merge(Toml::file("/etc/bayline/bayline.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("bayline/bayline.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("bayline.toml"))
        .merge(env_provider())
}

/// Environment provider mapping only the first underscore after the section
/// name to a dot, so `BAYLINE_STORE_APPOINTMENTS_KEY` becomes
/// `store.appointments_key`.
fn env_provider() -> Env {
    Env::prefixed("BAYLINE_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
