// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Bayline shop store.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use bayline_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("namespace: {}", config.storage.namespace);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::BaylineConfig;

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<BaylineConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<BaylineConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![(path.display().to_string(), content)])
            .unwrap_or_default()
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<BaylineConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Validate an extracted config, or turn the extraction error into diagnostics.
/// Sources are only read on failure, for span resolution.
fn finish(
    loaded: Result<BaylineConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<BaylineConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            tracing::debug!(namespace = %config.storage.namespace, "configuration loaded");
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Collect TOML source file contents for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![std::path::PathBuf::from("bayline.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("bayline/bayline.toml"));
    }
    candidates.push(std::path::PathBuf::from("/etc/bayline/bayline.toml"));

    candidates
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let display = std::fs::canonicalize(&path)
                .unwrap_or(path)
                .display()
                .to_string();
            Some((display, content))
        })
        .collect()
}
