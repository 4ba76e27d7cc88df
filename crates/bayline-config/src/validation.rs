// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::BaylineConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &BaylineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.log.level.as_str()) {
        fail(format!(
            "log.level `{}` must be one of {}",
            config.log.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.enabled && config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.storage.namespace.trim().is_empty() {
        fail("storage.namespace must not be empty".to_string());
    }

    let store = &config.store;
    if store.appointments_key.trim().is_empty() {
        fail("store.appointments_key must not be empty".to_string());
    }
    if store.notifications_key.trim().is_empty() {
        fail("store.notifications_key must not be empty".to_string());
    }
    if store.appointments_key == store.notifications_key {
        fail(format!(
            "store.appointments_key and store.notifications_key must differ, both are `{}`",
            store.appointments_key
        ));
    }
    if store.event_capacity == 0 {
        fail("store.event_capacity must be at least 1".to_string());
    }

    if config.notifications.max_retained == Some(0) {
        fail("notifications.max_retained must be at least 1 when set".to_string());
    }

    let broadcast = &config.broadcast;
    if broadcast.enabled {
        if broadcast.channel_name.trim().is_empty() {
            fail("broadcast.channel_name must not be empty".to_string());
        }
        if broadcast.poll_interval_ms == 0 {
            fail("broadcast.poll_interval_ms must be positive".to_string());
        }
        if broadcast.retain_messages == 0 {
            fail("broadcast.retain_messages must be at least 1".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&BaylineConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = BaylineConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn empty_database_path_is_fine_when_storage_disabled() {
        let mut config = BaylineConfig::default();
        config.storage.enabled = false;
        config.storage.database_path = "".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn identical_collection_keys_fail_validation() {
        let mut config = BaylineConfig::default();
        config.store.notifications_key = config.store.appointments_key.clone();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "must differ"));
    }

    #[test]
    fn all_failures_are_collected() {
        let mut config = BaylineConfig::default();
        config.log.level = "loud".to_string();
        config.broadcast.poll_interval_ms = 0;
        config.notifications.max_retained = Some(0);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(has_error(&errors, "log.level"));
        assert!(has_error(&errors, "poll_interval_ms"));
        assert!(has_error(&errors, "max_retained"));
    }

    #[test]
    fn broadcast_checks_skipped_when_disabled() {
        let mut config = BaylineConfig::default();
        config.broadcast.enabled = false;
        config.broadcast.channel_name = String::new();
        assert!(validate_config(&config).is_ok());
    }
}
