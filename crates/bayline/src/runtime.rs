// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Building a store and its adapters from configuration.

use std::sync::Arc;

use tracing::{debug, warn};

use bayline_config::model::BaylineConfig;
use bayline_storage::{SqliteChannel, SqliteNamespace};
use bayline_store::{Store, StoreOptions};

/// Initialize the tracing subscriber. `RUST_LOG` wins over `[log] level`.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bayline={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Open the store described by `config`.
///
/// A database that cannot be opened leaves the store in memory for this run;
/// the broadcast channel rides on the same database, so it goes too.
pub async fn open_store(config: &BaylineConfig) -> Arc<Store> {
    let mut builder = Store::builder().options(StoreOptions::from(config));

    if config.storage.enabled {
        match SqliteNamespace::open(&config.storage).await {
            Ok(namespace) => {
                if config.broadcast.enabled {
                    let channel = SqliteChannel::new(namespace.database().clone(), &config.broadcast);
                    builder = builder.channel(Arc::new(channel));
                }
                builder = builder.namespace(Arc::new(namespace));
            }
            Err(e) => warn!(
                path = %config.storage.database_path,
                error = %e,
                "storage unavailable, running in memory"
            ),
        }
    } else if config.broadcast.enabled {
        debug!("broadcast needs storage, skipping channel");
    }

    Arc::new(builder.build().await)
}
