// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast channel polled from the `broadcast_messages` table.
//!
//! Posting appends a row; subscribing starts (once per channel handle) a
//! background poller that forwards rows newer than the subscription point to
//! an in-process `tokio::sync::broadcast` sender. Any process that opens the
//! same database file and channel name sees the posts.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use bayline_config::model::BroadcastConfig;
use bayline_core::{AdapterType, BaylineError, BroadcastChannel, HealthStatus, PluginAdapter};

use crate::database::Database;
use crate::queries;

/// Rows fetched per poll.
const POLL_BATCH: i64 = 256;

/// Buffer of the in-process fan-out behind the poller.
const FANOUT_CAPACITY: usize = 256;

/// SQLite-backed broadcast channel.
pub struct SqliteChannel {
    db: Database,
    name: String,
    poll_interval: Duration,
    retain_messages: u64,
    sender: broadcast::Sender<String>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl SqliteChannel {
    pub fn new(db: Database, config: &BroadcastConfig) -> Self {
        let (sender, _) = broadcast::channel(FANOUT_CAPACITY);
        Self {
            db,
            name: config.channel_name.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            retain_messages: config.retain_messages,
            sender,
            poller: Mutex::new(None),
        }
    }

    async fn start_poller(&self) -> Result<(), BaylineError> {
        if self.poller_running() {
            return Ok(());
        }

        let cursor = queries::broadcast::latest_id(&self.db, &self.name).await?;
        let mut guard = self
            .poller
            .lock()
            .map_err(|_| BaylineError::Internal("channel poller lock poisoned".into()))?;
        if guard.is_some() {
            return Ok(());
        }

        let db = self.db.clone();
        let name = self.name.clone();
        let sender = self.sender.clone();
        let interval = self.poll_interval;
        *guard = Some(tokio::spawn(poll_loop(db, name, sender, cursor, interval)));
        debug!(channel = %self.name, cursor, "broadcast poller started");
        Ok(())
    }

    fn poller_running(&self) -> bool {
        self.poller
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    fn stop_poller(&self) {
        if let Ok(mut guard) = self.poller.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

async fn poll_loop(
    db: Database,
    channel: String,
    sender: broadcast::Sender<String>,
    mut cursor: i64,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match queries::broadcast::since(&db, &channel, cursor, POLL_BATCH).await {
            Ok(rows) => {
                for row in rows {
                    cursor = row.id;
                    // No receivers is fine: a later subscriber only wants newer posts.
                    let _ = sender.send(row.payload);
                }
            }
            Err(e) => warn!(channel = %channel, error = %e, "broadcast poll failed"),
        }
    }
}

impl Drop for SqliteChannel {
    fn drop(&mut self) {
        self.stop_poller();
    }
}

#[async_trait]
impl PluginAdapter for SqliteChannel {
    fn name(&self) -> &str {
        "sqlite-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, BaylineError> {
        queries::broadcast::latest_id(&self.db, &self.name).await?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BaylineError> {
        self.stop_poller();
        Ok(())
    }
}

#[async_trait]
impl BroadcastChannel for SqliteChannel {
    fn channel_name(&self) -> &str {
        &self.name
    }

    async fn post(&self, message: &str) -> Result<(), BaylineError> {
        queries::broadcast::append(&self.db, &self.name, message).await?;
        let pruned = queries::broadcast::prune(&self.db, &self.name, self.retain_messages).await?;
        if pruned > 0 {
            debug!(channel = %self.name, pruned, "pruned broadcast log");
        }
        Ok(())
    }

    async fn subscribe(&self) -> Result<broadcast::Receiver<String>, BaylineError> {
        let receiver = self.sender.subscribe();
        self.start_poller().await?;
        Ok(receiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config(name: &str) -> BroadcastConfig {
        BroadcastConfig {
            enabled: true,
            channel_name: name.to_string(),
            poll_interval_ms: 10,
            retain_messages: 10,
        }
    }

    async fn recv(rx: &mut broadcast::Receiver<String>) -> String {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("message should arrive")
            .unwrap()
    }

    #[tokio::test]
    async fn subscriber_receives_posts_from_another_handle() {
        let db = Database::open_in_memory().await.unwrap();
        let tab_a = SqliteChannel::new(db.clone(), &fast_config("sync"));
        let tab_b = SqliteChannel::new(db, &fast_config("sync"));

        let mut rx = tab_b.subscribe().await.unwrap();
        tab_a.post(r#"{"type":"cleared"}"#).await.unwrap();

        assert_eq!(recv(&mut rx).await, r#"{"type":"cleared"}"#);
    }

    #[tokio::test]
    async fn posts_before_subscribing_are_not_replayed() {
        let db = Database::open_in_memory().await.unwrap();
        let channel = SqliteChannel::new(db, &fast_config("sync"));
        channel.post("old").await.unwrap();

        let mut rx = channel.subscribe().await.unwrap();
        channel.post("new").await.unwrap();
        assert_eq!(recv(&mut rx).await, "new");
    }

    #[tokio::test]
    async fn channels_with_different_names_are_isolated() {
        let db = Database::open_in_memory().await.unwrap();
        let sync = SqliteChannel::new(db.clone(), &fast_config("sync"));
        let other = SqliteChannel::new(db, &fast_config("other"));

        let mut rx = sync.subscribe().await.unwrap();
        other.post("elsewhere").await.unwrap();
        sync.post("here").await.unwrap();
        assert_eq!(recv(&mut rx).await, "here");
    }

    #[tokio::test]
    async fn shutdown_stops_delivery() {
        let db = Database::open_in_memory().await.unwrap();
        let channel = SqliteChannel::new(db, &fast_config("sync"));
        let mut rx = channel.subscribe().await.unwrap();
        channel.shutdown().await.unwrap();
        channel.post("late").await.unwrap();

        let got = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(got.is_err() || got.unwrap().is_err());
    }
}
