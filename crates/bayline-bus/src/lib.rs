// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process broadcast hub.
//!
//! A [`LocalBus`] owns one `tokio::sync::broadcast` sender per channel name.
//! Every [`LocalChannel`] opened on the same bus and name reaches the same
//! subscribers, which is how several store contexts inside one process (a
//! kiosk app with several windows, or a test) see each other's changes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

use bayline_core::{AdapterType, BaylineError, BroadcastChannel, HealthStatus, PluginAdapter};

/// Default per-channel buffer. Receivers that fall further behind observe a lag.
pub const DEFAULT_CAPACITY: usize = 256;

/// Registry of named in-process channels.
#[derive(Clone)]
pub struct LocalBus {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<String>>>>,
    capacity: usize,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Open a handle on the channel called `name`, creating it on first use.
    pub fn open(&self, name: &str) -> Result<LocalChannel, BaylineError> {
        let mut channels = self
            .channels
            .lock()
            .map_err(|_| BaylineError::Internal("local bus lock poisoned".into()))?;
        let sender = channels
            .entry(name.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone();
        Ok(LocalChannel {
            name: name.to_string(),
            sender,
        })
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle on one named channel of a [`LocalBus`].
#[derive(Clone)]
pub struct LocalChannel {
    name: String,
    sender: broadcast::Sender<String>,
}

impl LocalChannel {
    /// Number of live subscribers on this channel.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl PluginAdapter for LocalChannel {
    fn name(&self) -> &str {
        "local-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, BaylineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BaylineError> {
        Ok(())
    }
}

#[async_trait]
impl BroadcastChannel for LocalChannel {
    fn channel_name(&self) -> &str {
        &self.name
    }

    async fn post(&self, message: &str) -> Result<(), BaylineError> {
        // A send with no subscribers is not a failure: nobody else is listening yet.
        let delivered = self.sender.send(message.to_string()).unwrap_or(0);
        trace!(channel = %self.name, delivered, "local post");
        Ok(())
    }

    async fn subscribe(&self) -> Result<broadcast::Receiver<String>, BaylineError> {
        Ok(self.sender.subscribe())
    }
}
