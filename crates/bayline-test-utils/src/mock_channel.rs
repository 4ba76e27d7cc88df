// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock broadcast channel for deterministic testing.
//!
//! `MockChannel` implements `BroadcastChannel` with captured posts and
//! injectable inbound messages. Posts are recorded but not echoed back to
//! subscribers, so a test controls exactly what a store receives.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};

use bayline_core::{AdapterType, BaylineError, BroadcastChannel, HealthStatus, PluginAdapter};

pub struct MockChannel {
    inbound: broadcast::Sender<String>,
    posted: Arc<Mutex<Vec<String>>>,
    fail_posts: AtomicBool,
    fail_subscribe: AtomicBool,
}

impl MockChannel {
    pub fn new() -> Self {
        let (inbound, _) = broadcast::channel(64);
        Self {
            inbound,
            posted: Arc::new(Mutex::new(Vec::new())),
            fail_posts: AtomicBool::new(false),
            fail_subscribe: AtomicBool::new(false),
        }
    }

    /// Deliver a raw message to every current subscriber.
    pub fn inject(&self, raw: impl Into<String>) -> usize {
        self.inbound.send(raw.into()).unwrap_or(0)
    }

    /// Every message passed to `post()` so far, oldest first.
    pub async fn posted(&self) -> Vec<String> {
        self.posted.lock().await.clone()
    }

    pub async fn clear_posted(&self) {
        self.posted.lock().await.clear();
    }

    pub fn fail_posts(&self, fail: bool) {
        self.fail_posts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inbound.receiver_count()
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
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
impl BroadcastChannel for MockChannel {
    fn channel_name(&self) -> &str {
        "mock"
    }

    async fn post(&self, message: &str) -> Result<(), BaylineError> {
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(BaylineError::channel("injected post failure"));
        }
        self.posted.lock().await.push(message.to_string());
        Ok(())
    }

    async fn subscribe(&self) -> Result<broadcast::Receiver<String>, BaylineError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(BaylineError::channel("broadcast unsupported"));
        }
        Ok(self.inbound.subscribe())
    }
}
