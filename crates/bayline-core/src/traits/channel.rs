// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast channel trait for cross-context change notification.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::BaylineError;
use crate::traits::adapter::PluginAdapter;

/// A named, best-effort fan-out channel between contexts.
///
/// Delivery is at-most-once and unordered across posters. Implementations
/// deliver a post to every subscriber, including subscribers owned by the
/// poster; receivers filter their own messages.
#[async_trait]
pub trait BroadcastChannel: PluginAdapter {
    /// Name of the channel posts are delivered on.
    fn channel_name(&self) -> &str;

    /// Post a serialized message to every subscriber of the channel.
    async fn post(&self, message: &str) -> Result<(), BaylineError>;

    /// Subscribe to messages posted after this call.
    async fn subscribe(&self) -> Result<broadcast::Receiver<String>, BaylineError>;
}
