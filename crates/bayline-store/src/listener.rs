// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Applying changes announced by other contexts.

use std::sync::{Arc, Weak};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, trace, warn};

use bayline_core::{Envelope, StoreEvent};

use crate::collection;
use crate::store::Store;

impl Store {
    /// Start consuming the broadcast channel. Envelopes from other contexts
    /// are merged into the mirror and re-emitted to local subscribers.
    ///
    /// Returns `false` when there is no channel or it cannot be subscribed
    /// to; the store then only sees other contexts' changes on its next read.
    /// Attaching twice is a no-op.
    pub async fn attach_listener(self: &Arc<Self>) -> bool {
        let Some(channel) = &self.channel else {
            return false;
        };
        if self.listener_running() {
            return true;
        }

        let rx = match channel.subscribe().await {
            Ok(rx) => rx,
            Err(e) => {
                warn!(
                    channel = channel.channel_name(),
                    error = %e,
                    "broadcast unavailable, changes from other contexts arrive on next read only"
                );
                return false;
            }
        };

        let handle = tokio::spawn(listen(Arc::downgrade(self), rx));
        match self.listener.lock() {
            Ok(mut guard) => {
                if let Some(previous) = guard.replace(handle) {
                    previous.abort();
                }
            }
            Err(_) => {
                handle.abort();
                warn!("listener slot poisoned, not attaching");
                return false;
            }
        }
        info!(
            channel = channel.channel_name(),
            context = %self.context,
            "listening for changes from other contexts"
        );
        true
    }

    fn listener_running(&self) -> bool {
        self.listener
            .lock()
            .map(|guard| guard.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    pub(crate) fn stop_listener(&self) {
        if let Ok(mut guard) = self.listener.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }

    /// Merge one envelope into the mirror. Returns whether anything was
    /// applied; envelopes this store posted itself are ignored.
    pub async fn apply_envelope(&self, envelope: Envelope) -> bool {
        if envelope.origin == self.context {
            trace!(event = envelope.event.kind(), "ignoring own broadcast");
            return false;
        }

        let changed = {
            let mut mirror = self.mirror.lock().await;
            match &envelope.event {
                StoreEvent::AppointmentAdded { appointment }
                | StoreEvent::AppointmentUpdated { appointment } => {
                    mirror.appointments.apply_remote(appointment.clone())
                }
                StoreEvent::NotificationAdded { notification }
                | StoreEvent::NotificationUpdated { notification } => {
                    let changed = mirror.notifications.apply_remote(notification.clone());
                    collection::retain_newest(
                        &mut mirror.notifications.records,
                        self.options.max_notifications,
                    );
                    changed
                }
                StoreEvent::Cleared => {
                    mirror.appointments.clear();
                    mirror.notifications.clear();
                    true
                }
            }
        };

        if changed {
            debug!(
                origin = %envelope.origin,
                event = envelope.event.kind(),
                "applied change from another context"
            );
            let _ = self.events.send(envelope.event);
        }
        changed
    }
}

async fn listen(store: Weak<Store>, mut rx: broadcast::Receiver<String>) {
    loop {
        let raw = match rx.recv().await {
            Ok(raw) => raw,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "listener fell behind, some remote changes were missed");
                continue;
            }
            Err(RecvError::Closed) => {
                debug!("broadcast channel closed, listener exiting");
                break;
            }
        };

        let Some(store) = store.upgrade() else {
            break;
        };
        match Envelope::decode(&raw) {
            Ok(envelope) => {
                store.apply_envelope(envelope).await;
            }
            Err(e) => warn!(error = %e, "discarding malformed broadcast message"),
        }
    }
}
