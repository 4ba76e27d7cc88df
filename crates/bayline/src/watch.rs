// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `bayline watch`: print changes made by any context until interrupted.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use bayline_core::BaylineError;
use bayline_store::Store;

use crate::output::Output;

pub async fn run_watch(store: Arc<Store>, out: Output) -> Result<(), BaylineError> {
    let mut events = store.subscribe();
    if !store.attach_listener().await {
        return Err(BaylineError::channel(
            "no broadcast channel available (enable [storage] and [broadcast])",
        ));
    }
    info!(context = %store.context_id(), "watching for changes, Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) => out.event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "output fell behind, some changes were not printed");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}
