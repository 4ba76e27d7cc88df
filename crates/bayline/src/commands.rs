// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record commands: `appointment`, `notification`, `stats`, and `clear`.

use std::io::Read;

use clap::Subcommand;
use serde_json::Value;

use bayline_core::{AppointmentDraft, BaylineError, NotificationDraft, Role};
use bayline_store::Store;

use crate::output::Output;

#[derive(Subcommand, Debug)]
pub enum AppointmentCommand {
    /// Add an appointment from a JSON object (`-` reads stdin).
    Add {
        /// e.g. '{"customerName":"Dana","service":"oil change","status":"pending"}'
        record: String,
    },
    /// List all appointments, oldest first.
    List,
    /// Move an appointment to a new status.
    SetStatus {
        id: String,
        /// `pending`, `in-progress`, `completed`, or any other label.
        status: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum NotificationCommand {
    /// Add a notification from a JSON object (`-` reads stdin).
    Add { record: String },
    /// List notifications, optionally only those for one role.
    List {
        #[arg(long)]
        role: Option<String>,
    },
    /// Mark a notification as read.
    MarkRead { id: String },
    /// Count unread notifications.
    Unread {
        #[arg(long)]
        role: Option<String>,
    },
}

pub async fn appointment(
    store: &Store,
    out: &Output,
    command: AppointmentCommand,
) -> Result<(), BaylineError> {
    match command {
        AppointmentCommand::Add { record } => {
            let draft = AppointmentDraft::from_json(parse_record(&record)?)?;
            let stored = store.add_appointment(draft).await?;
            out.appointment(&stored);
        }
        AppointmentCommand::List => out.appointments(&store.get_appointments().await),
        AppointmentCommand::SetStatus { id, status } => {
            match store.set_appointment_status(&id, status.as_str()).await {
                Some(updated) => out.appointment(&updated),
                None => return Err(unknown("appointment", &id)),
            }
        }
    }
    Ok(())
}

pub async fn notification(
    store: &Store,
    out: &Output,
    command: NotificationCommand,
) -> Result<(), BaylineError> {
    match command {
        NotificationCommand::Add { record } => {
            let draft = NotificationDraft::from_json(parse_record(&record)?)?;
            let stored = store.add_notification(draft).await?;
            out.notification(&stored);
        }
        NotificationCommand::List { role } => {
            let notifications = match role {
                Some(role) => store.get_notifications_for(&Role::from(role)).await,
                None => store.get_notifications().await,
            };
            out.notifications(&notifications);
        }
        NotificationCommand::MarkRead { id } => match store.mark_notification_as_read(&id).await {
            Some(notification) => out.notification(&notification),
            None => return Err(unknown("notification", &id)),
        },
        NotificationCommand::Unread { role } => {
            let count = match role {
                Some(role) => store.get_unread_count_for(&Role::from(role)).await,
                None => store.get_unread_count().await,
            };
            out.count("unread", count);
        }
    }
    Ok(())
}

pub async fn stats(store: &Store, out: &Output) {
    out.stats(&store.get_stats().await);
}

pub async fn clear(store: &Store, out: &Output) {
    store.clear_all().await;
    out.message("all appointments and notifications cleared");
}

/// Parse a record argument, reading stdin for `-`.
fn parse_record(arg: &str) -> Result<Value, BaylineError> {
    let text = if arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| BaylineError::InvalidRecord(format!("could not read stdin: {e}")))?;
        buf
    } else {
        arg.to_string()
    };
    serde_json::from_str(&text)
        .map_err(|e| BaylineError::InvalidRecord(format!("record is not valid JSON: {e}")))
}

fn unknown(kind: &str, id: &str) -> BaylineError {
    BaylineError::InvalidRecord(format!("no {kind} with id `{id}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_record_rejects_bad_json() {
        let err = parse_record("{oops").unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[tokio::test]
    async fn add_rejects_arrays() {
        let store = Store::in_memory().await;
        let err = appointment(
            &store,
            &Output::plain(),
            AppointmentCommand::Add {
                record: "[1, 2]".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BaylineError::InvalidRecord(_)));
        assert!(store.get_appointments().await.is_empty());
    }

    #[tokio::test]
    async fn set_status_of_unknown_id_errors() {
        let store = Store::in_memory().await;
        let err = appointment(
            &store,
            &Output::plain(),
            AppointmentCommand::SetStatus {
                id: "ghost".into(),
                status: "completed".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[tokio::test]
    async fn add_then_mark_read() {
        let store = Store::in_memory().await;
        let out = Output::plain();
        notification(
            &store,
            &out,
            NotificationCommand::Add {
                record: r#"{"id":"N-1","title":"Car ready","forRole":"employee"}"#.into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(store.get_unread_count_for(&Role::Employee).await, 1);

        notification(&store, &out, NotificationCommand::MarkRead { id: "N-1".into() })
            .await
            .unwrap();
        assert_eq!(store.get_unread_count().await, 0);
    }
}
