// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human and JSON rendering of records, stats, and events.

use std::io::IsTerminal;

use colored::Colorize;
use serde::Serialize;

use bayline_core::{Appointment, AppointmentStatus, Notification, StoreEvent, StoreStats};

/// How command results are printed.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
    color: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            color: !json && std::io::stdout().is_terminal(),
        }
    }

    #[cfg(test)]
    pub fn plain() -> Self {
        Self {
            json: false,
            color: false,
        }
    }

    pub fn appointment(&self, appointment: &Appointment) {
        if self.json {
            print_json(appointment);
        } else {
            println!("{}", self.appointment_line(appointment));
        }
    }

    pub fn appointments(&self, appointments: &[Appointment]) {
        if self.json {
            print_json(&appointments);
            return;
        }
        if appointments.is_empty() {
            println!("  no appointments");
            return;
        }
        for appointment in appointments {
            println!("{}", self.appointment_line(appointment));
        }
    }

    pub fn notification(&self, notification: &Notification) {
        if self.json {
            print_json(notification);
        } else {
            println!("{}", self.notification_line(notification));
        }
    }

    pub fn notifications(&self, notifications: &[Notification]) {
        if self.json {
            print_json(&notifications);
            return;
        }
        if notifications.is_empty() {
            println!("  no notifications");
            return;
        }
        for notification in notifications {
            println!("{}", self.notification_line(notification));
        }
    }

    pub fn stats(&self, stats: &StoreStats) {
        if self.json {
            print_json(stats);
        } else {
            println!(
                "  total {}  pending {}  active {}  completed {}",
                stats.total, stats.pending, stats.active, stats.completed
            );
        }
    }

    pub fn count(&self, label: &str, count: usize) {
        if self.json {
            print_json(&serde_json::json!({ label: count }));
        } else {
            println!("  {label}: {count}");
        }
    }

    pub fn message(&self, text: &str) {
        if self.json {
            print_json(&serde_json::json!({ "message": text }));
        } else {
            println!("  {text}");
        }
    }

    pub fn event(&self, event: &StoreEvent) {
        if self.json {
            print_json(event);
            return;
        }
        let detail = match event {
            StoreEvent::AppointmentAdded { appointment }
            | StoreEvent::AppointmentUpdated { appointment } => self.appointment_line(appointment),
            StoreEvent::NotificationAdded { notification }
            | StoreEvent::NotificationUpdated { notification } => {
                self.notification_line(notification)
            }
            StoreEvent::Cleared => String::new(),
        };
        let kind = if self.color {
            event.kind().bold().to_string()
        } else {
            event.kind().to_string()
        };
        println!("{kind}{detail}");
    }

    fn appointment_line(&self, appointment: &Appointment) -> String {
        let status = appointment
            .status
            .as_ref()
            .map(AppointmentStatus::as_str)
            .unwrap_or("-");
        let status = if self.color {
            match appointment.status {
                Some(AppointmentStatus::Pending) => status.yellow().to_string(),
                Some(AppointmentStatus::InProgress) => status.cyan().to_string(),
                Some(AppointmentStatus::Completed) => status.green().to_string(),
                _ => status.to_string(),
            }
        } else {
            status.to_string()
        };
        let customer = text_field(&appointment.extra, "customerName");
        let service = text_field(&appointment.extra, "service");
        format!(
            "  {:<36}  {:<12}  {:<20}  {}",
            appointment.id, status, customer, service
        )
    }

    fn notification_line(&self, notification: &Notification) -> String {
        let marker = match (notification.read, self.color) {
            (false, true) => "●".blue().to_string(),
            (false, false) => "*".to_string(),
            (true, _) => " ".to_string(),
        };
        let role = notification
            .for_role
            .as_ref()
            .map(|r| r.as_str())
            .unwrap_or("all");
        let title = notification.title.as_deref().unwrap_or("");
        format!("  {marker} {:<36}  {:<9}  {title}", notification.id, role)
    }
}

fn text_field<'a>(extra: &'a bayline_core::records::Extra, key: &str) -> &'a str {
    extra.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("bayline: could not encode output: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bayline_core::{AppointmentDraft, NotificationDraft, Role};
    use chrono::Utc;

    #[test]
    fn appointment_line_shows_status_and_customer() {
        let appointment = AppointmentDraft::new()
            .with_id("APT-1")
            .with_status("in-progress")
            .with_field("customerName", "Dana")
            .with_field("service", "brakes")
            .into_record(Utc::now())
            .unwrap();
        let line = Output::plain().appointment_line(&appointment);
        assert!(line.contains("APT-1"));
        assert!(line.contains("in-progress"));
        assert!(line.contains("Dana"));
        assert!(line.contains("brakes"));
    }

    #[test]
    fn notification_line_marks_unread() {
        let unread = NotificationDraft::new()
            .with_id("N-1")
            .with_title("Car ready")
            .for_role(Role::Employee)
            .into_record(Utc::now())
            .unwrap();
        let line = Output::plain().notification_line(&unread);
        assert!(line.starts_with("  * N-1"));
        assert!(line.contains("employee"));

        let read = NotificationDraft::new()
            .with_id("N-2")
            .with_read(true)
            .into_record(Utc::now())
            .unwrap();
        let line = Output::plain().notification_line(&read);
        assert!(line.starts_with("    N-2"));
        assert!(line.contains("all"));
    }
}
