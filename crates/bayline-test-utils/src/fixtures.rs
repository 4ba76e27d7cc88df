// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sample drafts shaped like real booking-flow submissions.

use bayline_core::{AppointmentDraft, AppointmentStatus, NotificationDraft, Role};

/// A pending appointment with the usual customer, vehicle and schedule fields.
pub fn booking(customer: &str) -> AppointmentDraft {
    AppointmentDraft::new()
        .with_status(AppointmentStatus::Pending)
        .with_field("customerName", customer)
        .with_field("vehicle", "2019 Corolla")
        .with_field("service", "oil change")
        .with_field("date", "2026-10-20")
        .with_field("time", "09:30")
}

/// A booking with an explicit status and no other change.
pub fn booking_with_status(customer: &str, status: impl Into<AppointmentStatus>) -> AppointmentDraft {
    booking(customer).with_status(status)
}

/// The notification the booking flow raises for staff when an appointment lands.
pub fn new_booking_alert(appointment_id: &str) -> NotificationDraft {
    NotificationDraft::new()
        .with_kind("new-appointment")
        .with_title("New appointment")
        .with_message("A customer booked a service")
        .for_role(Role::Admin)
        .about_appointment(appointment_id)
}

/// A notification addressed to `role`.
pub fn alert_for(role: Role, title: &str) -> NotificationDraft {
    NotificationDraft::new()
        .with_kind("info")
        .with_title(title)
        .for_role(role)
}
