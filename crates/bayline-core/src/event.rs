// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Change events and the broadcast envelope that carries them between contexts.

use serde::{Deserialize, Serialize};

use crate::error::BaylineError;
use crate::records::{Appointment, AppointmentStatus, Notification};
use crate::types::ContextId;

/// A change applied to the store.
///
/// The JSON tag matches the message names posted by the browser booking flow
/// (`appointment-added`, `notification-updated`, ...), with the changed record
/// carried in the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StoreEvent {
    AppointmentAdded { appointment: Appointment },
    AppointmentUpdated { appointment: Appointment },
    NotificationAdded { notification: Notification },
    NotificationUpdated { notification: Notification },
    Cleared,
}

impl StoreEvent {
    /// Wire name of the event.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreEvent::AppointmentAdded { .. } => "appointment-added",
            StoreEvent::AppointmentUpdated { .. } => "appointment-updated",
            StoreEvent::NotificationAdded { .. } => "notification-added",
            StoreEvent::NotificationUpdated { .. } => "notification-updated",
            StoreEvent::Cleared => "cleared",
        }
    }
}

/// A [`StoreEvent`] tagged with the context that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub origin: ContextId,
    pub event: StoreEvent,
}

impl Envelope {
    pub fn new(origin: ContextId, event: StoreEvent) -> Self {
        Self { origin, event }
    }

    pub fn encode(&self) -> Result<String, BaylineError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self, BaylineError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Appointment counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Appointments with status `in-progress`.
    pub active: usize,
    pub pending: usize,
    pub completed: usize,
    pub total: usize,
}

impl StoreStats {
    pub fn from_appointments(appointments: &[Appointment]) -> Self {
        let mut stats = StoreStats {
            total: appointments.len(),
            ..Default::default()
        };
        for appointment in appointments {
            match appointment.status {
                Some(AppointmentStatus::InProgress) => stats.active += 1,
                Some(AppointmentStatus::Pending) => stats.pending += 1,
                Some(AppointmentStatus::Completed) => stats.completed += 1,
                _ => {}
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{AppointmentDraft, NotificationDraft};
    use chrono::Utc;
    use proptest::prelude::*;

    #[test]
    fn event_tags_use_wire_names() {
        let notification = NotificationDraft::new()
            .with_title("Service complete")
            .into_record(Utc::now())
            .unwrap();
        let event = StoreEvent::NotificationUpdated { notification };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "notification-updated");
        assert_eq!(event.kind(), "notification-updated");

        let cleared = serde_json::to_value(&StoreEvent::Cleared).unwrap();
        assert_eq!(cleared, serde_json::json!({"type": "cleared"}));
    }

    #[test]
    fn envelope_survives_the_wire() {
        let appointment = AppointmentDraft::new()
            .with_status("pending")
            .with_field("vehicle", "2019 Civic")
            .into_record(Utc::now())
            .unwrap();
        let envelope = Envelope::new(
            ContextId("tab-a".into()),
            StoreEvent::AppointmentAdded { appointment },
        );
        let decoded = Envelope::decode(&envelope.encode().unwrap()).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn garbage_envelope_is_a_serialization_error() {
        let err = Envelope::decode("not json").unwrap_err();
        assert!(matches!(err, BaylineError::Serialization(_)));
    }

    #[test]
    fn stats_count_only_exact_statuses() {
        let appointments: Vec<_> = ["pending", "in-progress", "completed", "cancelled"]
            .into_iter()
            .map(|s| {
                AppointmentDraft::new()
                    .with_status(s)
                    .into_record(Utc::now())
                    .unwrap()
            })
            .collect();
        let stats = StoreStats::from_appointments(&appointments);
        assert_eq!(
            stats,
            StoreStats {
                active: 1,
                pending: 1,
                completed: 1,
                total: 4
            }
        );
    }

    proptest! {
        #[test]
        fn stats_match_status_histogram(statuses in prop::collection::vec(
            prop::sample::select(vec!["pending", "in-progress", "completed", "other"]), 0..40)
        ) {
            let appointments: Vec<_> = statuses
                .iter()
                .map(|s| AppointmentDraft::new().with_status(*s).into_record(Utc::now()).unwrap())
                .collect();
            let stats = StoreStats::from_appointments(&appointments);
            let count = |name: &str| statuses.iter().filter(|s| **s == name).count();
            prop_assert_eq!(stats.total, statuses.len());
            prop_assert_eq!(stats.pending, count("pending"));
            prop_assert_eq!(stats.active, count("in-progress"));
            prop_assert_eq!(stats.completed, count("completed"));
        }
    }
}
