// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Appointment and notification records.
//!
//! Both record types carry a small set of required fields (`id`, `createdAt`,
//! `rev`) plus an open map of caller-supplied extension fields that is passed
//! through untouched. Field names serialize in camelCase so a namespace written
//! by the browser booking flow reads back unchanged.
//!
//! Callers never build records directly: they submit a draft, and the draft is
//! validated and completed at the insertion boundary.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::BaylineError;

/// Extension fields carried alongside the typed ones.
pub type Extra = Map<String, Value>;

/// Keys owned by the typed part of a record; stripped from drafts' extras.
const RESERVED_KEYS: &[&str] = &["rev"];

/// Identity and revision access shared by both collections.
pub trait Record: Clone {
    fn id(&self) -> &str;
    fn rev(&self) -> u64;
    fn set_rev(&mut self, rev: u64);
}

/// Appointment lifecycle status. The set is open: unknown strings survive as
/// [`AppointmentStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppointmentStatus {
    Pending,
    InProgress,
    Completed,
    Other(String),
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::InProgress => "in-progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Other(s) => s,
        }
    }
}

impl From<String> for AppointmentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => AppointmentStatus::Pending,
            "in-progress" => AppointmentStatus::InProgress,
            "completed" => AppointmentStatus::Completed,
            _ => AppointmentStatus::Other(s),
        }
    }
}

impl From<&str> for AppointmentStatus {
    fn from(s: &str) -> Self {
        AppointmentStatus::from(s.to_string())
    }
}

impl From<AppointmentStatus> for String {
    fn from(status: AppointmentStatus) -> Self {
        match status {
            AppointmentStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audience of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Employee,
    Customer,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
            Role::Customer => "customer",
            Role::Other(s) => s,
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "admin" => Role::Admin,
            "employee" => Role::Employee,
            "customer" => Role::Customer,
            _ => Role::Other(s),
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Role::from(s.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn initial_rev() -> u64 {
    1
}

/// `"read": null` means unread.
fn null_as_unread<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// A stored appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(default = "initial_rev")]
    pub rev: u64,
    /// Customer, vehicle, service and schedule details.
    #[serde(flatten)]
    pub extra: Extra,
}

impl Record for Appointment {
    fn id(&self) -> &str {
        &self.id
    }

    fn rev(&self) -> u64 {
        self.rev
    }

    fn set_rev(&mut self, rev: u64) {
        self.rev = rev;
    }
}

/// A stored notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_unread")]
    pub read: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub for_role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
    #[serde(default = "initial_rev")]
    pub rev: u64,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Record for Notification {
    fn id(&self) -> &str {
        &self.id
    }

    fn rev(&self) -> u64 {
        self.rev
    }

    fn set_rev(&mut self, rev: u64) {
        self.rev = rev;
    }
}

/// An appointment as submitted by a caller, before ids and timestamps are filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl AppointmentDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a draft from an arbitrary JSON value. Only objects are accepted.
    pub fn from_json(value: Value) -> Result<Self, BaylineError> {
        draft_from_json(value)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<AppointmentStatus>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Validate the draft and complete the generated fields.
    pub fn into_record(self, now: DateTime<Utc>) -> Result<Appointment, BaylineError> {
        Ok(Appointment {
            id: resolve_id(self.id)?,
            created_at: resolve_created_at(self.created_at, now)?,
            status: self.status,
            rev: initial_rev(),
            extra: strip_reserved(self.extra),
        })
    }
}

/// A notification as submitted by a caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub for_role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl NotificationDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: Value) -> Result<Self, BaylineError> {
        draft_from_json(value)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn for_role(mut self, role: impl Into<Role>) -> Self {
        self.for_role = Some(role.into());
        self
    }

    pub fn about_appointment(mut self, appointment_id: impl Into<String>) -> Self {
        self.appointment_id = Some(appointment_id.into());
        self
    }

    pub fn with_read(mut self, read: bool) -> Self {
        self.read = Some(read);
        self
    }

    /// Validate the draft and complete the generated fields. `read` defaults to `false`.
    pub fn into_record(self, now: DateTime<Utc>) -> Result<Notification, BaylineError> {
        Ok(Notification {
            id: resolve_id(self.id)?,
            created_at: resolve_created_at(self.created_at, now)?,
            read: self.read.unwrap_or(false),
            kind: self.kind,
            title: self.title,
            message: self.message,
            for_role: self.for_role,
            appointment_id: self.appointment_id,
            rev: initial_rev(),
            extra: strip_reserved(self.extra),
        })
    }
}

/// Format a timestamp the way persisted records carry it (`2026-01-01T09:30:00.000Z`).
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn draft_from_json<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, BaylineError> {
    if !value.is_object() {
        return Err(BaylineError::InvalidRecord(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| BaylineError::InvalidRecord(e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn resolve_id(id: Option<String>) -> Result<String, BaylineError> {
    match id {
        Some(id) if id.trim().is_empty() => Err(BaylineError::InvalidRecord(
            "id must not be empty".to_string(),
        )),
        Some(id) => Ok(id),
        None => Ok(uuid::Uuid::new_v4().to_string()),
    }
}

fn resolve_created_at(
    created_at: Option<String>,
    now: DateTime<Utc>,
) -> Result<String, BaylineError> {
    match created_at {
        Some(ts) => {
            DateTime::parse_from_rfc3339(&ts).map_err(|e| {
                BaylineError::InvalidRecord(format!("createdAt `{ts}` is not RFC 3339: {e}"))
            })?;
            Ok(ts)
        }
        None => Ok(format_timestamp(now)),
    }
}

fn strip_reserved(mut extra: Extra) -> Extra {
    for key in RESERVED_KEYS {
        extra.remove(*key);
    }
    extra
}
