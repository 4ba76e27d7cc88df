// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The store: persisted collections, an in-memory mirror, and change fan-out.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use bayline_core::{
    Appointment, AppointmentDraft, AppointmentStatus, BaylineError, BroadcastChannel, ContextId,
    Envelope, Notification, NotificationDraft, PersistentNamespace, Record, Role, StoreEvent,
    StoreStats,
};

use crate::collection::{self, Collection};
use crate::options::StoreOptions;

/// Read-merge-write attempts before a contended write falls back to the mirror.
const MAX_WRITE_ATTEMPTS: usize = 8;

#[derive(Debug, Default)]
pub(crate) struct Mirror {
    pub(crate) appointments: Collection<Appointment>,
    pub(crate) notifications: Collection<Notification>,
}

fn appointments(mirror: &mut Mirror) -> &mut Collection<Appointment> {
    &mut mirror.appointments
}

fn notifications(mirror: &mut Mirror) -> &mut Collection<Notification> {
    &mut mirror.notifications
}

/// Result of applying a mutation to a working copy.
pub(crate) enum Edit<T> {
    /// The collection changed and must be written.
    Changed(T),
    /// Nothing to write.
    Unchanged(Option<T>),
}

/// One context's view of the shared appointment and notification collections.
///
/// Every read goes to the persistent namespace first and falls back to the
/// in-memory mirror. Every mutation is a read-merge-write under the mirror
/// lock, followed by a local event and a best-effort broadcast.
pub struct Store {
    pub(crate) context: ContextId,
    pub(crate) options: StoreOptions,
    pub(crate) namespace: Option<Arc<dyn PersistentNamespace>>,
    pub(crate) channel: Option<Arc<dyn BroadcastChannel>>,
    pub(crate) mirror: Mutex<Mirror>,
    pub(crate) events: broadcast::Sender<StoreEvent>,
    pub(crate) listener: StdMutex<Option<JoinHandle<()>>>,
}

/// Builder for [`Store`]. Both adapters are optional.
#[derive(Default)]
pub struct StoreBuilder {
    context: Option<ContextId>,
    options: StoreOptions,
    namespace: Option<Arc<dyn PersistentNamespace>>,
    channel: Option<Arc<dyn BroadcastChannel>>,
}

impl StoreBuilder {
    pub fn options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    pub fn namespace(mut self, namespace: Arc<dyn PersistentNamespace>) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn channel(mut self, channel: Arc<dyn BroadcastChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Use a fixed context id instead of a generated one.
    pub fn context(mut self, context: ContextId) -> Self {
        self.context = Some(context);
        self
    }

    /// Build the store and hydrate its mirror from the namespace.
    pub async fn build(self) -> Store {
        let (events, _) = broadcast::channel(self.options.event_capacity.max(1));
        let context = self.context.unwrap_or_else(ContextId::generate);

        let mut mirror = Mirror::default();
        if let Some(namespace) = &self.namespace {
            mirror.appointments = Collection::from_records(
                load(namespace.as_ref(), &self.options.appointments_key).await,
            );
            mirror.notifications = Collection::from_records(
                load(namespace.as_ref(), &self.options.notifications_key).await,
            );
        } else {
            warn!(%context, "no persistent namespace, store is in-memory only");
        }

        info!(
            %context,
            appointments = mirror.appointments.records.len(),
            notifications = mirror.notifications.records.len(),
            broadcast = self.channel.is_some(),
            "store ready"
        );

        Store {
            context,
            options: self.options,
            namespace: self.namespace,
            channel: self.channel,
            mirror: Mutex::new(mirror),
            events,
            listener: StdMutex::new(None),
        }
    }
}

/// Initial load of one collection. Failures and malformed data yield an empty collection.
async fn load<R: DeserializeOwned>(namespace: &dyn PersistentNamespace, key: &str) -> Vec<R> {
    match namespace.read(key).await {
        Ok(Some(raw)) => collection::decode(key, &raw).unwrap_or_default(),
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!(key, error = %e, "namespace unavailable at load, starting empty");
            Vec::new()
        }
    }
}

/// Outcome of a read-merge-write against the namespace.
enum Attempt<R, T> {
    /// Written, or nothing needed writing.
    Done(Edit<T>),
    /// Applied to a fresh merged copy that could not be written. `base` holds
    /// the revisions of that copy before the change.
    Unwritten {
        records: Vec<R>,
        base: HashMap<String, u64>,
        edit: Edit<T>,
    },
    /// The namespace could not be read.
    Unreadable,
}

/// Merge the persisted value with the mirror. A value that does not decode
/// counts as no data and the mirror is kept whole.
fn merge_persisted<R>(key: &str, collection: &Collection<R>, raw: Option<&str>) -> Vec<R>
where
    R: Record + DeserializeOwned,
{
    match raw {
        Some(raw) => match collection::decode::<R>(key, raw) {
            Some(persisted) => collection.reconcile(persisted),
            None => collection.records.clone(),
        },
        None => collection.reconcile(Vec::new()),
    }
}

/// Run `apply` against the freshly read persisted collection merged with the
/// mirror and swap the result in.
async fn try_persist<R, T, F>(
    namespace: &dyn PersistentNamespace,
    key: &str,
    collection: &mut Collection<R>,
    apply: &mut F,
) -> Attempt<R, T>
where
    R: Record + Serialize + DeserializeOwned,
    F: FnMut(&mut Vec<R>) -> Edit<T>,
{
    let mut contended = None;
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let raw = match namespace.read(key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "namespace read failed, keeping change in memory");
                return Attempt::Unreadable;
            }
        };
        let mut records = merge_persisted(key, collection, raw.as_deref());
        let base = collection::revisions_of(&records);

        let value = match apply(&mut records) {
            Edit::Changed(value) => value,
            unchanged => return Attempt::Done(unchanged),
        };

        let encoded = match serde_json::to_string(&records) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key, error = %e, "collection could not be serialized, keeping change in memory");
                return Attempt::Unwritten {
                    records,
                    base,
                    edit: Edit::Changed(value),
                };
            }
        };

        match namespace.compare_and_swap(key, raw.as_deref(), &encoded).await {
            Ok(true) => {
                debug!(key, records = records.len(), attempt, "collection persisted");
                collection.synced(records);
                return Attempt::Done(Edit::Changed(value));
            }
            Ok(false) => {
                debug!(key, attempt, "concurrent write detected, merging again");
                contended = Some((records, base, value));
            }
            Err(e) => {
                warn!(key, error = %e, "namespace write failed, keeping change in memory");
                return Attempt::Unwritten {
                    records,
                    base,
                    edit: Edit::Changed(value),
                };
            }
        }
    }

    warn!(
        key,
        attempts = MAX_WRITE_ATTEMPTS,
        "namespace kept changing underneath, keeping change in memory"
    );
    match contended {
        Some((records, base, value)) => Attempt::Unwritten {
            records,
            base,
            edit: Edit::Changed(value),
        },
        None => Attempt::Unreadable,
    }
}

impl Store {
    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }

    /// Store with neither persistence nor broadcast.
    pub async fn in_memory() -> Store {
        Store::builder().build().await
    }

    pub fn context_id(&self) -> &ContextId {
        &self.context
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn is_persistent(&self) -> bool {
        self.namespace.is_some()
    }

    /// Receive every change made through this store or applied from another context.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Validate `draft`, insert it (replacing a record with the same id), and
    /// announce it.
    pub async fn add_appointment(
        &self,
        draft: AppointmentDraft,
    ) -> Result<Appointment, BaylineError> {
        let record = draft.into_record(Utc::now())?;
        let key = self.options.appointments_key.clone();
        let edit = self
            .modify(&key, appointments, |records| {
                Edit::Changed(collection::upsert(records, record.clone()))
            })
            .await;

        let stored = match edit {
            Edit::Changed(stored) => stored,
            Edit::Unchanged(_) => record,
        };
        debug!(id = %stored.id, rev = stored.rev, "appointment added");
        self.emit(StoreEvent::AppointmentAdded {
            appointment: stored.clone(),
        })
        .await;
        Ok(stored)
    }

    pub async fn get_appointments(&self) -> Vec<Appointment> {
        let key = self.options.appointments_key.clone();
        self.snapshot(&key, appointments, None).await
    }

    pub async fn get_stats(&self) -> StoreStats {
        StoreStats::from_appointments(&self.get_appointments().await)
    }

    /// Move appointment `id` to `status`. Returns the updated record, or
    /// `None` when no appointment has that id.
    pub async fn set_appointment_status(
        &self,
        id: &str,
        status: impl Into<AppointmentStatus>,
    ) -> Option<Appointment> {
        let status = status.into();
        let key = self.options.appointments_key.clone();
        let edit = self
            .modify(&key, appointments, |records| {
                match records.iter_mut().find(|a| a.id == id) {
                    Some(a) if a.status.as_ref() == Some(&status) => Edit::Unchanged(Some(a.clone())),
                    Some(a) => {
                        a.status = Some(status.clone());
                        a.rev += 1;
                        Edit::Changed(a.clone())
                    }
                    None => Edit::Unchanged(None),
                }
            })
            .await;

        match edit {
            Edit::Changed(updated) => {
                debug!(id, status = %status, rev = updated.rev, "appointment status changed");
                self.emit(StoreEvent::AppointmentUpdated {
                    appointment: updated.clone(),
                })
                .await;
                Some(updated)
            }
            Edit::Unchanged(current) => current,
        }
    }

    /// Validate `draft` (unread unless stated), insert it, apply the retention
    /// cap, and announce it.
    pub async fn add_notification(
        &self,
        draft: NotificationDraft,
    ) -> Result<Notification, BaylineError> {
        let record = draft.into_record(Utc::now())?;
        let key = self.options.notifications_key.clone();
        let cap = self.options.max_notifications;
        let edit = self
            .modify(&key, notifications, |records| {
                let stored = collection::upsert(records, record.clone());
                let dropped = collection::retain_newest(records, cap);
                if dropped > 0 {
                    debug!(dropped, "oldest notifications dropped by retention");
                }
                Edit::Changed(stored)
            })
            .await;

        let stored = match edit {
            Edit::Changed(stored) => stored,
            Edit::Unchanged(_) => record,
        };
        debug!(id = %stored.id, rev = stored.rev, "notification added");
        self.emit(StoreEvent::NotificationAdded {
            notification: stored.clone(),
        })
        .await;
        Ok(stored)
    }

    pub async fn get_notifications(&self) -> Vec<Notification> {
        let key = self.options.notifications_key.clone();
        self.snapshot(&key, notifications, self.options.max_notifications)
            .await
    }

    /// Notifications addressed to `role`.
    pub async fn get_notifications_for(&self, role: &Role) -> Vec<Notification> {
        self.get_notifications()
            .await
            .into_iter()
            .filter(|n| n.for_role.as_ref() == Some(role))
            .collect()
    }

    /// Mark notification `id` as read. Marking an already read notification
    /// changes nothing. Returns the notification, or `None` for an unknown id.
    pub async fn mark_notification_as_read(&self, id: &str) -> Option<Notification> {
        let key = self.options.notifications_key.clone();
        let edit = self
            .modify(&key, notifications, |records| {
                match records.iter_mut().find(|n| n.id == id) {
                    Some(n) if n.read => Edit::Unchanged(Some(n.clone())),
                    Some(n) => {
                        n.read = true;
                        n.rev += 1;
                        Edit::Changed(n.clone())
                    }
                    None => Edit::Unchanged(None),
                }
            })
            .await;

        match edit {
            Edit::Changed(updated) => {
                debug!(id, "notification marked read");
                self.emit(StoreEvent::NotificationUpdated {
                    notification: updated.clone(),
                })
                .await;
                Some(updated)
            }
            Edit::Unchanged(current) => current,
        }
    }

    pub async fn get_unread_count(&self) -> usize {
        self.get_notifications()
            .await
            .iter()
            .filter(|n| !n.read)
            .count()
    }

    pub async fn get_unread_count_for(&self, role: &Role) -> usize {
        self.get_notifications_for(role)
            .await
            .iter()
            .filter(|n| !n.read)
            .count()
    }

    /// Empty both collections everywhere and announce it.
    pub async fn clear_all(&self) {
        let appointments_key = self.options.appointments_key.clone();
        let notifications_key = self.options.notifications_key.clone();
        self.reset(&appointments_key, appointments).await;
        self.reset(&notifications_key, notifications).await;
        info!(context = %self.context, "store cleared");
        self.emit(StoreEvent::Cleared).await;
    }

    /// Stop the listener and shut both adapters down.
    pub async fn close(&self) {
        self.stop_listener();
        if let Some(channel) = &self.channel {
            if let Err(e) = channel.shutdown().await {
                warn!(error = %e, "broadcast channel shutdown failed");
            }
        }
        if let Some(namespace) = &self.namespace {
            if let Err(e) = namespace.shutdown().await {
                warn!(error = %e, "namespace shutdown failed");
            }
        }
    }

    /// Fresh persisted copy merged with unsynced local changes, or the mirror
    /// when the namespace is absent, failing, or holds malformed data. `cap`
    /// bounds the merged view to its newest records.
    async fn snapshot<R>(
        &self,
        key: &str,
        select: fn(&mut Mirror) -> &mut Collection<R>,
        cap: Option<usize>,
    ) -> Vec<R>
    where
        R: Record + DeserializeOwned,
    {
        let mut mirror = self.mirror.lock().await;
        let collection = select(&mut mirror);
        let Some(namespace) = &self.namespace else {
            return collection.records.clone();
        };

        let raw = match namespace.read(key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "namespace read failed, serving in-memory mirror");
                return collection.records.clone();
            }
        };
        let mut merged = merge_persisted(key, collection, raw.as_deref());
        collection::retain_newest(&mut merged, cap);
        collection.records = merged.clone();
        merged
    }

    /// Apply `apply` with read-merge-write, or to the mirror alone when
    /// persistence is absent or failing.
    async fn modify<R, T, F>(
        &self,
        key: &str,
        select: fn(&mut Mirror) -> &mut Collection<R>,
        mut apply: F,
    ) -> Edit<T>
    where
        R: Record + Serialize + DeserializeOwned,
        F: FnMut(&mut Vec<R>) -> Edit<T>,
    {
        let mut mirror = self.mirror.lock().await;
        let collection = select(&mut mirror);

        if let Some(namespace) = &self.namespace {
            match try_persist(namespace.as_ref(), key, collection, &mut apply).await {
                Attempt::Done(edit) => return edit,
                Attempt::Unwritten {
                    records,
                    base,
                    edit,
                } => {
                    collection.adopt_unwritten(records, &base);
                    return edit;
                }
                Attempt::Unreadable => {}
            }
        }

        let before = collection.revisions();
        let edit = apply(&mut collection.records);
        if matches!(edit, Edit::Changed(_)) {
            collection.mark_changed_since(&before);
        }
        edit
    }

    async fn reset<R>(&self, key: &str, select: fn(&mut Mirror) -> &mut Collection<R>)
    where
        R: Record + Serialize + DeserializeOwned,
    {
        let mut mirror = self.mirror.lock().await;
        let collection = select(&mut mirror);
        let mut clear = |records: &mut Vec<R>| {
            records.clear();
            Edit::Changed(())
        };

        if let Some(namespace) = &self.namespace {
            if let Attempt::Done(_) =
                try_persist(namespace.as_ref(), key, collection, &mut clear).await
            {
                return;
            }
        }

        collection.clear();
        collection.clear_pending = self.namespace.is_some();
    }

    /// Notify local subscribers, then post to other contexts.
    async fn emit(&self, event: StoreEvent) {
        // No local subscribers is fine.
        let _ = self.events.send(event.clone());

        let Some(channel) = &self.channel else {
            return;
        };
        let kind = event.kind();
        match Envelope::new(self.context.clone(), event).encode() {
            Ok(raw) => {
                if let Err(e) = channel.post(&raw).await {
                    warn!(channel = channel.channel_name(), event = kind, error = %e, "broadcast post failed");
                }
            }
            Err(e) => warn!(event = kind, error = %e, "broadcast envelope could not be encoded"),
        }
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        self.stop_listener();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bayline_test_utils::{MockChannel, MockNamespace};
    use serde_json::json;
    use tracing_test::traced_test;

    #[tokio::test]
    async fn in_memory_store_round_trips() {
        let store = Store::in_memory().await;
        assert!(!store.is_persistent());

        let added = store
            .add_appointment(AppointmentDraft::new().with_status("pending"))
            .await
            .unwrap();
        assert_eq!(store.get_appointments().await, vec![added]);
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected_before_any_change() {
        let store = Store::in_memory().await;
        let mut rx = store.subscribe();

        let err = store
            .add_appointment(AppointmentDraft::new().with_id(""))
            .await
            .unwrap_err();
        assert!(matches!(err, BaylineError::InvalidRecord(_)));
        assert!(store.get_appointments().await.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn non_object_json_is_rejected() {
        let err = NotificationDraft::from_json(json!(["not", "an", "object"])).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[tokio::test]
    async fn duplicate_id_upserts_in_memory() {
        let store = Store::in_memory().await;
        store
            .add_appointment(AppointmentDraft::new().with_id("a1").with_status("pending"))
            .await
            .unwrap();
        let replaced = store
            .add_appointment(AppointmentDraft::new().with_id("a1").with_status("completed"))
            .await
            .unwrap();

        assert_eq!(replaced.rev, 2);
        let all = store.get_appointments().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, Some(AppointmentStatus::Completed));
    }

    #[tokio::test]
    async fn set_status_on_unknown_id_is_none() {
        let store = Store::in_memory().await;
        assert!(store.set_appointment_status("ghost", "completed").await.is_none());
    }

    #[tokio::test]
    async fn local_events_are_emitted_in_order() {
        let store = Store::in_memory().await;
        let mut rx = store.subscribe();

        let a = store.add_appointment(AppointmentDraft::new()).await.unwrap();
        store.set_appointment_status(&a.id, "in-progress").await;
        store.clear_all().await;

        assert_eq!(rx.recv().await.unwrap().kind(), "appointment-added");
        assert_eq!(rx.recv().await.unwrap().kind(), "appointment-updated");
        assert_eq!(rx.recv().await.unwrap(), StoreEvent::Cleared);
    }

    #[tokio::test]
    async fn retention_applies_without_persistence() {
        let store = Store::builder()
            .options(StoreOptions {
                max_notifications: Some(2),
                ..StoreOptions::default()
            })
            .build()
            .await;
        for id in ["n1", "n2", "n3"] {
            store
                .add_notification(NotificationDraft::new().with_id(id))
                .await
                .unwrap();
        }
        let ids: Vec<_> = store
            .get_notifications()
            .await
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["n2", "n3"]);
    }

    #[tokio::test]
    #[traced_test]
    async fn malformed_persisted_data_is_logged_at_load() {
        let ns = MockNamespace::new();
        ns.seed("appointments", "[{\"id\":").await;
        let store = Store::builder().namespace(Arc::new(ns)).build().await;

        assert!(store.get_appointments().await.is_empty());
        assert!(logs_contain("malformed persisted collection"));
    }

    #[tokio::test]
    #[traced_test]
    async fn failed_write_is_logged_not_returned() {
        let ns = MockNamespace::new();
        ns.fail_writes(true);
        let store = Store::builder().namespace(Arc::new(ns)).build().await;

        assert!(store.add_appointment(AppointmentDraft::new()).await.is_ok());
        assert!(logs_contain("namespace write failed"));
    }

    #[tokio::test]
    #[traced_test]
    async fn failed_broadcast_is_logged_not_returned() {
        let channel = Arc::new(MockChannel::new());
        channel.fail_posts(true);
        let store = Store::builder().channel(channel).build().await;

        assert!(store.add_notification(NotificationDraft::new()).await.is_ok());
        assert!(logs_contain("broadcast post failed"));
    }
}
