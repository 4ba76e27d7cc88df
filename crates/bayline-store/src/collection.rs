// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One mirrored collection and the merge-by-id rules that reconcile it with
//! a freshly read persisted copy.

use std::collections::{HashMap, HashSet};

use serde::de::DeserializeOwned;
use tracing::warn;

use bayline_core::Record;

/// In-memory copy of one collection.
///
/// `unsynced` holds the ids whose latest local state never reached the
/// namespace. Only those records may override or extend a persisted copy.
/// `clear_pending` is set when a clear could not be persisted; until a write
/// succeeds the persisted copy is ignored.
#[derive(Debug)]
pub(crate) struct Collection<R> {
    pub(crate) records: Vec<R>,
    pub(crate) unsynced: HashSet<String>,
    pub(crate) clear_pending: bool,
}

impl<R> Default for Collection<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            unsynced: HashSet::new(),
            clear_pending: false,
        }
    }
}

impl<R: Record> Collection<R> {
    pub(crate) fn from_records(records: Vec<R>) -> Self {
        Self {
            records,
            unsynced: HashSet::new(),
            clear_pending: false,
        }
    }

    /// Merge `persisted` with the local records that never reached storage.
    pub(crate) fn reconcile(&self, persisted: Vec<R>) -> Vec<R> {
        let persisted = if self.clear_pending {
            Vec::new()
        } else {
            persisted
        };
        if self.unsynced.is_empty() {
            return persisted;
        }

        let local: HashMap<&str, &R> = self
            .records
            .iter()
            .filter(|r| self.unsynced.contains(r.id()))
            .map(|r| (r.id(), r))
            .collect();

        let mut seen: HashSet<String> = HashSet::with_capacity(persisted.len());
        let mut merged: Vec<R> = Vec::with_capacity(persisted.len() + local.len());
        for record in persisted {
            seen.insert(record.id().to_string());
            match local.get(record.id()) {
                Some(mine) if mine.rev() > record.rev() => merged.push((*mine).clone()),
                _ => merged.push(record),
            }
        }
        for record in &self.records {
            if self.unsynced.contains(record.id()) && !seen.contains(record.id()) {
                merged.push(record.clone());
            }
        }
        merged
    }

    /// Adopt `records` as the mirror after a successful write.
    pub(crate) fn synced(&mut self, records: Vec<R>) {
        self.records = records;
        self.unsynced.clear();
        self.clear_pending = false;
    }

    /// Adopt a merged copy whose write failed. Records whose revision differs
    /// from `base`, the merged copy before the change, become unsynced.
    pub(crate) fn adopt_unwritten(&mut self, records: Vec<R>, base: &HashMap<String, u64>) {
        for record in &records {
            if base.get(record.id()) != Some(&record.rev()) {
                self.unsynced.insert(record.id().to_string());
            }
        }
        self.unsynced
            .retain(|id| records.iter().any(|r| r.id() == id.as_str()));
        self.records = records;
    }

    /// Remember every record whose revision differs from `before` as unsynced.
    pub(crate) fn mark_changed_since(&mut self, before: &HashMap<String, u64>) {
        for record in &self.records {
            if before.get(record.id()) != Some(&record.rev()) {
                self.unsynced.insert(record.id().to_string());
            }
        }
    }

    pub(crate) fn revisions(&self) -> HashMap<String, u64> {
        revisions_of(&self.records)
    }

    /// Apply a record received from another context. The incoming copy is
    /// already persisted by its origin, so it replaces a local copy only when
    /// its revision is higher. Returns whether the mirror changed.
    pub(crate) fn apply_remote(&mut self, incoming: R) -> bool {
        match self.records.iter_mut().find(|r| r.id() == incoming.id()) {
            Some(existing) if existing.rev() >= incoming.rev() => false,
            Some(existing) => {
                self.unsynced.remove(incoming.id());
                *existing = incoming;
                true
            }
            None => {
                self.records.push(incoming);
                true
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
        self.unsynced.clear();
        self.clear_pending = false;
    }
}

pub(crate) fn revisions_of<R: Record>(records: &[R]) -> HashMap<String, u64> {
    records
        .iter()
        .map(|r| (r.id().to_string(), r.rev()))
        .collect()
}

/// Insert `record`, or replace the record with the same id in place. A
/// replacement continues the existing revision line.
pub(crate) fn upsert<R: Record>(records: &mut Vec<R>, mut record: R) -> R {
    match records.iter_mut().find(|r| r.id() == record.id()) {
        Some(existing) => {
            record.set_rev(existing.rev() + 1);
            *existing = record.clone();
        }
        None => records.push(record.clone()),
    }
    record
}

/// Drop the oldest records beyond `cap`. Returns how many were dropped.
pub(crate) fn retain_newest<R>(records: &mut Vec<R>, cap: Option<usize>) -> usize {
    match cap {
        Some(cap) if records.len() > cap => {
            let excess = records.len() - cap;
            records.drain(..excess);
            excess
        }
        _ => 0,
    }
}

/// Parse a persisted collection. Malformed data is logged and skipped.
pub(crate) fn decode<R: DeserializeOwned>(key: &str, raw: &str) -> Option<Vec<R>> {
    match serde_json::from_str(raw) {
        Ok(records) => Some(records),
        Err(e) => {
            warn!(key, error = %e, "malformed persisted collection, treating as no data");
            None
        }
    }
}
