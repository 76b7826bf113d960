//! Advisory cache of the last observed collection.
//!
//! # Responsibilities
//! - Hold the collection as last returned by the server, in server order
//! - Apply confirmed create/update/delete results in place
//! - Hand out cheap immutable snapshots to readers
//!
//! # Design Decisions
//! - Readers never block: snapshots are `Arc`s loaded from an `ArcSwapOption`
//! - Writers are serialized by a mutex held only for the copy-and-swap
//! - An unpopulated cache (no successful `list` yet) ignores record-level updates
//! - Never holds two records with the same id

use arc_swap::ArcSwapOption;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::client::record::{Collection, Record, RecordId};

pub struct RecordCache<T> {
    enabled: bool,
    current: ArcSwapOption<Collection<T>>,
    write_lock: Mutex<()>,
}

impl<T: Clone> RecordCache<T> {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            current: ArcSwapOption::empty(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn is_populated(&self) -> bool {
        self.current.load().is_some()
    }

    /// Current collection, or `None` before the first successful list.
    pub fn snapshot(&self) -> Option<Arc<Collection<T>>> {
        self.current.load_full()
    }

    pub fn get(&self, id: &RecordId) -> Option<Record<T>> {
        self.snapshot()
            .and_then(|records| records.iter().find(|r| &r.id == id).cloned())
    }

    pub fn len(&self) -> usize {
        self.snapshot().map_or(0, |records| records.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the whole collection. Duplicate ids are collapsed with
    /// [`dedupe_by_id`]; the collapsed collection is returned whether or not
    /// the cache is enabled.
    pub fn replace_all(&self, records: Collection<T>) -> Arc<Collection<T>> {
        let deduped = Arc::new(dedupe_by_id(records));
        if self.enabled {
            let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.current.store(Some(deduped.clone()));
        }
        deduped
    }

    /// Insert or replace a record, keeping its position if already present.
    /// No-op when the cache is unpopulated.
    pub fn upsert(&self, record: Record<T>) {
        self.mutate(|records| {
            match records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => records.push(record),
            }
        });
    }

    /// Drop the record with `id`, if cached.
    pub fn remove(&self, id: &RecordId) {
        self.mutate(|records| records.retain(|r| &r.id != id));
    }

    /// Forget everything; the next snapshot is `None`.
    pub fn invalidate(&self) {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.current.store(None);
    }

    fn mutate(&self, f: impl FnOnce(&mut Collection<T>)) {
        if !self.enabled {
            return;
        }
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(current) = self.current.load_full() else {
            return;
        };
        let mut next = current.as_ref().clone();
        f(&mut next);
        self.current.store(Some(Arc::new(next)));
    }
}

/// Collapse duplicate ids onto the position of their first occurrence,
/// keeping the fields of the last occurrence.
pub fn dedupe_by_id<T>(records: Collection<T>) -> Collection<T> {
    let mut positions: HashMap<RecordId, usize> = HashMap::with_capacity(records.len());
    let mut deduped: Collection<T> = Vec::with_capacity(records.len());
    for record in records {
        match positions.get(&record.id) {
            Some(&pos) => deduped[pos] = record,
            None => {
                positions.insert(record.id.clone(), deduped.len());
                deduped.push(record);
            }
        }
    }
    deduped
}

impl<T> std::fmt::Debug for RecordCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCache")
            .field("enabled", &self.enabled)
            .field("len", &self.current.load_full().map(|r| r.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str) -> Record<String> {
        Record::new(RecordId::new(id).unwrap(), name.to_string())
    }

    #[test]
    fn test_unpopulated_ignores_record_updates() {
        let cache = RecordCache::new(true);
        cache.upsert(record("1", "a"));
        assert!(cache.snapshot().is_none());
        assert!(!cache.is_populated());
    }

    #[test]
    fn test_upsert_keeps_position() {
        let cache = RecordCache::new(true);
        cache.replace_all(vec![record("1", "a"), record("2", "b"), record("3", "c")]);
        cache.upsert(record("2", "B"));
        cache.upsert(record("4", "d"));

        let snap = cache.snapshot().unwrap();
        let names: Vec<_> = snap.iter().map(|r| r.fields.as_str()).collect();
        assert_eq!(names, vec!["a", "B", "c", "d"]);
    }

    #[test]
    fn test_replace_all_dedupes() {
        let cache = RecordCache::new(true);
        cache.replace_all(vec![record("1", "a"), record("2", "b"), record("1", "z")]);
        let snap = cache.snapshot().unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0], record("1", "z"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let cache = RecordCache::new(true);
        cache.replace_all(vec![record("1", "a")]);
        let id = RecordId::new("1").unwrap();
        cache.remove(&id);
        cache.remove(&id);
        assert!(cache.is_populated());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_snapshot_is_stable_across_writes() {
        let cache = RecordCache::new(true);
        cache.replace_all(vec![record("1", "a")]);
        let before = cache.snapshot().unwrap();
        cache.upsert(record("1", "b"));
        assert_eq!(before[0].fields, "a");
        assert_eq!(cache.get(&RecordId::new("1").unwrap()).unwrap().fields, "b");
    }

    #[test]
    fn test_disabled_cache_stays_empty() {
        let cache = RecordCache::new(false);
        let listed = cache.replace_all(vec![record("1", "a"), record("1", "b")]);
        assert_eq!(listed.as_slice(), &[record("1", "b")]);
        assert!(cache.snapshot().is_none());
    }
}
