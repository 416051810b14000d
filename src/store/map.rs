use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::store::{distance, Tracked};
use crate::subscription::StoreEvent;

/// Shared store core: a concurrent id-keyed map with insertion-ordered
/// snapshots and change broadcasting.
///
/// The ingestion pipeline is the only writer. Readers never hold a lock
/// across iteration: every query collects a point-in-time copy first.
pub(crate) struct EntityMap<T> {
    entries: DashMap<i64, Entry<T>>,
    next_seq: AtomicU64,
    events_tx: broadcast::Sender<StoreEvent<T>>,
}

struct Entry<T> {
    seq: u64,
    record: T,
}

impl<T: Tracked> EntityMap<T> {
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(1024);
        Self {
            entries: DashMap::new(),
            next_seq: AtomicU64::new(0),
            events_tx,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: i64) -> Option<T> {
        self.entries.get(&id).map(|entry| entry.record.clone())
    }

    /// Inserts a freshly detected record and broadcasts `Created`.
    pub fn insert(&self, record: T) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let notice = record.clone();
        self.entries.insert(record.id(), Entry { seq, record });
        let _ = self.events_tx.send(StoreEvent::Created(notice));
    }

    /// Mutates a record in place and broadcasts `Updated`. Returns `false`
    /// when the id is not tracked.
    pub fn update<F: FnOnce(&mut T)>(&self, id: i64, mutate: F) -> bool {
        let snapshot = match self.entries.get_mut(&id) {
            Some(mut entry) => {
                mutate(&mut entry.record);
                entry.record.clone()
            }
            None => return false,
        };
        let _ = self.events_tx.send(StoreEvent::Updated(snapshot));
        true
    }

    /// Removes a record and broadcasts `Removed`. Returns `false` when the
    /// id was not tracked.
    pub fn remove(&self, id: i64) -> bool {
        if self.entries.remove(&id).is_some() {
            let _ = self.events_tx.send(StoreEvent::Removed { id });
            true
        } else {
            false
        }
    }

    /// Point-in-time copy of all records, ordered by insertion.
    pub fn snapshot(&self) -> Vec<T> {
        let mut entries: Vec<(u64, T)> = self
            .entries
            .iter()
            .map(|entry| (entry.seq, entry.record.clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, record)| record).collect()
    }

    /// Records within `max_distance` of `origin`, ordered by insertion.
    pub fn in_range(&self, origin: (f32, f32), max_distance: f32) -> Vec<T> {
        let mut entries: Vec<(u64, T)> = self
            .entries
            .iter()
            .filter(|entry| distance(origin, entry.record.position()) <= max_distance)
            .map(|entry| (entry.seq, entry.record.clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, record)| record).collect()
    }

    /// Removes every record farther than `max_distance` from `origin`,
    /// broadcasting `Removed` for each. Returns the eviction count.
    pub fn evict_beyond(&self, origin: (f32, f32), max_distance: f32) -> usize {
        let stale: Vec<i64> = self
            .entries
            .iter()
            .filter(|entry| distance(origin, entry.record.position()) > max_distance)
            .map(|entry| *entry.key())
            .collect();
        let mut evicted = 0;
        for id in stale {
            if self.remove(id) {
                evicted += 1;
            }
        }
        evicted
    }

    /// Drops everything without notifications (session teardown).
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent<T>> {
        self.events_tx.subscribe()
    }
}
