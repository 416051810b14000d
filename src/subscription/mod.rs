// Consumer-facing notification fan-out. Every store broadcasts its own
// add/update/remove stream; the world adds a shared tick stream driven by
// the eviction task. Lagging consumers drop notices instead of stalling
// ingestion.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Notification emitted by a store when its state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent<T> {
    Created(T),
    Updated(T),
    Removed { id: i64 },
}

impl<T> StoreEvent<T> {
    /// The id of the record this notice refers to.
    pub fn id(&self) -> i64
    where
        T: crate::store::Tracked,
    {
        match self {
            StoreEvent::Created(record) | StoreEvent::Updated(record) => record.id(),
            StoreEvent::Removed { id } => *id,
        }
    }
}

/// Periodic heartbeat sent after each eviction sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tick {
    pub at: DateTime<Utc>,
    /// Records removed by the sweep that produced this tick
    pub evicted: usize,
}
