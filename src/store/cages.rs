use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::photon::Parameters;
use crate::store::{EntityMap, Outcome, Tracked};
use crate::subscription::StoreEvent;

/// One wisp cage trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cage {
    pub id: i64,
    pub name: String,
    pub pos_x: f32,
    pub pos_y: f32,
    pub detected_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

impl Tracked for Cage {
    fn id(&self) -> i64 {
        self.id
    }
    fn position(&self) -> (f32, f32) {
        (self.pos_x, self.pos_y)
    }
}

const SLOT_ID: u8 = 0;
const SLOT_POSITION: u8 = 1;
const SLOT_NAME: u8 = 2;

/// Store for wisp cages.
pub struct CageStore {
    map: EntityMap<Cage>,
    dropped: AtomicU64,
}

impl CageStore {
    pub fn new() -> Self {
        Self {
            map: EntityMap::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Applies a NewCage event. Id and position required; duplicates
    /// ignored.
    pub fn apply_new_cage(&self, params: &Parameters) -> Outcome {
        let (Some(id), Some((pos_x, pos_y))) =
            (params.int(SLOT_ID), params.position(SLOT_POSITION))
        else {
            return self.drop_message("new cage event missing id or position");
        };
        if self.map.contains(id) {
            return Outcome::Ignored;
        }

        let now = Utc::now();
        self.map.insert(Cage {
            id,
            name: params.string_or_empty(SLOT_NAME),
            pos_x,
            pos_y,
            detected_at: now,
            last_update: now,
        });
        Outcome::Created
    }

    /// Applies a cage-opened event (slot 0: id).
    pub fn apply_opened(&self, params: &Parameters) -> Outcome {
        let Some(id) = params.int(0) else {
            return self.drop_message("cage opened event missing id");
        };
        if self.map.remove(id) {
            Outcome::Updated
        } else {
            Outcome::Ignored
        }
    }

    pub fn remove(&self, id: i64) -> bool {
        self.map.remove(id)
    }

    pub fn snapshot(&self) -> Vec<Cage> {
        self.map.snapshot()
    }

    pub fn in_range(&self, origin: (f32, f32), max_distance: f32) -> Vec<Cage> {
        self.map.in_range(origin, max_distance)
    }

    pub fn evict_beyond(&self, origin: (f32, f32), max_distance: f32) -> usize {
        self.map.evict_beyond(origin, max_distance)
    }

    pub fn clear(&self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.len() == 0
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent<Cage>> {
        self.map.subscribe()
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn drop_message(&self, reason: &'static str) -> Outcome {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        debug!(reason = reason, "dropped cage event");
        Outcome::Ignored
    }
}

impl Default for CageStore {
    fn default() -> Self {
        Self::new()
    }
}
