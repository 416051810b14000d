use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::photon::Parameters;
use crate::store::{EntityMap, Outcome, Tracked};
use crate::subscription::StoreEvent;

/// One loot container standing in the world.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chest {
    pub id: i64,
    pub name: String,
    pub pos_x: f32,
    pub pos_y: f32,
    pub detected_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

impl Tracked for Chest {
    fn id(&self) -> i64 {
        self.id
    }
    fn position(&self) -> (f32, f32) {
        (self.pos_x, self.pos_y)
    }
}

const SLOT_ID: u8 = 0;
const SLOT_POSITION: u8 = 1;
const SLOT_NAME: u8 = 3;
// Mist chests report their real name one slot over
const SLOT_MIST_NAME: u8 = 4;

/// Store for loot chests.
pub struct ChestStore {
    map: EntityMap<Chest>,
    dropped: AtomicU64,
}

impl ChestStore {
    pub fn new() -> Self {
        Self {
            map: EntityMap::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Applies a NewLootChest event. Id and position required; a duplicate
    /// create is ignored.
    pub fn apply_new_chest(&self, params: &Parameters) -> Outcome {
        let (Some(id), Some((pos_x, pos_y))) =
            (params.int(SLOT_ID), params.position(SLOT_POSITION))
        else {
            return self.drop_message("new chest event missing id or position");
        };
        if self.map.contains(id) {
            return Outcome::Ignored;
        }

        let mut name = params.string_or_empty(SLOT_NAME);
        if name.to_lowercase().contains("mist") {
            if let Some(mist_name) = params.string(SLOT_MIST_NAME) {
                name = mist_name.to_string();
            }
        }

        let now = Utc::now();
        self.map.insert(Chest {
            id,
            name,
            pos_x,
            pos_y,
            detected_at: now,
            last_update: now,
        });
        Outcome::Created
    }

    pub fn remove(&self, id: i64) -> bool {
        self.map.remove(id)
    }

    pub fn snapshot(&self) -> Vec<Chest> {
        self.map.snapshot()
    }

    pub fn in_range(&self, origin: (f32, f32), max_distance: f32) -> Vec<Chest> {
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

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent<Chest>> {
        self.map.subscribe()
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn drop_message(&self, reason: &'static str) -> Outcome {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        debug!(reason = reason, "dropped chest event");
        Outcome::Ignored
    }
}

impl Default for ChestStore {
    fn default() -> Self {
        Self::new()
    }
}
