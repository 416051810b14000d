use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::photon::Parameters;
use crate::store::{EntityMap, Outcome, Tracked};
use crate::subscription::StoreEvent;

/// Display category of a dungeon entrance, derived from its reported name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DungeonCategory {
    Solo,
    Group,
    Corrupted,
    Hellgate,
}

impl DungeonCategory {
    /// Corrupted names also contain "solo", so they are checked first.
    pub fn from_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("corrupted") {
            DungeonCategory::Corrupted
        } else if name.contains("solo") {
            DungeonCategory::Solo
        } else if name.contains("hellgate") {
            DungeonCategory::Hellgate
        } else {
            DungeonCategory::Group
        }
    }
}

/// One dungeon entrance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dungeon {
    pub id: i64,
    pub name: String,
    pub category: DungeonCategory,
    pub enchant: u8,
    pub pos_x: f32,
    pub pos_y: f32,
    pub detected_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

impl Tracked for Dungeon {
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
const SLOT_ENCHANT: u8 = 6;

/// Store for dungeon entrances.
pub struct DungeonStore {
    map: EntityMap<Dungeon>,
    dropped: AtomicU64,
}

impl DungeonStore {
    pub fn new() -> Self {
        Self {
            map: EntityMap::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Applies a NewRandomDungeonExit event. Id and position required;
    /// duplicates ignored.
    pub fn apply_new_dungeon(&self, params: &Parameters) -> Outcome {
        let (Some(id), Some((pos_x, pos_y))) =
            (params.int(SLOT_ID), params.position(SLOT_POSITION))
        else {
            return self.drop_message("new dungeon event missing id or position");
        };
        if self.map.contains(id) {
            return Outcome::Ignored;
        }

        let name = params.string_or_empty(SLOT_NAME);
        let now = Utc::now();
        self.map.insert(Dungeon {
            id,
            category: DungeonCategory::from_name(&name),
            name,
            enchant: params.int_or(SLOT_ENCHANT, 0) as u8,
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

    pub fn snapshot(&self) -> Vec<Dungeon> {
        self.map.snapshot()
    }

    pub fn in_range(&self, origin: (f32, f32), max_distance: f32) -> Vec<Dungeon> {
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

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent<Dungeon>> {
        self.map.subscribe()
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn drop_message(&self, reason: &'static str) -> Outcome {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        debug!(reason = reason, "dropped dungeon event");
        Outcome::Ignored
    }
}

impl Default for DungeonStore {
    fn default() -> Self {
        Self::new()
    }
}
