use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::photon::Parameters;
use crate::store::{EntityMap, Outcome, Tracked};
use crate::subscription::StoreEvent;

/// One active fishing zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FishingSpot {
    pub id: i64,
    pub kind: String,
    pub pos_x: f32,
    pub pos_y: f32,
    pub size_spawned: i64,
    pub size_left_to_spawn: i64,
    pub detected_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

impl FishingSpot {
    pub fn total_size(&self) -> i64 {
        self.size_spawned + self.size_left_to_spawn
    }
}

impl Tracked for FishingSpot {
    fn id(&self) -> i64 {
        self.id
    }
    fn position(&self) -> (f32, f32) {
        (self.pos_x, self.pos_y)
    }
}

const SLOT_ID: u8 = 0;
const SLOT_POSITION: u8 = 1;
const SLOT_SIZE_SPAWNED: u8 = 2;
const SLOT_SIZE_LEFT: u8 = 3;
const SLOT_KIND: u8 = 4;

/// Store for fishing zones.
pub struct FishingStore {
    map: EntityMap<FishingSpot>,
    dropped: AtomicU64,
}

impl FishingStore {
    pub fn new() -> Self {
        Self {
            map: EntityMap::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Applies a NewFishingZone event. Id, position, and kind are required.
    /// A create for a zone already tracked replaces its attributes (zones
    /// respawn under the same id with fresh sizes).
    pub fn apply_new_zone(&self, params: &Parameters) -> Outcome {
        let (Some(id), Some((pos_x, pos_y)), Some(kind)) = (
            params.int(SLOT_ID),
            params.position(SLOT_POSITION),
            params.string(SLOT_KIND),
        ) else {
            return self.drop_message("new fishing zone event missing id, position, or kind");
        };
        let size_spawned = params.int_or(SLOT_SIZE_SPAWNED, 0);
        let size_left_to_spawn = params.int_or(SLOT_SIZE_LEFT, 0);

        if self.map.contains(id) {
            let kind = kind.to_string();
            self.map.update(id, |spot| {
                spot.kind = kind;
                spot.pos_x = pos_x;
                spot.pos_y = pos_y;
                spot.size_spawned = size_spawned;
                spot.size_left_to_spawn = size_left_to_spawn;
                spot.last_update = Utc::now();
            });
            return Outcome::Updated;
        }

        let now = Utc::now();
        self.map.insert(FishingSpot {
            id,
            kind: kind.to_string(),
            pos_x,
            pos_y,
            size_spawned,
            size_left_to_spawn,
            detected_at: now,
            last_update: now,
        });
        Outcome::Created
    }

    /// Applies a fishing-end event (slot 0: id).
    pub fn apply_fishing_end(&self, params: &Parameters) -> Outcome {
        let Some(id) = params.int(0) else {
            return self.drop_message("fishing end event missing id");
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

    pub fn snapshot(&self) -> Vec<FishingSpot> {
        self.map.snapshot()
    }

    pub fn in_range(&self, origin: (f32, f32), max_distance: f32) -> Vec<FishingSpot> {
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

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent<FishingSpot>> {
        self.map.subscribe()
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn drop_message(&self, reason: &'static str) -> Outcome {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        debug!(reason = reason, "dropped fishing event");
        Outcome::Ignored
    }
}

impl Default for FishingStore {
    fn default() -> Self {
        Self::new()
    }
}
