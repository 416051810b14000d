use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::photon::Parameters;
use crate::store::{EntityMap, Outcome, Tracked};
use crate::subscription::StoreEvent;

/// Resource family, derived from the numeric type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResourceKind {
    Wood,
    Rock,
    Fiber,
    Hide,
    Ore,
    Unknown,
}

impl ResourceKind {
    /// The type-code ranges are contiguous and fixed by the game data.
    pub fn from_type_code(code: i64) -> Self {
        match code {
            0..=5 => ResourceKind::Wood,
            6..=10 => ResourceKind::Rock,
            11..=15 => ResourceKind::Fiber,
            16..=22 => ResourceKind::Hide,
            23..=27 => ResourceKind::Ore,
            _ => ResourceKind::Unknown,
        }
    }
}

/// One harvestable resource node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Harvestable {
    pub id: i64,
    pub type_code: i64,
    pub kind: ResourceKind,
    pub tier: u8,
    pub pos_x: f32,
    pub pos_y: f32,
    /// Enchantment charges on the node
    pub charges: i64,
    /// Remaining harvestable amount
    pub size: i64,
    pub detected_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

impl Tracked for Harvestable {
    fn id(&self) -> i64 {
        self.id
    }
    fn position(&self) -> (f32, f32) {
        (self.pos_x, self.pos_y)
    }
}

// Single-object event slots.
const SLOT_ID: u8 = 0;
const SLOT_TYPE: u8 = 5;
const SLOT_TIER: u8 = 7;
const SLOT_POSITION: u8 = 8;
const SLOT_SIZE: u8 = 10;
const SLOT_CHARGES: u8 = 11;

// Batched-list event slots (parallel arrays; positions are interleaved
// x/y pairs).
const LIST_SLOT_IDS: u8 = 0;
const LIST_SLOT_TYPES: u8 = 1;
const LIST_SLOT_TIERS: u8 = 2;
const LIST_SLOT_POSITIONS: u8 = 3;
const LIST_SLOT_COUNTS: u8 = 4;

/// Store for harvestable resource nodes.
pub struct HarvestableStore {
    map: EntityMap<Harvestable>,
    dropped: AtomicU64,
}

impl HarvestableStore {
    pub fn new() -> Self {
        Self {
            map: EntityMap::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Applies a single new-harvestable event. Type, tier, and position are
    /// required; charges and size default to 0. A create for a node already
    /// tracked refreshes its charges and size instead.
    pub fn apply_new_object(&self, params: &Parameters) -> Outcome {
        let (Some(id), Some(type_code), Some(tier), Some((pos_x, pos_y))) = (
            params.int(SLOT_ID),
            params.int(SLOT_TYPE),
            params.int(SLOT_TIER),
            params.position(SLOT_POSITION),
        ) else {
            return self.drop_message("harvestable event missing id, type, tier, or position");
        };
        let charges = params.int_or(SLOT_CHARGES, 0);
        let size = params.int_or(SLOT_SIZE, 0);
        self.upsert(id, type_code, tier, pos_x, pos_y, charges, size)
    }

    /// Applies a batched simple-harvestable list. Entries with ids but
    /// missing companions take per-field defaults; the batch never fails as
    /// a whole.
    pub fn apply_new_list(&self, params: &Parameters) -> Outcome {
        let Some(ids) = params.int_list(LIST_SLOT_IDS) else {
            return self.drop_message("harvestable list event missing id array");
        };
        let types = params.int_list(LIST_SLOT_TYPES).unwrap_or_default();
        let tiers = params.int_list(LIST_SLOT_TIERS).unwrap_or_default();
        let positions = params.float_list(LIST_SLOT_POSITIONS).unwrap_or_default();
        let counts = params.int_list(LIST_SLOT_COUNTS).unwrap_or_default();

        let mut created = false;
        for (index, id) in ids.iter().enumerate() {
            let type_code = types.get(index).copied().unwrap_or(0);
            let tier = tiers.get(index).copied().unwrap_or(1);
            let pos_x = positions.get(index * 2).copied().unwrap_or(0.0);
            let pos_y = positions.get(index * 2 + 1).copied().unwrap_or(0.0);
            let size = counts.get(index).copied().unwrap_or(0);
            if self.upsert(*id, type_code, tier, pos_x, pos_y, 0, size) == Outcome::Created {
                created = true;
            }
        }
        if created {
            Outcome::Created
        } else {
            Outcome::Updated
        }
    }

    /// Applies a size change after someone harvested (slots: 0 id, 1 size).
    pub fn apply_change_state(&self, params: &Parameters) -> Outcome {
        let (Some(id), Some(size)) = (params.int(0), params.int(1)) else {
            return self.drop_message("harvestable state event missing id or size");
        };
        if self.map.update(id, |node| {
            node.size = size;
            node.last_update = Utc::now();
        }) {
            Outcome::Updated
        } else {
            Outcome::Ignored
        }
    }

    /// Applies a finished harvest (slots: 0 id, 1 gathered count); size
    /// never goes below zero.
    pub fn apply_harvest_finished(&self, params: &Parameters) -> Outcome {
        let (Some(id), Some(count)) = (params.int(0), params.int(1)) else {
            return self.drop_message("harvest-finished event missing id or count");
        };
        if self.map.update(id, |node| {
            node.size = (node.size - count).max(0);
            node.last_update = Utc::now();
        }) {
            Outcome::Updated
        } else {
            Outcome::Ignored
        }
    }

    fn upsert(
        &self,
        id: i64,
        type_code: i64,
        tier: i64,
        pos_x: f32,
        pos_y: f32,
        charges: i64,
        size: i64,
    ) -> Outcome {
        if self.map.contains(id) {
            self.map.update(id, |node| {
                node.charges = charges;
                node.size = size;
                node.last_update = Utc::now();
            });
            return Outcome::Updated;
        }
        let now = Utc::now();
        self.map.insert(Harvestable {
            id,
            type_code,
            kind: ResourceKind::from_type_code(type_code),
            tier: tier.clamp(0, u8::MAX as i64) as u8,
            pos_x,
            pos_y,
            charges,
            size,
            detected_at: now,
            last_update: now,
        });
        Outcome::Created
    }

    pub fn remove(&self, id: i64) -> bool {
        self.map.remove(id)
    }

    pub fn snapshot(&self) -> Vec<Harvestable> {
        self.map.snapshot()
    }

    pub fn in_range(&self, origin: (f32, f32), max_distance: f32) -> Vec<Harvestable> {
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

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent<Harvestable>> {
        self.map.subscribe()
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn drop_message(&self, reason: &'static str) -> Outcome {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        debug!(reason = reason, "dropped harvestable event");
        Outcome::Ignored
    }
}

impl Default for HarvestableStore {
    fn default() -> Self {
        Self::new()
    }
}
