use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::info::MobsInfo;
use crate::photon::Parameters;
use crate::store::{EntityMap, Outcome, Tracked};
use crate::subscription::StoreEvent;

/// One tracked creature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mob {
    pub id: i64,
    pub type_id: i64,
    /// Display name resolved through the mobs-info table
    pub name: String,
    pub tier: u8,
    pub enchantment_level: u8,
    pub rarity: String,
    pub pos_x: f32,
    pub pos_y: f32,
    pub health: i64,
    pub max_health: i64,
    pub detected_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

impl Mob {
    pub fn is_alive(&self) -> bool {
        self.health > 0 || self.max_health == 0
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            1.0
        } else {
            self.health as f32 / self.max_health as f32
        }
    }
}

impl Tracked for Mob {
    fn id(&self) -> i64 {
        self.id
    }
    fn position(&self) -> (f32, f32) {
        (self.pos_x, self.pos_y)
    }
}

// NewMob parameter slots.
const SLOT_ID: u8 = 0;
const SLOT_POSITION: u8 = 1;
const SLOT_TYPE: u8 = 2;
const SLOT_HEALTH: u8 = 3;
const SLOT_ENCHANT: u8 = 4;
const SLOT_RARITY: u8 = 5;

/// Store for creatures near the local player.
pub struct MobStore {
    map: EntityMap<Mob>,
    info: Arc<MobsInfo>,
    dropped: AtomicU64,
}

impl MobStore {
    pub fn new(info: Arc<MobsInfo>) -> Self {
        Self {
            map: EntityMap::new(),
            info,
            dropped: AtomicU64::new(0),
        }
    }

    /// Applies a NewMob event. Id and position are required. A create for a
    /// creature already tracked is a pure no-op; creatures are repositioned
    /// only by the move event.
    pub fn apply_new_mob(&self, params: &Parameters) -> Outcome {
        let (Some(id), Some((pos_x, pos_y))) =
            (params.int(SLOT_ID), params.position(SLOT_POSITION))
        else {
            return self.drop_message("new mob event missing id or position");
        };
        if self.map.contains(id) {
            return Outcome::Ignored;
        }

        let type_id = params.int_or(SLOT_TYPE, 0);
        let health = params.int_or(SLOT_HEALTH, 0);
        let now = Utc::now();
        self.map.insert(Mob {
            id,
            type_id,
            name: self.info.name_for(type_id),
            tier: self.info.tier_for(type_id).unwrap_or(0),
            enchantment_level: params.int_or(SLOT_ENCHANT, 0) as u8,
            rarity: params
                .string(SLOT_RARITY)
                .unwrap_or("common")
                .to_string(),
            pos_x,
            pos_y,
            health,
            max_health: health,
            detected_at: now,
            last_update: now,
        });
        Outcome::Created
    }

    /// Applies a position update (slots: 0 id, 1 position).
    pub fn apply_move(&self, params: &Parameters) -> Outcome {
        let (Some(id), Some((pos_x, pos_y))) = (params.int(0), params.position(1)) else {
            return self.drop_message("move event missing id or position");
        };
        if self.map.update(id, |mob| {
            mob.pos_x = pos_x;
            mob.pos_y = pos_y;
            mob.last_update = Utc::now();
        }) {
            Outcome::Updated
        } else {
            Outcome::Ignored
        }
    }

    /// Applies a health update (slots: 0 id, 1 health).
    pub fn apply_health_update(&self, params: &Parameters) -> Outcome {
        let (Some(id), Some(health)) = (params.int(0), params.int(1)) else {
            return self.drop_message("health event missing id or value");
        };
        if self.map.update(id, |mob| {
            mob.health = health;
            mob.last_update = Utc::now();
        }) {
            Outcome::Updated
        } else {
            Outcome::Ignored
        }
    }

    pub fn remove(&self, id: i64) -> bool {
        self.map.remove(id)
    }

    pub fn snapshot(&self) -> Vec<Mob> {
        self.map.snapshot()
    }

    pub fn in_range(&self, origin: (f32, f32), max_distance: f32) -> Vec<Mob> {
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

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent<Mob>> {
        self.map.subscribe()
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn drop_message(&self, reason: &'static str) -> Outcome {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        debug!(reason = reason, "dropped mob event");
        Outcome::Ignored
    }
}
