use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::photon::Parameters;
use crate::store::{EntityMap, Outcome, Tracked};
use crate::subscription::StoreEvent;

/// Territory flag a character plays under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlayerFlag {
    Passive,
    Faction(u8),
    Dangerous,
}

/// One tracked character.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub id: i64,
    pub nickname: String,
    pub guild_name: String,
    pub alliance_name: String,
    pub pos_x: f32,
    pub pos_y: f32,
    /// Position before the most recent move, for heading interpolation
    pub old_pos_x: f32,
    pub old_pos_y: f32,
    pub current_health: i64,
    pub initial_health: i64,
    /// Equipped item ids, opaque to tracking
    pub items: Vec<i64>,
    pub flag_id: u8,
    pub mounted: bool,
    pub detected_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

impl Player {
    pub fn flag(&self) -> PlayerFlag {
        match self.flag_id {
            0 => PlayerFlag::Passive,
            faction @ 1..=6 => PlayerFlag::Faction(faction),
            _ => PlayerFlag::Dangerous,
        }
    }
}

impl Tracked for Player {
    fn id(&self) -> i64 {
        self.id
    }
    fn position(&self) -> (f32, f32) {
        (self.pos_x, self.pos_y)
    }
}

// NewCharacter parameter slots.
const SLOT_ID: u8 = 0;
const SLOT_POSITION: u8 = 1;
const SLOT_NICKNAME: u8 = 2;
const SLOT_GUILD: u8 = 3;
const SLOT_ALLIANCE: u8 = 4;
const SLOT_CURRENT_HEALTH: u8 = 5;
const SLOT_INITIAL_HEALTH: u8 = 6;
const SLOT_ITEMS: u8 = 7;
const SLOT_FLAG: u8 = 8;

/// Store for characters near the local player.
pub struct PlayerStore {
    map: EntityMap<Player>,
    dropped: AtomicU64,
}

impl PlayerStore {
    pub fn new() -> Self {
        Self {
            map: EntityMap::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Applies a NewCharacter event. Id and position are required; every
    /// other slot defaults when absent. A create for a character already
    /// tracked refreshes its position in place.
    pub fn apply_new_character(&self, params: &Parameters) -> Outcome {
        let (Some(id), Some((pos_x, pos_y))) =
            (params.int(SLOT_ID), params.position(SLOT_POSITION))
        else {
            return self.drop_message("new character event missing id or position");
        };

        if self.map.contains(id) {
            self.map.update(id, |player| {
                player.old_pos_x = player.pos_x;
                player.old_pos_y = player.pos_y;
                player.pos_x = pos_x;
                player.pos_y = pos_y;
                player.last_update = Utc::now();
            });
            return Outcome::Updated;
        }

        let now = Utc::now();
        self.map.insert(Player {
            id,
            nickname: params.string_or_empty(SLOT_NICKNAME),
            guild_name: params.string_or_empty(SLOT_GUILD),
            alliance_name: params.string_or_empty(SLOT_ALLIANCE),
            pos_x,
            pos_y,
            old_pos_x: pos_x,
            old_pos_y: pos_y,
            current_health: params.int_or(SLOT_CURRENT_HEALTH, 0),
            initial_health: params.int_or(SLOT_INITIAL_HEALTH, 0),
            items: params.int_list(SLOT_ITEMS).unwrap_or_default(),
            flag_id: params.int_or(SLOT_FLAG, 0) as u8,
            mounted: false,
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
        if self.map.update(id, |player| {
            player.old_pos_x = player.pos_x;
            player.old_pos_y = player.pos_y;
            player.pos_x = pos_x;
            player.pos_y = pos_y;
            player.last_update = Utc::now();
        }) {
            Outcome::Updated
        } else {
            Outcome::Ignored
        }
    }

    /// Applies a health update (slots: 0 id, 1 current, 2 initial).
    pub fn apply_health_update(&self, params: &Parameters) -> Outcome {
        let Some(id) = params.int(0) else {
            return self.drop_message("health event missing id");
        };
        let current = params.int_or(1, 0);
        let initial = params.int(2);
        if self.map.update(id, |player| {
            player.current_health = current;
            if let Some(initial) = initial {
                player.initial_health = initial;
            }
            player.last_update = Utc::now();
        }) {
            Outcome::Updated
        } else {
            Outcome::Ignored
        }
    }

    /// Applies a mount state change (slots: 0 id, 1 mounted).
    pub fn apply_mounted(&self, params: &Parameters) -> Outcome {
        let (Some(id), Some(mounted)) = (params.int(0), params.bool(1)) else {
            return self.drop_message("mount event missing id or state");
        };
        if self.map.update(id, |player| {
            player.mounted = mounted;
            player.last_update = Utc::now();
        }) {
            Outcome::Updated
        } else {
            Outcome::Ignored
        }
    }

    pub fn remove(&self, id: i64) -> bool {
        self.map.remove(id)
    }

    pub fn snapshot(&self) -> Vec<Player> {
        self.map.snapshot()
    }

    pub fn in_range(&self, origin: (f32, f32), max_distance: f32) -> Vec<Player> {
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

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent<Player>> {
        self.map.subscribe()
    }

    /// Messages dropped for missing required fields.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn drop_message(&self, reason: &'static str) -> Outcome {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        debug!(reason = reason, "dropped character event");
        Outcome::Ignored
    }
}

impl Default for PlayerStore {
    fn default() -> Self {
        Self::new()
    }
}
