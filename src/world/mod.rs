// Aggregate of the seven entity stores plus local-player state. The
// ingestion pipeline mutates through the store handlers; consumers query
// snapshots and subscribe to change streams from any task.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::info;

use crate::info::MobsInfo;
use crate::store::{
    Cage, CageStore, Chest, ChestStore, Dungeon, DungeonStore, FishingSpot, FishingStore,
    Harvestable, HarvestableStore, LocalPlayer, Mob, MobStore, Player, PlayerStore,
};
use crate::subscription::Tick;

/// The tracked kinds, for diagnostics and aggregate queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntityKind {
    Player,
    Harvestable,
    Mob,
    Chest,
    Dungeon,
    FishingSpot,
    Cage,
}

/// Point-in-time copy of every store, safe to serialize and iterate
/// without touching the live maps.
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub players: Vec<Player>,
    pub harvestables: Vec<Harvestable>,
    pub mobs: Vec<Mob>,
    pub chests: Vec<Chest>,
    pub dungeons: Vec<Dungeon>,
    pub fishing_spots: Vec<FishingSpot>,
    pub cages: Vec<Cage>,
    pub taken_at: DateTime<Utc>,
}

impl WorldSnapshot {
    pub fn total(&self) -> usize {
        self.players.len()
            + self.harvestables.len()
            + self.mobs.len()
            + self.chests.len()
            + self.dungeons.len()
            + self.fishing_spots.len()
            + self.cages.len()
    }
}

/// Authoritative in-memory world state.
pub struct World {
    players: PlayerStore,
    harvestables: HarvestableStore,
    mobs: MobStore,
    chests: ChestStore,
    dungeons: DungeonStore,
    fishing: FishingStore,
    cages: CageStore,
    local: LocalPlayer,
    tick_tx: broadcast::Sender<Tick>,
}

impl World {
    pub fn new(mobs_info: Arc<MobsInfo>) -> Self {
        let (tick_tx, _) = broadcast::channel(64);
        Self {
            players: PlayerStore::new(),
            harvestables: HarvestableStore::new(),
            mobs: MobStore::new(mobs_info),
            chests: ChestStore::new(),
            dungeons: DungeonStore::new(),
            fishing: FishingStore::new(),
            cages: CageStore::new(),
            local: LocalPlayer::new(),
            tick_tx,
        }
    }

    pub fn players(&self) -> &PlayerStore {
        &self.players
    }

    pub fn harvestables(&self) -> &HarvestableStore {
        &self.harvestables
    }

    pub fn mobs(&self) -> &MobStore {
        &self.mobs
    }

    pub fn chests(&self) -> &ChestStore {
        &self.chests
    }

    pub fn dungeons(&self) -> &DungeonStore {
        &self.dungeons
    }

    pub fn fishing(&self) -> &FishingStore {
        &self.fishing
    }

    pub fn cages(&self) -> &CageStore {
        &self.cages
    }

    /// Applies a Leave to every store; whichever holds the id drops it.
    /// Returns how many stores held it.
    pub fn remove_everywhere(&self, id: i64) -> usize {
        let removals = [
            self.players.remove(id),
            self.harvestables.remove(id),
            self.mobs.remove(id),
            self.chests.remove(id),
            self.dungeons.remove(id),
            self.fishing.remove(id),
            self.cages.remove(id),
        ];
        removals.iter().filter(|removed| **removed).count()
    }

    /// Drops all tracked state; called on disconnect or zone change.
    pub fn clear_all(&self) {
        self.players.clear();
        self.harvestables.clear();
        self.mobs.clear();
        self.chests.clear();
        self.dungeons.clear();
        self.fishing.clear();
        self.cages.clear();
        info!("cleared all entity stores");
    }

    pub fn update_local_player_position(&self, pos_x: f32, pos_y: f32) {
        self.local.update_position(pos_x, pos_y);
    }

    pub fn update_local_player_next_position(&self, pos_x: f32, pos_y: f32) {
        self.local.update_next_position(pos_x, pos_y);
    }

    pub fn local_position(&self) -> (f32, f32) {
        self.local.position()
    }

    pub fn local_next_position(&self) -> (f32, f32) {
        self.local.next_position()
    }

    /// Removes every record farther than `max_distance` from the local
    /// player and broadcasts a tick carrying the eviction count.
    pub fn evict_out_of_range(&self, max_distance: f32) -> usize {
        let origin = self.local.position();
        let evicted = self.players.evict_beyond(origin, max_distance)
            + self.harvestables.evict_beyond(origin, max_distance)
            + self.mobs.evict_beyond(origin, max_distance)
            + self.chests.evict_beyond(origin, max_distance)
            + self.dungeons.evict_beyond(origin, max_distance)
            + self.fishing.evict_beyond(origin, max_distance)
            + self.cages.evict_beyond(origin, max_distance);
        let _ = self.tick_tx.send(Tick {
            at: Utc::now(),
            evicted,
        });
        evicted
    }

    pub fn subscribe_ticks(&self) -> broadcast::Receiver<Tick> {
        self.tick_tx.subscribe()
    }

    /// Full copy of every store.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            players: self.players.snapshot(),
            harvestables: self.harvestables.snapshot(),
            mobs: self.mobs.snapshot(),
            chests: self.chests.snapshot(),
            dungeons: self.dungeons.snapshot(),
            fishing_spots: self.fishing.snapshot(),
            cages: self.cages.snapshot(),
            taken_at: Utc::now(),
        }
    }

    /// Copy of every store filtered to `max_distance` around the local
    /// player.
    pub fn snapshot_in_range(&self, max_distance: f32) -> WorldSnapshot {
        let origin = self.local.position();
        WorldSnapshot {
            players: self.players.in_range(origin, max_distance),
            harvestables: self.harvestables.in_range(origin, max_distance),
            mobs: self.mobs.in_range(origin, max_distance),
            chests: self.chests.in_range(origin, max_distance),
            dungeons: self.dungeons.in_range(origin, max_distance),
            fishing_spots: self.fishing.in_range(origin, max_distance),
            cages: self.cages.in_range(origin, max_distance),
            taken_at: Utc::now(),
        }
    }

    /// Record count for one kind.
    pub fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Player => self.players.len(),
            EntityKind::Harvestable => self.harvestables.len(),
            EntityKind::Mob => self.mobs.len(),
            EntityKind::Chest => self.chests.len(),
            EntityKind::Dungeon => self.dungeons.len(),
            EntityKind::FishingSpot => self.fishing.len(),
            EntityKind::Cage => self.cages.len(),
        }
    }

    /// Messages dropped across all stores for missing required fields.
    pub fn dropped_total(&self) -> u64 {
        self.players.dropped_count()
            + self.harvestables.dropped_count()
            + self.mobs.dropped_count()
            + self.chests.dropped_count()
            + self.dungeons.dropped_count()
            + self.fishing.dropped_count()
            + self.cages.dropped_count()
    }
}
