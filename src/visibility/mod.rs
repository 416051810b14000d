// Pure visibility predicates: entity attributes plus settings in, boolean
// out. Stores stay policy-agnostic; consumers apply these when deciding
// what to surface.

use crate::settings::{RadarSettings, ResourceFilter};
use crate::store::{
    Cage, Chest, Dungeon, DungeonCategory, FishingSpot, Harvestable, Mob, Player, PlayerFlag,
    ResourceKind,
};

pub fn player_visible(player: &Player, settings: &RadarSettings) -> bool {
    if !settings.players.enabled {
        return false;
    }
    settings.players.show_passive || player.flag() != PlayerFlag::Passive
}

pub fn harvestable_visible(node: &Harvestable, settings: &RadarSettings) -> bool {
    let Some(filter) = resource_filter(node.kind, settings) else {
        // Unknown resource families are never worth drawing
        return false;
    };
    filter.enabled && node.tier >= filter.min_tier && node.charges >= filter.min_charges
}

pub fn mob_visible(mob: &Mob, settings: &RadarSettings) -> bool {
    settings.mobs.enabled && mob.health > settings.mobs.min_health
}

pub fn chest_visible(_chest: &Chest, settings: &RadarSettings) -> bool {
    settings.chests.enabled
}

pub fn dungeon_visible(dungeon: &Dungeon, settings: &RadarSettings) -> bool {
    match dungeon.category {
        DungeonCategory::Solo => settings.dungeons.solo,
        DungeonCategory::Group => settings.dungeons.group,
        DungeonCategory::Corrupted => settings.dungeons.corrupted,
        DungeonCategory::Hellgate => settings.dungeons.hellgate,
    }
}

pub fn fishing_visible(_spot: &FishingSpot, settings: &RadarSettings) -> bool {
    settings.fishing.enabled
}

pub fn cage_visible(_cage: &Cage, settings: &RadarSettings) -> bool {
    settings.cages.enabled
}

fn resource_filter(kind: ResourceKind, settings: &RadarSettings) -> Option<&ResourceFilter> {
    match kind {
        ResourceKind::Wood => Some(&settings.resources.wood),
        ResourceKind::Rock => Some(&settings.resources.rock),
        ResourceKind::Fiber => Some(&settings.resources.fiber),
        ResourceKind::Hide => Some(&settings.resources.hide),
        ResourceKind::Ore => Some(&settings.resources.ore),
        ResourceKind::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn harvestable(kind_code: i64, tier: u8, charges: i64) -> Harvestable {
        let now = Utc::now();
        Harvestable {
            id: 1,
            type_code: kind_code,
            kind: ResourceKind::from_type_code(kind_code),
            tier,
            pos_x: 0.0,
            pos_y: 0.0,
            charges,
            size: 0,
            detected_at: now,
            last_update: now,
        }
    }

    fn mob(health: i64) -> Mob {
        let now = Utc::now();
        Mob {
            id: 1,
            type_id: 0,
            name: "Mob_0".into(),
            tier: 0,
            enchantment_level: 0,
            rarity: "common".into(),
            pos_x: 0.0,
            pos_y: 0.0,
            health,
            max_health: health.max(1),
            detected_at: now,
            last_update: now,
        }
    }

    fn dungeon(category: DungeonCategory) -> Dungeon {
        let now = Utc::now();
        Dungeon {
            id: 1,
            name: String::new(),
            category,
            enchant: 0,
            pos_x: 0.0,
            pos_y: 0.0,
            detected_at: now,
            last_update: now,
        }
    }

    #[test]
    fn tier_and_charge_thresholds_gate_resources() {
        let mut settings = RadarSettings::default();
        settings.resources.ore.min_tier = 5;
        settings.resources.ore.min_charges = 1;

        assert!(!harvestable_visible(&harvestable(23, 4, 2), &settings));
        assert!(!harvestable_visible(&harvestable(23, 6, 0), &settings));
        assert!(harvestable_visible(&harvestable(23, 6, 1), &settings));
        // Other families keep their own filter
        assert!(harvestable_visible(&harvestable(0, 2, 0), &settings));
    }

    #[test]
    fn unknown_resource_family_is_hidden() {
        let settings = RadarSettings::default();
        assert!(!harvestable_visible(&harvestable(99, 8, 4), &settings));
    }

    #[test]
    fn mob_health_threshold() {
        let mut settings = RadarSettings::default();
        settings.mobs.min_health = 100;
        assert!(!mob_visible(&mob(100), &settings));
        assert!(mob_visible(&mob(101), &settings));
        settings.mobs.enabled = false;
        assert!(!mob_visible(&mob(101), &settings));
    }

    #[test]
    fn dungeon_categories_toggle_independently() {
        let mut settings = RadarSettings::default();
        settings.dungeons.corrupted = false;
        assert!(!dungeon_visible(&dungeon(DungeonCategory::Corrupted), &settings));
        assert!(dungeon_visible(&dungeon(DungeonCategory::Solo), &settings));
        assert!(dungeon_visible(&dungeon(DungeonCategory::Hellgate), &settings));
    }

    #[test]
    fn passive_players_can_be_hidden() {
        let now = Utc::now();
        let passive = Player {
            id: 1,
            nickname: "Foo".into(),
            guild_name: String::new(),
            alliance_name: String::new(),
            pos_x: 0.0,
            pos_y: 0.0,
            old_pos_x: 0.0,
            old_pos_y: 0.0,
            current_health: 100,
            initial_health: 100,
            items: Vec::new(),
            flag_id: 0,
            mounted: false,
            detected_at: now,
            last_update: now,
        };
        let mut flagged = passive.clone();
        flagged.flag_id = 255;

        let mut settings = RadarSettings::default();
        settings.players.show_passive = false;
        assert!(!player_visible(&passive, &settings));
        assert!(player_visible(&flagged, &settings));
    }
}
