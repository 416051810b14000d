// Externally-owned visibility settings. The stores never read these; the
// predicates in the visibility module combine them with entity attributes
// on behalf of consumers.

use serde::Deserialize;

/// Read-only visibility configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RadarSettings {
    #[serde(default)]
    pub players: PlayerFilter,
    #[serde(default)]
    pub resources: ResourceFilters,
    #[serde(default)]
    pub mobs: MobFilter,
    #[serde(default)]
    pub chests: ChestFilter,
    #[serde(default)]
    pub dungeons: DungeonFilter,
    #[serde(default)]
    pub fishing: FishingFilter,
    #[serde(default)]
    pub cages: CageFilter,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerFilter {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Show flagless (passive) characters too
    #[serde(default = "default_true")]
    pub show_passive: bool,
}

/// One filter per resource family.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ResourceFilters {
    #[serde(default)]
    pub wood: ResourceFilter,
    #[serde(default)]
    pub rock: ResourceFilter,
    #[serde(default)]
    pub fiber: ResourceFilter,
    #[serde(default)]
    pub hide: ResourceFilter,
    #[serde(default)]
    pub ore: ResourceFilter,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceFilter {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Lowest tier worth showing
    #[serde(default = "default_min_tier")]
    pub min_tier: u8,
    /// Lowest enchantment-charge level worth showing
    #[serde(default)]
    pub min_charges: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MobFilter {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Creatures at or below this health are hidden
    #[serde(default)]
    pub min_health: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChestFilter {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DungeonFilter {
    #[serde(default = "default_true")]
    pub solo: bool,
    #[serde(default = "default_true")]
    pub group: bool,
    #[serde(default = "default_true")]
    pub corrupted: bool,
    #[serde(default = "default_true")]
    pub hellgate: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FishingFilter {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CageFilter {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

fn default_min_tier() -> u8 {
    1
}

impl Default for PlayerFilter {
    fn default() -> Self {
        Self {
            enabled: true,
            show_passive: true,
        }
    }
}

impl Default for ResourceFilter {
    fn default() -> Self {
        Self {
            enabled: true,
            min_tier: default_min_tier(),
            min_charges: 0,
        }
    }
}

impl Default for MobFilter {
    fn default() -> Self {
        Self {
            enabled: true,
            min_health: 0,
        }
    }
}

impl Default for ChestFilter {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for DungeonFilter {
    fn default() -> Self {
        Self {
            solo: true,
            group: true,
            corrupted: true,
            hellgate: true,
        }
    }
}

impl Default for FishingFilter {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for CageFilter {
    fn default() -> Self {
        Self { enabled: true }
    }
}
