// Read-only lookup table from mob type id to display data. Owned outside
// the stores; the mob store only ever reads it.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

/// Display data for one mob type.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MobEntry {
    pub name: String,
    #[serde(default)]
    pub tier: u8,
}

/// Mob type-id lookup table, loaded from a JSON object keyed by type id.
#[derive(Debug, Default)]
pub struct MobsInfo {
    mobs: HashMap<i64, MobEntry>,
}

impl MobsInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the table from a JSON file of `{ "<type id>": { name, tier } }`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read mobs info file {}", path.display()))?;
        let raw: HashMap<String, MobEntry> =
            serde_json::from_str(&contents).context("failed to parse mobs info file")?;

        let mut mobs = HashMap::with_capacity(raw.len());
        for (key, entry) in raw {
            let type_id: i64 = key
                .parse()
                .with_context(|| format!("non-numeric mob type id '{}'", key))?;
            mobs.insert(type_id, entry);
        }
        info!(entries = mobs.len(), "loaded mobs info table");
        Ok(Self { mobs })
    }

    pub fn insert(&mut self, type_id: i64, entry: MobEntry) {
        self.mobs.insert(type_id, entry);
    }

    pub fn get(&self, type_id: i64) -> Option<&MobEntry> {
        self.mobs.get(&type_id)
    }

    /// Display name for a type id; unknown types get a synthesized name so
    /// the record is still usable.
    pub fn name_for(&self, type_id: i64) -> String {
        match self.mobs.get(&type_id) {
            Some(entry) => entry.name.clone(),
            None => format!("Mob_{}", type_id),
        }
    }

    pub fn tier_for(&self, type_id: i64) -> Option<u8> {
        self.mobs.get(&type_id).map(|entry| entry.tier)
    }

    pub fn len(&self) -> usize {
        self.mobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mobs.is_empty()
    }
}
