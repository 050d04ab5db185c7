use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::constants::{ENTITIES_DIR, LEVEL_DAT_FILE, REGION_EXTENSION};

/// Entity types that are never modified. These are projectiles, vehicles,
/// decorations and other non-mob entities that misbehave when frozen.
const DEFAULT_EXCLUDED_ENTITIES: &[&str] = &[
    "minecraft:area_effect_cloud",
    "minecraft:armor_stand",
    "minecraft:arrow",
    "minecraft:boat",
    "minecraft:chest_minecart",
    "minecraft:command_block_minecart",
    "minecraft:dragon_fireball",
    "minecraft:egg",
    "minecraft:end_crystal",
    "minecraft:ender_pearl",
    "minecraft:evoker_fangs",
    "minecraft:experience_bottle",
    "minecraft:experience_orb",
    "minecraft:eye_of_ender",
    "minecraft:falling_block",
    "minecraft:fireball",
    "minecraft:firework_rocket",
    "minecraft:fox",
    "minecraft:furnace_minecart",
    "minecraft:glow_item_frame",
    "minecraft:hopper_minecart",
    "minecraft:item",
    "minecraft:item_frame",
    "minecraft:leash_knot",
    "minecraft:lightning_bolt",
    "minecraft:llama_spit",
    "minecraft:marker",
    "minecraft:minecart",
    "minecraft:painting",
    "minecraft:potion",
    "minecraft:small_fireball",
    "minecraft:snowball",
    "minecraft:spawner_minecart",
    "minecraft:spectral_arrow",
    "minecraft:tnt",
    "minecraft:tnt_minecart",
    "minecraft:trident",
    "minecraft:wither_skull",
];

/// Flags forced on every entity that passes the exclusion filter.
const DEFAULT_FORCED_FIELDS: &[&str] = &["Invulnerable", "NoAI", "NoGravity", "PersistenceRequired"];

/// Value written to each forced field.
const DEFAULT_FORCED_VALUE: i32 = 1;

/// Rule set applied to every entity of a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreezeRules {
    /// Entity ids that are left untouched.
    pub excluded: BTreeSet<String>,
    /// Top-level entity keys that get overwritten.
    pub forced_fields: Vec<String>,
    /// Integer stored under each forced field.
    pub forced_value: i32,
}

impl Default for FreezeRules {
    fn default() -> Self {
        Self {
            excluded: DEFAULT_EXCLUDED_ENTITIES
                .iter()
                .map(|id| id.to_string())
                .collect(),
            forced_fields: DEFAULT_FORCED_FIELDS
                .iter()
                .map(|field| field.to_string())
                .collect(),
            forced_value: DEFAULT_FORCED_VALUE,
        }
    }
}

impl FreezeRules {
    /// Creates an empty rule set that excludes nothing and forces nothing.
    pub fn empty() -> Self {
        Self {
            excluded: BTreeSet::new(),
            forced_fields: Vec::new(),
            forced_value: DEFAULT_FORCED_VALUE,
        }
    }

    /// Adds an entity id to the exclusion set.
    pub fn with_excluded<S: Into<String>>(mut self, id: S) -> Self {
        self.excluded.insert(id.into());
        self
    }

    /// Adds a field to the list of forced fields.
    pub fn with_forced_field<S: Into<String>>(mut self, field: S) -> Self {
        let field = field.into();
        if !self.forced_fields.contains(&field) {
            self.forced_fields.push(field);
        }
        self
    }

    /// Sets the value written to the forced fields.
    pub fn with_forced_value(mut self, value: i32) -> Self {
        self.forced_value = value;
        self
    }

    /// Returns true if entities with this id must not be modified.
    pub fn is_excluded(&self, id: &str) -> bool {
        self.excluded.contains(id)
    }
}

/// Names of the files and directories that make up a world root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldLayout {
    /// Marker file that must exist in the world root.
    pub marker_file: String,
    /// Subdirectory holding the region files to process.
    pub region_dir: String,
    /// Extension (without the dot) of region files.
    pub region_extension: String,
}

impl Default for WorldLayout {
    fn default() -> Self {
        Self {
            marker_file: LEVEL_DAT_FILE.to_string(),
            region_dir: ENTITIES_DIR.to_string(),
            region_extension: REGION_EXTENSION.to_string(),
        }
    }
}

impl WorldLayout {
    /// Path of the marker file for the given world root.
    pub fn marker_path(&self, root: &Path) -> PathBuf {
        root.join(&self.marker_file)
    }

    /// Path of the region directory for the given world root.
    pub fn region_path(&self, root: &Path) -> PathBuf {
        root.join(&self.region_dir)
    }

    /// Returns true if the path carries the region file extension.
    pub fn is_region_file(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext == self.region_extension.as_str())
    }
}
