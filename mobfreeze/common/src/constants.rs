/// Marker file that identifies a directory as a world root.
pub const LEVEL_DAT_FILE: &str = "level.dat";

/// Subdirectory of a world root holding the entity region files.
pub const ENTITIES_DIR: &str = "entities";

/// File extension of region container files.
pub const REGION_EXTENSION: &str = "mca";

/// Key of the entity list inside an entity chunk's root compound.
pub const ENTITIES_KEY: &str = "Entities";

/// Key holding an entity's namespaced type identifier.
pub const ENTITY_ID_KEY: &str = "id";
