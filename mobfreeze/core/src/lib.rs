//! Freezes the mobs of a Minecraft world.
//!
//! Every entity chunk in the world's `entities/*.mca` region files is
//! decoded, has a fixed set of flags forced on each entity that is not
//! excluded, and is written back in place.

pub mod error;
pub mod freeze;
pub mod pipeline;
pub mod world;

pub use error::{FreezeError, FreezeResult, WorldError};
pub use freeze::{EntityCounts, freeze_chunk, freeze_entities};
pub use pipeline::{Freezer, RegionReport, WorldReport};
pub use world::World;
