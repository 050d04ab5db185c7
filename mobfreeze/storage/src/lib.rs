pub mod region;

pub use region::{
    DecodeError, Extent, LocationEntry, MemoryBacking, RegionBacking, RegionError, RegionFile,
    RegionHeader, RegionResult, SlotPos,
};
