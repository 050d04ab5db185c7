//! Anvil region container module.
//!
//! A region file stores up to 1024 compressed records ("chunks") for a 32×32
//! block of chunk coordinates. This module provides:
//! - The two fixed header tables (locations and timestamps)
//! - A first-fit extent allocator over 4096-byte pages
//! - Length-prefixed compression framing of record payloads
//! - Record-level read and in-place rewrite of a region file
//!
//! # File Layout
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │  LOCATION TABLE  (page 0)                              │
//! │  1024 × u32 BE: (page_offset << 8) | page_count        │
//! ├────────────────────────────────────────────────────────┤
//! │  TIMESTAMP TABLE (page 1)                              │
//! │  1024 × u32 BE: last write, seconds since epoch        │
//! ├────────────────────────────────────────────────────────┤
//! │  PAGES 2..                                             │
//! │  [len:4B BE][method:1B][compressed payload][zero pad]  │
//! │  ...                                                   │
//! └────────────────────────────────────────────────────────┘
//! ```

pub mod allocator;
pub mod backing;
pub mod compression;
pub mod error;
pub mod header;
pub mod region_file;


pub use allocator::Extent;
pub use backing::{MemoryBacking, RegionBacking};
pub use compression::CompressionScheme;
pub use error::{CorruptReason, DecodeError, RegionError, RegionResult};
pub use header::{
    HEADER_PAGES, HEADER_SIZE, LocationEntry, PAGE_SIZE, REGION_WIDTH, RegionHeader, SLOT_COUNT,
    SlotPos,
};
pub use region_file::RegionFile;
