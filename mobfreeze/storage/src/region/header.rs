//! Region file header tables.
//!
//! The first two pages of a region file hold two parallel tables of 1024
//! big-endian `u32` values, one entry per slot in row-major `z * 32 + x`
//! order. The header is read into memory once when a file is opened and is
//! then kept in sync with the disk entry by entry.

use std::fmt;
use std::io::{Read, Seek, SeekFrom, Write};

use super::allocator::Extent;
use super::error::{RegionError, RegionResult};

/// Size of one allocation page in bytes.
pub const PAGE_SIZE: u64 = 4096;

/// Number of slots along each axis of a region.
pub const REGION_WIDTH: u8 = 32;

/// Number of slots in a region.
pub const SLOT_COUNT: usize = REGION_WIDTH as usize * REGION_WIDTH as usize;

/// Pages permanently reserved for the two header tables.
pub const HEADER_PAGES: u32 = 2;

/// Size of both header tables in bytes.
pub const HEADER_SIZE: u64 = PAGE_SIZE * HEADER_PAGES as u64;

/// Largest page offset representable in a location entry (24 bits).
pub const MAX_PAGE_OFFSET: u32 = 0x00FF_FFFF;

/// Largest page count representable in a location entry (8 bits).
pub const MAX_PAGE_COUNT: u32 = 0xFF;

/// Coordinates of a slot within a region, both in `0..32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotPos {
    x: u8,
    z: u8,
}

impl SlotPos {
    /// Creates a slot position, validating both coordinates.
    pub fn new(x: u32, z: u32) -> RegionResult<Self> {
        if x >= REGION_WIDTH as u32 || z >= REGION_WIDTH as u32 {
            return Err(RegionError::InvalidSlot { x, z });
        }
        Ok(Self {
            x: x as u8,
            z: z as u8,
        })
    }

    /// Slot holding the given absolute chunk coordinates.
    pub fn from_chunk(chunk_x: i32, chunk_z: i32) -> Self {
        let width = REGION_WIDTH as i32;
        Self {
            x: chunk_x.rem_euclid(width) as u8,
            z: chunk_z.rem_euclid(width) as u8,
        }
    }

    /// Slot at a row-major table index.
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= SLOT_COUNT {
            return None;
        }
        let width = REGION_WIDTH as usize;
        Some(Self {
            x: (index % width) as u8,
            z: (index / width) as u8,
        })
    }

    /// Row-major table index, `z * 32 + x`.
    pub fn index(self) -> usize {
        self.z as usize * REGION_WIDTH as usize + self.x as usize
    }

    pub fn x(self) -> u32 {
        self.x as u32
    }

    pub fn z(self) -> u32 {
        self.z as u32
    }

    /// All slots in row-major order.
    pub fn all() -> impl Iterator<Item = SlotPos> {
        (0..SLOT_COUNT).filter_map(SlotPos::from_index)
    }
}

impl fmt::Display for SlotPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// A packed location table entry: `(page_offset << 8) | page_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocationEntry(u32);

impl LocationEntry {
    /// The all-zero entry marking an empty slot.
    pub const EMPTY: LocationEntry = LocationEntry(0);

    /// Packs an offset and page count.
    ///
    /// The offset is truncated to 24 bits; callers check it against
    /// [`MAX_PAGE_OFFSET`] first.
    pub fn new(page_offset: u32, page_count: u8) -> Self {
        Self(((page_offset & MAX_PAGE_OFFSET) << 8) | page_count as u32)
    }

    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn page_offset(self) -> u32 {
        self.0 >> 8
    }

    pub fn page_count(self) -> u32 {
        self.0 & MAX_PAGE_COUNT
    }

    /// Returns true if all bits are zero.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The page range described by this entry.
    pub fn extent(self) -> Extent {
        Extent::new(self.page_offset(), self.page_count())
    }
}

/// In-memory copy of the location and timestamp tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionHeader {
    locations: Vec<LocationEntry>,
    timestamps: Vec<u32>,
}

impl Default for RegionHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionHeader {
    /// Creates a header with every slot empty.
    pub fn new() -> Self {
        Self {
            locations: vec![LocationEntry::EMPTY; SLOT_COUNT],
            timestamps: vec![0; SLOT_COUNT],
        }
    }

    /// Byte position of a slot's location entry.
    pub fn location_offset(slot: SlotPos) -> u64 {
        4 * slot.index() as u64
    }

    /// Byte position of a slot's timestamp entry.
    pub fn timestamp_offset(slot: SlotPos) -> u64 {
        PAGE_SIZE + 4 * slot.index() as u64
    }

    pub fn location(&self, slot: SlotPos) -> LocationEntry {
        self.locations[slot.index()]
    }

    pub fn set_location(&mut self, slot: SlotPos, entry: LocationEntry) {
        self.locations[slot.index()] = entry;
    }

    pub fn timestamp(&self, slot: SlotPos) -> u32 {
        self.timestamps[slot.index()]
    }

    pub fn set_timestamp(&mut self, slot: SlotPos, timestamp: u32) {
        self.timestamps[slot.index()] = timestamp;
    }

    /// Extents of every allocated slot, in slot order.
    ///
    /// An entry counts as allocated when its page offset is non-zero.
    pub fn live_extents(&self) -> Vec<(SlotPos, Extent)> {
        SlotPos::all()
            .map(|slot| (slot, self.location(slot)))
            .filter(|(_, entry)| entry.page_offset() > 0)
            .map(|(slot, entry)| (slot, entry.extent()))
            .collect()
    }

    /// Extents of every allocated slot except `excluded`.
    ///
    /// The excluded slot's old extent is treated as free, which is what lets
    /// a rewritten record grow, shrink or move without leaking its old pages.
    pub fn extents_excluding(&self, excluded: SlotPos) -> Vec<Extent> {
        self.live_extents()
            .into_iter()
            .filter(|(slot, _)| *slot != excluded)
            .map(|(_, extent)| extent)
            .collect()
    }

    /// Number of slots with a non-empty location entry.
    pub fn occupied_count(&self) -> usize {
        self.locations.iter().filter(|e| !e.is_empty()).count()
    }

    /// Writes both tables to the start of the writer.
    pub fn write_to<W: Write + Seek>(&self, writer: &mut W) -> RegionResult<()> {
        writer.seek(SeekFrom::Start(0))?;

        let mut buf = Vec::with_capacity(HEADER_SIZE as usize);
        for entry in &self.locations {
            buf.extend_from_slice(&entry.raw().to_be_bytes());
        }
        for timestamp in &self.timestamps {
            buf.extend_from_slice(&timestamp.to_be_bytes());
        }
        writer.write_all(&buf)?;

        Ok(())
    }

    /// Reads both tables from the start of the reader.
    pub fn read_from<R: Read + Seek>(reader: &mut R) -> RegionResult<Self> {
        reader.seek(SeekFrom::Start(0))?;

        let mut buf = vec![0u8; HEADER_SIZE as usize];
        reader.read_exact(&mut buf)?;

        let (location_bytes, timestamp_bytes) = buf.split_at(PAGE_SIZE as usize);
        let locations = location_bytes
            .chunks_exact(4)
            .map(|c| LocationEntry::from_raw(u32::from_be_bytes([c[0], c[1], c[2], c[3]])))
            .collect();
        let timestamps = timestamp_bytes
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self {
            locations,
            timestamps,
        })
    }
}
