//! Record-level access to a region file.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use mobfreeze_nbt::Nbt;

use super::allocator::{self, Extent};
use super::backing::RegionBacking;
use super::compression::{self, FRAME_HEADER_SIZE};
use super::error::{CorruptReason, RegionError, RegionResult};
use super::header::{
    HEADER_PAGES, HEADER_SIZE, LocationEntry, MAX_PAGE_COUNT, MAX_PAGE_OFFSET, PAGE_SIZE,
    RegionHeader, SlotPos,
};

/// A region file opened for reading and in-place rewriting.
///
/// Both header tables are read once on open and cached. Every write then
/// updates the cached tables and the matching 4-byte entries on disk, so
/// the cache and the file never disagree between calls.
///
/// A write touches only the rewritten slot's pages, its two header entries,
/// and the file length. Records of other slots are never moved.
///
/// The container assumes exclusive access to the underlying store. It does
/// no locking, and a write interrupted between its header update and data
/// write leaves that one slot inconsistent.
pub struct RegionFile<B: RegionBacking = File> {
    /// The underlying byte store.
    backing: B,
    /// Path of the file, when backed by one.
    path: Option<PathBuf>,
    /// Cached header tables.
    header: RegionHeader,
    /// False while a zero-length file has not had its tables written yet.
    header_on_disk: bool,
}

impl RegionFile<File> {
    /// Opens an existing region file for reading and writing.
    ///
    /// A zero-length file is accepted and treated as a region with every slot
    /// empty; its header tables are written on the first write.
    pub fn open<P: AsRef<Path>>(path: P) -> RegionResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let mut region = Self::from_backing(file)?;
        region.path = Some(path);
        Ok(region)
    }

    /// Creates a new, empty region file.
    ///
    /// This will fail if the file already exists.
    pub fn create<P: AsRef<Path>>(path: P) -> RegionResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;

        let mut region = Self::create_in(file)?;
        region.path = Some(path);
        Ok(region)
    }
}

impl<B: RegionBacking> RegionFile<B> {
    /// Opens a region stored in an arbitrary backing store.
    pub fn from_backing(mut backing: B) -> RegionResult<Self> {
        let len = backing.byte_len()?;

        if len == 0 {
            return Ok(Self {
                backing,
                path: None,
                header: RegionHeader::new(),
                header_on_disk: false,
            });
        }
        if len < HEADER_SIZE {
            return Err(RegionError::TruncatedHeader {
                expected: HEADER_SIZE,
                actual: len,
            });
        }
        if len % PAGE_SIZE != 0 {
            warn!("region length {len} is not a multiple of {PAGE_SIZE} bytes");
        }

        let header = RegionHeader::read_from(&mut backing)?;
        Ok(Self {
            backing,
            path: None,
            header,
            header_on_disk: true,
        })
    }

    /// Initializes an empty region in `backing`, discarding its contents.
    pub fn create_in(mut backing: B) -> RegionResult<Self> {
        let header = RegionHeader::new();
        backing.set_byte_len(0)?;
        header.write_to(&mut backing)?;
        backing.sync()?;

        Ok(Self {
            backing,
            path: None,
            header,
            header_on_disk: true,
        })
    }

    /// Returns the path of the region file, if it is backed by one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the cached header tables.
    pub fn header(&self) -> &RegionHeader {
        &self.header
    }

    /// Returns the location entry of a slot.
    pub fn location(&self, slot: SlotPos) -> LocationEntry {
        self.header.location(slot)
    }

    /// Returns the last-write timestamp of a slot, in seconds.
    pub fn timestamp(&self, slot: SlotPos) -> u32 {
        self.header.timestamp(slot)
    }

    /// Extents of every allocated slot.
    pub fn extents(&self) -> Vec<(SlotPos, Extent)> {
        self.header.live_extents()
    }

    /// Current length of the underlying store in whole pages.
    pub fn len_pages(&self) -> RegionResult<u64> {
        Ok(self.backing.byte_len()? / PAGE_SIZE)
    }

    /// Reads and decodes the record of a slot.
    pub fn read(&mut self, slot: SlotPos) -> RegionResult<Nbt> {
        let raw = self.read_raw(slot)?;
        Nbt::from_bytes(&raw).map_err(|e| RegionError::corrupt(slot, e))
    }

    /// Reads the decompressed bytes of a slot's record.
    ///
    /// Fails with [`RegionError::SlotEmpty`] when the slot has no record and
    /// with [`RegionError::SlotCorrupt`] when the location entry or the
    /// stored frame is unusable. I/O failures are returned as
    /// [`RegionError::Io`].
    pub fn read_raw(&mut self, slot: SlotPos) -> RegionResult<Vec<u8>> {
        let entry = self.header.location(slot);
        if entry.is_empty() {
            return Err(RegionError::SlotEmpty(slot));
        }
        if entry.page_offset() < HEADER_PAGES {
            return Err(RegionError::corrupt(
                slot,
                CorruptReason::InHeader(entry.page_offset()),
            ));
        }
        if entry.page_count() == 0 {
            return Err(RegionError::corrupt(slot, CorruptReason::ZeroPages));
        }

        let start = entry.page_offset() as u64 * PAGE_SIZE;
        let file_len = self.backing.byte_len()?;
        if start + FRAME_HEADER_SIZE as u64 > file_len {
            return Err(RegionError::corrupt(
                slot,
                CorruptReason::PastEof { start, file_len },
            ));
        }

        // A last page cut short by a partial write is still read; the frame
        // length decides whether enough of it survived.
        let stored = (entry.page_count() as u64 * PAGE_SIZE).min(file_len - start);
        let mut buf = vec![0u8; stored as usize];
        self.backing.seek(SeekFrom::Start(start))?;
        self.backing.read_exact(&mut buf)?;

        compression::decode(&buf).map_err(|e| RegionError::corrupt(slot, e))
    }

    /// Encodes and writes a record to a slot, returning where it was placed.
    pub fn write(&mut self, slot: SlotPos, nbt: &Nbt) -> RegionResult<Extent> {
        let raw = nbt.to_bytes()?;
        self.write_raw(slot, &raw)
    }

    /// Compresses and writes raw record bytes to a slot.
    ///
    /// The slot's previous extent is treated as free when choosing the
    /// placement, so the record may stay where it was, move to an earlier
    /// gap, or be appended. The file is then truncated to the end of the
    /// highest remaining extent.
    pub fn write_raw(&mut self, slot: SlotPos, data: &[u8]) -> RegionResult<Extent> {
        let framed = compression::encode(data)?;
        let pages = compression::page_count(framed.len());
        if pages > MAX_PAGE_COUNT as u64 {
            return Err(RegionError::RecordTooLarge { pages });
        }
        let pages = pages as u32;

        let occupied = self.header.extents_excluding(slot);
        let offset = allocator::place(&occupied, pages);
        if offset > MAX_PAGE_OFFSET {
            return Err(RegionError::AllocationFailure {
                needed: pages,
                offset,
            });
        }
        let extent = Extent::new(offset, pages);
        debug!(
            "slot {slot}: {} bytes framed, placing {pages} pages at page {offset}",
            framed.len()
        );

        self.materialize_header()?;

        let entry = LocationEntry::new(offset, pages as u8);
        self.write_u32_at(RegionHeader::location_offset(slot), entry.raw())?;
        self.header.set_location(slot, entry);

        let now = current_timestamp();
        self.write_u32_at(RegionHeader::timestamp_offset(slot), now)?;
        self.header.set_timestamp(slot, now);

        let mut padded = framed;
        padded.resize((pages as u64 * PAGE_SIZE) as usize, 0);
        self.backing
            .seek(SeekFrom::Start(offset as u64 * PAGE_SIZE))?;
        self.backing.write_all(&padded)?;

        self.truncate_to_extents()?;

        Ok(extent)
    }

    /// Clears a slot, freeing its pages. Does nothing for an empty slot.
    pub fn remove(&mut self, slot: SlotPos) -> RegionResult<()> {
        if self.header.location(slot).is_empty() {
            return Ok(());
        }

        self.write_u32_at(RegionHeader::location_offset(slot), 0)?;
        self.header.set_location(slot, LocationEntry::EMPTY);
        self.write_u32_at(RegionHeader::timestamp_offset(slot), 0)?;
        self.header.set_timestamp(slot, 0);

        self.truncate_to_extents()
    }

    /// Flushes and syncs the region, then releases it.
    pub fn close(mut self) -> RegionResult<()> {
        self.backing.sync()?;
        Ok(())
    }

    /// Returns the backing store, without syncing.
    pub fn into_backing(self) -> B {
        self.backing
    }

    /// Cuts the file to the end of the highest live extent.
    ///
    /// This rescans the whole location table on every write. The cost is
    /// fine for 1024 slots and keeps placement decisions independent of any
    /// incremental bookkeeping.
    fn truncate_to_extents(&mut self) -> RegionResult<()> {
        let end = allocator::highest_end(
            self.header
                .live_extents()
                .into_iter()
                .map(|(_, extent)| extent),
        );
        self.backing.set_byte_len(end as u64 * PAGE_SIZE)?;
        Ok(())
    }

    /// Writes the full header tables if the file started out empty.
    fn materialize_header(&mut self) -> RegionResult<()> {
        if !self.header_on_disk {
            self.header.write_to(&mut self.backing)?;
            self.header_on_disk = true;
        }
        Ok(())
    }

    fn write_u32_at(&mut self, pos: u64, value: u32) -> RegionResult<()> {
        self.backing.seek(SeekFrom::Start(pos))?;
        self.backing.write_all(&value.to_be_bytes())?;
        Ok(())
    }
}

/// Seconds since the Unix epoch, clamped to the `u32` table range.
fn current_timestamp() -> u32 {
    chrono::Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32
}

#[cfg(test)]
mod tests {
    use mobfreeze_nbt::{Compound, List, Tag};

    use super::*;
    use crate::region::backing::MemoryBacking;

    fn slot(x: u32, z: u32) -> SlotPos {
        SlotPos::new(x, z).unwrap()
    }

    fn empty_region() -> RegionFile<MemoryBacking> {
        RegionFile::create_in(MemoryBacking::new()).unwrap()
    }

    /// Incompressible bytes that frame to exactly `pages` pages.
    fn record_of_pages(pages: u64, seed: u32) -> Vec<u8> {
        let len = (pages * PAGE_SIZE) as usize - 512;
        let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect()
    }

    fn chunk_with_entities(ids: &[&str]) -> Nbt {
        let mut entities = List::new(mobfreeze_nbt::TagId::Compound);
        for id in ids {
            entities
                .push(Tag::Compound(Compound::new().with("id", Tag::from(*id))))
                .unwrap();
        }
        Nbt::new(
            "",
            Compound::new()
                .with("DataVersion", Tag::Int(3700))
                .with("Entities", Tag::List(entities)),
        )
    }

    #[test]
    fn test_create_and_read_empty() {
        let mut region = empty_region();
        assert_eq!(region.len_pages().unwrap(), 2);
        assert!(matches!(
            region.read(slot(0, 0)),
            Err(RegionError::SlotEmpty(_))
        ));
    }

    #[test]
    fn test_write_then_read() {
        let mut region = empty_region();
        let nbt = chunk_with_entities(&["minecraft:zombie", "minecraft:cow"]);

        let extent = region.write(slot(4, 7), &nbt).unwrap();
        assert_eq!(extent, Extent::new(2, 1));
        assert_eq!(region.read(slot(4, 7)).unwrap(), nbt);
        assert_eq!(region.location(slot(4, 7)), LocationEntry::new(2, 1));
        assert!(region.timestamp(slot(4, 7)) > 0);
        assert_eq!(region.len_pages().unwrap(), 3);
    }

    #[test]
    fn test_grow_single_record_in_place() {
        let mut region = empty_region();
        region.write_raw(slot(0, 0), b"small").unwrap();
        assert_eq!(region.location(slot(0, 0)), LocationEntry::new(2, 1));

        let big = record_of_pages(3, 1);
        let extent = region.write_raw(slot(0, 0), &big).unwrap();
        assert_eq!(extent, Extent::new(2, 3));
        assert_eq!(region.into_backing().as_bytes().len(), 4096 * 5);
    }

    #[test]
    fn test_rewrite_reuses_freed_gap() {
        let mut region = empty_region();
        region.write_raw(slot(0, 0), b"first").unwrap();
        region.write_raw(slot(1, 0), b"second").unwrap();
        assert_eq!(region.location(slot(1, 0)), LocationEntry::new(3, 1));

        let extent = region.write_raw(slot(0, 0), b"first again").unwrap();
        assert_eq!(extent, Extent::new(2, 1));
        assert_eq!(region.read_raw(slot(1, 0)).unwrap(), b"second");
        assert_eq!(region.len_pages().unwrap(), 4);
    }

    #[test]
    fn test_growing_record_moves_past_neighbour_and_truncates() {
        let mut region = empty_region();
        region.write_raw(slot(0, 0), b"a").unwrap();
        region.write_raw(slot(1, 0), b"b").unwrap();

        // Too big for the one-page gap at 2, so it is appended after (1, 0).
        let big = record_of_pages(2, 2);
        let extent = region.write_raw(slot(0, 0), &big).unwrap();
        assert_eq!(extent, Extent::new(4, 2));
        assert_eq!(region.len_pages().unwrap(), 6);

        // Shrinking it again moves it back into the gap and drops the tail.
        let extent = region.write_raw(slot(0, 0), b"a").unwrap();
        assert_eq!(extent, Extent::new(2, 1));
        assert_eq!(region.len_pages().unwrap(), 4);
        assert_eq!(region.read_raw(slot(1, 0)).unwrap(), b"b");
    }

    #[test]
    fn test_remove_truncates() {
        let mut region = empty_region();
        region.write_raw(slot(0, 0), b"a").unwrap();
        region.write_raw(slot(1, 0), b"b").unwrap();

        region.remove(slot(1, 0)).unwrap();
        assert!(region.location(slot(1, 0)).is_empty());
        assert_eq!(region.timestamp(slot(1, 0)), 0);
        assert_eq!(region.len_pages().unwrap(), 3);

        region.remove(slot(0, 0)).unwrap();
        region.remove(slot(0, 0)).unwrap();
        assert_eq!(region.len_pages().unwrap(), 2);
    }

    #[test]
    fn test_record_too_large() {
        let mut region = empty_region();
        let huge = record_of_pages(256, 3);
        assert!(matches!(
            region.write_raw(slot(0, 0), &huge),
            Err(RegionError::RecordTooLarge { .. })
        ));
        assert!(region.location(slot(0, 0)).is_empty());
        assert_eq!(region.len_pages().unwrap(), 2);
    }

    #[test]
    fn test_zero_length_file_is_empty_region() {
        let mut region = RegionFile::from_backing(MemoryBacking::new()).unwrap();
        assert!(matches!(
            region.read_raw(slot(3, 3)),
            Err(RegionError::SlotEmpty(_))
        ));

        region.write_raw(slot(3, 3), b"payload").unwrap();
        let bytes = region.into_backing().into_bytes();
        assert_eq!(bytes.len(), 4096 * 3);

        let mut reopened = RegionFile::from_backing(MemoryBacking::from_bytes(bytes)).unwrap();
        assert_eq!(reopened.read_raw(slot(3, 3)).unwrap(), b"payload");
    }

    #[test]
    fn test_truncated_header_is_rejected() {
        let result = RegionFile::from_backing(MemoryBacking::from_bytes(vec![0u8; 5000]));
        assert!(matches!(
            result,
            Err(RegionError::TruncatedHeader {
                expected: 8192,
                actual: 5000
            })
        ));
    }

    #[test]
    fn test_corrupt_locations() {
        let mut header = RegionHeader::new();
        header.set_location(slot(0, 0), LocationEntry::new(1, 1));
        header.set_location(slot(1, 0), LocationEntry::new(2, 0));
        header.set_location(slot(2, 0), LocationEntry::new(40, 1));
        let mut backing = MemoryBacking::new();
        header.write_to(&mut backing).unwrap();

        let mut region = RegionFile::from_backing(backing).unwrap();
        for (x, expected) in [(0, "header"), (1, "zero"), (2, "past")] {
            let err = region.read_raw(slot(x, 0)).unwrap_err();
            match (err, expected) {
                (
                    RegionError::SlotCorrupt {
                        reason: CorruptReason::InHeader(1),
                        ..
                    },
                    "header",
                ) => {}
                (
                    RegionError::SlotCorrupt {
                        reason: CorruptReason::ZeroPages,
                        ..
                    },
                    "zero",
                ) => {}
                (
                    RegionError::SlotCorrupt {
                        reason: CorruptReason::PastEof { .. },
                        ..
                    },
                    "past",
                ) => {}
                (other, _) => panic!("unexpected result for slot ({x}, 0): {other}"),
            }
        }
    }

    #[test]
    fn test_garbage_record_is_corrupt() {
        let mut region = empty_region();
        region.write_raw(slot(0, 0), b"fine").unwrap();
        let mut bytes = region.into_backing().into_bytes();
        for b in &mut bytes[8192 + 4..8192 + 64] {
            *b = 0xFF;
        }

        let mut region = RegionFile::from_backing(MemoryBacking::from_bytes(bytes)).unwrap();
        let err = region.read(slot(0, 0)).unwrap_err();
        assert!(err.is_slot_local());
        assert!(matches!(
            err,
            RegionError::SlotCorrupt {
                reason: CorruptReason::Decode(_),
                ..
            }
        ));
    }
}
