//! Rewrites every chunk of a region file with the freeze rules applied.
//!
//! Slots are visited in row-major order. A slot that is empty or cannot be
//! decoded is skipped without being written; every other chunk is written
//! back after the transform, whether or not it changed.

use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use mobfreeze_common::FreezeRules;
use mobfreeze_storage::{RegionBacking, RegionError, RegionFile, RegionResult, SlotPos};

use crate::error::{FreezeError, FreezeResult};
use crate::freeze::freeze_chunk;
use crate::world::World;

/// Counters for one region file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegionReport {
    /// Chunks decoded, transformed and written back.
    pub chunks_updated: usize,
    /// Entities that had the forced fields written.
    pub entities_updated: usize,
    /// Entities left alone because their id is excluded.
    pub entities_excluded: usize,
    /// Slots with no record.
    pub skipped_empty: usize,
    /// Slots whose record could not be decoded, or had no entity list.
    pub skipped_corrupt: usize,
}

impl AddAssign for RegionReport {
    fn add_assign(&mut self, other: Self) {
        self.chunks_updated += other.chunks_updated;
        self.entities_updated += other.entities_updated;
        self.entities_excluded += other.entities_excluded;
        self.skipped_empty += other.skipped_empty;
        self.skipped_corrupt += other.skipped_corrupt;
    }
}

/// Counters for a whole world.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WorldReport {
    /// Region files that were rewritten.
    pub regions_processed: usize,
    /// Region files left untouched because their header is truncated.
    pub skipped_files: Vec<PathBuf>,
    /// Sum of the per-region counters.
    pub totals: RegionReport,
}

/// Applies a [`FreezeRules`] set to region files.
#[derive(Debug, Clone, Default)]
pub struct Freezer {
    rules: FreezeRules,
}

impl Freezer {
    pub fn new(rules: FreezeRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &FreezeRules {
        &self.rules
    }

    /// Freezes every region file of a world, in file name order.
    ///
    /// `on_file` is called with the 1-based position, the total count and the
    /// path before each file is opened. The first fatal error aborts the run;
    /// files already processed keep their changes.
    pub fn freeze_world<F>(&self, world: &World, on_file: F) -> FreezeResult<WorldReport>
    where
        F: FnMut(usize, usize, &Path),
    {
        let files = world.region_files()?;
        self.freeze_files(&files, on_file)
    }

    /// Freezes the given region files in order, reporting each one to
    /// `on_file` as [`Freezer::freeze_world`] does.
    pub fn freeze_files<F>(&self, files: &[PathBuf], mut on_file: F) -> FreezeResult<WorldReport>
    where
        F: FnMut(usize, usize, &Path),
    {
        let mut report = WorldReport::default();

        for (i, path) in files.iter().enumerate() {
            on_file(i + 1, files.len(), path.as_path());
            match self.freeze_region(path)? {
                Some(region) => {
                    report.regions_processed += 1;
                    report.totals += region;
                }
                None => report.skipped_files.push(path.clone()),
            }
        }

        Ok(report)
    }

    /// Freezes one region file on disk.
    ///
    /// Returns `None` when the file is too short to hold its header tables;
    /// such a file is reported and left untouched.
    pub fn freeze_region(&self, path: &Path) -> FreezeResult<Option<RegionReport>> {
        let region_err = |source| FreezeError::Region {
            path: path.to_path_buf(),
            source,
        };

        let mut region = match RegionFile::open(path) {
            Ok(region) => region,
            Err(RegionError::TruncatedHeader { expected, actual }) => {
                warn!(
                    "skipping {}: {actual} bytes is shorter than the {expected}-byte header",
                    path.display()
                );
                return Ok(None);
            }
            Err(source) => return Err(region_err(source)),
        };

        let report = self.freeze_slots(&mut region).map_err(region_err)?;
        region.close().map_err(region_err)?;

        info!(
            "{}: {} chunks, {} entities updated, {} excluded, {} corrupt slots skipped",
            path.display(),
            report.chunks_updated,
            report.entities_updated,
            report.entities_excluded,
            report.skipped_corrupt
        );
        Ok(Some(report))
    }

    /// Freezes every slot of an open region.
    ///
    /// Slot-local read failures are counted and skipped. Any other error
    /// stops at the failing slot; slots before it have already been
    /// rewritten.
    pub fn freeze_slots<B: RegionBacking>(
        &self,
        region: &mut RegionFile<B>,
    ) -> RegionResult<RegionReport> {
        let mut report = RegionReport::default();

        for slot in SlotPos::all() {
            let mut chunk = match region.read(slot) {
                Ok(chunk) => chunk,
                Err(RegionError::SlotEmpty(_)) => {
                    report.skipped_empty += 1;
                    continue;
                }
                Err(RegionError::SlotCorrupt { slot, reason }) => {
                    warn!("skipping corrupt chunk {slot}: {reason}");
                    report.skipped_corrupt += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let Some(counts) = freeze_chunk(&mut chunk.root, &self.rules) else {
                warn!("skipping chunk {slot}: no entity list");
                report.skipped_corrupt += 1;
                continue;
            };

            let extent = region.write(slot, &chunk)?;
            debug!(
                "chunk {slot}: {} entities updated, {} excluded, stored at page {} ({} pages)",
                counts.updated, counts.excluded, extent.offset, extent.length
            );

            report.chunks_updated += 1;
            report.entities_updated += counts.updated;
            report.entities_excluded += counts.excluded;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use mobfreeze_nbt::{Compound, List, Nbt, Tag, TagId};
    use mobfreeze_storage::MemoryBacking;

    use super::*;

    fn slot(x: u32, z: u32) -> SlotPos {
        SlotPos::new(x, z).unwrap()
    }

    fn chunk(ids: &[&str]) -> Nbt {
        let mut list = List::new(TagId::Compound);
        for id in ids {
            list.push(Tag::Compound(Compound::new().with("id", Tag::from(*id))))
                .unwrap();
        }
        Nbt::new("", Compound::new().with("Entities", Tag::List(list)))
    }

    fn region_with(chunks: &[(SlotPos, Nbt)]) -> RegionFile<MemoryBacking> {
        let mut region = RegionFile::create_in(MemoryBacking::new()).unwrap();
        for (slot, nbt) in chunks {
            region.write(*slot, nbt).unwrap();
        }
        region
    }

    #[test]
    fn test_freeze_slots_counts() {
        let mut region = region_with(&[
            (slot(0, 0), chunk(&["minecraft:zombie", "minecraft:arrow"])),
            (slot(3, 1), chunk(&["minecraft:cow", "minecraft:pig"])),
            (slot(31, 31), chunk(&[])),
        ]);

        let report = Freezer::default().freeze_slots(&mut region).unwrap();
        assert_eq!(
            report,
            RegionReport {
                chunks_updated: 3,
                entities_updated: 3,
                entities_excluded: 1,
                skipped_empty: 1021,
                skipped_corrupt: 0,
            }
        );

        let frozen = region.read(slot(3, 1)).unwrap();
        let pig = frozen.root.get("Entities").and_then(Tag::as_list).unwrap().get(1);
        let pig = pig.and_then(Tag::as_compound).unwrap();
        assert_eq!(pig.get("NoGravity"), Some(&Tag::Int(1)));
    }

    #[test]
    fn test_chunk_without_entities_is_not_written() {
        let bare = Nbt::new("", Compound::new().with("DataVersion", Tag::Int(1)));
        let mut region = region_with(&[(slot(2, 0), bare.clone())]);
        let stamp = region.timestamp(slot(2, 0));
        let location = region.location(slot(2, 0));

        let report = Freezer::default().freeze_slots(&mut region).unwrap();
        assert_eq!(report.chunks_updated, 0);
        assert_eq!(report.skipped_corrupt, 1);
        assert_eq!(region.timestamp(slot(2, 0)), stamp);
        assert_eq!(region.location(slot(2, 0)), location);
        assert_eq!(region.read(slot(2, 0)).unwrap(), bare);
    }

    #[test]
    fn test_corrupt_slot_is_skipped() {
        let mut region = region_with(&[
            (slot(0, 0), chunk(&["minecraft:zombie"])),
            (slot(1, 0), chunk(&["minecraft:zombie"])),
        ]);
        region.write_raw(slot(1, 0), b"not nbt").unwrap();

        let report = Freezer::default().freeze_slots(&mut region).unwrap();
        assert_eq!(report.chunks_updated, 1);
        assert_eq!(report.skipped_corrupt, 1);
        assert_eq!(region.read_raw(slot(1, 0)).unwrap(), b"not nbt");
    }

    #[test]
    fn test_report_add_assign() {
        let mut total = RegionReport::default();
        let one = RegionReport {
            chunks_updated: 1,
            entities_updated: 2,
            entities_excluded: 3,
            skipped_empty: 4,
            skipped_corrupt: 5,
        };
        total += one;
        total += one;
        assert_eq!(total.entities_excluded, 6);
        assert_eq!(total.skipped_corrupt, 10);
    }
}
