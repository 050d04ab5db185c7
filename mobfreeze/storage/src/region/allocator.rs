//! First-fit page allocator for region files.
//!
//! Placement is a pure function over a snapshot of the occupied extents.
//! The caller builds the snapshot from the location table, leaving out the
//! slot being rewritten, and the allocator returns the lowest page offset at
//! which the record fits without touching any other extent.
//!
//! First-fit favours packing records toward the front of the file over
//! minimizing fragmentation. It never moves existing records.

use super::header::HEADER_PAGES;

/// A contiguous run of pages.
///
/// Ordering is by offset first, then length, which gives the sort in
/// [`place`] a total, deterministic order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Extent {
    /// First page of the run.
    pub offset: u32,
    /// Number of pages.
    pub length: u32,
}

/// The two header pages, always occupied.
pub const HEADER_EXTENT: Extent = Extent {
    offset: 0,
    length: HEADER_PAGES,
};

impl Extent {
    pub fn new(offset: u32, length: u32) -> Self {
        Self { offset, length }
    }

    /// One past the last page of the run.
    pub fn end(self) -> u32 {
        self.offset.saturating_add(self.length)
    }

    /// Returns true if the two runs share at least one page.
    pub fn overlaps(self, other: Extent) -> bool {
        self.length > 0
            && other.length > 0
            && self.offset < other.end()
            && other.offset < self.end()
    }
}

/// Returns the page offset at which a record of `needed` pages is placed.
///
/// The scan walks the occupied extents in ascending offset order, seeded
/// with the header extent, and picks the first gap of at least `needed`
/// pages. If no gap is large enough the record goes right after the last
/// extent, growing the file.
///
/// Gaps are measured from the furthest end seen so far rather than from the
/// previous extent's end, so a snapshot that already contains overlapping
/// extents still never yields a placement inside any of them.
pub fn place(occupied: &[Extent], needed: u32) -> u32 {
    let needed = needed.max(1);

    let mut extents = Vec::with_capacity(occupied.len() + 1);
    extents.push(HEADER_EXTENT);
    extents.extend_from_slice(occupied);
    extents.sort();

    let mut free_from = 0;
    for extent in &extents {
        if extent.offset >= free_from && extent.offset - free_from >= needed {
            return free_from;
        }
        free_from = free_from.max(extent.end());
    }

    // Terminal gap: everything after the last extent is free.
    free_from
}

/// One past the highest occupied page, never less than the header pages.
///
/// This is the file length in pages that leaves no dead trailing pages.
pub fn highest_end<I>(extents: I) -> u32
where
    I: IntoIterator<Item = Extent>,
{
    extents
        .into_iter()
        .map(Extent::end)
        .fold(HEADER_PAGES, u32::max)
}
