//! Error types for the region module.

use std::io;

use mobfreeze_nbt::NbtError;
use thiserror::Error;

use super::header::SlotPos;

/// Errors raised while unframing or decompressing a stored record.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The record is shorter than the 5-byte frame header.
    #[error("Frame is shorter than its 5-byte header ({0} bytes)")]
    ShortFrame(usize),

    /// The length field is zero, leaving no room for the method tag.
    #[error("Frame declares a length of zero")]
    ZeroLength,

    /// The length field points past the end of the stored pages.
    #[error("Frame declares {declared} bytes but only {available} are stored")]
    LengthOutOfBounds { declared: u32, available: usize },

    /// The compression method tag is not one this codec understands.
    #[error("Unknown compression method: {0}")]
    UnknownMethod(u8),

    /// The payload lives in a separate `.mcc` file, which is not supported.
    #[error("Record is stored externally (method {0:#04x})")]
    External(u8),

    /// The compressed stream is malformed.
    #[error("Decompression failed: {0}")]
    Decompress(#[source] io::Error),
}

/// Why a non-empty slot could not be read.
#[derive(Error, Debug)]
pub enum CorruptReason {
    /// The location entry points into the header tables.
    #[error("location points into the header tables (page {0})")]
    InHeader(u32),

    /// The location entry has an offset but no pages.
    #[error("location has a page count of zero")]
    ZeroPages,

    /// The record starts at or beyond the end of the file.
    #[error("record starts at byte {start} but the file is {file_len} bytes long")]
    PastEof { start: u64, file_len: u64 },

    /// The frame or the compressed stream is malformed.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The decompressed payload is not a valid NBT document.
    #[error("payload is not valid NBT: {0}")]
    Nbt(#[from] NbtError),
}

/// Errors that can occur when working with region files.
#[derive(Error, Debug)]
pub enum RegionError {
    /// The slot has no record.
    #[error("Slot {0} is empty")]
    SlotEmpty(SlotPos),

    /// The slot has a record that cannot be decoded.
    #[error("Slot {slot} is corrupt: {reason}")]
    SlotCorrupt { slot: SlotPos, reason: CorruptReason },

    /// Slot coordinates outside the 32×32 grid.
    #[error("Invalid slot coordinates ({x}, {z}): both must be below 32")]
    InvalidSlot { x: u32, z: u32 },

    /// No placement can be encoded in the 24-bit page offset.
    #[error("Cannot place {needed} pages: offset {offset} exceeds the 24-bit page offset limit")]
    AllocationFailure { needed: u32, offset: u32 },

    /// The compressed record needs more pages than the 8-bit page count allows.
    #[error("Record needs {pages} pages but a slot holds at most 255")]
    RecordTooLarge { pages: u64 },

    /// The file is non-empty but too short to hold both header tables.
    #[error("File is truncated: expected at least {expected} bytes, got {actual}")]
    TruncatedHeader { expected: u64, actual: u64 },

    /// The payload could not be serialized.
    #[error("Encoding error: {0}")]
    Encode(#[from] NbtError),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl RegionError {
    pub(crate) fn corrupt(slot: SlotPos, reason: impl Into<CorruptReason>) -> Self {
        RegionError::SlotCorrupt {
            slot,
            reason: reason.into(),
        }
    }

    /// Returns true for errors that only affect one slot and leave the rest
    /// of the file usable.
    pub fn is_slot_local(&self) -> bool {
        matches!(
            self,
            RegionError::SlotEmpty(_) | RegionError::SlotCorrupt { .. }
        )
    }
}

/// Result type for region file operations.
pub type RegionResult<T> = Result<T, RegionError>;
