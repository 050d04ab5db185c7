//! Error types for the NBT codec.

use thiserror::Error;

use crate::tag::TagId;

/// Errors that can occur while encoding or decoding NBT.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NbtError {
    /// The input ended before a value was complete.
    #[error("Unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// A tag id outside the known range was found.
    #[error("Invalid tag id: {0}")]
    InvalidTagId(u8),

    /// The root tag is not a compound.
    #[error("Root tag must be a compound, found {0:?}")]
    RootNotCompound(TagId),

    /// A length prefix was negative.
    #[error("Negative length: {0}")]
    NegativeLength(i32),

    /// A string is not valid modified UTF-8.
    #[error("Invalid modified UTF-8 string")]
    InvalidString,

    /// A string does not fit the 16-bit length prefix.
    #[error("String is too long to encode: {0} bytes")]
    StringTooLong(usize),

    /// Compounds and lists are nested deeper than allowed.
    #[error("Nesting depth exceeds limit of {0}")]
    DepthLimit(usize),

    /// A list holds an element whose type differs from the list type.
    #[error("List element {found:?} does not match list type {expected:?}")]
    ListTypeMismatch { expected: TagId, found: TagId },

    /// A non-empty list declares `End` as its element type.
    #[error("Non-empty list of End tags ({0} elements)")]
    EndList(i32),

    /// An array or list is too long for the 32-bit length prefix.
    #[error("Length {0} does not fit in a 32-bit length prefix")]
    LengthOverflow(usize),
}

/// Result type for NBT operations.
pub type NbtResult<T> = Result<T, NbtError>;
