//! Named Binary Tag (NBT) codec.
//!
//! This crate reads and writes the big-endian Java flavour of NBT used by
//! Minecraft chunk and entity storage. It works on raw, uncompressed byte
//! buffers; compression and file layout are handled by the storage crate.
//!
//! # Encoding
//!
//! ```text
//! root      := tag_id(=10) name payload(Compound)
//! compound  := (tag_id name payload)* tag_id(=0)
//! list      := element_id:u8 length:i32 payload*
//! name      := length:u16 modified-utf8 bytes
//! ```
//!
//! Compounds keep their keys in insertion order, so a decode/encode round
//! trip reproduces the input bytes for any canonically encoded tree.

pub mod decode;
pub mod encode;
pub mod error;
mod mutf8;
pub mod tag;

pub use error::{NbtError, NbtResult};
pub use tag::{Compound, List, Nbt, Tag, TagId};

/// Maximum nesting depth of compounds and lists accepted by the decoder.
pub const MAX_DEPTH: usize = 512;
