//! NBT decoder over an in-memory byte slice.

use crate::MAX_DEPTH;
use crate::error::{NbtError, NbtResult};
use crate::mutf8;
use crate::tag::{Compound, List, Nbt, Tag, TagId};

/// Reads NBT values from a byte slice.
///
/// Every declared length is checked against the remaining input before
/// anything is allocated, so truncated or garbage input fails with an error
/// instead of exhausting memory.
pub struct Decoder<'a> {
    input: &'a [u8],
    depth: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, depth: 0 }
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.input.len()
    }

    /// Reads a named root compound.
    pub fn read_document(&mut self) -> NbtResult<Nbt> {
        let id = TagId::try_from(self.read_u8()?)?;
        if id != TagId::Compound {
            return Err(NbtError::RootNotCompound(id));
        }
        let name = self.read_string()?;
        let root = self.read_compound()?;
        Ok(Nbt { name, root })
    }

    /// Reads the payload of a tag of the given type.
    pub fn read_payload(&mut self, id: TagId) -> NbtResult<Tag> {
        Ok(match id {
            TagId::End => return Err(NbtError::InvalidTagId(0)),
            TagId::Byte => Tag::Byte(self.read_u8()? as i8),
            TagId::Short => Tag::Short(i16::from_be_bytes(self.take_array()?)),
            TagId::Int => Tag::Int(self.read_i32()?),
            TagId::Long => Tag::Long(i64::from_be_bytes(self.take_array()?)),
            TagId::Float => Tag::Float(f32::from_be_bytes(self.take_array()?)),
            TagId::Double => Tag::Double(f64::from_be_bytes(self.take_array()?)),
            TagId::ByteArray => {
                let len = self.read_len(1)?;
                Tag::ByteArray(self.take(len)?.iter().map(|b| *b as i8).collect())
            }
            TagId::String => Tag::String(self.read_string()?),
            TagId::List => Tag::List(self.read_list()?),
            TagId::Compound => Tag::Compound(self.read_compound()?),
            TagId::IntArray => {
                let len = self.read_len(4)?;
                let bytes = self.take(len * 4)?;
                Tag::IntArray(
                    bytes
                        .chunks_exact(4)
                        .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                        .collect(),
                )
            }
            TagId::LongArray => {
                let len = self.read_len(8)?;
                let bytes = self.take(len * 8)?;
                Tag::LongArray(
                    bytes
                        .chunks_exact(8)
                        .map(|c| i64::from_be_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                        .collect(),
                )
            }
        })
    }

    fn read_compound(&mut self) -> NbtResult<Compound> {
        self.enter()?;
        let mut compound = Compound::new();
        loop {
            let id = TagId::try_from(self.read_u8()?)?;
            if id == TagId::End {
                break;
            }
            let name = self.read_string()?;
            let value = self.read_payload(id)?;
            compound.insert(name, value);
        }
        self.leave();
        Ok(compound)
    }

    fn read_list(&mut self) -> NbtResult<List> {
        self.enter()?;
        let element = TagId::try_from(self.read_u8()?)?;
        let raw_len = self.read_i32()?;
        if raw_len < 0 {
            return Err(NbtError::NegativeLength(raw_len));
        }
        if element == TagId::End && raw_len > 0 {
            return Err(NbtError::EndList(raw_len));
        }
        let len = raw_len as usize;
        self.ensure(len.saturating_mul(element.min_payload_size()))?;

        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(self.read_payload(element)?);
        }
        self.leave();
        Ok(List::from_parts(element, items))
    }

    fn read_string(&mut self) -> NbtResult<String> {
        let len = u16::from_be_bytes(self.take_array()?) as usize;
        mutf8::decode(self.take(len)?)
    }

    /// Reads an i32 length prefix for elements of `elem_size` bytes.
    fn read_len(&mut self, elem_size: usize) -> NbtResult<usize> {
        let raw = self.read_i32()?;
        if raw < 0 {
            return Err(NbtError::NegativeLength(raw));
        }
        let len = raw as usize;
        self.ensure(len.saturating_mul(elem_size))?;
        Ok(len)
    }

    fn read_u8(&mut self) -> NbtResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_i32(&mut self) -> NbtResult<i32> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    fn take_array<const N: usize>(&mut self) -> NbtResult<[u8; N]> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn take(&mut self, n: usize) -> NbtResult<&'a [u8]> {
        self.ensure(n)?;
        let (head, tail) = self.input.split_at(n);
        self.input = tail;
        Ok(head)
    }

    fn ensure(&self, n: usize) -> NbtResult<()> {
        if n > self.input.len() {
            return Err(NbtError::UnexpectedEof {
                needed: n,
                remaining: self.input.len(),
            });
        }
        Ok(())
    }

    fn enter(&mut self) -> NbtResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(NbtError::DepthLimit(MAX_DEPTH));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}
