//! NBT encoder writing into a growable buffer.

use crate::error::{NbtError, NbtResult};
use crate::mutf8;
use crate::tag::{Compound, List, Nbt, Tag, TagId};

pub struct Encoder {
    out: Vec<u8>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self { out: Vec::new() }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.out
    }

    /// Writes a named root compound.
    pub fn write_document(&mut self, nbt: &Nbt) -> NbtResult<()> {
        self.out.push(TagId::Compound as u8);
        self.write_string(&nbt.name)?;
        self.write_compound(&nbt.root)
    }

    /// Writes the payload of a tag, without its id or name.
    pub fn write_payload(&mut self, tag: &Tag) -> NbtResult<()> {
        match tag {
            Tag::Byte(v) => self.out.push(*v as u8),
            Tag::Short(v) => self.out.extend_from_slice(&v.to_be_bytes()),
            Tag::Int(v) => self.out.extend_from_slice(&v.to_be_bytes()),
            Tag::Long(v) => self.out.extend_from_slice(&v.to_be_bytes()),
            Tag::Float(v) => self.out.extend_from_slice(&v.to_be_bytes()),
            Tag::Double(v) => self.out.extend_from_slice(&v.to_be_bytes()),
            Tag::ByteArray(values) => {
                self.write_len(values.len())?;
                self.out.extend(values.iter().map(|b| *b as u8));
            }
            Tag::String(s) => self.write_string(s)?,
            Tag::List(list) => self.write_list(list)?,
            Tag::Compound(compound) => self.write_compound(compound)?,
            Tag::IntArray(values) => {
                self.write_len(values.len())?;
                for v in values {
                    self.out.extend_from_slice(&v.to_be_bytes());
                }
            }
            Tag::LongArray(values) => {
                self.write_len(values.len())?;
                for v in values {
                    self.out.extend_from_slice(&v.to_be_bytes());
                }
            }
        }
        Ok(())
    }

    fn write_compound(&mut self, compound: &Compound) -> NbtResult<()> {
        for (name, tag) in compound.iter() {
            self.out.push(tag.id() as u8);
            self.write_string(name)?;
            self.write_payload(tag)?;
        }
        self.out.push(TagId::End as u8);
        Ok(())
    }

    fn write_list(&mut self, list: &List) -> NbtResult<()> {
        let element = list.element_id();
        if element == TagId::End && !list.is_empty() {
            return Err(NbtError::EndList(list.len() as i32));
        }
        self.out.push(element as u8);
        self.write_len(list.len())?;
        for item in list.iter() {
            // Items may have been replaced through `iter_mut`.
            if item.id() != element {
                return Err(NbtError::ListTypeMismatch {
                    expected: element,
                    found: item.id(),
                });
            }
            self.write_payload(item)?;
        }
        Ok(())
    }

    fn write_string(&mut self, s: &str) -> NbtResult<()> {
        let len = mutf8::encoded_len(s);
        let len = u16::try_from(len).map_err(|_| NbtError::StringTooLong(len))?;
        self.out.extend_from_slice(&len.to_be_bytes());
        mutf8::encode(s, &mut self.out);
        Ok(())
    }

    fn write_len(&mut self, len: usize) -> NbtResult<()> {
        let len = i32::try_from(len).map_err(|_| NbtError::LengthOverflow(len))?;
        self.out.extend_from_slice(&len.to_be_bytes());
        Ok(())
    }
}
