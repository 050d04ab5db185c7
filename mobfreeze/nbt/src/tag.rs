//! In-memory representation of an NBT tree.

use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::error::{NbtError, NbtResult};

/// Type identifier of a tag, as stored on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagId {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TryFrom<u8> for TagId {
    type Error = NbtError;

    fn try_from(value: u8) -> NbtResult<Self> {
        Ok(match value {
            0 => TagId::End,
            1 => TagId::Byte,
            2 => TagId::Short,
            3 => TagId::Int,
            4 => TagId::Long,
            5 => TagId::Float,
            6 => TagId::Double,
            7 => TagId::ByteArray,
            8 => TagId::String,
            9 => TagId::List,
            10 => TagId::Compound,
            11 => TagId::IntArray,
            12 => TagId::LongArray,
            other => return Err(NbtError::InvalidTagId(other)),
        })
    }
}

impl TagId {
    /// Smallest number of bytes a payload of this type occupies.
    ///
    /// Used to reject declared lengths that cannot possibly fit in the
    /// remaining input before allocating for them.
    pub(crate) fn min_payload_size(self) -> usize {
        match self {
            TagId::End => 0,
            TagId::Byte | TagId::Compound => 1,
            TagId::Short | TagId::String => 2,
            TagId::Int | TagId::Float | TagId::ByteArray | TagId::IntArray | TagId::LongArray => 4,
            TagId::Long | TagId::Double => 8,
            TagId::List => 5,
        }
    }
}

/// A single NBT value.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(List),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    /// Returns the wire type of this tag.
    pub fn id(&self) -> TagId {
        match self {
            Tag::Byte(_) => TagId::Byte,
            Tag::Short(_) => TagId::Short,
            Tag::Int(_) => TagId::Int,
            Tag::Long(_) => TagId::Long,
            Tag::Float(_) => TagId::Float,
            Tag::Double(_) => TagId::Double,
            Tag::ByteArray(_) => TagId::ByteArray,
            Tag::String(_) => TagId::String,
            Tag::List(_) => TagId::List,
            Tag::Compound(_) => TagId::Compound,
            Tag::IntArray(_) => TagId::IntArray,
            Tag::LongArray(_) => TagId::LongArray,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Tag::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_compound_mut(&mut self) -> Option<&mut Compound> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Tag::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut List> {
        match self {
            Tag::List(l) => Some(l),
            _ => None,
        }
    }
}

impl From<Compound> for Tag {
    fn from(value: Compound) -> Self {
        Tag::Compound(value)
    }
}

impl From<List> for Tag {
    fn from(value: List) -> Self {
        Tag::List(value)
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Tag::String(value.to_string())
    }
}

/// A homogeneous list of tags.
///
/// The element type is kept even when the list is empty, so an empty list
/// of compounds re-encodes exactly as it was read.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    element: TagId,
    items: Vec<Tag>,
}

impl Default for List {
    fn default() -> Self {
        Self::new(TagId::End)
    }
}

impl List {
    /// Creates an empty list with the given element type.
    pub fn new(element: TagId) -> Self {
        Self {
            element,
            items: Vec::new(),
        }
    }

    /// Builds a list from tags, which must all share one type.
    pub fn from_tags(items: Vec<Tag>) -> NbtResult<Self> {
        let element = items.first().map(Tag::id).unwrap_or(TagId::End);
        if let Some(bad) = items.iter().find(|tag| tag.id() != element) {
            return Err(NbtError::ListTypeMismatch {
                expected: element,
                found: bad.id(),
            });
        }
        Ok(Self { element, items })
    }

    pub(crate) fn from_parts(element: TagId, items: Vec<Tag>) -> Self {
        Self { element, items }
    }

    /// Appends a tag. An empty list of `End` adopts the tag's type.
    pub fn push(&mut self, tag: Tag) -> NbtResult<()> {
        if self.items.is_empty() && self.element == TagId::End {
            self.element = tag.id();
        }
        if tag.id() != self.element {
            return Err(NbtError::ListTypeMismatch {
                expected: self.element,
                found: tag.id(),
            });
        }
        self.items.push(tag);
        Ok(())
    }

    pub fn element_id(&self) -> TagId {
        self.element
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tag> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Tag> {
        self.items.iter_mut()
    }
}

/// An ordered map from string keys to tags.
///
/// Keys keep the order in which they were first inserted; replacing the
/// value of an existing key leaves it in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    entries: Vec<(String, Tag)>,
}

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key, returning the previous value if the key existed.
    pub fn insert<K: Into<String>>(&mut self, key: K, tag: Tag) -> Option<Tag> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, tag)),
            None => {
                self.entries.push((key, tag));
                None
            }
        }
    }

    /// Builder-style variant of [`Compound::insert`].
    pub fn with<K: Into<String>>(mut self, key: K, tag: Tag) -> Self {
        self.insert(key, tag);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Tag> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<Tag> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the string stored under `key`, if it is a string tag.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Tag::as_str)
    }

    /// Returns the list stored under `key`, if it is a list tag.
    pub fn get_list_mut(&mut self, key: &str) -> Option<&mut List> {
        self.get_mut(key).and_then(Tag::as_list_mut)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tag)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

/// A complete NBT document: a named root compound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Nbt {
    /// Name of the root tag. Chunk payloads use the empty string.
    pub name: String,
    /// The root compound.
    pub root: Compound,
}

impl Nbt {
    pub fn new(name: impl Into<String>, root: Compound) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    /// Decodes a document from uncompressed bytes.
    ///
    /// Bytes following the root compound are ignored.
    pub fn from_bytes(bytes: &[u8]) -> NbtResult<Self> {
        Decoder::new(bytes).read_document()
    }

    /// Encodes the document to uncompressed bytes.
    pub fn to_bytes(&self) -> NbtResult<Vec<u8>> {
        let mut encoder = Encoder::new();
        encoder.write_document(self)?;
        Ok(encoder.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_insert_keeps_order() {
        let mut compound = Compound::new()
            .with("id", Tag::from("minecraft:zombie"))
            .with("Health", Tag::Float(20.0))
            .with("NoAI", Tag::Byte(0));

        let previous = compound.insert("Health", Tag::Float(5.0));
        assert_eq!(previous, Some(Tag::Float(20.0)));
        assert_eq!(compound.insert("Invulnerable", Tag::Int(1)), None);

        let keys: Vec<_> = compound.keys().collect();
        assert_eq!(keys, vec!["id", "Health", "NoAI", "Invulnerable"]);
        assert_eq!(compound.get_str("id"), Some("minecraft:zombie"));
        assert_eq!(compound.remove("NoAI"), Some(Tag::Byte(0)));
        assert!(!compound.contains_key("NoAI"));
        assert_eq!(compound.len(), 3);
    }

    #[test]
    fn test_list_push_enforces_type() {
        let mut list = List::default();
        list.push(Tag::Int(1)).unwrap();
        assert_eq!(list.element_id(), TagId::Int);

        let err = list.push(Tag::from("nope")).unwrap_err();
        assert_eq!(
            err,
            NbtError::ListTypeMismatch {
                expected: TagId::Int,
                found: TagId::String,
            }
        );
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_list_from_mixed_tags() {
        let result = List::from_tags(vec![Tag::Int(1), Tag::Long(2)]);
        assert!(matches!(result, Err(NbtError::ListTypeMismatch { .. })));
    }

    #[test]
    fn test_tag_id_from_u8() {
        assert_eq!(TagId::try_from(10).unwrap(), TagId::Compound);
        assert_eq!(TagId::try_from(13), Err(NbtError::InvalidTagId(13)));
    }
}
