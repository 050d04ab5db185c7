//! Java "modified UTF-8" as produced by `DataOutput.writeUTF`.
//!
//! It differs from standard UTF-8 in two ways: U+0000 is written as the two
//! byte sequence `C0 80`, and characters outside the BMP are written as a
//! surrogate pair with each half encoded in three bytes.

use crate::error::{NbtError, NbtResult};

pub(crate) fn encode(s: &str, out: &mut Vec<u8>) {
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
}

/// Number of bytes [`encode`] produces for `s`.
pub(crate) fn encoded_len(s: &str) -> usize {
    s.encode_utf16()
        .map(|unit| match unit {
            0x0001..=0x007F => 1,
            0x0000 | 0x0080..=0x07FF => 2,
            _ => 3,
        })
        .sum()
}

pub(crate) fn decode(bytes: &[u8]) -> NbtResult<String> {
    // Fast path: plain ASCII is identical in both encodings.
    if bytes.is_ascii() {
        return String::from_utf8(bytes.to_vec()).map_err(|_| NbtError::InvalidString);
    }

    let mut units = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied();
    while let Some(b0) = iter.next() {
        let unit = match b0 {
            0x00..=0x7F => u16::from(b0),
            0xC0..=0xDF => {
                let b1 = continuation(iter.next())?;
                (u16::from(b0 & 0x1F) << 6) | b1
            }
            0xE0..=0xEF => {
                let b1 = continuation(iter.next())?;
                let b2 = continuation(iter.next())?;
                (u16::from(b0 & 0x0F) << 12) | (b1 << 6) | b2
            }
            _ => return Err(NbtError::InvalidString),
        };
        units.push(unit);
    }

    String::from_utf16(&units).map_err(|_| NbtError::InvalidString)
}

fn continuation(byte: Option<u8>) -> NbtResult<u16> {
    match byte {
        Some(b) if b & 0xC0 == 0x80 => Ok(u16::from(b & 0x3F)),
        _ => Err(NbtError::InvalidString),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(s: &str) -> Vec<u8> {
        let mut out = Vec::new();
        encode(s, &mut out);
        assert_eq!(out.len(), encoded_len(s));
        assert_eq!(decode(&out).unwrap(), s);
        out
    }

    #[test]
    fn test_ascii() {
        assert_eq!(roundtrip("minecraft:zombie"), b"minecraft:zombie");
    }

    #[test]
    fn test_nul_uses_two_bytes() {
        assert_eq!(roundtrip("a\0b"), vec![b'a', 0xC0, 0x80, b'b']);
    }

    #[test]
    fn test_supplementary_uses_surrogate_pair() {
        let bytes = roundtrip("\u{1F600}");
        assert_eq!(bytes, vec![0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80]);
    }

    #[test]
    fn test_bmp_characters() {
        roundtrip("Grüße, 世界");
    }

    #[test]
    fn test_invalid_sequences() {
        assert_eq!(decode(&[0xC3]), Err(NbtError::InvalidString));
        assert_eq!(decode(&[0xE4, 0x41, 0x41]), Err(NbtError::InvalidString));
        assert_eq!(decode(&[0xF0, 0x9F, 0x98, 0x80]), Err(NbtError::InvalidString));
        // Lone high surrogate.
        assert_eq!(decode(&[0xED, 0xA0, 0xBD]), Err(NbtError::InvalidString));
    }
}
