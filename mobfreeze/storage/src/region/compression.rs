//! Length-prefixed compression framing for stored records.
//!
//! A framed record is `[length: u32 BE][method: u8][compressed bytes]`,
//! where `length` counts the method byte plus the compressed bytes. Records
//! are always written with zlib; gzip and uncompressed records are accepted
//! on read.

use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};

use super::error::DecodeError;
use super::header::PAGE_SIZE;

/// Bytes preceding the compressed payload: length (4) + method (1).
pub const FRAME_HEADER_SIZE: usize = 5;

/// Method-tag bit marking a record stored in an external `.mcc` file.
const EXTERNAL_FLAG: u8 = 0x80;

/// Compression method recorded in a frame's method byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionScheme {
    Gzip = 1,
    Zlib = 2,
    Uncompressed = 3,
}

impl CompressionScheme {
    /// Scheme used for every record this crate writes.
    pub const WRITE_DEFAULT: CompressionScheme = CompressionScheme::Zlib;

    pub fn from_tag(tag: u8) -> Result<Self, DecodeError> {
        match tag {
            1 => Ok(CompressionScheme::Gzip),
            2 => Ok(CompressionScheme::Zlib),
            3 => Ok(CompressionScheme::Uncompressed),
            t if t & EXTERNAL_FLAG != 0 => Err(DecodeError::External(t)),
            t => Err(DecodeError::UnknownMethod(t)),
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn compress(self, data: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            CompressionScheme::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                encoder.finish()
            }
            CompressionScheme::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                encoder.finish()
            }
            CompressionScheme::Uncompressed => Ok(data.to_vec()),
        }
    }

    pub fn decompress(self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            CompressionScheme::Gzip => {
                GzDecoder::new(data).read_to_end(&mut out)?;
            }
            CompressionScheme::Zlib => {
                ZlibDecoder::new(data).read_to_end(&mut out)?;
            }
            CompressionScheme::Uncompressed => out.extend_from_slice(data),
        }
        Ok(out)
    }
}

/// Compresses `data` with zlib and frames it.
pub fn encode(data: &[u8]) -> io::Result<Vec<u8>> {
    encode_with(CompressionScheme::WRITE_DEFAULT, data)
}

/// Compresses `data` with the given scheme and frames it.
pub fn encode_with(scheme: CompressionScheme, data: &[u8]) -> io::Result<Vec<u8>> {
    let compressed = scheme.compress(data)?;
    let length = u32::try_from(compressed.len() + 1).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "compressed record exceeds 4 GiB")
    })?;

    let mut framed = Vec::with_capacity(FRAME_HEADER_SIZE + compressed.len());
    framed.extend_from_slice(&length.to_be_bytes());
    framed.push(scheme.tag());
    framed.extend_from_slice(&compressed);
    Ok(framed)
}

/// Unframes and decompresses a stored record.
///
/// `framed` may extend past the end of the frame (for example, the whole
/// run of pages including zero padding); the length field decides where the
/// payload ends.
pub fn decode(framed: &[u8]) -> Result<Vec<u8>, DecodeError> {
    if framed.len() < FRAME_HEADER_SIZE {
        return Err(DecodeError::ShortFrame(framed.len()));
    }

    let declared = u32::from_be_bytes([framed[0], framed[1], framed[2], framed[3]]);
    if declared == 0 {
        return Err(DecodeError::ZeroLength);
    }
    let available = framed.len() - 4;
    if declared as usize > available {
        return Err(DecodeError::LengthOutOfBounds {
            declared,
            available,
        });
    }

    let scheme = CompressionScheme::from_tag(framed[4])?;
    let payload = &framed[FRAME_HEADER_SIZE..4 + declared as usize];
    scheme.decompress(payload).map_err(DecodeError::Decompress)
}

/// Pages needed to store a framed record of `framed_len` bytes, at least one.
pub fn page_count(framed_len: usize) -> u64 {
    (framed_len as u64).div_ceil(PAGE_SIZE).max(1)
}
