//! Reader for XNB containers holding `Dictionary<Int32, String>` tables
//!
//! Layout of the files the game ships:
//! - 10-byte header: `XNB`, target platform, format version, flags, file size
//! - optional `u32` decompressed size followed by an LZ4 block (flag `0x40`)
//! - type reader manifest (7-bit encoded count, then name + version pairs)
//! - shared resource count
//! - the primary asset: a dictionary of `i32` keys to `String` values
//!
//! LZX-compressed containers (flag `0x80`) are rejected with a decode error.

use crate::error::{Error, Result};
use crate::table::{RawTable, TableKind};
use byteorder::{LittleEndian, ReadBytesExt};
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use thiserror::Error;

/// Magic bytes at the start of every container
pub const MAGIC: &[u8; 3] = b"XNB";

const HEADER_LEN: usize = 10;
const FLAG_LZX: u8 = 0x80;
const FLAG_LZ4: u8 = 0x40;

/// Upper bound on the LZ4 block format's expansion ratio
const LZ4_MAX_RATIO: usize = 255;

/// Smallest encoded size of a dictionary entry: key, reader index, empty string
const MIN_ENTRY_LEN: usize = 6;

/// Smallest encoded size of a type reader: empty name and version
const MIN_READER_LEN: usize = 5;

const DICTIONARY_READER: &str = "Microsoft.Xna.Framework.Content.DictionaryReader`2";
const INT32_TYPE: &str = "System.Int32";
const STRING_TYPE: &str = "System.String";

/// Errors raised while decoding a container
#[derive(Debug, Error)]
pub enum XnbError {
    #[error("invalid magic: expected 'XNB', got {actual:?}")]
    InvalidMagic { actual: Vec<u8> },

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    #[error("LZX compressed containers are not supported; unpack the file first")]
    LzxCompressed,

    #[error("header declares {declared} bytes but file has {actual}")]
    SizeMismatch { declared: usize, actual: usize },

    #[error("LZ4 block of {compressed} bytes cannot expand to the declared {declared} bytes")]
    OversizedPayload { declared: usize, compressed: usize },

    #[error("LZ4 decompression failed: {0}")]
    Lz4(#[from] lz4_flex::block::DecompressError),

    #[error("unexpected end of data")]
    Truncated,

    #[error("malformed 7-bit encoded integer")]
    BadVarint,

    #[error("string is not valid UTF-8")]
    BadString,

    #[error("type reader index {0} is out of range")]
    BadReaderIndex(u32),

    #[error("primary asset is null")]
    NullAsset,

    #[error("primary asset is '{0}', expected a Dictionary<Int32, String>")]
    WrongAssetType(String),

    #[error("entry for key {0} has a null value")]
    NullValue(i32),
}

impl From<std::io::Error> for XnbError {
    fn from(_: std::io::Error) -> Self {
        XnbError::Truncated
    }
}

/// Read a container from disk into a raw table
pub fn read_xnb_table<P: AsRef<Path>>(path: P, kind: TableKind) -> Result<RawTable> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let entries = decode_dictionary(&bytes).map_err(|e| Error::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(RawTable::from_records(
        kind,
        path.to_path_buf(),
        entries.into_iter().map(|(k, v)| (k.to_string(), v)),
    ))
}

/// Decode the dictionary held by a container
pub fn decode_dictionary(bytes: &[u8]) -> std::result::Result<Vec<(i32, String)>, XnbError> {
    if bytes.len() < HEADER_LEN {
        return Err(XnbError::Truncated);
    }
    if &bytes[..3] != MAGIC {
        return Err(XnbError::InvalidMagic {
            actual: bytes[..3].to_vec(),
        });
    }

    let version = bytes[4];
    if version != 4 && version != 5 {
        return Err(XnbError::UnsupportedVersion(version));
    }

    let flags = bytes[5];
    let declared = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
    if declared != bytes.len() {
        return Err(XnbError::SizeMismatch {
            declared,
            actual: bytes.len(),
        });
    }

    if flags & FLAG_LZX != 0 {
        return Err(XnbError::LzxCompressed);
    }

    if flags & FLAG_LZ4 != 0 {
        let mut cursor = Cursor::new(&bytes[HEADER_LEN..]);
        let size = cursor.read_u32::<LittleEndian>()? as usize;
        let block = &bytes[HEADER_LEN + 4..];
        if size > block.len().saturating_mul(LZ4_MAX_RATIO) {
            return Err(XnbError::OversizedPayload {
                declared: size,
                compressed: block.len(),
            });
        }
        let payload = lz4_flex::block::decompress(block, size)?;
        read_payload(&payload)
    } else {
        read_payload(&bytes[HEADER_LEN..])
    }
}

fn read_payload(payload: &[u8]) -> std::result::Result<Vec<(i32, String)>, XnbError> {
    let mut cursor = Cursor::new(payload);

    let reader_count = read_7bit(&mut cursor)?;
    let mut readers = Vec::with_capacity(capacity_hint(&cursor, reader_count, MIN_READER_LEN));
    for _ in 0..reader_count {
        let name = read_string(&mut cursor)?;
        let _version = cursor.read_i32::<LittleEndian>()?;
        readers.push(name);
    }

    // Shared resources are never used by data tables
    let _shared = read_7bit(&mut cursor)?;

    let asset_reader = match read_7bit(&mut cursor)? {
        0 => return Err(XnbError::NullAsset),
        index => readers
            .get(index as usize - 1)
            .ok_or(XnbError::BadReaderIndex(index))?,
    };
    if !asset_reader.starts_with(DICTIONARY_READER)
        || !asset_reader.contains(INT32_TYPE)
        || !asset_reader.contains(STRING_TYPE)
    {
        return Err(XnbError::WrongAssetType(asset_reader.clone()));
    }

    let count = cursor.read_u32::<LittleEndian>()?;
    let mut entries = Vec::with_capacity(capacity_hint(&cursor, count, MIN_ENTRY_LEN));
    for _ in 0..count {
        // Int32 is a value type, so keys carry no reader prefix
        let key = cursor.read_i32::<LittleEndian>()?;
        match read_7bit(&mut cursor)? {
            0 => return Err(XnbError::NullValue(key)),
            index if index as usize > readers.len() => {
                return Err(XnbError::BadReaderIndex(index))
            }
            _ => {}
        }
        let value = read_string(&mut cursor)?;
        entries.push((key, value));
    }

    Ok(entries)
}

/// Counts come from the file, so never reserve more than the remaining bytes could hold
fn capacity_hint(cursor: &Cursor<&[u8]>, count: u32, min_len: usize) -> usize {
    (count as usize).min(remaining(cursor) / min_len)
}

fn remaining(cursor: &Cursor<&[u8]>) -> usize {
    cursor
        .get_ref()
        .len()
        .saturating_sub(cursor.position() as usize)
}

fn read_7bit(cursor: &mut Cursor<&[u8]>) -> std::result::Result<u32, XnbError> {
    let mut result: u32 = 0;
    for shift in (0..35).step_by(7) {
        let byte = cursor.read_u8()?;
        result |= u32::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(XnbError::BadVarint)
}

fn read_string(cursor: &mut Cursor<&[u8]>) -> std::result::Result<String, XnbError> {
    let len = read_7bit(cursor)? as usize;
    if len > remaining(cursor) {
        return Err(XnbError::Truncated);
    }
    let mut buf = vec![0u8; len];
    cursor.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| XnbError::BadString)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    const READER_NAME: &str = "Microsoft.Xna.Framework.Content.DictionaryReader`2[[System.Int32, mscorlib],[System.String, mscorlib]]";

    fn write_7bit(out: &mut Vec<u8>, mut value: u32) {
        while value >= 0x80 {
            out.push((value as u8) | 0x80);
            value >>= 7;
        }
        out.push(value as u8);
    }

    fn write_string(out: &mut Vec<u8>, s: &str) {
        write_7bit(out, s.len() as u32);
        out.extend_from_slice(s.as_bytes());
    }

    fn payload(entries: &[(i32, &str)]) -> Vec<u8> {
        let mut out = Vec::new();
        write_7bit(&mut out, 3);
        write_string(&mut out, READER_NAME);
        out.write_i32::<LittleEndian>(0).unwrap();
        write_string(&mut out, "Microsoft.Xna.Framework.Content.Int32Reader");
        out.write_i32::<LittleEndian>(0).unwrap();
        write_string(&mut out, "Microsoft.Xna.Framework.Content.StringReader");
        out.write_i32::<LittleEndian>(0).unwrap();
        write_7bit(&mut out, 0);
        write_7bit(&mut out, 1);
        out.write_u32::<LittleEndian>(entries.len() as u32).unwrap();
        for (key, value) in entries {
            out.write_i32::<LittleEndian>(*key).unwrap();
            write_7bit(&mut out, 3);
            write_string(&mut out, value);
        }
        out
    }

    fn wrap(flags: u8, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.push(b'w');
        out.push(5);
        out.push(flags);
        out.write_u32::<LittleEndian>((HEADER_LEN + body.len()) as u32)
            .unwrap();
        out.extend_from_slice(body);
        out
    }

    /// Build an uncompressed container holding the given entries
    pub(crate) fn build_xnb(entries: &[(i32, &str)]) -> Vec<u8> {
        wrap(0, &payload(entries))
    }

    #[test]
    fn test_decode_uncompressed() {
        let bytes = build_xnb(&[(24, "Parsnip/35/10/Basic -75/A spring tuber."), (472, "Parsnip Seeds/10/-300/Seeds -74/Plant these.")]);
        let entries = decode_dictionary(&bytes).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, 24);
        assert!(entries[0].1.starts_with("Parsnip/35"));
        assert_eq!(entries[1].0, 472);
    }

    #[test]
    fn test_decode_lz4() {
        let raw = payload(&[(16, "Wild Horseradish/50/5/Basic -81/A spicy root.")]);
        let compressed = lz4_flex::block::compress(&raw);
        let mut body = Vec::new();
        body.write_u32::<LittleEndian>(raw.len() as u32).unwrap();
        body.extend_from_slice(&compressed);

        let entries = decode_dictionary(&wrap(FLAG_LZ4, &body)).unwrap();
        assert_eq!(entries, vec![(16, "Wild Horseradish/50/5/Basic -81/A spicy root.".to_string())]);
    }

    #[test]
    fn test_reject_lzx() {
        let bytes = wrap(FLAG_LZX, &[0, 0, 0, 0]);
        assert!(matches!(decode_dictionary(&bytes), Err(XnbError::LzxCompressed)));
    }

    #[test]
    fn test_reject_bad_magic() {
        let mut bytes = build_xnb(&[]);
        bytes[0] = b'Z';
        assert!(matches!(decode_dictionary(&bytes), Err(XnbError::InvalidMagic { .. })));
    }

    #[test]
    fn test_reject_truncated() {
        let mut bytes = build_xnb(&[(24, "Parsnip/35/10/Basic -75/A spring tuber.")]);
        bytes.truncate(bytes.len() - 5);
        let declared = bytes.len() as u32;
        bytes[6..10].copy_from_slice(&declared.to_le_bytes());
        assert!(matches!(decode_dictionary(&bytes), Err(XnbError::Truncated)));
    }

    #[test]
    fn test_reject_size_mismatch() {
        let mut bytes = build_xnb(&[]);
        bytes.push(0);
        assert!(matches!(decode_dictionary(&bytes), Err(XnbError::SizeMismatch { .. })));
    }

    #[test]
    fn test_reject_oversized_count() {
        let mut bytes = build_xnb(&[]);
        let len = bytes.len();
        bytes[len - 4..].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(decode_dictionary(&bytes), Err(XnbError::Truncated)));
    }

    #[test]
    fn test_reject_oversized_reader_count() {
        let bytes = wrap(0, &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert!(matches!(decode_dictionary(&bytes), Err(XnbError::Truncated)));
    }

    #[test]
    fn test_reject_oversized_lz4_size() {
        let raw = payload(&[(24, "Parsnip/35/10/Basic -75/A spring tuber.")]);
        let compressed = lz4_flex::block::compress(&raw);
        let mut body = Vec::new();
        body.write_u32::<LittleEndian>(u32::MAX).unwrap();
        body.extend_from_slice(&compressed);

        assert!(matches!(
            decode_dictionary(&wrap(FLAG_LZ4, &body)),
            Err(XnbError::OversizedPayload { .. })
        ));
    }

    #[test]
    fn test_read_7bit_multibyte() {
        let mut out = Vec::new();
        write_7bit(&mut out, 300);
        let mut cursor = Cursor::new(out.as_slice());
        assert_eq!(read_7bit(&mut cursor).unwrap(), 300);
    }
}
