//! Reads and writes the on-disk trie image.
//!
//! Layout, big-endian throughout:
//!
//! ```text
//! u32  base_check_count N
//! u32 × N   base_check cells
//! u32  value_count M
//! u32  fixed_value_size S   (0xFFFF_FFFF when not fixed)
//! repeated M times:
//!   u32 value_index
//!   u32 serialized_byte_length L
//!   u8  × L  serialized value bytes
//! ```

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use crate::error::{Result, TrieError};

/// Sentinel written in place of a fixed value size when values are
/// variable-length.
pub const NOT_FIXED_SIZE: u32 = 0xFFFF_FFFF;

/// One decoded `(value_index, raw_bytes)` record from the value section.
#[derive(Debug)]
pub struct ValueRecord {
    pub value_index: u32,
    pub bytes: Vec<u8>,
}

/// Parsed image header plus the raw value records, before any
/// backend-specific value decoding happens.
#[derive(Debug)]
pub struct ParsedImage {
    pub cells: Vec<i32>,
    pub fixed_value_size: Option<usize>,
    pub records: Vec<ValueRecord>,
}

/// Writes the image for `cells` and `(index, bytes)` value records to
/// `sink`.
pub fn write_image(
    sink: &mut dyn Write,
    cells: &[i32],
    fixed_value_size: Option<usize>,
    values: impl Iterator<Item = (u32, Vec<u8>)>,
) -> Result<()> {
    sink.write_u32::<BigEndian>(cells.len() as u32)?;
    for &cell in cells {
        sink.write_i32::<BigEndian>(cell)?;
    }

    let values: Vec<_> = values.collect();
    sink.write_u32::<BigEndian>(values.len() as u32)?;
    sink.write_u32::<BigEndian>(fixed_value_size.map(|s| s as u32).unwrap_or(NOT_FIXED_SIZE))?;
    for (index, bytes) in values {
        sink.write_u32::<BigEndian>(index)?;
        sink.write_u32::<BigEndian>(bytes.len() as u32)?;
        sink.write_all(&bytes)?;
    }
    Ok(())
}

/// Reads a whole image from `source` into memory.
pub fn read_image(source: &mut dyn Read) -> Result<ParsedImage> {
    let cell_count = read_u32(source)?;
    let mut cells = Vec::with_capacity(cell_count as usize);
    for _ in 0..cell_count {
        cells.push(source.read_i32::<BigEndian>().map_err(io_to_format)?);
    }

    let value_count = read_u32(source)?;
    let fixed_value_size_raw = read_u32(source)?;
    let fixed_value_size = (fixed_value_size_raw != NOT_FIXED_SIZE).then_some(fixed_value_size_raw as usize);

    let mut records = Vec::with_capacity(value_count as usize);
    for _ in 0..value_count {
        let value_index = read_u32(source)?;
        let len = read_u32(source)? as usize;
        let mut bytes = vec![0u8; len];
        source.read_exact(&mut bytes).map_err(io_to_format)?;
        records.push(ValueRecord { value_index, bytes });
    }

    Ok(ParsedImage {
        cells,
        fixed_value_size,
        records,
    })
}

fn read_u32(source: &mut dyn Read) -> Result<u32> {
    source.read_u32::<BigEndian>().map_err(io_to_format)
}

fn io_to_format(err: io::Error) -> TrieError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        TrieError::FormatError("truncated trie image".to_string())
    } else {
        TrieError::IoFailure(err)
    }
}
