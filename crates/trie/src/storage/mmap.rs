use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::num::NonZeroUsize;
use std::path::Path;
use std::rc::Rc;

use lru::LruCache;
use memmap2::Mmap;

use super::{unpack_base, unpack_check, Storage, VACANT_CHECK};
use crate::error::{Result, TrieError};
use crate::serial::NOT_FIXED_SIZE;
use crate::value::{ValueDeserializer, ValueSerializer};

/// Default capacity of the decoded-value LRU cache, used when a caller
/// doesn't have a more specific number in mind.
pub const DEFAULT_VALUE_CACHE_CAPACITY: usize = 128;

/// Byte span of one value record's payload within the mapped file.
#[derive(Clone, Copy)]
struct ValueSpan {
    offset: usize,
    len: usize,
}

/// A read-only projection of a serialized trie image, read through an
/// `mmap` so the BASE/CHECK array never has to be copied into the
/// process's heap.
///
/// Values are decoded lazily through a caller-supplied
/// [`ValueDeserializer`] and cached by index in an LRU cache, since
/// decoding (unlike a raw BASE/CHECK cell read) can be arbitrarily
/// expensive.
pub struct MmapStorage<V> {
    mmap: Rc<Mmap>,
    base_offset: usize,
    cell_count: usize,
    value_count: usize,
    fixed_value_size: usize,
    value_spans: Rc<HashMap<u32, ValueSpan>>,
    cache: RefCell<LruCache<u32, V>>,
    deserializer: Rc<dyn ValueDeserializer<V>>,
}

impl<V> std::fmt::Debug for MmapStorage<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmapStorage")
            .field("base_offset", &self.base_offset)
            .field("cell_count", &self.cell_count)
            .field("value_count", &self.value_count)
            .field("fixed_value_size", &self.fixed_value_size)
            .finish_non_exhaustive()
    }
}

impl<V: Clone> MmapStorage<V> {
    /// Opens the trie image stored in `path`, starting at byte `offset`
    /// (so an image may be embedded after a caller-defined header).
    ///
    /// Fails if `path` can't be opened, if the image is truncated, or if
    /// the header declares a non-fixed value size (`Mmap` storage can
    /// only be built over fixed-size values, since decoding is driven by
    /// byte offsets computed without reading every record up front).
    pub fn open<P: AsRef<Path>>(
        path: P,
        offset: usize,
        deserializer: impl ValueDeserializer<V> + 'static,
        cache_capacity: NonZeroUsize,
    ) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the file is not expected to be modified by another
        // process while mapped; this is the standard caveat of mmap-based
        // I/O and is documented on `MmapStorage::open`.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_mmap(mmap, offset, deserializer, cache_capacity)
    }

    fn from_mmap(
        mmap: Mmap,
        base_offset: usize,
        deserializer: impl ValueDeserializer<V> + 'static,
        cache_capacity: NonZeroUsize,
    ) -> Result<Self> {
        let bytes = &mmap[..];
        let cell_count = read_u32(bytes, base_offset)? as usize;
        let cells_end = base_offset
            .checked_add(4)
            .and_then(|p| p.checked_add(cell_count.checked_mul(4)?))
            .ok_or_else(|| TrieError::FormatError("trie image cell count overflows".to_string()))?;
        require_len(bytes, cells_end)?;

        let value_count = read_u32(bytes, cells_end)? as usize;
        let fixed_value_size_raw = read_u32(bytes, cells_end + 4)?;
        if fixed_value_size_raw == NOT_FIXED_SIZE {
            return Err(TrieError::FormatError(
                "mmap storage requires a fixed value size".to_string(),
            ));
        }
        let fixed_value_size = fixed_value_size_raw as usize;

        let mut value_spans = HashMap::with_capacity(value_count);
        let mut cursor = cells_end + 8;
        for _ in 0..value_count {
            let value_index = read_u32(bytes, cursor)?;
            let len = read_u32(bytes, cursor + 4)? as usize;
            let payload_offset = cursor + 8;
            require_len(bytes, payload_offset + len)?;
            value_spans.insert(
                value_index,
                ValueSpan {
                    offset: payload_offset,
                    len,
                },
            );
            cursor = payload_offset + len;
        }

        Ok(Self {
            mmap: Rc::new(mmap),
            base_offset,
            cell_count,
            value_count,
            fixed_value_size,
            value_spans: Rc::new(value_spans),
            cache: RefCell::new(LruCache::new(cache_capacity)),
            deserializer: Rc::new(deserializer),
        })
    }

    /// The fixed serialized length declared by the image header.
    pub fn fixed_value_size(&self) -> usize {
        self.fixed_value_size
    }

    fn read_cell(&self, index: usize) -> Option<i32> {
        if index >= self.cell_count {
            return None;
        }
        let pos = self.base_offset + 4 + index * 4;
        Some(i32::from_be_bytes(self.mmap[pos..pos + 4].try_into().unwrap()))
    }
}

fn require_len(bytes: &[u8], len: usize) -> Result<()> {
    if bytes.len() < len {
        Err(TrieError::FormatError("truncated trie image".to_string()))
    } else {
        Ok(())
    }
}

fn read_u32(bytes: &[u8], pos: usize) -> Result<u32> {
    let end = pos
        .checked_add(4)
        .ok_or_else(|| TrieError::FormatError("trie image offset overflows".to_string()))?;
    require_len(bytes, end)?;
    Ok(u32::from_be_bytes(bytes[pos..end].try_into().unwrap()))
}

impl<V: Clone + 'static> Storage<V> for MmapStorage<V> {
    fn base_at(&self, index: usize) -> i32 {
        self.read_cell(index).map(unpack_base).unwrap_or(0)
    }

    fn set_base_at(&self, _index: usize, _base: i32) -> Result<()> {
        Err(TrieError::LogicError("mmap storage is read-only".to_string()))
    }

    fn check_at(&self, index: usize) -> u8 {
        self.read_cell(index).map(unpack_check).unwrap_or(VACANT_CHECK)
    }

    fn set_check_at(&self, _index: usize, _check: u8) -> Result<()> {
        Err(TrieError::LogicError("mmap storage is read-only".to_string()))
    }

    fn base_check_size(&self) -> usize {
        self.cell_count
    }

    fn value_at(&self, index: usize) -> Result<Option<V>> {
        let index = index as u32;
        if let Some(cached) = self.cache.borrow_mut().get(&index) {
            return Ok(Some(cached.clone()));
        }
        let Some(span) = self.value_spans.get(&index) else {
            return Ok(None);
        };
        let bytes = &self.mmap[span.offset..span.offset + span.len];
        let value = self.deserializer.deserialize(bytes)?;
        self.cache.borrow_mut().put(index, value.clone());
        Ok(Some(value))
    }

    fn add_value_at(&self, _index: usize, _value: V) -> Result<()> {
        Err(TrieError::LogicError("mmap storage is read-only".to_string()))
    }

    fn value_count(&self) -> usize {
        self.value_count
    }

    fn filling_rate(&self) -> f64 {
        if self.cell_count == 0 {
            return 0.0;
        }
        let filled = (0..self.cell_count)
            .filter(|&i| self.check_at(i) != VACANT_CHECK)
            .count();
        filled as f64 / self.cell_count as f64
    }

    fn serialize(&self, _sink: &mut dyn std::io::Write, _value_serializer: &dyn ValueSerializer<V>) -> Result<()> {
        Err(TrieError::LogicError(
            "mmap storage is already serialized; re-serializing it is not supported".to_string(),
        ))
    }

    fn clone_storage(&self) -> Box<dyn Storage<V>> {
        Box::new(Self {
            mmap: Rc::clone(&self.mmap),
            base_offset: self.base_offset,
            cell_count: self.cell_count,
            value_count: self.value_count,
            fixed_value_size: self.fixed_value_size,
            value_spans: Rc::clone(&self.value_spans),
            cache: RefCell::new(LruCache::new(
                NonZeroUsize::new(self.cache.borrow().cap().get()).unwrap(),
            )),
            deserializer: Rc::clone(&self.deserializer),
        })
    }
}
