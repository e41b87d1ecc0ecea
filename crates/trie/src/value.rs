//! Value (de)serialization contract used to write and read the trie image
//! (see [`crate::serial`]).
//!
//! A serializer is a pure function from a value to bytes plus a declared
//! fixed size; the deserializer is its inverse. [`Storage::serialize`]
//! stores `fixed_size.unwrap_or(0xFFFF_FFFF)` in the image header so a
//! reader can validate that an mmap-backed storage (which requires a fixed
//! value size) is being opened against a compatible image.

use crate::error::{Result, TrieError};

/// Serializes values of type `V` into bytes for the trie image.
pub trait ValueSerializer<V> {
    /// Encodes `value` into its on-disk representation.
    fn serialize(&self, value: &V) -> Vec<u8>;

    /// The serialized length of every value, if constant. `Mmap` storage
    /// requires this to be `Some`.
    fn fixed_size(&self) -> Option<usize>;
}

/// Inverse of [`ValueSerializer`].
pub trait ValueDeserializer<V> {
    /// Decodes `bytes` back into a `V`. `bytes` is exactly the slice
    /// written by the matching [`ValueSerializer::serialize`] call.
    fn deserialize(&self, bytes: &[u8]) -> Result<V>;
}

/// Fixed 4-byte big-endian `u32` codec, used in the trie round-trip
/// fixtures.
#[derive(Debug, Clone, Copy, Default)]
pub struct U32Serializer;

impl ValueSerializer<u32> for U32Serializer {
    fn serialize(&self, value: &u32) -> Vec<u8> {
        value.to_be_bytes().to_vec()
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(4)
    }
}

impl ValueDeserializer<u32> for U32Serializer {
    fn deserialize(&self, bytes: &[u8]) -> Result<u32> {
        let array: [u8; 4] = bytes
            .try_into()
            .map_err(|_| TrieError::FormatError("expected 4 bytes for u32 value".to_string()))?;
        Ok(u32::from_be_bytes(array))
    }
}

/// Variable-length byte-string codec. Not usable with `Mmap` storage since
/// it declares no fixed size.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesSerializer;

impl ValueSerializer<Vec<u8>> for BytesSerializer {
    fn serialize(&self, value: &Vec<u8>) -> Vec<u8> {
        value.clone()
    }

    fn fixed_size(&self) -> Option<usize> {
        None
    }
}

impl ValueDeserializer<Vec<u8>> for BytesSerializer {
    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}
