//! A double-array trie: a compact, static map from byte-string keys to
//! arbitrary values, backed by one of three storage strategies (in-memory,
//! reference-counted shared, or `mmap`-ed read-only) so that a trie built
//! once can be serialized, reopened without copying, and queried for
//! exact matches, prefix iteration or sub-tries sharing the same storage.

mod builder;
mod error;
mod iter;
mod serial;
mod storage;
mod trie;
mod value;

pub use builder::{BuildingObserver, NoopObserver, DEFAULT_DENSITY_FACTOR};
pub use error::{Result, TrieError};
pub use iter::TrieIter;
pub use storage::{MemoryStorage, MmapStorage, SharedStorage, Storage};
pub use trie::Trie;
pub use value::{BytesSerializer, U32Serializer, ValueDeserializer, ValueSerializer};
