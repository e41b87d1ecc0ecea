use std::num::NonZeroUsize;
use std::path::Path;
use std::rc::Rc;

use tracing::trace;

use crate::builder::{self, BuildingObserver, NoopObserver, DEFAULT_DENSITY_FACTOR};
use crate::error::{Result, TrieError};
use crate::iter::{find_value, traverse, TrieIter};
use crate::serial;
use crate::storage::{MemoryStorage, MmapStorage, SharedStorage, Storage};
use crate::value::{ValueDeserializer, ValueSerializer};

/// A static, double-array-backed map from byte-sequence keys to values of
/// type `V`.
///
/// Built once from a sorted `(key, value)` list, read-only afterwards
/// except for [`Trie::subtrie`], which shares the same underlying
/// [`Storage`] rather than copying it — hence the storage handle is an
/// `Rc<dyn Storage<V>>` rather than an owned, unique backend. See the
/// design notes on [`Storage::clone_storage`] for how this differs from
/// the backend-level clone operation.
pub struct Trie<V> {
    storage: Rc<dyn Storage<V>>,
    root_index: usize,
}

impl<V> std::fmt::Debug for Trie<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trie").field("root_index", &self.root_index).finish_non_exhaustive()
    }
}

impl<V: Clone + 'static> Trie<V> {
    /// Builds a new trie from `entries`, which must be strictly sorted by
    /// key with no duplicates.
    pub fn new(entries: &[(Vec<u8>, V)]) -> Result<Self> {
        Self::with_observer_and_density(entries, &mut NoopObserver, DEFAULT_DENSITY_FACTOR)
    }

    /// Like [`Trie::new`], but with an explicit [`BuildingObserver`] and
    /// `density_factor`.
    pub fn with_observer_and_density(
        entries: &[(Vec<u8>, V)],
        observer: &mut dyn BuildingObserver,
        density_factor: i32,
    ) -> Result<Self> {
        let storage = builder::build(entries, observer, density_factor)?;
        Ok(Self {
            storage: Rc::new(storage),
            root_index: 0,
        })
    }

    /// Wraps an already-built storage (e.g. one produced by
    /// [`Trie::new`] against a [`SharedStorage`], or opened read-only from
    /// disk) as a trie rooted at index 0.
    pub fn from_storage(storage: Rc<dyn Storage<V>>) -> Self {
        Self { storage, root_index: 0 }
    }

    /// Opens a trie image through an `mmap`-backed `Mmap` storage.
    pub fn open_mmap<P: AsRef<Path>>(
        path: P,
        offset: usize,
        deserializer: impl ValueDeserializer<V> + 'static,
        cache_capacity: NonZeroUsize,
    ) -> Result<Self> {
        let storage = MmapStorage::open(path, offset, deserializer, cache_capacity)?;
        trace!(cells = storage.base_check_size(), "trie opened via mmap");
        Ok(Self {
            storage: Rc::new(storage),
            root_index: 0,
        })
    }

    /// Reads a whole serialized image into memory and rebuilds an
    /// in-memory trie from it — the non-mmap counterpart to
    /// [`Trie::open_mmap`], useful for `Memory`/`Shared` round trips.
    pub fn from_image_bytes(bytes: &[u8], deserializer: &dyn ValueDeserializer<V>) -> Result<Self> {
        let parsed = serial::read_image(&mut &bytes[..])?;
        let storage = MemoryStorage::new();
        for (index, &cell) in parsed.cells.iter().enumerate() {
            storage.set_base_at(index, crate::storage::unpack_base(cell))?;
            storage.set_check_at(index, crate::storage::unpack_check(cell))?;
        }
        for record in parsed.records {
            let value = deserializer.deserialize(&record.bytes)?;
            storage.add_value_at(record.value_index as usize, value)?;
        }
        Ok(Self {
            storage: Rc::new(storage),
            root_index: 0,
        })
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &[u8]) -> bool {
        matches!(find_value(self.storage.as_ref(), self.root_index, key), Ok(Some(_)))
    }

    /// The value stored under `key`, if any.
    pub fn find(&self, key: &[u8]) -> Result<Option<V>> {
        find_value(self.storage.as_ref(), self.root_index, key)
    }

    /// Number of keys stored in this trie (or sub-trie root).
    ///
    /// Walks the double array rather than reading the storage-wide value
    /// count, since a sub-trie shares its parent's storage and must not
    /// report the whole trie's key count as its own.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates every stored value in ascending key order.
    pub fn iter(&self) -> TrieIter<'_, V> {
        TrieIter::new(self.storage.as_ref(), self.root_index)
    }

    /// A view rooted at the state reached by traversing `prefix` (without
    /// a terminator), sharing this trie's storage. `None` if no stored
    /// key has `prefix` as a prefix.
    pub fn subtrie(&self, prefix: &[u8]) -> Option<Trie<V>> {
        let root_index = traverse(self.storage.as_ref(), self.root_index, prefix)?;
        Some(Trie {
            storage: Rc::clone(&self.storage),
            root_index,
        })
    }

    /// Fraction of BASE/CHECK cells currently occupied.
    pub fn filling_rate(&self) -> f64 {
        self.storage.filling_rate()
    }

    /// Writes the trie image to `sink`.
    pub fn serialize(&self, sink: &mut dyn std::io::Write, value_serializer: &dyn ValueSerializer<V>) -> Result<()> {
        if self.root_index != 0 {
            return Err(TrieError::LogicError(
                "only a trie rooted at index 0 can be serialized".to_string(),
            ));
        }
        self.storage.serialize(sink, value_serializer)
    }
}

impl<V: Clone + 'static> Trie<V> {
    /// Builds a trie backed by [`SharedStorage`] instead of a plain
    /// [`MemoryStorage`], so external code that already holds a
    /// `Rc<SharedStorage<V>>` can keep writing to it (e.g. incrementally
    /// assembling a test fixture) while this trie observes the result.
    pub fn new_shared(entries: &[(Vec<u8>, V)]) -> Result<Self> {
        let shared = SharedStorage::new();
        let mut observer = NoopObserver;
        builder::build_into(entries, &shared, &mut observer, DEFAULT_DENSITY_FACTOR)?;
        Ok(Self {
            storage: Rc::new(shared),
            root_index: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::U32Serializer;
    use std::num::NonZeroUsize;

    fn sample() -> Trie<u32> {
        let entries = vec![
            (b"UKI".to_vec(), 3u32),
            (b"USA".to_vec(), 2u32),
            (b"UTO".to_vec(), 1u32),
        ];
        Trie::new(&entries).unwrap()
    }

    #[test]
    fn find_and_iterate() {
        let trie = sample();
        assert_eq!(trie.find(b"UTO").unwrap(), Some(1));
        assert_eq!(trie.find(b"U").unwrap(), None);
        assert!(trie.contains(b"USA"));
        assert!(!trie.contains(b"XYZ"));
        assert_eq!(trie.iter().collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(trie.len(), 3);
    }

    #[test]
    fn subtrie_shares_storage() {
        let trie = sample();
        let sub = trie.subtrie(b"U").unwrap();
        assert_eq!(sub.find(b"TO").unwrap(), Some(1));
        assert_eq!(sub.find(b"SA").unwrap(), Some(2));
        assert!(trie.subtrie(b"V").is_none());
    }

    #[test]
    fn subtrie_len_counts_only_its_own_keys() {
        let entries = vec![
            (b"AAA".to_vec(), 1u32),
            (b"AAB".to_vec(), 2u32),
            (b"BCD".to_vec(), 3u32),
        ];
        let trie = Trie::new(&entries).unwrap();
        assert_eq!(trie.len(), 3);

        let a = trie.subtrie(b"AA").unwrap();
        assert_eq!(a.len(), 2);
        assert!(!a.is_empty());

        let b = trie.subtrie(b"B").unwrap();
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn mmap_round_trip() {
        let trie = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trie.img");
        let mut file = std::fs::File::create(&path).unwrap();
        trie.serialize(&mut file, &U32Serializer).unwrap();
        drop(file);

        let reopened: Trie<u32> =
            Trie::open_mmap(&path, 0, U32Serializer, NonZeroUsize::new(4).unwrap()).unwrap();
        assert_eq!(reopened.find(b"UTO").unwrap(), Some(1));
        assert_eq!(reopened.find(b"U").unwrap(), None);
        assert_eq!(reopened.iter().collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    #[test]
    fn mmap_storage_is_immutable() {
        let trie = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trie.img");
        let mut file = std::fs::File::create(&path).unwrap();
        trie.serialize(&mut file, &U32Serializer).unwrap();
        drop(file);

        let reopened: Trie<u32> =
            Trie::open_mmap(&path, 0, U32Serializer, NonZeroUsize::new(4).unwrap()).unwrap();
        assert!(reopened.filling_rate() > 0.0);
        assert!(reopened.storage.base_check_size() > 0);
    }

    #[test]
    fn filling_rate_never_exceeds_one() {
        let trie = sample();
        assert!(trie.filling_rate() <= 1.0);
    }

    #[test]
    fn empty_trie_has_no_entries() {
        let trie: Trie<u32> = Trie::new(&[]).unwrap();
        assert!(trie.is_empty());
        assert_eq!(trie.find(b"anything").unwrap(), None);
        assert_eq!(trie.iter().count(), 0);
    }
}
