//! Builds a minimal BASE/CHECK layout from a sorted `(key, value)` list.

use tracing::trace;

use crate::error::{Result, TrieError};
use crate::storage::{MemoryStorage, Storage, VACANT_CHECK};

/// The byte appended to every key before it is inserted, so that a leaf
/// state's BASE can double as the value index without colliding with an
/// internal state that still has children.
///
/// Together with [`VACANT_CHECK`](crate::storage::VACANT_CHECK), this
/// reserves two of the 256 possible key bytes: a raw key byte can be
/// neither `0x00` (the terminator) nor `0xFF` (the CHECK sentinel a
/// vacant cell is probed against), or it would be indistinguishable from
/// one of those two special states while walking the double array.
pub const KEY_TERMINATOR: u8 = 0x00;

/// Default search-growth granularity: how many cells the builder
/// allocates at a time when it runs out of room while hunting for a free
/// base. A larger factor means fewer reallocations (faster builds) at the
/// cost of more vacant cells left behind (lower packing density).
pub const DEFAULT_DENSITY_FACTOR: i32 = 1024;

/// Receives progress notifications while a [`crate::Trie`] is built.
pub trait BuildingObserver {
    /// Called once for every key added to the trie, in build order.
    fn adding(&mut self, key: &[u8]) {
        let _ = key;
    }

    /// Called once after the last key has been added.
    fn done(&mut self) {}
}

/// A [`BuildingObserver`] that does nothing, used as the default so
/// callers that don't care about progress don't have to write one.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl BuildingObserver for NoopObserver {}

/// Builds a [`MemoryStorage`] encoding `entries`.
///
/// `entries` must be strictly sorted by key and free of duplicate keys;
/// `None` is treated as a hard precondition violation and rejected with
/// [`TrieError::InvalidArgument`] rather than silently producing a
/// miscompiled trie.
pub fn build<V: Clone + 'static>(
    entries: &[(Vec<u8>, V)],
    observer: &mut dyn BuildingObserver,
    density_factor: i32,
) -> Result<MemoryStorage<V>> {
    let storage = MemoryStorage::new();
    build_into(entries, &storage, observer, density_factor)?;
    Ok(storage)
}

/// Same as [`build`], but lays the trie out into an already-constructed
/// `storage` instead of allocating a fresh [`MemoryStorage`] — used to
/// build directly into a [`crate::storage::SharedStorage`] so external
/// code can keep a handle to the same backing arrays.
pub fn build_into<V: Clone + 'static, S: Storage<V> + ?Sized>(
    entries: &[(Vec<u8>, V)],
    storage: &S,
    observer: &mut dyn BuildingObserver,
    density_factor: i32,
) -> Result<()> {
    for key in entries.iter().flat_map(|(k, _)| k.iter()) {
        if *key == KEY_TERMINATOR {
            return Err(TrieError::InvalidArgument(
                "key bytes must not contain the terminator byte 0x00".to_string(),
            ));
        }
        if *key == VACANT_CHECK {
            return Err(TrieError::InvalidArgument(
                "key bytes must not contain the vacant-check sentinel byte 0xFF".to_string(),
            ));
        }
    }
    for pair in entries.windows(2) {
        if pair[0].0 >= pair[1].0 {
            return Err(TrieError::InvalidArgument(
                "entries must be strictly sorted by key with no duplicates".to_string(),
            ));
        }
    }

    let terminated: Vec<(Vec<u8>, usize)> = entries
        .iter()
        .enumerate()
        .map(|(value_index, (key, _))| {
            let mut with_terminator = key.clone();
            with_terminator.push(KEY_TERMINATOR);
            (with_terminator, value_index)
        })
        .collect();

    let growth = density_factor.max(1) as usize;
    let items: Vec<(&[u8], usize)> = terminated.iter().map(|(k, v)| (k.as_slice(), *v)).collect();
    build_state(storage, 0, &items, 0, growth)?;

    for (index, (key, value)) in entries.iter().enumerate() {
        observer.adding(key);
        storage.add_value_at(index, value.clone())?;
    }
    observer.done();

    trace!(entries = entries.len(), cells = storage.base_check_size(), "trie built");
    Ok(())
}

/// Recursively lays out one state and all of its descendants.
///
/// `items` holds every (already-terminated) key sharing the prefix that
/// led to `state_index`, alongside the original index into the caller's
/// entry list (`value_index`), paired with the depth already consumed.
fn build_state<V: Clone + 'static, S: Storage<V> + ?Sized>(
    storage: &S,
    state_index: usize,
    items: &[(&[u8], usize)],
    depth: usize,
    growth: usize,
) -> Result<()> {
    if items.len() == 1 && items[0].0.len() == depth {
        // This state was reached by consuming the terminator; it has no
        // children, so its BASE doubles as the value index.
        storage.set_base_at(state_index, items[0].1 as i32)?;
        return Ok(());
    }

    let mut groups: Vec<(u8, &[(&[u8], usize)])> = Vec::new();
    let mut start = 0;
    while start < items.len() {
        let byte = items[start].0[depth];
        let mut end = start + 1;
        while end < items.len() && items[end].0[depth] == byte {
            end += 1;
        }
        groups.push((byte, &items[start..end]));
        start = end;
    }

    let children: Vec<u8> = groups.iter().map(|(byte, _)| *byte).collect();
    let base = find_free_base(storage, &children, growth)?;
    storage.set_base_at(state_index, base)?;

    for (byte, group) in groups {
        let child_index = (base as i64 + byte as i64) as usize;
        storage.set_check_at(child_index, byte)?;
        build_state(storage, child_index, group, depth + 1, growth)?;
    }

    Ok(())
}

/// Finds the smallest `base >= 1` such that `base + b` is vacant for
/// every child byte `b`, growing `storage` in `growth`-sized chunks when
/// the search runs past its current size.
fn find_free_base<V: Clone + 'static, S: Storage<V> + ?Sized>(storage: &S, children: &[u8], growth: usize) -> Result<i32> {
    let max_child = *children.iter().max().unwrap_or(&0) as usize;
    let mut base: usize = 1;
    loop {
        let highest_needed = base + max_child;
        if highest_needed >= storage.base_check_size() {
            // Grow in `growth`-sized chunks: a direct translation of
            // `density_factor` into an allocation granularity (see
            // DEFAULT_DENSITY_FACTOR).
            let target = ((highest_needed / growth) + 1) * growth;
            storage.set_check_at(target.max(highest_needed), VACANT_CHECK)?;
        }
        if children
            .iter()
            .all(|&b| storage.check_at(base + b as usize) == VACANT_CHECK)
        {
            return Ok(base as i32);
        }
        base += 1;
    }
}
