//! In-order enumeration over a [`crate::Trie`].
//!
//! A double array has no explicit sibling list, so enumerating a state's
//! children means probing all 256 possible transition bytes and keeping
//! the ones whose CHECK cell agrees. That is `O(256)` per state rather
//! than `O(children)`; fine for the sizes this crate targets, and simpler
//! than threading a parallel sibling-link array through the builder.

use crate::builder::KEY_TERMINATOR;
use crate::error::Result;
use crate::storage::Storage;

/// Yields every value stored under a [`crate::Trie`] (or sub-trie), in
/// ascending key order.
pub struct TrieIter<'a, V> {
    storage: &'a dyn Storage<V>,
    // Each frame is the BASE of a state whose transitions (0..=255) are
    // still being scanned, plus the next byte to probe.
    stack: Vec<(i32, u16)>,
}

impl<'a, V: Clone + 'static> TrieIter<'a, V> {
    pub(crate) fn new(storage: &'a dyn Storage<V>, root_index: usize) -> Self {
        Self {
            storage,
            stack: vec![(storage.base_at(root_index), 0)],
        }
    }
}

impl<'a, V: Clone + 'static> Iterator for TrieIter<'a, V> {
    type Item = V;

    fn next(&mut self) -> Option<V> {
        while let Some((base, byte)) = self.stack.pop() {
            if byte > 0xFF {
                continue;
            }
            let index = base + byte as i32;
            let next_byte = byte + 1;
            if index >= 0 && self.storage.check_at(index as usize) == byte as u8 {
                self.stack.push((base, next_byte));
                if byte == KEY_TERMINATOR as u16 {
                    let value_index = self.storage.base_at(index as usize);
                    if let Ok(Some(value)) = self.storage.value_at(value_index as usize) {
                        return Some(value);
                    }
                    continue;
                } else {
                    self.stack.push((self.storage.base_at(index as usize), 0));
                    continue;
                }
            }
            if next_byte <= 0xFF {
                self.stack.push((base, next_byte));
            }
        }
        None
    }
}

/// Same traversal as [`TrieIter`], but starting from `prefix` (without a
/// terminator), used by [`crate::Trie::subtrie`] to find the sub-root, and
/// shared by `contains`/`find`.
pub(crate) fn traverse<V: Clone + 'static>(storage: &dyn Storage<V>, root_index: usize, bytes: &[u8]) -> Option<usize> {
    let mut index = root_index;
    for &byte in bytes {
        let next = storage.base_at(index) + byte as i32;
        if next < 0 || storage.check_at(next as usize) != byte {
            return None;
        }
        index = next as usize;
    }
    Some(index)
}

/// Looks up `key`'s value, following the terminator transition.
pub(crate) fn find_value<V: Clone + 'static>(storage: &dyn Storage<V>, root_index: usize, key: &[u8]) -> Result<Option<V>> {
    let mut terminated = Vec::with_capacity(key.len() + 1);
    terminated.extend_from_slice(key);
    terminated.push(KEY_TERMINATOR);

    let Some(leaf_index) = traverse(storage, root_index, &terminated) else {
        return Ok(None);
    };
    let value_index = storage.base_at(leaf_index);
    storage.value_at(value_index as usize)
}
