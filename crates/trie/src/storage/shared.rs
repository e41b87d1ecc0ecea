use std::rc::Rc;

use super::{MemoryStorage, Storage};
use crate::error::Result;
use crate::value::ValueSerializer;

/// Same semantics as [`MemoryStorage`], except `clone_storage` returns an
/// alias: every clone shares the same backing arrays through an `Rc`, so a
/// write through one clone is visible through all the others.
///
/// Single-threaded by design: an `Rc` is the idiomatic choice here, not an
/// `Arc` — nothing in this crate hands a trie across threads.
pub struct SharedStorage<V> {
    inner: Rc<MemoryStorage<V>>,
}

impl<V: Clone> SharedStorage<V> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(MemoryStorage::new()),
        }
    }
}

impl<V: Clone> Default for SharedStorage<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for SharedStorage<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V: Clone + 'static> Storage<V> for SharedStorage<V> {
    fn base_at(&self, index: usize) -> i32 {
        self.inner.base_at(index)
    }

    fn set_base_at(&self, index: usize, base: i32) -> Result<()> {
        self.inner.set_base_at(index, base)
    }

    fn check_at(&self, index: usize) -> u8 {
        self.inner.check_at(index)
    }

    fn set_check_at(&self, index: usize, check: u8) -> Result<()> {
        self.inner.set_check_at(index, check)
    }

    fn base_check_size(&self) -> usize {
        self.inner.base_check_size()
    }

    fn value_at(&self, index: usize) -> Result<Option<V>> {
        self.inner.value_at(index)
    }

    fn add_value_at(&self, index: usize, value: V) -> Result<()> {
        self.inner.add_value_at(index, value)
    }

    fn value_count(&self) -> usize {
        self.inner.value_count()
    }

    fn filling_rate(&self) -> f64 {
        self.inner.filling_rate()
    }

    fn serialize(&self, sink: &mut dyn std::io::Write, value_serializer: &dyn ValueSerializer<V>) -> Result<()> {
        self.inner.serialize(sink, value_serializer)
    }

    fn clone_storage(&self) -> Box<dyn Storage<V>> {
        Box::new(self.clone())
    }
}
