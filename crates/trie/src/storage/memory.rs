use std::cell::RefCell;

use super::{pack_cell, unpack_base, unpack_check, Storage, VACANT_CELL, VACANT_CHECK};
use crate::error::Result;
use crate::value::ValueSerializer;

/// Fully owned, fully mutable BASE/CHECK array and value table.
///
/// The BASE/CHECK array and the value table are each a `RefCell<Vec<_>>`
/// so that every [`Storage`] method can take `&self`.
#[derive(Debug)]
pub struct MemoryStorage<V> {
    cells: RefCell<Vec<i32>>,
    values: RefCell<Vec<Option<V>>>,
}

impl<V: Clone> MemoryStorage<V> {
    pub fn new() -> Self {
        Self {
            cells: RefCell::new(Vec::new()),
            values: RefCell::new(Vec::new()),
        }
    }

    fn ensure_cells_len(&self, len: usize) {
        let mut cells = self.cells.borrow_mut();
        if cells.len() < len {
            cells.resize(len, VACANT_CELL);
        }
    }
}

impl<V: Clone + 'static> Storage<V> for MemoryStorage<V> {
    fn base_at(&self, index: usize) -> i32 {
        self.cells
            .borrow()
            .get(index)
            .map(|&cell| unpack_base(cell))
            .unwrap_or(0)
    }

    fn set_base_at(&self, index: usize, base: i32) -> Result<()> {
        self.ensure_cells_len(index + 1);
        let mut cells = self.cells.borrow_mut();
        let check = unpack_check(cells[index]);
        cells[index] = pack_cell(base, check);
        Ok(())
    }

    fn check_at(&self, index: usize) -> u8 {
        self.cells
            .borrow()
            .get(index)
            .map(|&cell| unpack_check(cell))
            .unwrap_or(VACANT_CHECK)
    }

    fn set_check_at(&self, index: usize, check: u8) -> Result<()> {
        self.ensure_cells_len(index + 1);
        let mut cells = self.cells.borrow_mut();
        let base = unpack_base(cells[index]);
        cells[index] = pack_cell(base, check);
        Ok(())
    }

    fn base_check_size(&self) -> usize {
        self.cells.borrow().len()
    }

    fn value_at(&self, index: usize) -> Result<Option<V>> {
        Ok(self.values.borrow().get(index).cloned().flatten())
    }

    fn add_value_at(&self, index: usize, value: V) -> Result<()> {
        let mut values = self.values.borrow_mut();
        if values.len() <= index {
            values.resize(index + 1, None);
        }
        values[index] = Some(value);
        Ok(())
    }

    fn value_count(&self) -> usize {
        self.values.borrow().len()
    }

    fn filling_rate(&self) -> f64 {
        let cells = self.cells.borrow();
        if cells.is_empty() {
            return 0.0;
        }
        let filled = cells
            .iter()
            .filter(|&&cell| unpack_check(cell) != VACANT_CHECK)
            .count();
        filled as f64 / cells.len() as f64
    }

    fn serialize(&self, sink: &mut dyn std::io::Write, value_serializer: &dyn ValueSerializer<V>) -> Result<()> {
        let cells = self.cells.borrow();
        let values = self.values.borrow();
        let encoded = values.iter().enumerate().filter_map(|(index, value)| {
            value
                .as_ref()
                .map(|v| (index as u32, value_serializer.serialize(v)))
        });
        crate::serial::write_image(sink, &cells, value_serializer.fixed_size(), encoded)
    }

    fn clone_storage(&self) -> Box<dyn Storage<V>> {
        Box::new(MemoryStorage {
            cells: RefCell::new(self.cells.borrow().clone()),
            values: RefCell::new(self.values.borrow().clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_on_write_and_reports_vacant_by_default() {
        let storage: MemoryStorage<u32> = MemoryStorage::new();
        assert_eq!(storage.base_check_size(), 0);
        assert_eq!(storage.check_at(5), VACANT_CHECK);

        storage.set_check_at(5, 7).unwrap();
        assert_eq!(storage.base_check_size(), 6);
        assert_eq!(storage.check_at(5), 7);
        assert_eq!(storage.base_at(5), 0);
    }

    #[test]
    fn base_and_check_share_a_cell_independently() {
        let storage: MemoryStorage<u32> = MemoryStorage::new();
        storage.set_base_at(2, -100).unwrap();
        storage.set_check_at(2, 9).unwrap();
        assert_eq!(storage.base_at(2), -100);
        assert_eq!(storage.check_at(2), 9);
    }

    #[test]
    fn filling_rate_tracks_occupied_cells() {
        let storage: MemoryStorage<u32> = MemoryStorage::new();
        storage.set_check_at(0, 1).unwrap();
        storage.set_check_at(1, VACANT_CHECK).unwrap();
        assert_eq!(storage.filling_rate(), 0.5);
    }

    #[test]
    fn values_support_out_of_order_writes() {
        let storage: MemoryStorage<u32> = MemoryStorage::new();
        storage.add_value_at(3, 30).unwrap();
        storage.add_value_at(1, 10).unwrap();
        assert_eq!(storage.value_at(1).unwrap(), Some(10));
        assert_eq!(storage.value_at(3).unwrap(), Some(30));
        assert_eq!(storage.value_at(2).unwrap(), None);
        storage.add_value_at(1, 11).unwrap();
        assert_eq!(storage.value_at(1).unwrap(), Some(11));
    }
}
