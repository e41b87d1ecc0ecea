//! Maps step keys to candidate entries, and entry pairs to connection
//! costs.

use std::collections::HashMap;

use dartrie::Trie;

use crate::entry::Entry;
use crate::error::{LatticeError, Result};

/// Sentinel cost returned for a connection the vocabulary doesn't know
/// about, chosen so ordinary cost arithmetic never mistakes "unreachable"
/// for a merely-expensive edge.
pub const UNREACHABLE_COST: i32 = i32::MAX;

/// The cost of one `(from, to)` connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub cost: i32,
}

/// Entries table (`step_key -> [entry]`) plus connections table
/// (`(from_key, to_key) -> cost`).
///
/// The entries table is backed by a [`dartrie::Trie`] keyed on the raw
/// step-key bytes rather than a plain hash map, letting the vocabulary
/// dogfood the trie crate this workspace builds.
///
/// Connection identity is by entry *key* only, not by value: the
/// canonical transfer-trains fixture has three distinct entries
/// (`mizuho`/`sakura`/`tsubame`) sharing one key
/// (`Hakata-Tosu-Omuta-Kumamoto`), and the connections table entries for
/// that key carry no value at all — confirming that connections are
/// indexed on the shared key, not the differentiating value.
#[derive(Debug)]
pub struct Vocabulary<V> {
    entries: Trie<Vec<Entry<V>>>,
    connections: HashMap<(Vec<u8>, Vec<u8>), i32>,
}

impl<V: Clone + 'static> Vocabulary<V> {
    /// Builds a vocabulary from `entries` (grouped by step key, in any
    /// order) and `connections` (`(from_key, to_key) -> cost` pairs).
    /// Rejects a step key listed more than once.
    pub fn new(mut entries: Vec<(Vec<u8>, Vec<Entry<V>>)>, connections: Vec<((Vec<u8>, Vec<u8>), i32)>) -> Result<Self> {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for pair in entries.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(LatticeError::InvalidArgument(
                    "a step key must not be listed more than once".to_string(),
                ));
            }
        }

        let trie = Trie::new(&entries)?;
        Ok(Self {
            entries: trie,
            connections: connections.into_iter().collect(),
        })
    }

    /// Every entry registered under `step_key`, or an empty vector if the
    /// vocabulary has none (never errors; [`crate::lattice::Lattice::push_back`]
    /// is what turns "no entries" into an `InvalidArgument`).
    pub fn find_entries(&self, step_key: &[u8]) -> Vec<Entry<V>> {
        self.entries.find(step_key).ok().flatten().unwrap_or_default()
    }

    /// The cost of the `(from_key, to_key)` connection, or
    /// [`UNREACHABLE_COST`] if the vocabulary doesn't list it.
    pub fn find_connection(&self, from_key: &[u8], to_key: &[u8]) -> Connection {
        let cost = self
            .connections
            .get(&(from_key.to_vec(), to_key.to_vec()))
            .copied()
            .unwrap_or(UNREACHABLE_COST);
        Connection { cost }
    }
}
