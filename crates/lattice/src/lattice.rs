//! Step-wise node population and best-predecessor tracking.

use tracing::trace;

use crate::error::{LatticeError, Result};
use crate::node::Node;
use crate::vocabulary::Vocabulary;

/// Finds the argmin over `prev_nodes[j].path_cost + edge_costs[j]`, tying
/// to the smallest `j`.
/// Uses `saturating_add` throughout since `UNREACHABLE_COST` is
/// `i32::MAX` and an unreachable predecessor must not wrap around to a
/// negative cost.
fn best_predecessor<V>(prev_nodes: &[Node<V>], edge_costs: &[i32]) -> (usize, i32) {
    let mut best_index = 0;
    let mut best_cost = prev_nodes[0].path_cost.saturating_add(edge_costs[0]);
    for (j, prev) in prev_nodes.iter().enumerate().skip(1) {
        let cost = prev.path_cost.saturating_add(edge_costs[j]);
        if cost < best_cost {
            best_cost = cost;
            best_index = j;
        }
    }
    (best_index, best_cost)
}

/// An ordered sequence of steps, each holding the candidate nodes that
/// consume the same input segment. Step 0 always holds a single BOS node.
pub struct Lattice<V> {
    vocabulary: Vocabulary<V>,
    steps: Vec<Vec<Node<V>>>,
}

impl<V: Clone + 'static> Lattice<V> {
    pub fn new(vocabulary: Vocabulary<V>) -> Self {
        Self {
            vocabulary,
            steps: vec![vec![Node::bos()]],
        }
    }

    /// Appends a new step built from every entry the vocabulary has for
    /// `step_key`. Fails with [`LatticeError::InvalidArgument`] if the
    /// vocabulary has no entries for it.
    pub fn push_back(&mut self, step_key: &[u8]) -> Result<()> {
        let entries = self.vocabulary.find_entries(step_key);
        if entries.is_empty() {
            return Err(LatticeError::InvalidArgument(
                "the vocabulary has no entries for this step key".to_string(),
            ));
        }

        let preceding_step = self.steps.len() - 1;
        let prev_nodes = &self.steps[preceding_step];

        let mut new_nodes = Vec::with_capacity(entries.len());
        for entry in &entries {
            let preceding_edge_costs: Vec<i32> = prev_nodes
                .iter()
                .map(|prev| self.vocabulary.find_connection(&prev.key, &entry.key).cost)
                .collect();
            let (best_preceding_node, best_cost) = best_predecessor(prev_nodes, &preceding_edge_costs);
            let path_cost = best_cost.saturating_add(entry.cost);
            new_nodes.push(Node::from_entry(entry, preceding_step, preceding_edge_costs, best_preceding_node, path_cost));
        }

        trace!(step = self.steps.len(), nodes = new_nodes.len(), "lattice step appended");
        self.steps.push(new_nodes);
        Ok(())
    }

    /// Computes the virtual EOS node over the current last step, without
    /// appending it. Pure: calling this twice with no intervening
    /// `push_back` yields equal results.
    pub fn settle(&self) -> Result<(Node<V>, Vec<i32>)> {
        let preceding_step = self.steps.len() - 1;
        let prev_nodes = &self.steps[preceding_step];

        let preceding_edge_costs: Vec<i32> = prev_nodes
            .iter()
            .map(|prev| self.vocabulary.find_connection(&prev.key, &[]).cost)
            .collect();
        let (best_preceding_node, best_cost) = best_predecessor(prev_nodes, &preceding_edge_costs);
        let eos = Node::eos(preceding_step, preceding_edge_costs.clone(), best_preceding_node, best_cost);

        trace!(path_cost = best_cost, "lattice settled");
        Ok((eos, preceding_edge_costs))
    }

    /// The nodes at step `index`. Out-of-range is a recoverable error.
    pub fn nodes_at(&self, index: usize) -> Result<&[Node<V>]> {
        self.steps
            .get(index)
            .map(Vec::as_slice)
            .ok_or_else(|| LatticeError::InvalidArgument(format!("step index {index} is out of range")))
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry;
    use crate::vocabulary::Vocabulary;

    fn two_step_vocabulary() -> Vocabulary<String> {
        let entries = vec![
            (
                b"A".to_vec(),
                vec![Entry::new(b"ka".to_vec(), "kamome".to_string(), 840)],
            ),
            (
                b"B".to_vec(),
                vec![Entry::new(b"ts".to_vec(), "local813".to_string(), 860)],
            ),
        ];
        let connections = vec![
            ((Vec::new(), b"ka".to_vec()), 800),
            ((b"ka".to_vec(), b"ts".to_vec()), 600),
            ((b"ts".to_vec(), Vec::new()), 500),
        ];
        Vocabulary::new(entries, connections).unwrap()
    }

    #[test]
    fn nodes_at_zero_is_always_a_single_bos() {
        let lattice = Lattice::new(two_step_vocabulary());
        let nodes = lattice.nodes_at(0).unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].is_bos());
        assert_eq!(nodes[0].path_cost, 0);
    }

    #[test]
    fn push_back_computes_path_cost_from_the_single_predecessor() {
        let mut lattice = Lattice::new(two_step_vocabulary());
        lattice.push_back(b"A").unwrap();
        let nodes = lattice.nodes_at(1).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].path_cost, 800 + 840);

        lattice.push_back(b"B").unwrap();
        let nodes = lattice.nodes_at(2).unwrap();
        assert_eq!(nodes[0].path_cost, 800 + 840 + 600 + 860);
    }

    #[test]
    fn settle_is_idempotent() {
        let mut lattice = Lattice::new(two_step_vocabulary());
        lattice.push_back(b"A").unwrap();
        lattice.push_back(b"B").unwrap();
        let (eos1, costs1) = lattice.settle().unwrap();
        let (eos2, costs2) = lattice.settle().unwrap();
        assert_eq!(eos1.path_cost, eos2.path_cost);
        assert_eq!(costs1, costs2);
        assert_eq!(eos1.path_cost, 800 + 840 + 600 + 860 + 500);
    }

    #[test]
    fn push_back_rejects_an_unknown_step_key() {
        let mut lattice = Lattice::new(two_step_vocabulary());
        let err = lattice.push_back(b"nope").unwrap_err();
        assert!(matches!(err, LatticeError::InvalidArgument(_)));
        assert_eq!(lattice.step_count(), 1);
    }

    #[test]
    fn nodes_at_out_of_range_is_recoverable() {
        let lattice = Lattice::new(two_step_vocabulary());
        assert!(lattice.nodes_at(5).is_err());
        assert_eq!(lattice.step_count(), 1);
    }

    #[test]
    fn empty_vocabulary_rejects_push_back_but_settle_still_succeeds() {
        let vocabulary: Vocabulary<u32> = Vocabulary::new(Vec::new(), Vec::new()).unwrap();
        let mut lattice = Lattice::new(vocabulary);
        assert!(lattice.push_back(b"anything").is_err());
        assert_eq!(lattice.step_count(), 1);

        let (eos, _) = lattice.settle().unwrap();
        assert_eq!(eos.path_cost, crate::vocabulary::UNREACHABLE_COST);
    }
}
