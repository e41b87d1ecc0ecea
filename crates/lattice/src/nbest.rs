//! Lazy enumeration of whole paths in increasing path-cost order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::constraint::Constraint;
use crate::error::Result;
use crate::lattice::Lattice;
use crate::node::Node;

/// A partially-expanded path: `tail_path` runs from some interior node
/// back to EOS (in reverse, i.e. EOS first), `tail_path_cost` is its cost
/// not counting anything before its first (oldest considered) node, and
/// `whole_path_cost` is the total cost the eventual whole path will have
/// once this tail is completed via its best remaining predecessors.
///
/// Ordered by `whole_path_cost` ascending so a [`BinaryHeap`] (a max-heap)
/// pops the cheapest cap first.
struct Cap<V> {
    tail_path: Vec<Node<V>>,
    tail_path_cost: i32,
    whole_path_cost: i32,
}

impl<V> Cap<V> {
    fn new(tail_path: Vec<Node<V>>, tail_path_cost: i32, whole_path_cost: i32) -> Self {
        Self {
            tail_path,
            tail_path_cost,
            whole_path_cost,
        }
    }
}

impl<V> PartialEq for Cap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.whole_path_cost == other.whole_path_cost
    }
}

impl<V> Eq for Cap<V> {}

impl<V> PartialOrd for Cap<V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V> Ord for Cap<V> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.whole_path_cost.cmp(&self.whole_path_cost)
    }
}

/// Walks `opened`'s tail back to BOS along best predecessors, returning
/// the completed path (EOS-first, i.e. reverse of traversal order). Also
/// pushes one new cap per non-best predecessor encountered along the way
/// onto `caps`, so a later call can resume from any point this walk
/// passed over.
fn make_whole_path<V: Clone>(lattice: &Lattice<V>, opened: &Cap<V>, caps: &mut BinaryHeap<Cap<V>>) -> Result<Vec<Node<V>>> {
    let mut path = opened.tail_path.clone();
    let mut tail_path_cost = opened.tail_path_cost;
    let mut current = path
        .last()
        .cloned()
        .expect("a cap always carries at least its starting node");

    while !current.is_bos() {
        let preceding_nodes = lattice.nodes_at(current.preceding_step)?;

        for (i, preceding_node) in preceding_nodes.iter().enumerate() {
            if i == current.best_preceding_node {
                continue;
            }
            let mut cap_tail_path = path.clone();
            cap_tail_path.push(preceding_node.clone());
            let preceding_edge_cost = current.preceding_edge_costs[i];
            let cap_tail_path_cost = tail_path_cost
                .saturating_add(preceding_edge_cost)
                .saturating_add(preceding_node.node_cost);
            let cap_whole_path_cost = tail_path_cost
                .saturating_add(preceding_edge_cost)
                .saturating_add(preceding_node.path_cost);
            caps.push(Cap::new(cap_tail_path, cap_tail_path_cost, cap_whole_path_cost));
        }

        let best_preceding_edge_cost = current.preceding_edge_costs[current.best_preceding_node];
        let best_preceding_node = preceding_nodes[current.best_preceding_node].clone();
        tail_path_cost = tail_path_cost
            .saturating_add(best_preceding_edge_cost)
            .saturating_add(best_preceding_node.node_cost);
        path.push(best_preceding_node.clone());
        current = best_preceding_node;
    }

    Ok(path)
}

/// Enumerates whole paths (BOS..EOS, in order) over a settled lattice, in
/// non-decreasing total-cost order, filtering out any path that doesn't
/// satisfy the given [`Constraint`] (per spec.md §4.6, the constraint is
/// optional — `None` yields every path, with no pattern to match against).
pub struct NBestIterator<'a, V> {
    lattice: &'a Lattice<V>,
    caps: BinaryHeap<Cap<V>>,
    constraint: Option<Constraint<V>>,
}

impl<'a, V: Clone> NBestIterator<'a, V> {
    /// `eos_node` should be the node returned by [`Lattice::settle`].
    /// `constraint` of `None` means unconstrained enumeration over every
    /// BOS..EOS path.
    pub fn new(lattice: &'a Lattice<V>, eos_node: Node<V>, constraint: Option<Constraint<V>>) -> Self {
        let tail_path_cost = eos_node.node_cost;
        let whole_path_cost = eos_node.path_cost;
        let mut caps = BinaryHeap::new();
        caps.push(Cap::new(vec![eos_node], tail_path_cost, whole_path_cost));
        Self { lattice, caps, constraint }
    }

    /// Whether another call to `next()` could still produce a path. Not
    /// exact when a constraint is in effect: some of the remaining caps
    /// may all fail to match, in which case the true answer is "no" but
    /// this still reports "yes" until those caps are actually expanded.
    pub fn has_next(&self) -> bool {
        !self.caps.is_empty()
    }
}

impl<'a, V: Clone + PartialEq + 'static> Iterator for NBestIterator<'a, V> {
    type Item = Result<Vec<Node<V>>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let opened = self.caps.pop()?;
            let path = match make_whole_path(self.lattice, &opened, &mut self.caps) {
                Ok(path) => path,
                Err(err) => return Some(Err(err)),
            };
            let mut whole_path = path;
            whole_path.reverse();
            let matches = self.constraint.as_ref().map_or(true, |c| c.matches(&whole_path));
            if matches {
                return Some(Ok(whole_path));
            }
        }
    }
}
