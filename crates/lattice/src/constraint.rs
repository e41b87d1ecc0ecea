//! Path constraints: a pattern of pinned nodes and wildcards that an
//! enumerated path must match.

use crate::node::Node;

/// A wildcard that must consume exactly `preceding_step_count` preceding
/// steps, or any number of them when pinned to [`ANY_STEP`].
pub const ANY_STEP: usize = usize::MAX;

/// One element of a constraint pattern.
#[derive(Debug, Clone)]
pub enum PatternElement<V> {
    /// The path must contain this exact node (matched by key and value).
    NodePin(Node<V>),
    /// The path may skip an arbitrary run of nodes here. `ANY_STEP` means
    /// "consume as many as needed"; any other value is not currently
    /// produced by this crate but is accepted for forward compatibility
    /// with a future precise step-bound computation.
    Wildcard(usize),
}

/// An ordered sequence of [`PatternElement`]s a whole path (BOS..EOS) must
/// satisfy.
///
/// Matching is a plain backtracking search over every way the wildcards
/// can split the path: this is a deliberate simplification over computing
/// each wildcard's exact span up front, since it doesn't need a node's
/// absolute step index to decide whether a pattern matches. It is
/// adequate for every scenario this crate needs to support, at the cost
/// of exponential blowup for pathological patterns with many adjacent
/// wildcards — not a concern for the small, hand-authored constraints
/// this crate expects.
pub struct Constraint<V> {
    pattern: Vec<PatternElement<V>>,
}

impl<V: PartialEq> Constraint<V> {
    pub fn new(pattern: Vec<PatternElement<V>>) -> Self {
        Self { pattern }
    }

    /// Whether `path` (a whole BOS..EOS path, in order) satisfies this
    /// constraint.
    pub fn matches(&self, path: &[Node<V>]) -> bool {
        matches_from(&self.pattern, path)
    }
}

fn node_matches<V: PartialEq>(pin: &Node<V>, candidate: &Node<V>) -> bool {
    pin.key == candidate.key && pin.value == candidate.value
}

fn matches_from<V: PartialEq>(pattern: &[PatternElement<V>], path: &[Node<V>]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((PatternElement::NodePin(pin), rest)) => match path.split_first() {
            Some((head, tail)) if node_matches(pin, head) => matches_from(rest, tail),
            _ => false,
        },
        Some((PatternElement::Wildcard(_), rest)) => {
            for split in 0..=path.len() {
                if matches_from(rest, &path[split..]) {
                    return true;
                }
            }
            false
        }
    }
}
