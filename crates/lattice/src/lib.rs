mod constraint;
mod entry;
mod error;
mod lattice;
mod nbest;
mod node;
mod vocabulary;

pub use constraint::{Constraint, PatternElement, ANY_STEP};
pub use entry::Entry;
pub use error::{LatticeError, Result};
pub use lattice::Lattice;
pub use nbest::NBestIterator;
pub use node::{Node, NO_PRECEDING};
pub use vocabulary::{Connection, Vocabulary, UNREACHABLE_COST};
