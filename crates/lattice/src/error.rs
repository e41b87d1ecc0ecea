use thiserror::Error;

/// Errors surfaced by the vocabulary, lattice and N-best layers.
#[derive(Debug, Error)]
pub enum LatticeError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("logic error: {0}")]
    LogicError(String),

    #[error(transparent)]
    Trie(#[from] dartrie::TrieError),
}

pub type Result<T> = std::result::Result<T, LatticeError>;
