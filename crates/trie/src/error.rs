use thiserror::Error;

/// Errors surfaced by the storage, builder and trie layers.
///
/// Construction failures leave no partial state: a [`TrieError`] always
/// means the caller gets back `Err`, never a half-built [`crate::Trie`] or
/// [`crate::storage::Storage`].
#[derive(Debug, Error)]
pub enum TrieError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("logic error: {0}")]
    LogicError(String),

    #[error("io failure: {0}")]
    IoFailure(#[from] std::io::Error),

    #[error("format error: {0}")]
    FormatError(String),
}

pub type Result<T> = std::result::Result<T, TrieError>;
