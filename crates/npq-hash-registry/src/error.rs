use npq_triple_store::error::TripleStoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HashRegistryError {
    /// Admin repository could not be opened, read or written
    #[error(transparent)]
    Store(#[from] TripleStoreError),
}

pub type Result<T> = std::result::Result<T, HashRegistryError>;
