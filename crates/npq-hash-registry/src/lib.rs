mod codec;
pub mod error;
mod load;
mod lookup;
mod metrics;

use std::sync::Arc;

pub use codec::{Hashable, hash_from_iri, hash_iri, hash_of, sha256_hex};
use dashmap::DashMap;
use npq_triple_store::{RdfValue, RepositoryBroker};
use tokio::sync::{Mutex, OnceCell};

/// Hash Registry
///
/// Maps SHA-256 hashes to the RDF values they were computed from. The mapping
/// is persisted as `<hash-iri> npa:isHashOf <value>` triples in the admin
/// graph of the admin repository and mirrored in memory. The mirror is filled
/// by one full scan of the admin graph on first use and only grows afterwards.
pub struct HashRegistry {
    broker: Arc<RepositoryBroker>,
    entries: DashMap<String, RdfValue>,
    loaded: OnceCell<()>,
    /// Serializes writes so each hash is persisted at most once.
    insert_gate: Mutex<()>,
}

impl HashRegistry {
    pub fn new(broker: Arc<RepositoryBroker>) -> Self {
        Self {
            broker,
            entries: DashMap::new(),
            loaded: OnceCell::new(),
            insert_gate: Mutex::new(()),
        }
    }

    /// Number of cached entries. Zero until the registry has been loaded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `hash` is cached, without triggering a load.
    pub fn contains(&self, hash: &str) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }
}

#[cfg(test)]
mod tests;
