mod runner;
mod shutdown;

use std::sync::Arc;

use npq_hash_registry::HashRegistry;
use npq_triple_store::RepositoryBroker;

use crate::config::RuntimeConfig;

pub(crate) struct RuntimeDeps {
    pub(crate) broker: Arc<RepositoryBroker>,
    pub(crate) registry: Arc<HashRegistry>,
    pub(crate) config: RuntimeConfig,
}

pub(crate) use runner::run;
