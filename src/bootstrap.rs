use std::sync::Arc;

use npq_hash_registry::HashRegistry;
use npq_triple_store::RepositoryBroker;

use crate::{
    config::{self, Config},
    error::AppError,
};

pub(crate) struct CoreBootstrap {
    pub(crate) config: Arc<Config>,
    pub(crate) broker: Arc<RepositoryBroker>,
    pub(crate) registry: Arc<HashRegistry>,
}

/// Load configuration, start logging and build the broker and registry.
/// No network call happens here.
pub(crate) fn build_core() -> Result<CoreBootstrap, AppError> {
    let config = config::initialize_configuration()?;
    crate::logger::initialize(&config.logger, &config.telemetry);

    let (broker, registry) = build_services(&config)?;

    Ok(CoreBootstrap {
        config: Arc::new(config),
        broker,
        registry,
    })
}

pub(crate) fn build_services(
    config: &Config,
) -> Result<(Arc<RepositoryBroker>, Arc<HashRegistry>), AppError> {
    let broker = Arc::new(RepositoryBroker::new(&config.triple_store)?);
    let registry = Arc::new(HashRegistry::new(Arc::clone(&broker)));
    Ok((broker, registry))
}
