use npq_triple_store::{BackendKind, TripleStoreConfig};
use serde::{Deserialize, Serialize};

use crate::{
    config::ConfigError,
    logger::{LoggerConfig, TelemetryConfig},
};

/// Configuration as read from defaults, files and the environment.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigRaw {
    pub triple_store: TripleStoreConfig,
    pub runtime: RuntimeConfig,
    pub logger: LoggerConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct RuntimeConfig {
    /// Open the admin repository and load the hash registry at startup.
    pub warm_up: bool,
    /// How long to wait for repositories to be released on shutdown.
    pub shutdown_timeout_secs: u64,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub backend: BackendKind,
    pub triple_store: TripleStoreConfig,
    pub runtime: RuntimeConfig,
    pub logger: LoggerConfig,
    pub telemetry: TelemetryConfig,
}

impl ConfigRaw {
    pub(crate) fn resolve(self) -> Result<Config, ConfigError> {
        let backend = self
            .triple_store
            .backend_kind()
            .map_err(|error| ConfigError::InvalidConfig(error.to_string()))?;

        if backend == BackendKind::Virtuoso && self.triple_store.credentials().is_none() {
            return Err(ConfigError::MissingSecret(
                "USERNAME and PASSWORD are required for the virtuoso backend".to_string(),
            ));
        }
        if self.triple_store.endpoint_base.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "triple_store.endpoint_base must not be empty".to_string(),
            ));
        }

        Ok(Config {
            backend,
            triple_store: self.triple_store,
            runtime: self.runtime,
            logger: self.logger,
            telemetry: self.telemetry,
        })
    }
}
