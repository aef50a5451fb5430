//! Typed defaults, the lowest configuration layer.

use npq_triple_store::TripleStoreConfig;

use super::{ConfigRaw, RuntimeConfig};
use crate::logger::{
    DEFAULT_LOG_DIRECTIVES, LogFormat, LoggerConfig, TelemetryConfig, TelemetryMetricsConfig,
};

pub(crate) fn config() -> ConfigRaw {
    ConfigRaw {
        triple_store: TripleStoreConfig::default(),
        runtime: RuntimeConfig {
            warm_up: true,
            shutdown_timeout_secs: 30,
        },
        logger: LoggerConfig {
            level: DEFAULT_LOG_DIRECTIVES.to_string(),
            format: LogFormat::Pretty,
        },
        telemetry: TelemetryConfig {
            metrics: TelemetryMetricsConfig {
                enabled: false,
                bind_address: "0.0.0.0:9464".to_string(),
            },
        },
    }
}
