//! Process-wide log subscriber and Prometheus exporter.
//!
//! Directives name the broker's crates (`nanopub_query_broker`,
//! `npq_triple_store`, `npq_hash_registry`); a `RUST_LOG` value replaces them
//! wholesale. Broker and registry counters reach Prometheus only when the
//! exporter is enabled.

mod config;

use std::net::SocketAddr;

pub(crate) use config::{
    DEFAULT_LOG_DIRECTIVES, LogFormat, LoggerConfig, TelemetryConfig, TelemetryMetricsConfig,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{
    EnvFilter, filter::ParseError, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

pub(crate) fn initialize(logger_config: &LoggerConfig, telemetry_config: &TelemetryConfig) {
    let (filter, rejected) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, None),
        Err(_) => configured_filter(&logger_config.level),
    };

    install_subscriber(&logger_config.format, filter);

    if let Some(error) = rejected {
        tracing::warn!(
            level = %logger_config.level,
            error = %error,
            fallback = DEFAULT_LOG_DIRECTIVES,
            "Invalid log directives in configuration"
        );
    }

    install_prometheus(&telemetry_config.metrics);
}

/// Filter for the configured directives, or the defaults plus the parse
/// error when they do not parse.
fn configured_filter(level: &str) -> (EnvFilter, Option<ParseError>) {
    match EnvFilter::try_new(level) {
        Ok(filter) => (filter, None),
        Err(error) => (EnvFilter::new(DEFAULT_LOG_DIRECTIVES), Some(error)),
    }
}

fn install_subscriber(format: &LogFormat, filter: EnvFilter) {
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init(),
        // Event fields at the top level, next to `level` and `target`.
        LogFormat::Json => registry
            .with(fmt::layer().json().flatten_event(true))
            .init(),
    }
}

fn install_prometheus(metrics_config: &TelemetryMetricsConfig) {
    if !metrics_config.enabled {
        return;
    }

    let bind_address: SocketAddr = match metrics_config.bind_address.parse() {
        Ok(address) => address,
        Err(error) => {
            tracing::warn!(
                bind_address = %metrics_config.bind_address,
                error = %error,
                "Invalid metrics bind address; broker metrics will not be exported"
            );
            return;
        }
    };

    if let Err(error) = PrometheusBuilder::new()
        .with_http_listener(bind_address)
        .install()
    {
        tracing::warn!(
            bind_address = %bind_address,
            error = %error,
            "Failed to start the Prometheus listener"
        );
        return;
    }
    tracing::info!(bind_address = %bind_address, "Serving broker metrics");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_directives_are_used() {
        let (filter, rejected) = configured_filter("npq_hash_registry=debug");

        assert!(rejected.is_none());
        assert_eq!(filter.to_string(), "npq_hash_registry=debug");
    }

    #[test]
    fn unparsable_directives_fall_back_to_service_targets() {
        let (filter, rejected) = configured_filter("npq_triple_store=loud");

        assert!(rejected.is_some());
        let directives = filter.to_string();
        for target in ["nanopub_query_broker", "npq_triple_store", "npq_hash_registry"] {
            assert!(directives.contains(&format!("{target}=info")), "{directives}");
        }
    }
}
