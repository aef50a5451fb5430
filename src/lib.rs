mod bootstrap;
mod config;
mod error;
mod logger;
mod runtime;

pub use config::ConfigError;
pub use error::AppError;

pub async fn run() -> Result<(), AppError> {
    let bootstrap::CoreBootstrap {
        config,
        broker,
        registry,
    } = bootstrap::build_core()?;

    display_banner(&config);

    runtime::run(runtime::RuntimeDeps {
        broker,
        registry,
        config: config.runtime.clone(),
    })
    .await
}

fn display_banner(config: &config::Config) {
    tracing::info!("======================================================");
    tracing::info!(
        "             Nanopub Query Broker v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("======================================================");
    tracing::info!(
        backend = %config.backend,
        endpoint_base = %config.triple_store.endpoint_base,
        admin_base = %config.triple_store.admin_base,
        on_rejected = ?config.triple_store.provisioning.on_rejected,
        "Triple store configured"
    );
}
