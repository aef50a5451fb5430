use std::{future::Future, sync::Arc, time::Duration};

use npq_hash_registry::HashRegistry;
use npq_triple_store::{BrokerSupervisor, RepositoryBroker};
use tokio::{select, signal::unix::SignalKind};
use tokio_util::sync::CancellationToken;

use super::{RuntimeDeps, shutdown};
use crate::error::AppError;

/// Run until SIGINT or SIGTERM, then release every repository.
pub(crate) async fn run(deps: RuntimeDeps) -> Result<(), AppError> {
    let mut sigterm = tokio::signal::unix::signal(SignalKind::terminate())?;
    let signal = async move {
        select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("Received SIGINT, initiating shutdown..."),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating shutdown..."),
        }
    };

    run_until(deps, signal).await;
    Ok(())
}

/// Run until `shutdown_signal` completes. Returns the number of repository
/// handles released.
pub(crate) async fn run_until(deps: RuntimeDeps, shutdown_signal: impl Future<Output = ()>) -> usize {
    let RuntimeDeps {
        broker,
        registry,
        config,
    } = deps;

    // The supervisor owns the broker's shutdown; cancelling its token is the
    // only way repositories get released.
    let supervisor = BrokerSupervisor::spawn(Arc::clone(&broker));

    let warm_up_task = tokio::spawn({
        let cancel = supervisor.token().child_token();
        let enabled = config.warm_up;
        async move {
            if enabled {
                warm_up(&broker, &registry, cancel).await;
            }
        }
    });

    shutdown_signal.await;

    shutdown::graceful_shutdown(shutdown::ShutdownContext {
        supervisor,
        warm_up_task,
        broker_timeout: Duration::from_secs(config.shutdown_timeout_secs),
    })
    .await
}

/// Open the admin repository and load the hash registry, so the first real
/// request does not pay for it. Failures are logged; the next caller retries.
async fn warm_up(broker: &RepositoryBroker, registry: &HashRegistry, cancel: CancellationToken) {
    let warm_up = async {
        let admin = broker.admin_connection().await?;
        tracing::info!(repository = %admin.name(), "Admin repository ready");
        let entries = registry.preload().await?;
        Ok::<_, AppError>(entries)
    };

    select! {
        _ = cancel.cancelled() => tracing::debug!("Warm-up cancelled by shutdown"),
        result = warm_up => match result {
            Ok(entries) => tracing::info!(entries, "Warm-up complete"),
            Err(error) => tracing::warn!(error = %error, "Warm-up failed"),
        },
    }
}
