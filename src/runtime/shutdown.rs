use std::time::Duration;

use npq_triple_store::BrokerSupervisor;
use tokio::task::JoinHandle;

const WARM_UP_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub(super) struct ShutdownContext {
    pub(super) supervisor: BrokerSupervisor,
    pub(super) warm_up_task: JoinHandle<()>,
    pub(super) broker_timeout: Duration,
}

/// Ordered shutdown:
/// 1. Request termination (also cancels the warm-up)
/// 2. Wait for the warm-up task to exit
/// 3. Wait for the supervisor to release every repository
pub(super) async fn graceful_shutdown(context: ShutdownContext) -> usize {
    let ShutdownContext {
        supervisor,
        mut warm_up_task,
        broker_timeout,
    } = context;

    tracing::info!("Shutting down gracefully...");

    supervisor.request_termination();

    wait_for_shutdown_task("warm_up", WARM_UP_SHUTDOWN_TIMEOUT, &mut warm_up_task, true).await;

    let released = match tokio::time::timeout(broker_timeout, supervisor.join()).await {
        Ok(Ok(closed)) => {
            tracing::info!(closed, "Repositories released");
            closed
        }
        Ok(Err(error)) => {
            tracing::error!(error = %error, "Broker supervisor failed");
            0
        }
        Err(_) => {
            tracing::warn!(
                timeout_secs = broker_timeout.as_secs(),
                "Shutdown timeout reached while releasing repositories"
            );
            0
        }
    };

    tracing::info!("Shutdown complete");
    released
}

async fn wait_for_shutdown_task(
    task: &str,
    timeout: Duration,
    handle: &mut JoinHandle<()>,
    abort_on_timeout: bool,
) {
    match tokio::time::timeout(timeout, &mut *handle).await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => tracing::error!(
            task,
            error = ?error,
            "Shutdown task panicked"
        ),
        Err(_) if abort_on_timeout => {
            tracing::warn!(
                task,
                timeout_secs = timeout.as_secs(),
                "Shutdown timeout reached, aborting task"
            );
            handle.abort();
            let _ = handle.await;
        }
        Err(_) => tracing::warn!(
            task,
            timeout_secs = timeout.as_secs(),
            "Shutdown timeout reached"
        ),
    }
}
