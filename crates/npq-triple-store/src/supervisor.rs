use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    RepositoryBroker,
    error::{Result, TripleStoreError},
};

/// Background task owning the broker's shutdown.
///
/// The task waits for termination to be requested and then releases every
/// repository handle, exactly once, no matter how many times termination is
/// requested or from where.
pub struct BrokerSupervisor {
    token: CancellationToken,
    task: JoinHandle<usize>,
}

impl BrokerSupervisor {
    pub fn spawn(broker: Arc<RepositoryBroker>) -> Self {
        Self::spawn_with_token(broker, CancellationToken::new())
    }

    /// Supervise `broker`, shutting it down when `token` is cancelled.
    pub fn spawn_with_token(broker: Arc<RepositoryBroker>, token: CancellationToken) -> Self {
        let task = tokio::spawn({
            let token = token.clone();
            async move {
                token.cancelled().await;
                tracing::info!("Termination requested, releasing repositories");
                broker.shutdown().await
            }
        });

        Self { token, task }
    }

    /// Ask the supervisor to shut the broker down. Idempotent.
    pub fn request_termination(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the shutdown to complete; yields the number of handles closed.
    pub async fn join(self) -> Result<usize> {
        self.task
            .await
            .map_err(|e| TripleStoreError::Other(format!("Broker supervisor task failed: {e}")))
    }
}
