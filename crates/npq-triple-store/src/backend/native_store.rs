use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{SparqlConnection, backend_error};
use crate::{
    config::TimeoutConfig,
    error::Result,
    sparql::{SelectResult, parse_ask_json, parse_select_json},
};

/// RDF4J server hosting native-store repositories.
pub struct NativeStoreBackend {
    client: Client,
    endpoint_base: String,
    timeouts: TimeoutConfig,
}

impl NativeStoreBackend {
    pub fn new(client: Client, endpoint_base: String, timeouts: TimeoutConfig) -> Self {
        Self {
            client,
            endpoint_base,
            timeouts,
        }
    }

    /// Uninitialized connection to `<endpoint-base><name>`.
    pub fn connection(&self, name: &str) -> NativeStoreConnection {
        NativeStoreConnection {
            client: self.client.clone(),
            endpoint: format!("{}{}", self.endpoint_base, name),
            handshake_timeout: self.timeouts.connect_timeout(),
        }
    }
}

/// RDF4J repository protocol: queries on the repository URL, updates on
/// `/statements`.
pub struct NativeStoreConnection {
    client: Client,
    endpoint: String,
    handshake_timeout: Duration,
}

impl NativeStoreConnection {
    fn statements_endpoint(&self) -> String {
        format!("{}/statements", self.endpoint)
    }

    async fn query(&self, query: &str, timeout: Duration) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/sparql-query")
            .header("Accept", "application/sparql-results+json")
            .timeout(timeout)
            .body(query.to_string())
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.text().await?)
        } else {
            Err(backend_error(response).await)
        }
    }
}

#[async_trait]
impl SparqlConnection for NativeStoreConnection {
    fn backend(&self) -> &'static str {
        "native-store"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn initialize(&self) -> Result<()> {
        // The size resource exists for every repository, so it doubles as a
        // cheap existence check.
        let response = self
            .client
            .get(format!("{}/size", self.endpoint))
            .timeout(self.handshake_timeout)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::debug!(endpoint = %self.endpoint, "Native store repository reachable");
            Ok(())
        } else {
            Err(backend_error(response).await)
        }
    }

    async fn select(&self, query: &str, timeout: Duration) -> Result<SelectResult> {
        let body = self.query(query, timeout).await?;
        parse_select_json(&body)
    }

    async fn ask(&self, query: &str, timeout: Duration) -> Result<bool> {
        let body = self.query(query, timeout).await?;
        parse_ask_json(&body)
    }

    async fn update(&self, update: &str, timeout: Duration) -> Result<()> {
        let response = self
            .client
            .post(self.statements_endpoint())
            .header("Content-Type", "application/sparql-update")
            .timeout(timeout)
            .body(update.to_string())
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(backend_error(response).await)
        }
    }

    async fn shut_down(&self) -> Result<()> {
        // Stateless over HTTP; pooled sockets are released with the client.
        Ok(())
    }
}
