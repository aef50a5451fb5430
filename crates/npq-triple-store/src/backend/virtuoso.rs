use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{SparqlConnection, backend_error};
use crate::{
    config::TimeoutConfig,
    error::Result,
    sparql::{SelectResult, parse_ask_json, parse_select_json},
};

/// Virtuoso server; every repository endpoint needs the same credentials.
pub struct VirtuosoBackend {
    client: Client,
    endpoint_base: String,
    username: String,
    password: String,
    timeouts: TimeoutConfig,
}

impl VirtuosoBackend {
    pub fn new(
        client: Client,
        endpoint_base: String,
        username: String,
        password: String,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            client,
            endpoint_base,
            username,
            password,
            timeouts,
        }
    }

    /// Uninitialized connection to `<endpoint-base><name>`.
    pub fn connection(&self, name: &str) -> VirtuosoConnection {
        VirtuosoConnection {
            client: self.client.clone(),
            endpoint: format!("{}{}", self.endpoint_base, name),
            username: self.username.clone(),
            password: self.password.clone(),
            handshake_timeout: self.timeouts.connect_timeout(),
        }
    }
}

/// Virtuoso SPARQL protocol endpoint. Queries and updates are both sent as
/// the form-encoded `query` parameter.
pub struct VirtuosoConnection {
    client: Client,
    endpoint: String,
    username: String,
    password: String,
    handshake_timeout: Duration,
}

impl VirtuosoConnection {
    async fn post(&self, sparql: &str, timeout: Duration) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/sparql-results+json")
            .form(&[("query", sparql)])
            .timeout(timeout)
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
impl SparqlConnection for VirtuosoConnection {
    fn backend(&self) -> &'static str {
        "virtuoso"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn initialize(&self) -> Result<()> {
        // Authenticated no-op query; fails fast on bad credentials.
        let body = self.post("ASK {}", self.handshake_timeout).await?;
        parse_ask_json(&body)?;
        tracing::debug!(endpoint = %self.endpoint, "Virtuoso endpoint reachable");
        Ok(())
    }

    async fn select(&self, query: &str, timeout: Duration) -> Result<SelectResult> {
        let body = self.post(query, timeout).await?;
        parse_select_json(&body)
    }

    async fn ask(&self, query: &str, timeout: Duration) -> Result<bool> {
        let body = self.post(query, timeout).await?;
        parse_ask_json(&body)
    }

    async fn update(&self, update: &str, timeout: Duration) -> Result<()> {
        self.post(update, timeout).await.map(|_| ())
    }

    async fn shut_down(&self) -> Result<()> {
        Ok(())
    }
}
