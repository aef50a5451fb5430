//! In-memory connectors and provisioners for tests.
//!
//! [`MemoryConnector`] serves every repository name from its own in-memory
//! Oxigraph store, so data written through one handle is visible to handles
//! opened later for the same name (as it would be on a real server).

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use oxigraph::{
    model::Term,
    sparql::{QueryResults, SparqlEvaluator},
    store::Store,
};

use crate::{
    backend::{RepositoryConnector, SparqlConnection},
    error::{Result, TripleStoreError},
    provision::{ProvisionOutcome, RepositoryProvisioner},
    sparql::{SelectResult, SelectRow},
    value::RdfValue,
};

/// Per-repository call counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStats {
    pub opens: usize,
    pub selects: usize,
    pub asks: usize,
    pub updates: usize,
    pub shutdowns: usize,
}

#[derive(Default)]
struct MemoryState {
    stores: HashMap<String, Store>,
    stats: HashMap<String, ConnectionStats>,
    failing: HashSet<String>,
}

/// Connector backed by in-memory Oxigraph stores, one per repository name.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    state: Arc<Mutex<MemoryState>>,
    open_delay: Duration,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every `open`, to widen race windows in concurrency tests.
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    /// Make `open(name)` fail until [`MemoryConnector::recover`] is called.
    pub fn fail_opens_for(&self, name: &str) {
        self.lock().failing.insert(name.to_string());
    }

    pub fn recover(&self, name: &str) {
        self.lock().failing.remove(name);
    }

    pub fn stats(&self, name: &str) -> ConnectionStats {
        self.lock().stats.get(name).copied().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn bump(&self, name: &str, f: impl FnOnce(&mut ConnectionStats)) {
        f(self.lock().stats.entry(name.to_string()).or_default());
    }
}

#[async_trait]
impl RepositoryConnector for MemoryConnector {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn open(&self, name: &str) -> Result<Box<dyn SparqlConnection>> {
        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }

        let store = {
            let mut state = self.lock();
            if state.failing.contains(name) {
                return Err(TripleStoreError::Backend {
                    status: 404,
                    message: format!("Unknown repository: {name}"),
                });
            }
            match state.stores.get(name) {
                Some(store) => store.clone(),
                None => {
                    let store = Store::new().map_err(|e| {
                        TripleStoreError::Other(format!("Failed to create in-memory store: {e}"))
                    })?;
                    state.stores.insert(name.to_string(), store.clone());
                    store
                }
            }
        };
        self.bump(name, |stats| stats.opens += 1);

        Ok(Box::new(MemoryConnection {
            name: name.to_string(),
            endpoint: format!("memory://{name}"),
            store,
            connector: self.clone(),
        }))
    }
}

/// SPARQL connection evaluating queries with Oxigraph.
pub struct MemoryConnection {
    name: String,
    endpoint: String,
    store: Store,
    connector: MemoryConnector,
}

impl MemoryConnection {
    /// Run `query` on the blocking pool, converting the results to owned data
    /// before they leave the closure.
    async fn evaluate<T, F>(&self, query: &str, convert: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(QueryResults<'_>) -> Result<T> + Send + 'static,
    {
        let prepared = SparqlEvaluator::new().parse_query(query).map_err(|e| {
            TripleStoreError::InvalidQuery {
                reason: format!("Failed to parse SPARQL query: {e}"),
            }
        })?;
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            let results = prepared
                .on_store(&store)
                .execute()
                .map_err(|e| TripleStoreError::Other(format!("SPARQL query failed: {e}")))?;
            convert(results)
        })
        .await
        .map_err(|e| TripleStoreError::Other(format!("Task join error: {e}")))?
    }
}

#[async_trait]
impl SparqlConnection for MemoryConnection {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn select(&self, query: &str, _timeout: Duration) -> Result<SelectResult> {
        self.connector.bump(&self.name, |stats| stats.selects += 1);
        self.evaluate(query, solutions_to_select).await
    }

    async fn ask(&self, query: &str, _timeout: Duration) -> Result<bool> {
        self.connector.bump(&self.name, |stats| stats.asks += 1);
        self.evaluate(query, |results| match results {
            QueryResults::Boolean(value) => Ok(value),
            _ => Err(TripleStoreError::Other(
                "Expected ASK to return boolean result".to_string(),
            )),
        })
        .await
    }

    async fn update(&self, update: &str, _timeout: Duration) -> Result<()> {
        self.connector.bump(&self.name, |stats| stats.updates += 1);
        let prepared = SparqlEvaluator::new().parse_update(update).map_err(|e| {
            TripleStoreError::InvalidQuery {
                reason: format!("Failed to parse SPARQL UPDATE: {e}"),
            }
        })?;
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            prepared
                .on_store(&store)
                .execute()
                .map_err(|e| TripleStoreError::Other(format!("SPARQL UPDATE failed: {e}")))
        })
        .await
        .map_err(|e| TripleStoreError::Other(format!("Task join error: {e}")))?
    }

    async fn shut_down(&self) -> Result<()> {
        self.connector.bump(&self.name, |stats| stats.shutdowns += 1);
        Ok(())
    }
}

fn solutions_to_select(results: QueryResults<'_>) -> Result<SelectResult> {
    let QueryResults::Solutions(solutions) = results else {
        return Err(TripleStoreError::Other(
            "Expected SELECT to return solutions".to_string(),
        ));
    };
    let variables = solutions
        .variables()
        .iter()
        .map(|v| v.as_str().to_string())
        .collect();
    let mut rows = Vec::new();
    for solution in solutions {
        let solution = solution
            .map_err(|e| TripleStoreError::Other(format!("Failed to read solution: {e}")))?;
        let mut row = SelectRow::default();
        for (variable, term) in solution.iter() {
            row.bindings
                .insert(variable.as_str().to_string(), term_to_value(term)?);
        }
        rows.push(row);
    }
    Ok(SelectResult { variables, rows })
}

fn term_to_value(term: &Term) -> Result<RdfValue> {
    match term {
        Term::NamedNode(node) => Ok(RdfValue::Iri(node.as_str().to_string())),
        Term::BlankNode(node) => Ok(RdfValue::BlankNode(node.as_str().to_string())),
        Term::Literal(literal) => Ok(RdfValue::from_literal_parts(
            literal.value().to_string(),
            Some(literal.datatype().as_str().to_string()),
            literal.language().map(str::to_string),
        )),
        #[allow(unreachable_patterns)]
        other => Err(TripleStoreError::ParseError {
            reason: format!("unsupported term {other}"),
        }),
    }
}

/// Provisioner that behaves like an RDF4J administration endpoint: the first
/// PUT for a name creates it, later ones conflict. Can be switched to reject
/// or fail every request.
#[derive(Clone, Default)]
pub struct RecordingProvisioner {
    inner: Arc<Mutex<ProvisionerState>>,
}

#[derive(Default)]
struct ProvisionerState {
    existing: HashSet<String>,
    calls: Vec<String>,
    forced: Option<ProvisionOutcome>,
}

impl RecordingProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request with `outcome`.
    pub fn always(outcome: ProvisionOutcome) -> Self {
        let provisioner = Self::default();
        provisioner.lock().forced = Some(outcome);
        provisioner
    }

    /// Names provisioned so far, in call order, including repeats.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn calls_for(&self, name: &str) -> usize {
        self.lock().calls.iter().filter(|n| *n == name).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProvisionerState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RepositoryProvisioner for RecordingProvisioner {
    async fn provision(&self, name: &str) -> ProvisionOutcome {
        let mut state = self.lock();
        state.calls.push(name.to_string());
        if let Some(outcome) = &state.forced {
            return outcome.clone();
        }
        if state.existing.insert(name.to_string()) {
            ProvisionOutcome::Created
        } else {
            ProvisionOutcome::AlreadyExists
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[tokio::test]
    async fn memory_connection_answers_select_and_ask() {
        let connector = MemoryConnector::new();
        let connection = connector.open("repo").await.unwrap();
        let timeout = Duration::from_secs(5);

        connection
            .update(
                "INSERT DATA { <http://example.org/s> <http://example.org/p> \"o\"@en }",
                timeout,
            )
            .await
            .unwrap();

        // Results cross the blocking pool on a multi-threaded runtime.
        let result = tokio::spawn(async move {
            let select = connection
                .select("SELECT ?s ?o WHERE { ?s ?p ?o }", timeout)
                .await
                .unwrap();
            let ask = connection
                .ask("ASK { ?s <http://example.org/p> ?o }", timeout)
                .await
                .unwrap();
            (select, ask)
        })
        .await
        .unwrap();
        let (select, ask) = result;

        assert!(ask);
        assert_eq!(select.variables, vec!["s".to_string(), "o".to_string()]);
        assert_eq!(select.rows.len(), 1);
        assert_eq!(
            select.rows[0].bindings.get("o"),
            Some(&RdfValue::lang_literal("o", "en"))
        );
        assert_eq!(connector.stats("repo").selects, 1);
        assert_eq!(connector.stats("repo").asks, 1);
    }

    #[tokio::test]
    async fn memory_connection_rejects_wrong_query_form() {
        let connection = MemoryConnector::new().open("repo").await.unwrap();
        let timeout = Duration::from_secs(5);

        assert!(connection.ask("SELECT * WHERE { ?s ?p ?o }", timeout).await.is_err());
        assert!(connection.select("ASK { ?s ?p ?o }", timeout).await.is_err());
    }
}
