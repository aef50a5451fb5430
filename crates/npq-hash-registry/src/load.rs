use std::time::Instant;

use npq_triple_store::{
    sparql_iri,
    vocab::{ADMIN_GRAPH, IS_HASH_OF},
};

use crate::{HashRegistry, codec::hash_from_iri, error::Result, metrics};

impl HashRegistry {
    /// Load the cache from the admin graph if that has not happened yet.
    /// Returns the number of cached entries.
    pub async fn preload(&self) -> Result<usize> {
        self.ensure_loaded().await?;
        Ok(self.len())
    }

    pub(crate) async fn ensure_loaded(&self) -> Result<()> {
        // A failed scan leaves the cell empty; the next caller retries.
        self.loaded.get_or_try_init(|| self.load()).await?;
        Ok(())
    }

    async fn load(&self) -> Result<()> {
        let started = Instant::now();
        let result = self.scan_admin_graph().await;
        metrics::record_load(result.is_ok(), self.len(), started.elapsed());

        match &result {
            Ok(skipped) => tracing::info!(
                entries = self.len(),
                skipped,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Hash registry loaded"
            ),
            Err(error) => tracing::error!(error = %error, "Failed to load hash registry"),
        }
        result.map(|_| ())
    }

    /// Returns the number of triples skipped for not naming a hash.
    async fn scan_admin_graph(&self) -> Result<usize> {
        let admin = self.broker.admin_connection().await?;
        let query = format!(
            "SELECT ?s ?o WHERE {{ GRAPH {graph} {{ ?s {predicate} ?o }} }}",
            graph = sparql_iri(ADMIN_GRAPH)?,
            predicate = sparql_iri(IS_HASH_OF)?,
        );
        let result = admin.select(&query).await?;

        let mut skipped = 0;
        for mut row in result.rows {
            let (Some(subject), Some(object)) = (row.bindings.remove("s"), row.bindings.remove("o"))
            else {
                skipped += 1;
                continue;
            };
            let Some(hash) = subject.is_iri().then(|| hash_from_iri(subject.as_str())).flatten()
            else {
                tracing::warn!(subject = %subject, "Skipping isHashOf triple without a hash subject");
                skipped += 1;
                continue;
            };
            self.entries.entry(hash.to_string()).or_insert(object);
        }
        Ok(skipped)
    }
}
