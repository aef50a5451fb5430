//! Single-pattern lookups used by the admin bookkeeping code.

use crate::{
    RepositoryHandle,
    error::Result,
    value::{RdfValue, sparql_iri},
};

impl RepositoryHandle {
    /// First object of `subject predicate ?o` inside `graph`, if any.
    pub async fn object_for_pattern(
        &self,
        graph: &str,
        subject: &str,
        predicate: &str,
    ) -> Result<Option<RdfValue>> {
        let query = pattern_query(graph, subject, predicate, Some(1))?;
        let result = self.select(&query).await?;

        Ok(result
            .rows
            .into_iter()
            .find_map(|mut row| row.bindings.remove("o")))
    }

    /// All objects of `subject predicate ?o` inside `graph`; empty if none.
    pub async fn objects_for_pattern(
        &self,
        graph: &str,
        subject: &str,
        predicate: &str,
    ) -> Result<Vec<RdfValue>> {
        let query = pattern_query(graph, subject, predicate, None)?;
        let result = self.select(&query).await?;

        Ok(result.column("o"))
    }
}

fn pattern_query(
    graph: &str,
    subject: &str,
    predicate: &str,
    limit: Option<usize>,
) -> Result<String> {
    let graph = sparql_iri(graph)?;
    let subject = sparql_iri(subject)?;
    let predicate = sparql_iri(predicate)?;
    let limit = limit.map(|n| format!(" LIMIT {n}")).unwrap_or_default();

    Ok(format!(
        "SELECT ?o WHERE {{ GRAPH {graph} {{ {subject} {predicate} ?o }} }}{limit}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_bounded_query() {
        let query = pattern_query("http://g", "http://s", "http://p", Some(1)).unwrap();
        assert_eq!(
            query,
            "SELECT ?o WHERE { GRAPH <http://g> { <http://s> <http://p> ?o } } LIMIT 1"
        );
    }

    #[test]
    fn rejects_malformed_iris() {
        assert!(pattern_query("http://g", "not an iri", "http://p", None).is_err());
    }
}
