mod integration_tests;

pub(super) fn require_rdf4j() -> bool {
    if std::env::var("RUN_RDF4J_TESTS").ok().as_deref() == Some("1") {
        true
    } else {
        eprintln!("Skipping RDF4J tests (set RUN_RDF4J_TESTS=1)");
        false
    }
}
