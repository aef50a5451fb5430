use thiserror::Error;

/// Top-level application error that composes all subsystem errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Triple store errors
    #[error("Triple store error: {0}")]
    TripleStore(#[from] npq_triple_store::error::TripleStoreError),

    /// Hash registry errors
    #[error("Hash registry error: {0}")]
    HashRegistry(#[from] npq_hash_registry::error::HashRegistryError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    fn load() -> Result<(), ConfigError> {
        Err(ConfigError::MissingConfig("custom.toml".to_string()))
    }

    fn start() -> Result<(), AppError> {
        load()?;
        Ok(())
    }

    #[test]
    fn config_errors_keep_their_variant() {
        let error = start().unwrap_err();

        assert!(matches!(
            error,
            AppError::Config(ConfigError::MissingConfig(ref path)) if path == "custom.toml"
        ));
        assert_eq!(
            error.to_string(),
            "Configuration error: Missing required config file: custom.toml"
        );
    }
}
