use std::{collections::BTreeMap, path::Path};

use clap::{Arg, Command};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use super::{Config, ConfigRaw, defaults};
use crate::config::ConfigError;

/// Environment variables read by the service, mapped onto `triple_store.*`
/// and always taken as strings.
const TRIPLE_STORE_ENV: [&str; 5] = [
    "ENDPOINT_BASE",
    "ENDPOINT_TYPE",
    "USERNAME",
    "PASSWORD",
    "ADMIN_BASE",
];

/// Parse the command line and load the configuration.
pub(crate) fn initialize_configuration() -> Result<Config, ConfigError> {
    let matches = Command::new("Nanopub Query Broker")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Sets a custom config file (.toml format)"),
        )
        .get_matches();

    let custom_config_path = matches.get_one::<String>("config").map(Path::new);
    load_configuration(Path::new("config.toml"), custom_config_path)
}

/// Build configuration with layered sources (priority: lowest to highest):
/// typed defaults, `default_path` if it exists, `custom_path`, environment.
pub(crate) fn load_configuration(
    default_path: &Path,
    custom_path: Option<&Path>,
) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(defaults::config()));

    if default_path.exists() {
        figment = figment.merge(Toml::file(default_path));
    }

    if let Some(config_path) = custom_path {
        if !config_path.exists() {
            return Err(ConfigError::MissingConfig(config_path.display().to_string()));
        }
        figment = figment.merge(Toml::file(config_path));
    }

    figment = figment.merge(triple_store_env());

    let config: ConfigRaw = figment.extract().map_err(Box::new)?;
    config.resolve()
}

fn triple_store_env() -> Serialized<BTreeMap<String, String>> {
    // `Env` as a provider would parse `PASSWORD=123456` into an integer.
    let values: BTreeMap<String, String> = Env::raw()
        .only(&TRIPLE_STORE_ENV)
        .iter()
        .map(|(key, value)| (key.as_str().to_ascii_lowercase(), value))
        .collect();
    Serialized::defaults(values).key("triple_store")
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use npq_triple_store::BackendKind;

    use super::*;

    #[test]
    fn defaults_apply_without_files() {
        Jail::expect_with(|jail| {
            // The host may export USERNAME and friends.
            jail.clear_env();
            let config = load_configuration(Path::new("config.toml"), None).unwrap();

            assert_eq!(config.backend, BackendKind::NativeStore);
            assert_eq!(config.triple_store.admin_base, "http://rdf4j:8080/rdf4j-server");
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_files() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "config.toml",
                r#"
                [triple_store]
                endpoint_base = "http://from-file:8080/repositories/"
                admin_base = "http://from-file:8080"
                "#,
            )?;
            jail.set_env("ENDPOINT_BASE", "http://virtuoso:8890/sparql/");
            jail.set_env("ENDPOINT_TYPE", "virtuoso");
            jail.set_env("USERNAME", "dba");
            jail.set_env("PASSWORD", "secret");

            let config = load_configuration(Path::new("config.toml"), None).unwrap();

            assert_eq!(config.backend, BackendKind::Virtuoso);
            assert_eq!(config.triple_store.endpoint_base, "http://virtuoso:8890/sparql/");
            assert_eq!(config.triple_store.admin_base, "http://from-file:8080");
            assert_eq!(config.triple_store.credentials(), Some(("dba", "secret")));
            Ok(())
        });
    }

    #[test]
    fn numeric_credentials_stay_strings() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("ENDPOINT_TYPE", "virtuoso");
            jail.set_env("USERNAME", "1000");
            jail.set_env("PASSWORD", "0123456");

            let config = load_configuration(Path::new("config.toml"), None).unwrap();

            assert_eq!(config.backend, BackendKind::Virtuoso);
            assert_eq!(config.triple_store.credentials(), Some(("1000", "0123456")));
            Ok(())
        });
    }

    #[test]
    fn boolean_like_password_stays_a_string() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("ENDPOINT_TYPE", "virtuoso");
            jail.set_env("USERNAME", "dba");
            jail.set_env("PASSWORD", "true");

            let config = load_configuration(Path::new("config.toml"), None).unwrap();

            assert_eq!(config.triple_store.credentials(), Some(("dba", "true")));
            Ok(())
        });
    }

    #[test]
    fn custom_file_overrides_default_file() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("config.toml", "[runtime]\nshutdown_timeout_secs = 5\n")?;
            jail.create_file("custom.toml", "[runtime]\nshutdown_timeout_secs = 9\n")?;

            let config =
                load_configuration(Path::new("config.toml"), Some(Path::new("custom.toml")))
                    .unwrap();

            assert_eq!(config.runtime.shutdown_timeout_secs, 9);
            assert!(config.runtime.warm_up);
            Ok(())
        });
    }

    #[test]
    fn missing_custom_file_is_an_error() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let error = load_configuration(Path::new("config.toml"), Some(Path::new("nope.toml")))
                .unwrap_err();

            assert!(matches!(error, ConfigError::MissingConfig(path) if path == "nope.toml"));
            Ok(())
        });
    }

    #[test]
    fn unknown_endpoint_type_is_rejected() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("ENDPOINT_TYPE", "graphdb");

            let error = load_configuration(Path::new("config.toml"), None).unwrap_err();

            assert!(matches!(error, ConfigError::InvalidConfig(ref msg) if msg.contains("graphdb")));
            Ok(())
        });
    }

    #[test]
    fn virtuoso_requires_credentials() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("ENDPOINT_TYPE", "virtuoso");

            let error = load_configuration(Path::new("config.toml"), None).unwrap_err();

            assert!(matches!(error, ConfigError::MissingSecret(_)));
            Ok(())
        });
    }

    #[test]
    fn unknown_keys_are_rejected() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("config.toml", "[triple_store]\nendpoint = \"typo\"\n")?;

            let error = load_configuration(Path::new("config.toml"), None).unwrap_err();

            assert!(matches!(error, ConfigError::LoadError(_)));
            Ok(())
        });
    }
}
