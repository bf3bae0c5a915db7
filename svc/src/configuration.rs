use std::{path::Path, sync::Arc};

use libregistration::hashing::{Argon2id, Bcrypt, PasswordHashing};
use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;

/// Runtime environment for the service.
#[derive(PartialEq, Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Server {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub api_port: u16,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub debug_port: u16,
    pub host: String,
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    Postgres,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Database {
    pub backend: Backend,
    /// Connection string of the persistence layer.
    pub uri: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub pool_max_size: usize,
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Bcrypt,
    Argon2id,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Hashing {
    pub algorithm: HashAlgorithm,
    /// Bcrypt cost factor, ignored by argon2id.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub cost: u32,
}

impl Hashing {
    pub fn hasher(&self) -> Arc<dyn PasswordHashing + Send + Sync> {
        match self.algorithm {
            HashAlgorithm::Bcrypt => Arc::new(Bcrypt::new(self.cost)),
            HashAlgorithm::Argon2id => Arc::new(Argon2id::default()),
        }
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Registration {
    pub strict: bool,
    pub hashing: Hashing,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Configuration {
    pub server: Server,
    pub database: Database,
    pub registration: Registration,
}

impl Configuration {
    /// Reads the configuration from `./configuration`.
    pub fn parse(key: &str) -> Result<Configuration, config::ConfigError> {
        let base_path = std::env::current_dir()
            .map_err(|err| config::ConfigError::Foreign(Box::new(err)))?;
        Self::parse_from(key, &base_path.join("configuration"))
    }

    pub fn parse_from(
        key: &str,
        configuration_directory: &Path,
    ) -> Result<Configuration, config::ConfigError> {
        let key = key.to_uppercase();

        // Detect the runtime environment, if none is provided use local.
        let environment: Environment = std::env::var(format!("{}_ENVIRONMENT", &key))
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .map_err(config::ConfigError::Message)?;
        let environment_filename = format!("{}.yaml", environment.as_str());

        let conf = config::Config::builder()
            .add_source(config::File::from(
                configuration_directory.join("base.yaml"),
            ))
            .add_source(config::File::from(
                configuration_directory.join(environment_filename),
            ))
            // Add in settings from environment variables (with a prefix of key and '__' as separator)
            // E.g. `<key>_DATABASE__URI=postgres://...` would set `Settings.database.uri`
            .add_source(
                config::Environment::with_prefix(&key)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let conf = conf.try_deserialize::<Configuration>()?;

        if environment == Environment::Production && conf.database.backend == Backend::Memory {
            return Err(config::ConfigError::Message(
                "Don't use the memory backend in production.".to_string(),
            ));
        }
        if conf.database.backend == Backend::Postgres && conf.database.uri.expose_secret().is_empty()
        {
            return Err(config::ConfigError::Message(format!(
                "{}_DATABASE__URI must be set for the postgres backend.",
                &key
            )));
        }
        Ok(conf)
    }
}
