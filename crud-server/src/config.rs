//! Server configuration
//!
//! Layered, lowest precedence first: TOML file, `CRUD_*` environment
//! variables (`__` separates nested keys, e.g. `CRUD_ENGINE__REPORT_MISSING_ROWS`),
//! then command-line overrides.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum_table_crud::EngineConfig;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use config::builder::DefaultState;
use serde::Deserialize;
use tokio::net::lookup_host;

use crate::database::Backend;

pub const ENV_PREFIX: &str = "CRUD";

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_host")]
    pub bind_host: String,
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Path the CRUD routes are mounted under; empty for the root
    #[serde(default)]
    pub base_path: String,
    /// Directory served for every path no route claims
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
    #[serde(default)]
    pub seed_sample_data: bool,
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_bind_host() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    10
}

impl ServerConfig {
    pub fn backend(&self) -> Option<Backend> {
        Backend::from_url(&self.database_url)
    }

    /// Resolve `bind_host` (an IP address or a host name) to the listen address
    pub async fn socket_addr(&self) -> std::io::Result<SocketAddr> {
        lookup_host((self.bind_host.as_str(), self.bind_port))
            .await?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("bind_host '{}' resolved to no address", self.bind_host),
                )
            })
    }
}

/// Values given on the command line; `None` leaves lower layers alone
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub database_url: Option<String>,
    pub bind_host: Option<String>,
    pub bind_port: Option<u16>,
    pub base_path: Option<String>,
    pub static_dir: Option<PathBuf>,
    pub seed_sample_data: bool,
}

impl Overrides {
    fn apply(
        &self,
        mut builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if let Some(url) = &self.database_url {
            builder = builder.set_override("database_url", url.as_str())?;
        }
        if let Some(host) = &self.bind_host {
            builder = builder.set_override("bind_host", host.as_str())?;
        }
        if let Some(port) = self.bind_port {
            builder = builder.set_override("bind_port", i64::from(port))?;
        }
        if let Some(base_path) = &self.base_path {
            builder = builder.set_override("base_path", base_path.as_str())?;
        }
        if let Some(dir) = &self.static_dir {
            builder = builder.set_override("static_dir", dir.to_string_lossy().into_owned())?;
        }
        if self.seed_sample_data {
            builder = builder.set_override("seed_sample_data", true)?;
        }
        Ok(builder)
    }
}

pub fn validate_config(config: ServerConfig) -> Result<ServerConfig, ConfigError> {
    if config.database_url.trim().is_empty() {
        return Err(ConfigError::Message("database_url must not be empty".to_string()));
    }

    let Some(backend) = config.backend() else {
        return Err(ConfigError::Message(format!(
            "Unsupported database URL '{}': expected a sqlite:, postgres:, postgresql: or mysql: scheme",
            config.database_url
        )));
    };

    if config.max_connections == 0 {
        return Err(ConfigError::Message("max_connections must be at least 1".to_string()));
    }

    if config.seed_sample_data && backend != Backend::Sqlite {
        return Err(ConfigError::Message(
            "seed_sample_data is only supported for SQLite databases".to_string(),
        ));
    }

    Ok(config)
}

fn environment(source: Option<HashMap<String, String>>) -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(source)
}

fn finish(builder: ConfigBuilder<DefaultState>, overrides: &Overrides) -> Result<ServerConfig, ConfigError> {
    overrides
        .apply(builder)?
        .build()?
        .try_deserialize()
        .and_then(validate_config)
}

/// Load from an optional file, the process environment and CLI overrides
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<ServerConfig, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path));
    }
    finish(builder.add_source(environment(None)), overrides)
}

// Load a config from a string and an explicit environment map (for tests)
pub fn load_config_from_string(
    config_str: &str,
    env: HashMap<String, String>,
    overrides: &Overrides,
) -> Result<ServerConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(File::from_str(config_str, FileFormat::Toml))
        .add_source(environment(Some(env)));
    finish(builder, overrides)
}
