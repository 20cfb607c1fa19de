use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::env::{self, EnvKey};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("DOMAIN is not a valid base URL: {0}")]
    InvalidDomain(#[from] url::ParseError),
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub database_url: String,
    pub amqp_url: String,
    /// Local directory holding one artifact subtree per video.
    pub upload_root: String,
    /// Public base URL manifests are served under, e.g. "https://vps.example.com".
    pub public_domain: String,
    pub transcode_concurrency: usize,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let public_domain = require(EnvKey::PublicDomain)?;
        // Fail at startup rather than emitting broken manifest URLs later.
        Url::parse(&public_domain)?;

        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3005),
            database_url: require(EnvKey::DatabaseUrl)?,
            amqp_url: require(EnvKey::AmqpUrl)?,
            upload_root: env::get_or(EnvKey::UploadRoot, "./uploads"),
            public_domain: public_domain.trim_end_matches('/').to_string(),
            transcode_concurrency: env::get_parsed(EnvKey::TranscodeConcurrency, 2),
        })
    }
}

fn require(key: EnvKey) -> Result<String, ConfigError> {
    let name = key.as_str();
    env::get(key).map_err(|_| ConfigError::MissingVar(name))
}
