use std::path::Path;
use std::time::Duration;

use ::config::builder::DefaultState;
use ::config::{ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::error::AppError;

/// Environment variable prefix, e.g. `DIVEROUTES_BASE_URL`.
pub const ENV_PREFIX: &str = "DIVEROUTES";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Settings for talking to a Divemap instance.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Root of the REST API; route paths are joined onto it.
    pub base_url: String,
    /// Bearer token of the signed-in user. Anonymous when absent.
    #[serde(default)]
    pub api_token: Option<String>,
    pub timeout_secs: u64,
    /// How long a fetched route list is served before it is considered stale.
    pub cache_ttl_secs: u64,
    /// Default `limit` for the popular-routes query.
    pub popular_limit: u32,
}

impl ClientConfig {
    /// Build the config from defaults, an optional TOML file, then the environment.
    ///
    /// Environment variables win over the file:
    /// - `DIVEROUTES_BASE_URL`
    /// - `DIVEROUTES_API_TOKEN`
    /// - `DIVEROUTES_TIMEOUT_SECS`
    /// - `DIVEROUTES_CACHE_TTL_SECS`
    /// - `DIVEROUTES_POPULAR_LIMIT`
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut builder = Self::defaults()?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX));
        Self::finish(builder)
    }

    /// Build from the environment only.
    pub fn from_env() -> Result<Self, AppError> {
        Self::load(None)
    }

    /// Build with explicit values (useful for testing).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            timeout_secs: 30,
            cache_ttl_secs: 300,
            popular_limit: 10,
        }
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Parsed API root. Always ends with `/` so relative joins keep the path prefix.
    pub fn api_root(&self) -> Result<url::Url, AppError> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        url::Url::parse(&raw)
            .map_err(|e| AppError::Config(format!("Invalid base_url '{}': {}", self.base_url, e)))
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, AppError> {
        Ok(::config::Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("timeout_secs", 30_i64)?
            .set_default("cache_ttl_secs", 300_i64)?
            .set_default("popular_limit", 10_i64)?)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, AppError> {
        let config: ClientConfig = builder.build()?.try_deserialize()?;
        config.api_root()?;
        Ok(config)
    }
}
