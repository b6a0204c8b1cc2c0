//! Gateway configuration.
//!
//! Layered with figment: the embedded `config/default.toml`, then an optional
//! TOML file, then `SIMPLENOTE_`-prefixed environment variables.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_TOML: &str = include_str!("../config/default.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    #[error("{0} must be set (SIMPLENOTE_{1})")]
    Missing(&'static str, &'static str),

    #[error("invalid bind_addr {0:?}")]
    BindAddr(String),

    #[error("route_prefix must start with '/', got {0:?}")]
    RoutePrefix(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `simplenote_core=debug`.
    pub level: String,
    /// `pretty` or `json`.
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub email: String,
    pub password: String,
    pub base_url: String,
    pub bind_addr: String,
    pub route_prefix: String,
    /// Log every outgoing note service request.
    pub debug: bool,
    /// 0 disables the timeout.
    pub request_timeout_secs: u64,
    pub log: LogConfig,
}

impl GatewayConfig {
    /// Defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_TOML));
        if let Some(path) = path {
            figment = figment.merge(Toml::file_exact(path));
        }
        Self::from_figment(figment.merge(Env::prefixed("SIMPLENOTE_").split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract()?)
    }

    /// Embedded defaults only.
    pub fn defaults() -> Figment {
        Figment::new().merge(Toml::string(DEFAULT_TOML))
    }

    /// Checks that cannot be expressed in the TOML schema.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.email.is_empty() {
            return Err(ConfigError::Missing("email", "EMAIL"));
        }
        if self.password.is_empty() {
            return Err(ConfigError::Missing("password", "PASSWORD"));
        }
        self.socket_addr()?;
        if !self.route_prefix.is_empty() && !self.route_prefix.starts_with('/') {
            return Err(ConfigError::RoutePrefix(self.route_prefix.clone()));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|_| ConfigError::BindAddr(self.bind_addr.clone()))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}
