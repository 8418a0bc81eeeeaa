//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `DUET_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_INPUTS, DEFAULT_MAX_SEQ_LEN,
    DEFAULT_PORT,
};

/// Server configuration shared by the embedding and reranking binaries.
///
/// Use [`Config::from_env`] to read `DUET_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Model directory. When unset the service runs a deterministic stub model.
    pub model_path: Option<PathBuf>,

    /// Upper bound applied to a request's `batch_size`. Default: `128`.
    pub max_batch_size: usize,

    /// Max texts or candidates per request. Default: `2048`.
    pub max_inputs: usize,

    /// Max request body size in bytes. Default: 16 MiB.
    pub max_body_bytes: usize,

    /// Tokenizer truncation length. Default: `512`.
    pub max_seq_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            model_path: None,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_inputs: DEFAULT_MAX_INPUTS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
        }
    }
}

impl Config {
    pub(crate) const ENV_PORT: &'static str = "DUET_PORT";
    const ENV_BIND_ADDR: &'static str = "DUET_BIND_ADDR";
    const ENV_MODEL_PATH: &'static str = "DUET_MODEL_PATH";
    const ENV_MAX_BATCH_SIZE: &'static str = "DUET_MAX_BATCH_SIZE";
    const ENV_MAX_INPUTS: &'static str = "DUET_MAX_INPUTS";
    const ENV_MAX_BODY_BYTES: &'static str = "DUET_MAX_BODY_BYTES";
    const ENV_MAX_SEQ_LEN: &'static str = "DUET_MAX_SEQ_LEN";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let model_path = Self::parse_optional_path_from_env(Self::ENV_MODEL_PATH);
        let max_batch_size =
            Self::parse_usize_from_env(Self::ENV_MAX_BATCH_SIZE, defaults.max_batch_size)?;
        let max_inputs = Self::parse_usize_from_env(Self::ENV_MAX_INPUTS, defaults.max_inputs)?;
        let max_body_bytes =
            Self::parse_usize_from_env(Self::ENV_MAX_BODY_BYTES, defaults.max_body_bytes)?;
        let max_seq_len = Self::parse_usize_from_env(Self::ENV_MAX_SEQ_LEN, defaults.max_seq_len)?;

        Ok(Self {
            port,
            bind_addr,
            model_path,
            max_batch_size,
            max_inputs,
            max_body_bytes,
            max_seq_len,
        })
    }

    /// Validates paths and limits (does not load anything).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref path) = self.model_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        for (name, value) in [
            (Self::ENV_MAX_BATCH_SIZE, self.max_batch_size),
            (Self::ENV_MAX_INPUTS, self.max_inputs),
            (Self::ENV_MAX_BODY_BYTES, self.max_body_bytes),
            (Self::ENV_MAX_SEQ_LEN, self.max_seq_len),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroLimit { name });
            }
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        match self.bind_addr {
            IpAddr::V4(addr) => format!("{}:{}", addr, self.port),
            IpAddr::V6(addr) => format!("[{}]:{}", addr, self.port),
        }
    }

    /// Reads only the port (used by `--health-check`, which must not fail on other vars).
    pub fn port_from_env() -> u16 {
        Self::parse_port_from_env(DEFAULT_PORT).unwrap_or(DEFAULT_PORT)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_usize_from_env(name: &'static str, default: usize) -> Result<usize, ConfigError> {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::InvalidNumber {
                    name,
                    value,
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }
}
