use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::constants::{DEFAULT_BATCH_SIZE, DEFAULT_INSTRUCTION};
use crate::gateway::error::GatewayError;

fn default_instruction() -> String {
    DEFAULT_INSTRUCTION.to_string()
}

fn default_normalize() -> bool {
    true
}

/// Body of `POST /embed`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbedRequest {
    #[serde(default = "default_instruction")]
    pub instruction: String,

    pub texts: Vec<String>,

    #[serde(default = "default_normalize")]
    pub normalize: bool,

    #[serde(default)]
    pub batch_size: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbedResponse {
    pub embeddings: Vec<Vec<f32>>,
}

/// Body of `POST /rerank`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RerankRequest {
    pub query: String,

    pub candidates: Vec<String>,

    #[serde(default)]
    pub batch_size: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RerankResponse {
    pub scores: Vec<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,

    /// RFC 3339 timestamp of the moment the model became ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_since: Option<String>,
}

impl HealthResponse {
    /// Bare `{"status": ...}` body (loading, failed, liveness).
    pub fn bare(status: &'static str) -> Self {
        Self {
            status,
            device: None,
            model: None,
            mode: None,
            dimension: None,
            ready_since: None,
        }
    }
}

/// Per-request limits derived from [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    pub default_batch_size: usize,
    pub max_batch_size: usize,
    pub max_inputs: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RequestLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_batch_size: DEFAULT_BATCH_SIZE.min(config.max_batch_size),
            max_batch_size: config.max_batch_size,
            max_inputs: config.max_inputs,
        }
    }

    /// Resolves the effective batch size: default when absent, clamped to the maximum.
    pub fn batch_size(&self, requested: Option<usize>) -> Result<usize, GatewayError> {
        match requested {
            None => Ok(self.default_batch_size),
            Some(0) => Err(GatewayError::InvalidRequest(
                "batch_size must be a positive integer".to_string(),
            )),
            Some(n) => Ok(n.min(self.max_batch_size)),
        }
    }

    /// Rejects empty or oversized input lists. `field` names the list in the error.
    pub fn check_inputs(&self, field: &str, len: usize) -> Result<(), GatewayError> {
        if len == 0 {
            return Err(GatewayError::InvalidRequest(format!(
                "{} must not be empty",
                field
            )));
        }
        if len > self.max_inputs {
            return Err(GatewayError::InvalidRequest(format!(
                "{} has {} items, at most {} are allowed",
                field, len, self.max_inputs
            )));
        }
        Ok(())
    }
}
