use std::path::PathBuf;
use std::str::FromStr;

use crate::config::{Config, ConfigError};
use crate::constants::DEFAULT_MAX_SEQ_LEN;

/// Maximum sequence length used for reranker tokenization.
pub const MAX_SEQ_LEN: usize = DEFAULT_MAX_SEQ_LEN;

/// Function applied to the cross-encoder's single logit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreActivation {
    /// `1 / (1 + e^-x)`, scores in `(0, 1)`.
    #[default]
    Sigmoid,
    /// Raw logits.
    Identity,
}

impl FromStr for ScoreActivation {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sigmoid" => Ok(Self::Sigmoid),
            "identity" | "none" | "raw" => Ok(Self::Identity),
            _ => Err(ConfigError::InvalidChoice {
                name: RerankerConfig::ENV_ACTIVATION,
                value: value.to_string(),
                expected: "sigmoid, identity",
            }),
        }
    }
}

#[derive(Debug, Clone)]
/// Configuration for [`Reranker`](super::Reranker).
pub struct RerankerConfig {
    /// Directory containing `config.json`, `model.safetensors`, and `tokenizer.json`.
    pub model_path: Option<PathBuf>,

    /// Truncation length for the joint `(query, candidate)` sequence.
    pub max_seq_len: usize,

    pub activation: ScoreActivation,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            max_seq_len: MAX_SEQ_LEN,
            activation: ScoreActivation::default(),
        }
    }
}

impl RerankerConfig {
    /// Env var selecting the score activation (`sigmoid` or `identity`).
    pub const ENV_ACTIVATION: &'static str = "DUET_RERANK_ACTIVATION";

    /// Creates a config for a model directory.
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: Some(model_path.into()),
            ..Default::default()
        }
    }

    /// Creates a config that runs without a model (stub scoring).
    pub fn stub() -> Self {
        Self::default()
    }

    /// Derives the reranker config from the server config (stub when no model path is set).
    pub fn from_server_config(config: &Config) -> Result<Self, ConfigError> {
        let activation = match std::env::var(Self::ENV_ACTIVATION) {
            Ok(value) => value.parse()?,
            Err(_) => ScoreActivation::default(),
        };

        Ok(Self {
            model_path: config.model_path.clone(),
            max_seq_len: config.max_seq_len,
            activation,
        })
    }

    pub fn with_activation(mut self, activation: ScoreActivation) -> Self {
        self.activation = activation;
        self
    }

    /// Validates basic invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_seq_len == 0 {
            return Err("max_seq_len must be greater than zero".to_string());
        }

        if let Some(ref path) = self.model_path
            && path.as_os_str().is_empty()
        {
            return Err("model_path cannot be empty when provided".to_string());
        }

        Ok(())
    }
}
