use std::path::PathBuf;

use crate::config::{Config, ConfigError};
use crate::constants::{DEFAULT_MAX_SEQ_LEN, INSTRUCTOR_EMBEDDING_DIM};
use crate::embedding::error::EmbeddingError;

/// Default Instructor embedding dimension (also the stub dimension).
pub const INSTRUCTOR_DEFAULT_DIM: usize = INSTRUCTOR_EMBEDDING_DIM;

/// Default Instructor max sequence length.
pub const INSTRUCTOR_MAX_SEQ_LEN: usize = DEFAULT_MAX_SEQ_LEN;

/// Subdirectory holding the sentence-transformers projection layer.
pub const DENSE_SUBDIR: &str = "2_Dense";

#[derive(Debug, Clone)]
/// Configuration for [`InstructorEmbedder`](super::InstructorEmbedder).
pub struct InstructorConfig {
    /// Directory with `config.json`, `tokenizer.json` and T5 encoder weights.
    pub model_dir: PathBuf,
    /// Max tokens per `instruction + text` sequence.
    pub max_seq_len: usize,
    /// Output dimension in stub mode (real models report their own).
    pub stub_dim: usize,
    /// If true, run in deterministic stub mode (no model files required).
    pub testing_stub: bool,
}

impl Default for InstructorConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::new(),
            max_seq_len: INSTRUCTOR_MAX_SEQ_LEN,
            stub_dim: INSTRUCTOR_DEFAULT_DIM,
            testing_stub: false,
        }
    }
}

impl InstructorConfig {
    /// Env var overriding the stub output dimension.
    pub const ENV_STUB_DIM: &'static str = "DUET_EMBED_STUB_DIM";

    /// Creates a config for a model directory.
    pub fn new<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            model_dir: model_dir.into(),
            ..Default::default()
        }
    }

    /// Creates a stub config (no model files; produces deterministic embeddings).
    pub fn stub() -> Self {
        Self {
            testing_stub: true,
            ..Default::default()
        }
    }

    /// Derives the embedder config from the server config (stub when no model path is set).
    pub fn from_server_config(config: &Config) -> Result<Self, ConfigError> {
        let base = match &config.model_path {
            Some(path) => Self::new(path.clone()),
            None => Self::stub(),
        };

        let stub_dim = match std::env::var(Self::ENV_STUB_DIM) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::InvalidNumber {
                    name: Self::ENV_STUB_DIM,
                    value,
                    source: e,
                })?,
            Err(_) => INSTRUCTOR_DEFAULT_DIM,
        };

        Ok(base
            .with_max_seq_len(config.max_seq_len)
            .with_stub_dim(stub_dim))
    }

    pub fn with_max_seq_len(mut self, max_seq_len: usize) -> Self {
        self.max_seq_len = max_seq_len;
        self
    }

    pub fn with_stub_dim(mut self, stub_dim: usize) -> Self {
        self.stub_dim = stub_dim;
        self
    }

    /// Validates required fields for the selected mode.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.max_seq_len == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "max_seq_len must be greater than zero".to_string(),
            });
        }

        if self.testing_stub {
            if self.stub_dim == 0 {
                return Err(EmbeddingError::InvalidConfig {
                    reason: "stub_dim must be greater than zero".to_string(),
                });
            }
            return Ok(());
        }

        if self.model_dir.as_os_str().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "model_dir is required (stubbing is disabled)".to_string(),
            });
        }

        if !self.model_dir.is_dir() {
            return Err(EmbeddingError::ModelNotFound {
                path: self.model_dir.clone(),
            });
        }

        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.model_dir.join("config.json")
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir.join("tokenizer.json")
    }

    pub fn dense_dir(&self) -> PathBuf {
        self.model_dir.join(DENSE_SUBDIR)
    }
}
