//! Instructor embedder (T5 encoder + instruction-aware pooling).
//!
//! Use [`InstructorConfig::stub`] for tests and local runs without model files.

/// Instructor configuration.
pub mod config;
pub(crate) mod model;


pub use config::{DENSE_SUBDIR, INSTRUCTOR_DEFAULT_DIM, INSTRUCTOR_MAX_SEQ_LEN, InstructorConfig};

use std::sync::Arc;

use candle_core::Device;
use parking_lot::Mutex;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::embedding::device::{device_label, select_device};
use crate::embedding::error::EmbeddingError;
use crate::embedding::traits::{ServedModel, TextEmbedder};
use crate::embedding::utils::{l2_normalize, load_tokenizer_with_truncation};

use model::InstructorModel;

/// Text embedded at load time to validate the model and learn its output size.
const WARMUP_TEXT: &str = "warmup";

enum EmbedderBackend {
    Model {
        model: Arc<Mutex<InstructorModel>>,
        tokenizer: Arc<Tokenizer>,
    },
    Stub,
}

/// Instruction-conditioned embedding generator (supports stub mode).
pub struct InstructorEmbedder {
    backend: EmbedderBackend,
    device: Device,
    config: InstructorConfig,
    model_name: String,
    dimension: usize,
}

impl std::fmt::Debug for InstructorEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstructorEmbedder")
            .field(
                "backend",
                &match &self.backend {
                    EmbedderBackend::Model { .. } => "Model",
                    EmbedderBackend::Stub => "Stub",
                },
            )
            .field("device", &device_label(&self.device))
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("max_seq_len", &self.config.max_seq_len)
            .finish()
    }
}

impl InstructorEmbedder {
    /// Loads the embedder from a config (stub mode is supported).
    pub fn load(config: InstructorConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if config.testing_stub {
            warn!(
                dimension = config.stub_dim,
                "Instructor embedder running in STUB mode (testing only)"
            );
            return Ok(Self {
                backend: EmbedderBackend::Stub,
                device: Device::Cpu,
                dimension: config.stub_dim,
                model_name: "stub".to_string(),
                config,
            });
        }

        let device = select_device()?;
        debug!(?device, "Selected compute device for Instructor");

        let tokenizer_path = config.tokenizer_path();
        if !tokenizer_path.exists() {
            return Err(EmbeddingError::ModelNotFound {
                path: tokenizer_path,
            });
        }

        let mut tokenizer = load_tokenizer_with_truncation(&config.model_dir, config.max_seq_len)
            .map_err(|e| EmbeddingError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            })?;
        // Sequences are encoded one at a time; padding would leak into the pooled mean.
        tokenizer.with_padding(None);

        let mut model = InstructorModel::load(&config.model_dir, &config.dense_dir(), &device)?;

        let warmup_ids = Self::tokenize(&tokenizer, "", &[WARMUP_TEXT.to_string()])?;
        let dimension = model
            .embed_tokens(&warmup_ids.sequences[0], 0)
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("Warmup forward pass failed: {}", e),
            })?
            .len();

        let model_name = config
            .model_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "instructor".to_string());

        info!(
            model_dir = %config.model_dir.display(),
            model = %model_name,
            device = device_label(&device),
            dimension,
            dense_projection = model.has_dense(),
            max_seq_len = config.max_seq_len,
            "Instructor model loaded successfully"
        );

        Ok(Self {
            backend: EmbedderBackend::Model {
                model: Arc::new(Mutex::new(model)),
                tokenizer: Arc::new(tokenizer),
            },
            device,
            config,
            model_name,
            dimension,
        })
    }

    /// Shorthand for `load(InstructorConfig::stub())`.
    pub fn stub() -> Result<Self, EmbeddingError> {
        Self::load(InstructorConfig::stub())
    }

    /// Embeds a single text.
    pub fn embed(
        &self,
        instruction: &str,
        text: &str,
        normalize: bool,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(instruction, &[text.to_string()], normalize, 1)?;
        vectors.pop().ok_or_else(|| EmbeddingError::InferenceFailed {
            reason: "embedder returned no vector".to_string(),
        })
    }

    fn tokenize(
        tokenizer: &Tokenizer,
        instruction: &str,
        texts: &[String],
    ) -> Result<TokenizedChunk, EmbeddingError> {
        let instruction_tokens = if instruction.is_empty() {
            0
        } else {
            tokenizer
                .encode(instruction, false)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?
                .get_ids()
                .len()
        };

        let inputs: Vec<String> = texts
            .iter()
            .map(|text| format!("{instruction}{text}"))
            .collect();

        let sequences = tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| EmbeddingError::TokenizationFailed {
                reason: e.to_string(),
            })?
            .into_iter()
            .map(|encoding| encoding.get_ids().to_vec())
            .collect();

        Ok(TokenizedChunk {
            instruction_tokens,
            sequences,
        })
    }

    fn embed_chunk_with_model(
        &self,
        instruction: &str,
        chunk: &[String],
        model: &Mutex<InstructorModel>,
        tokenizer: &Tokenizer,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let tokenized = Self::tokenize(tokenizer, instruction, chunk)?;

        debug!(
            chunk_len = chunk.len(),
            instruction_tokens = tokenized.instruction_tokens,
            "Embedding chunk (transformer forward pass)"
        );

        let mut model = model.lock();
        tokenized
            .sequences
            .iter()
            .map(|ids| {
                if ids.is_empty() {
                    return Ok(vec![0.0; self.dimension]);
                }
                model
                    .embed_tokens(ids, tokenized.instruction_tokens)
                    .map_err(|e| EmbeddingError::inference(e.to_string()))
            })
            .collect()
    }

    fn embed_stub(&self, instruction: &str, text: &str) -> Vec<f32> {
        use std::hash::{DefaultHasher, Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        instruction.hash(&mut hasher);
        text.hash(&mut hasher);
        let mut state = hasher.finish();

        (0..self.dimension)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0
            })
            .collect()
    }

    /// Returns the embedder configuration.
    pub fn config(&self) -> &InstructorConfig {
        &self.config
    }
}

struct TokenizedChunk {
    instruction_tokens: usize,
    sequences: Vec<Vec<u32>>,
}

impl ServedModel for InstructorEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn is_stub(&self) -> bool {
        matches!(self.backend, EmbedderBackend::Stub)
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }
}

impl TextEmbedder for InstructorEmbedder {
    fn embed_batch(
        &self,
        instruction: &str,
        texts: &[String],
        normalize: bool,
        batch_size: usize,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let batch_size = batch_size.max(1);
        let mut embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(batch_size) {
            let vectors = match &self.backend {
                EmbedderBackend::Model { model, tokenizer } => {
                    self.embed_chunk_with_model(instruction, chunk, model, tokenizer)?
                }
                EmbedderBackend::Stub => chunk
                    .iter()
                    .map(|text| self.embed_stub(instruction, text))
                    .collect(),
            };
            embeddings.extend(vectors);
        }

        if normalize {
            for vector in &mut embeddings {
                l2_normalize(vector);
            }
        }

        debug!(
            count = embeddings.len(),
            batch_size,
            normalize,
            "Embedding batch complete"
        );

        Ok(embeddings)
    }
}
