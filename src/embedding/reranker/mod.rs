//! Cross-encoder reranker (XLM-RoBERTa sequence classifier, e.g. BGE Reranker Large).

pub mod config;
pub mod error;
mod lexical;


pub use config::{MAX_SEQ_LEN, RerankerConfig, ScoreActivation};
pub use error::RerankerError;
pub use lexical::lexical_overlap_score;

use candle_core::{DType, Device, Tensor};
use candle_transformers::models::xlm_roberta::{
    Config as XlmRobertaConfig, XLMRobertaForSequenceClassification,
};
use tokenizers::{Encoding, Tokenizer};
use tracing::{debug, info};

use crate::embedding::device::{device_label, select_device};
use crate::embedding::traits::{PairScorer, ServedModel};
use crate::embedding::utils::{
    build_var_builder, ensure_batch_padding, load_tokenizer_with_truncation,
};

/// Single relevance logit per pair.
const NUM_LABELS: usize = 1;

pub struct Reranker {
    device: Device,
    config: RerankerConfig,
    model_name: String,
    model: Option<XLMRobertaForSequenceClassification>,
    tokenizer: Option<Tokenizer>,
}

impl std::fmt::Debug for Reranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reranker")
            .field("device", &device_label(&self.device))
            .field("config", &self.config)
            .field("model_name", &self.model_name)
            .field("model_loaded", &self.is_model_loaded())
            .finish()
    }
}

impl Reranker {
    pub fn load(config: RerankerConfig) -> Result<Self, RerankerError> {
        if let Err(msg) = config.validate() {
            return Err(RerankerError::InvalidConfig { reason: msg });
        }

        let Some(model_path) = config.model_path.clone() else {
            info!("No reranker model path configured, operating in stub mode");
            return Ok(Self {
                device: Device::Cpu,
                config,
                model_name: "stub".to_string(),
                model: None,
                tokenizer: None,
            });
        };

        if !model_path.is_dir() {
            return Err(RerankerError::ModelNotFound { path: model_path });
        }

        for required in ["config.json", "model.safetensors", "tokenizer.json"] {
            if !model_path.join(required).exists() {
                return Err(RerankerError::ModelLoadFailed {
                    reason: format!("Missing {} in {}", required, model_path.display()),
                });
            }
        }

        let device = select_device()?;
        debug!(?device, "Selected compute device for reranker");

        info!(
            model_path = %model_path.display(),
            activation = ?config.activation,
            "Loading reranker model"
        );

        let raw_config = std::fs::read_to_string(model_path.join("config.json"))?;
        let model_config: XlmRobertaConfig =
            serde_json::from_str(&raw_config).map_err(|e| RerankerError::ModelLoadFailed {
                reason: format!("Failed to parse config: {}", e),
            })?;

        let vb = build_var_builder(&model_path.join("model.safetensors"), DType::F32, &device)
            .map_err(|e| RerankerError::ModelLoadFailed {
                reason: format!("Failed to map weights: {}", e),
            })?;

        let model = XLMRobertaForSequenceClassification::new(NUM_LABELS, &model_config, vb)
            .map_err(|e| RerankerError::ModelLoadFailed {
                reason: format!("Failed to build cross-encoder: {}", e),
            })?;

        let mut tokenizer = load_tokenizer_with_truncation(&model_path, config.max_seq_len)
            .map_err(|e| RerankerError::ModelLoadFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            })?;
        ensure_batch_padding(&mut tokenizer);

        let model_name = model_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "reranker".to_string());

        info!(
            model = %model_name,
            device = device_label(&device),
            "Reranker model loaded successfully"
        );

        Ok(Self {
            device,
            config,
            model_name,
            model: Some(model),
            tokenizer: Some(tokenizer),
        })
    }

    pub fn stub() -> Result<Self, RerankerError> {
        Self::load(RerankerConfig::stub())
    }

    /// Scores a single pair.
    pub fn score(&self, query: &str, candidate: &str) -> Result<f32, RerankerError> {
        let scores = self.score_batch(query, &[candidate.to_string()], 1)?;
        scores
            .first()
            .copied()
            .ok_or_else(|| RerankerError::InferenceFailed {
                reason: "cross-encoder returned no score".to_string(),
            })
    }

    fn score_chunk_with_model(
        &self,
        query: &str,
        chunk: &[String],
        model: &XLMRobertaForSequenceClassification,
        tokenizer: &Tokenizer,
    ) -> Result<Vec<f32>, RerankerError> {
        let pairs: Vec<(&str, &str)> = chunk.iter().map(|c| (query, c.as_str())).collect();
        let encodings =
            tokenizer
                .encode_batch(pairs, true)
                .map_err(|e| RerankerError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        let input_ids = self.stack(&encodings, Encoding::get_ids)?;
        let attention_mask = self.stack(&encodings, Encoding::get_attention_mask)?;
        let token_type_ids = self.stack(&encodings, Encoding::get_type_ids)?;

        debug!(
            chunk_len = chunk.len(),
            seq_len = encodings.first().map(|e| e.len()),
            "Scoring chunk (cross-encoder forward pass)"
        );

        // [chunk_len, NUM_LABELS]
        let logits = model
            .forward(&input_ids, &attention_mask, &token_type_ids)
            .map_err(|e| RerankerError::inference(e.to_string()))?
            .to_dtype(DType::F32)?;

        let scores = match self.config.activation {
            ScoreActivation::Sigmoid => candle_nn::ops::sigmoid(&logits)?,
            ScoreActivation::Identity => logits,
        };

        Ok(scores.flatten_all()?.to_vec1::<f32>()?)
    }

    fn stack(
        &self,
        encodings: &[Encoding],
        field: fn(&Encoding) -> &[u32],
    ) -> Result<Tensor, RerankerError> {
        let rows = encodings
            .iter()
            .map(|encoding| Tensor::new(field(encoding), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()?;
        Ok(Tensor::stack(&rows, 0)?)
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn config(&self) -> &RerankerConfig {
        &self.config
    }
}

impl ServedModel for Reranker {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn is_stub(&self) -> bool {
        !self.is_model_loaded()
    }
}

impl PairScorer for Reranker {
    fn score_batch(
        &self,
        query: &str,
        candidates: &[String],
        batch_size: usize,
    ) -> Result<Vec<f32>, RerankerError> {
        debug!(
            query_len = query.len(),
            num_candidates = candidates.len(),
            batch_size,
            model_loaded = self.is_model_loaded(),
            "Scoring candidates"
        );

        let mut scores = Vec::with_capacity(candidates.len());

        for chunk in candidates.chunks(batch_size.max(1)) {
            match (&self.model, &self.tokenizer) {
                (Some(model), Some(tokenizer)) => {
                    scores.extend(self.score_chunk_with_model(query, chunk, model, tokenizer)?);
                }
                _ => scores.extend(
                    chunk
                        .iter()
                        .map(|candidate| lexical_overlap_score(query, candidate)),
                ),
            }
        }

        debug!(
            top_score = scores.iter().copied().reduce(f32::max),
            "Scoring complete"
        );

        Ok(scores)
    }
}
