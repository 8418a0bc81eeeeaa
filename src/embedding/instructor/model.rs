//! T5 encoder + instruction-aware mean pooling + optional dense projection.

use std::path::Path;

use candle_core::{DType, Device, IndexOp, Module, Tensor};
use candle_nn::Linear;
use candle_transformers::models::t5::{self, T5EncoderModel};
use serde::Deserialize;
use tracing::{debug, info};

use crate::embedding::error::EmbeddingError;
use crate::embedding::utils::{build_var_builder, find_model_weights};

/// `2_Dense/config.json` as written by sentence-transformers.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DenseConfig {
    pub in_features: usize,
    pub out_features: usize,
    #[serde(default = "default_bias")]
    pub bias: bool,
    #[serde(default)]
    pub activation_function: Option<String>,
}

fn default_bias() -> bool {
    true
}

impl DenseConfig {
    fn uses_tanh(&self) -> bool {
        self.activation_function
            .as_deref()
            .is_some_and(|name| name.ends_with("Tanh"))
    }
}

struct DenseProjection {
    linear: Linear,
    tanh: bool,
}

impl DenseProjection {
    fn load(dir: &Path, device: &Device) -> Result<Option<Self>, EmbeddingError> {
        let config_path = dir.join("config.json");
        if !config_path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&config_path)?;
        let config: DenseConfig =
            serde_json::from_str(&raw).map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to parse {}: {}", config_path.display(), e),
            })?;

        let weights = find_model_weights(dir).ok_or_else(|| EmbeddingError::ModelLoadFailed {
            reason: format!("No dense projection weights in {}", dir.display()),
        })?;
        let load_failed = |e: candle_core::Error| EmbeddingError::ModelLoadFailed {
            reason: format!("Failed to load dense projection: {}", e),
        };
        let vb = build_var_builder(&weights, DType::F32, device).map_err(load_failed)?;
        let vb = vb.pp("linear");

        let linear = if config.bias {
            candle_nn::linear(config.in_features, config.out_features, vb)
        } else {
            candle_nn::linear_no_bias(config.in_features, config.out_features, vb)
        }
        .map_err(load_failed)?;

        debug!(
            in_features = config.in_features,
            out_features = config.out_features,
            bias = config.bias,
            tanh = config.uses_tanh(),
            "Dense projection loaded"
        );

        Ok(Some(Self {
            linear,
            tanh: config.uses_tanh(),
        }))
    }

    fn forward(&self, pooled: &Tensor) -> candle_core::Result<Tensor> {
        let projected = self.linear.forward(&pooled.unsqueeze(0)?)?.squeeze(0)?;
        if self.tanh {
            projected.tanh()
        } else {
            Ok(projected)
        }
    }
}

pub(crate) struct InstructorModel {
    encoder: T5EncoderModel,
    dense: Option<DenseProjection>,
    device: Device,
}

impl InstructorModel {
    pub fn load(model_dir: &Path, dense_dir: &Path, device: &Device) -> Result<Self, EmbeddingError> {
        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to read {}: {}", config_path.display(), e),
            }
        })?;
        let mut config: t5::Config =
            serde_json::from_str(&raw).map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to parse T5 config: {}", e),
            })?;
        config.use_cache = false;

        let weights =
            find_model_weights(model_dir).ok_or_else(|| EmbeddingError::ModelLoadFailed {
                reason: format!("No encoder weights in {}", model_dir.display()),
            })?;

        info!(weights = %weights.display(), "Loading T5 encoder");

        let vb = build_var_builder(&weights, DType::F32, device).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to map encoder weights: {}", e),
            }
        })?;
        let encoder =
            T5EncoderModel::load(vb, &config).map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to load T5 encoder: {}", e),
            })?;

        let dense = DenseProjection::load(dense_dir, device)?;

        Ok(Self {
            encoder,
            dense,
            device: device.clone(),
        })
    }

    /// Encodes one tokenized sequence and mean-pools positions `skip..`.
    ///
    /// When `skip` covers the whole sequence (instruction filled the truncation window)
    /// every position is pooled instead.
    pub fn embed_tokens(&mut self, ids: &[u32], skip: usize) -> candle_core::Result<Vec<f32>> {
        let seq_len = ids.len();
        let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;

        // [1, seq_len, d_model]
        let hidden = self.encoder.forward(&input_ids)?;

        let start = if skip < seq_len { skip } else { 0 };
        let pooled = hidden
            .i(0)?
            .narrow(0, start, seq_len - start)?
            .mean(0)?;

        let pooled = match &self.dense {
            Some(dense) => dense.forward(&pooled)?,
            None => pooled,
        };

        pooled.to_dtype(DType::F32)?.to_vec1::<f32>()
    }

    pub fn has_dense(&self) -> bool {
        self.dense.is_some()
    }
}
