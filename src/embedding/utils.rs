use std::io;
use std::path::{Path, PathBuf};

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer};

/// Weight files looked up in a model directory, in order of preference.
pub const WEIGHT_FILE_CANDIDATES: [&str; 2] = ["model.safetensors", "pytorch_model.bin"];

/// Loads a tokenizer from a model directory or explicit tokenizer.json path.
pub fn load_tokenizer(model_path: &Path) -> io::Result<Tokenizer> {
    let tokenizer_path = if model_path
        .file_name()
        .is_some_and(|name| name == std::ffi::OsStr::new("tokenizer.json"))
    {
        model_path.to_path_buf()
    } else if model_path.is_dir() {
        model_path.join("tokenizer.json")
    } else {
        model_path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Model path has no parent"))?
            .join("tokenizer.json")
    };

    Tokenizer::from_file(&tokenizer_path).map_err(io::Error::other)
}

/// Loads a tokenizer with truncation enabled for a maximum sequence length.
///
/// Both served models have a fixed maximum sequence length; longer inputs are
/// truncated to fit instead of failing the request.
pub fn load_tokenizer_with_truncation(model_path: &Path, max_len: usize) -> io::Result<Tokenizer> {
    use tokenizers::TruncationParams;

    let mut tokenizer = load_tokenizer(model_path)?;

    let truncation = TruncationParams {
        max_length: max_len,
        ..Default::default()
    };

    tokenizer
        .with_truncation(Some(truncation))
        .map_err(|e| io::Error::other(format!("Failed to configure truncation: {}", e)))?;

    Ok(tokenizer)
}

/// Enables batch-longest padding unless `tokenizer.json` already configures it.
pub fn ensure_batch_padding(tokenizer: &mut Tokenizer) {
    if tokenizer.get_padding().is_some() {
        return;
    }

    let pad_token = "<pad>".to_string();
    let pad_id = tokenizer.token_to_id(&pad_token).unwrap_or(0);
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        pad_id,
        pad_token,
        ..Default::default()
    }));
}

/// Returns the first weight file found in `dir`.
pub fn find_model_weights(dir: &Path) -> Option<PathBuf> {
    WEIGHT_FILE_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Builds a [`VarBuilder`] over safetensors (memory-mapped) or a PyTorch pickle.
pub fn build_var_builder(
    path: &Path,
    dtype: DType,
    device: &Device,
) -> candle_core::Result<VarBuilder<'static>> {
    let is_safetensors = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("safetensors"));

    if is_safetensors {
        // SAFETY: the weight file is treated as read-only for the process lifetime.
        unsafe { VarBuilder::from_mmaped_safetensors(&[path.to_path_buf()], dtype, device) }
    } else {
        VarBuilder::from_pth(path, dtype, device)
    }
}

/// Scales `vector` in place to unit Euclidean norm. Zero vectors are left as-is.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = l2_norm(vector);

    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

pub fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}
