//! Tiny randomly initialised T5 and XLM-RoBERTa checkpoints written to a tempdir,
//! so the real forward-pass paths run in unit tests without downloading weights.

use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use candle_transformers::models::t5::{self, T5EncoderModel};
use candle_transformers::models::xlm_roberta::{self, XLMRobertaForSequenceClassification};
use serde_json::{Value, json};
use tempfile::TempDir;

pub(crate) const TINY_D_MODEL: usize = 8;
pub(crate) const TINY_DENSE_OUT: usize = 6;

const WORDS: &[&str] = &[
    "represent", "the", "sentence", "for", "retrieval", ":", "query", "document", "rust",
    "async", "runtime", "tokio", "binary", "tree", "bread", "garden", "hello", "world",
];

/// A model directory that lives as long as the fixture.
pub(crate) struct ModelFixture {
    _root: TempDir,
    pub dir: PathBuf,
}

impl ModelFixture {
    fn new(name: &str) -> Self {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        Self { _root: root, dir }
    }
}

fn randomize(varmap: &VarMap) {
    for var in varmap.data().lock().unwrap().values() {
        let noise = Tensor::randn(0f32, 0.5, var.shape(), var.device()).unwrap();
        var.set(&noise).unwrap();
    }
}

fn write_json(path: &Path, value: &Value) {
    std::fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

fn special(id: u32, content: &str) -> Value {
    json!({
        "id": id,
        "content": content,
        "single_word": false,
        "lstrip": false,
        "rstrip": false,
        "normalized": false,
        "special": true
    })
}

fn seq(id: &str) -> Value {
    json!({"Sequence": {"id": id, "type_id": 0}})
}

fn tok(id: &str) -> Value {
    json!({"SpecialToken": {"id": id, "type_id": 0}})
}

/// Word-level tokenizer: `specials` take ids `0..`, then [`WORDS`].
fn write_tokenizer(dir: &Path, specials: &[&str], single: Value, pair: Value, markers: &[&str]) {
    let mut vocab = serde_json::Map::new();
    for (id, token) in specials.iter().chain(WORDS).enumerate() {
        vocab.insert((*token).to_string(), json!(id));
    }
    let special_tokens: serde_json::Map<String, Value> = markers
        .iter()
        .map(|marker| {
            let id = specials.iter().position(|s| s == marker).unwrap();
            (
                (*marker).to_string(),
                json!({"id": marker, "ids": [id], "tokens": [marker]}),
            )
        })
        .collect();

    write_json(
        &dir.join("tokenizer.json"),
        &json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": specials
                .iter()
                .enumerate()
                .map(|(id, s)| special(id as u32, s))
                .collect::<Vec<_>>(),
            "normalizer": {"type": "Lowercase"},
            "pre_tokenizer": {"type": "Whitespace"},
            "post_processor": {
                "type": "TemplateProcessing",
                "single": single,
                "pair": pair,
                "special_tokens": special_tokens
            },
            "decoder": null,
            "model": {"type": "WordLevel", "vocab": vocab, "unk_token": "<unk>"}
        }),
    );
}

pub(crate) fn tiny_t5_config() -> Value {
    json!({
        "vocab_size": 32,
        "d_model": TINY_D_MODEL,
        "d_kv": 4,
        "d_ff": 16,
        "num_layers": 2,
        "num_heads": 2,
        "relative_attention_num_buckets": 8,
        "relative_attention_max_distance": 16,
        "dropout_rate": 0.0,
        "layer_norm_epsilon": 1e-6,
        "initializer_factor": 1.0,
        "feed_forward_proj": "relu",
        "is_encoder_decoder": true,
        "use_cache": false,
        "pad_token_id": 0,
        "eos_token_id": 1
    })
}

/// Instructor-style directory: T5 encoder, `</s>`-terminated tokenizer and,
/// when `dense` is set, a bias-free tanh projection under `2_Dense/`.
pub(crate) fn tiny_instructor(dense: bool) -> ModelFixture {
    let fixture = ModelFixture::new("tiny-instructor");
    let config = tiny_t5_config();
    write_json(&fixture.dir.join("config.json"), &config);

    let t5_config: t5::Config = serde_json::from_value(config).unwrap();
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    T5EncoderModel::load(vb, &t5_config).unwrap();
    randomize(&varmap);
    varmap.save(fixture.dir.join("model.safetensors")).unwrap();

    write_tokenizer(
        &fixture.dir,
        &["<pad>", "</s>", "<unk>"],
        json!([seq("A"), tok("</s>")]),
        json!([seq("A"), tok("</s>"), seq("B"), tok("</s>")]),
        &["</s>"],
    );

    if dense {
        write_dense(
            &fixture.dir.join("2_Dense"),
            json!({
                "in_features": TINY_D_MODEL,
                "out_features": TINY_DENSE_OUT,
                "bias": false,
                "activation_function": "torch.nn.modules.activation.Tanh"
            }),
        );
    }
    fixture
}

/// Writes a bias-free projection with the given `config.json`.
pub(crate) fn write_dense(dir: &Path, config: Value) {
    std::fs::create_dir_all(dir).unwrap();
    write_json(&dir.join("config.json"), &config);

    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    candle_nn::linear_no_bias(TINY_D_MODEL, TINY_DENSE_OUT, vb.pp("linear")).unwrap();
    randomize(&varmap);
    varmap.save(dir.join("model.safetensors")).unwrap();
}

/// BGE-style directory: XLM-R sequence classifier with one label.
pub(crate) fn tiny_reranker() -> ModelFixture {
    let fixture = ModelFixture::new("tiny-reranker");
    let config = json!({
        "hidden_size": TINY_D_MODEL,
        "layer_norm_eps": 1e-5,
        "attention_probs_dropout_prob": 0.0,
        "hidden_dropout_prob": 0.0,
        "num_attention_heads": 2,
        "position_embedding_type": "absolute",
        "intermediate_size": 16,
        "hidden_act": "gelu",
        "num_hidden_layers": 2,
        "vocab_size": 32,
        "max_position_embeddings": 64,
        "type_vocab_size": 1,
        "pad_token_id": 1
    });
    write_json(&fixture.dir.join("config.json"), &config);

    let xlmr_config: xlm_roberta::Config = serde_json::from_value(config).unwrap();
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    XLMRobertaForSequenceClassification::new(1, &xlmr_config, vb).unwrap();
    randomize(&varmap);
    varmap.save(fixture.dir.join("model.safetensors")).unwrap();

    write_tokenizer(
        &fixture.dir,
        &["<s>", "<pad>", "</s>", "<unk>"],
        json!([tok("<s>"), seq("A"), tok("</s>")]),
        json!([
            tok("<s>"),
            seq("A"),
            tok("</s>"),
            tok("</s>"),
            seq("B"),
            tok("</s>")
        ]),
        &["<s>", "</s>"],
    );
    fixture
}
