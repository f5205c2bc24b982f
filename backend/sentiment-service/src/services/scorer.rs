//! Sequence classification over an ONNX export of the sentiment model.
//!
//! The model folder must hold `model.onnx` and `tokenizer.json`, with an
//! optional `config.json` naming the classes. A transformers checkpoint saved
//! with `save_pretrained` has to be exported first, e.g.
//! `optimum-cli export onnx --model <checkpoint> --task text-classification <out>`.
use crate::models::Prediction;
use ndarray::Array2;
use ort::session::{Session, SessionInputValue, SessionOutputs};
use ort::value::Tensor;
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use thiserror::Error;
use tokenizers::{Tokenizer, TruncationParams};

/// Longest token sequence fed to the classifier
pub const MAX_SEQUENCE_LENGTH: usize = 512;

pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("Model not available")]
    Unavailable,

    #[error("Model file not found: {0} (export the checkpoint with `optimum-cli export onnx --task text-classification`)")]
    ModelNotFound(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(String),

    #[error("Invalid model config: {0}")]
    Config(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScorerError>;

/// Text classifier producing one prediction per input, in input order
#[cfg_attr(test, mockall::automock)]
pub trait SentimentScorer: Send + Sync {
    fn score(&self, texts: &[String]) -> Result<Vec<Prediction>>;
}

/// Process-wide model state, decided once at startup
#[derive(Clone)]
pub enum ModelHandle {
    Ready(Arc<dyn SentimentScorer>),
    Unavailable { reason: String },
}

impl ModelHandle {
    pub fn ready(scorer: impl SentimentScorer + 'static) -> Self {
        ModelHandle::Ready(Arc::new(scorer))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        ModelHandle::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelHandle::Ready(_))
    }

    pub fn scorer(&self) -> Result<Arc<dyn SentimentScorer>> {
        match self {
            ModelHandle::Ready(scorer) => Ok(scorer.clone()),
            ModelHandle::Unavailable { .. } => Err(ScorerError::Unavailable),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ModelConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

/// Sequence classifier exported to ONNX, run with ONNX Runtime
pub struct OnnxSentimentScorer {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    labels: Vec<String>,
    logits_output: String,
    uses_token_type_ids: bool,
    // Keeps a downloaded model folder alive as long as the scorer
    _model_dir: Option<TempDir>,
}

impl OnnxSentimentScorer {
    /// Load `model.onnx`, `tokenizer.json` and the optional `config.json` from `dir`
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();

        let model_path = dir.join(MODEL_FILE);
        if !model_path.exists() {
            return Err(ScorerError::ModelNotFound(model_path.display().to_string()));
        }
        let tokenizer_path = dir.join(TOKENIZER_FILE);
        if !tokenizer_path.exists() {
            return Err(ScorerError::ModelNotFound(
                tokenizer_path.display().to_string(),
            ));
        }

        let labels = load_labels(&dir.join(CONFIG_FILE))?;

        let tokenizer = load_tokenizer(&tokenizer_path)?;

        let session = Session::builder()
            .map_err(|e| ScorerError::OnnxRuntime(e.to_string()))?
            .commit_from_file(&model_path)
            .map_err(|e| ScorerError::OnnxRuntime(e.to_string()))?;

        let uses_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");
        let logits_output = session
            .outputs
            .iter()
            .map(|output| output.name.clone())
            .find(|name| name == "logits")
            .or_else(|| session.outputs.first().map(|output| output.name.clone()))
            .ok_or_else(|| ScorerError::OnnxRuntime("Model declares no outputs".to_string()))?;

        tracing::info!(
            model = %model_path.display(),
            labels = ?labels,
            token_type_ids = uses_token_type_ids,
            "Sentiment model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            labels,
            logits_output,
            uses_token_type_ids,
            _model_dir: None,
        })
    }

    /// Tie the lifetime of a temporary model folder to this scorer
    pub fn with_model_dir(mut self, dir: TempDir) -> Self {
        self._model_dir = Some(dir);
        self
    }

    /// Run the graph and return the flattened `[batch, num_labels]` logits
    fn run_inference(&self, batch: EncodedBatch) -> Result<Vec<f32>> {
        let ort_err = |e: ort::Error| ScorerError::OnnxRuntime(e.to_string());
        let EncodedBatch {
            input_ids,
            attention_mask,
            token_type_ids,
        } = batch;

        let mut inputs: Vec<(Cow<'_, str>, SessionInputValue<'_>)> = vec![
            (
                Cow::Borrowed("input_ids"),
                SessionInputValue::from(Tensor::from_array(input_ids).map_err(ort_err)?),
            ),
            (
                Cow::Borrowed("attention_mask"),
                SessionInputValue::from(Tensor::from_array(attention_mask).map_err(ort_err)?),
            ),
        ];
        if self.uses_token_type_ids {
            inputs.push((
                Cow::Borrowed("token_type_ids"),
                SessionInputValue::from(Tensor::from_array(token_type_ids).map_err(ort_err)?),
            ));
        }

        // `run` needs exclusive access to the session
        let mut session = self
            .session
            .lock()
            .map_err(|e| ScorerError::Inference(format!("Failed to lock session: {}", e)))?;

        let outputs: SessionOutputs = session.run(inputs).map_err(ort_err)?;
        let logits = outputs
            .get(self.logits_output.as_str())
            .ok_or_else(|| ScorerError::Inference("No logits tensor".to_string()))?;
        let (_, data) = logits.try_extract_tensor::<f32>().map_err(ort_err)?;

        Ok(data.to_vec())
    }
}

impl SentimentScorer for OnnxSentimentScorer {
    fn score(&self, texts: &[String]) -> Result<Vec<Prediction>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let batch = encode_batch(&self.tokenizer, texts)?;
        let logits = self.run_inference(batch)?;
        predictions_from_logits(&logits, texts.len(), &self.labels)
    }
}

/// Tokenizer input tensors, `[batch, seq]`, zero padded to the longest text
#[derive(Debug, Clone, PartialEq)]
struct EncodedBatch {
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
    token_type_ids: Array2<i64>,
}

fn load_tokenizer(path: &Path) -> Result<Tokenizer> {
    let mut tokenizer =
        Tokenizer::from_file(path).map_err(|e| ScorerError::Tokenizer(e.to_string()))?;
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: MAX_SEQUENCE_LENGTH,
            ..Default::default()
        }))
        .map_err(|e| ScorerError::Tokenizer(e.to_string()))?;
    Ok(tokenizer)
}

fn encode_batch(tokenizer: &Tokenizer, texts: &[String]) -> Result<EncodedBatch> {
    let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let encodings = tokenizer
        .encode_batch(inputs, true)
        .map_err(|e| ScorerError::Tokenizer(e.to_string()))?;

    let seq_len = encodings
        .iter()
        .map(|encoding| encoding.get_ids().len())
        .max()
        .unwrap_or(0);
    let shape = (encodings.len(), seq_len);
    let mut batch = EncodedBatch {
        input_ids: Array2::zeros(shape),
        attention_mask: Array2::zeros(shape),
        token_type_ids: Array2::zeros(shape),
    };

    for (row, encoding) in encodings.iter().enumerate() {
        let tokens = encoding
            .get_ids()
            .iter()
            .zip(encoding.get_attention_mask())
            .zip(encoding.get_type_ids());
        for (col, ((&id, &mask), &type_id)) in tokens.enumerate() {
            batch.input_ids[[row, col]] = i64::from(id);
            batch.attention_mask[[row, col]] = i64::from(mask);
            batch.token_type_ids[[row, col]] = i64::from(type_id);
        }
    }

    Ok(batch)
}

/// Split flattened logits into one row per text and take each row's top class
fn predictions_from_logits(
    logits: &[f32],
    batch_size: usize,
    labels: &[String],
) -> Result<Vec<Prediction>> {
    if batch_size == 0 {
        return Ok(Vec::new());
    }
    if logits.is_empty() || logits.len() % batch_size != 0 {
        return Err(ScorerError::Inference(format!(
            "Unexpected logits length {} for batch of {}",
            logits.len(),
            batch_size
        )));
    }
    let num_labels = logits.len() / batch_size;

    logits
        .chunks(num_labels)
        .map(|row| {
            let (index, score) = top_prediction(row)
                .ok_or_else(|| ScorerError::Inference("Empty logits row".to_string()))?;
            let label = labels
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("LABEL_{}", index));
            Ok(Prediction { label, score })
        })
        .collect()
}

/// Read `id2label` from the model's `config.json`, indexed by class id.
/// A missing file yields no names (labels fall back to `LABEL_<id>`).
fn load_labels(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)?;
    let config: ModelConfig =
        serde_json::from_str(&raw).map_err(|e| ScorerError::Config(e.to_string()))?;
    labels_from_id2label(&config.id2label)
}

/// Class ids must cover `0..n` exactly once
fn labels_from_id2label(id2label: &HashMap<String, String>) -> Result<Vec<String>> {
    let mut labels: Vec<Option<String>> = vec![None; id2label.len()];
    for (id, label) in id2label {
        let index: usize = id
            .parse()
            .map_err(|_| ScorerError::Config(format!("Non-numeric label id '{}'", id)))?;
        let slot = labels.get_mut(index).ok_or_else(|| {
            ScorerError::Config(format!(
                "Label id {} out of range for {} labels",
                index,
                id2label.len()
            ))
        })?;
        if slot.replace(label.clone()).is_some() {
            return Err(ScorerError::Config(format!("Duplicate label id {}", index)));
        }
    }

    // No duplicates and every id below the count means every slot is filled
    Ok(labels.into_iter().flatten().collect())
}

/// Arg-max class of a logits row with its softmax probability
pub fn top_prediction(logits: &[f32]) -> Option<(usize, f32)> {
    let (index, &max) = logits
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))?;

    let denominator: f32 = logits.iter().map(|&logit| (logit - max).exp()).sum();
    Some((index, 1.0 / denominator))
}
