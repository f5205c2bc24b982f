//! Startup-time model retrieval: a bucket prefix or a local folder
use crate::services::scorer::{ModelHandle, OnnxSentimentScorer, ScorerError};
use s3_utils::operations::folder_prefix;
use s3_utils::{S3Client, S3Config};
use std::path::PathBuf;
use thiserror::Error;

/// Where the model files live
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// Every object under `prefix` in the bucket makes up the model
    S3 { config: S3Config, prefix: String },
    LocalDir(PathBuf),
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("No model source configured (set MODEL_DIR or S3_BUCKET_NAME)")]
    NotConfigured,

    #[error("No files found in S3 model folder at prefix '{0}'")]
    NoModelFiles(String),

    #[error("Model directory does not exist: {0}")]
    MissingDir(String),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Scorer(#[from] ScorerError),
}

/// Resolve the model once. Failures are logged and leave the handle unavailable
/// for the life of the process.
pub async fn provision(source: Option<ModelSource>) -> ModelHandle {
    let result = match source {
        Some(source) => load_model(source).await,
        None => Err(ProvisionError::NotConfigured),
    };

    match result {
        Ok(scorer) => {
            tracing::info!("Model loaded successfully");
            ModelHandle::ready(scorer)
        }
        Err(e) => {
            tracing::error!(
                "Error loading model: {}. Scoring endpoints will report the model as unavailable.",
                e
            );
            ModelHandle::unavailable(e.to_string())
        }
    }
}

pub async fn load_model(source: ModelSource) -> Result<OnnxSentimentScorer, ProvisionError> {
    match source {
        ModelSource::LocalDir(dir) => {
            if !dir.is_dir() {
                return Err(ProvisionError::MissingDir(dir.display().to_string()));
            }
            tracing::info!(dir = %dir.display(), "Loading model from local directory");
            Ok(OnnxSentimentScorer::from_dir(&dir)?)
        }
        ModelSource::S3 { config, prefix } => {
            let model_dir = download_from_s3(config, &prefix).await?;
            let scorer = OnnxSentimentScorer::from_dir(model_dir.path())?;
            Ok(scorer.with_model_dir(model_dir))
        }
    }
}

/// Copy every object under the prefix into a fresh temporary directory
async fn download_from_s3(
    config: S3Config,
    prefix: &str,
) -> Result<tempfile::TempDir, ProvisionError> {
    let prefix = folder_prefix(prefix);
    let client = S3Client::with_config(config).await;
    let tmp_dir = tempfile::tempdir()?;

    tracing::info!(
        bucket = %client.config().bucket,
        prefix = %prefix,
        "Listing model objects"
    );

    let files = client
        .operations()
        .download_prefix(&prefix, tmp_dir.path())
        .await
        .map_err(|e| ProvisionError::S3(e.to_string()))?;

    if files.is_empty() {
        return Err(ProvisionError::NoModelFiles(prefix));
    }

    let names: Vec<_> = files.iter().filter_map(|path| path.file_name()).collect();
    tracing::info!(dir = %tmp_dir.path().display(), files = ?names, "Model downloaded");

    Ok(tmp_dir)
}
