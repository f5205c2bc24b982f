//! Configuration for the sentiment service, loaded from environment variables
use crate::services::provisioner::ModelSource;
use s3_utils::S3Config;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Largest page the upstream search endpoint serves
pub const MAX_TRENDING_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Missing X_BEARER_TOKEN in environment (required for the posts API)")]
    MissingBearerToken,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration struct
#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token for the posts API
    #[serde(default)]
    pub x_bearer_token: String,

    #[serde(default = "default_api_base_url")]
    pub x_api_base_url: String,

    /// Search query used by the trending endpoint
    #[serde(default = "default_trending_query")]
    pub trending_query: String,

    #[serde(default = "default_trending_limit")]
    pub trending_default_limit: u32,

    #[serde(default = "default_search_timeout_secs")]
    pub search_timeout_secs: u64,

    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,

    /// Local model folder; takes precedence over the bucket
    #[serde(default)]
    pub model_dir: Option<PathBuf>,

    #[serde(default)]
    pub s3_bucket_name: Option<String>,

    /// Key prefix of the model folder inside the bucket
    #[serde(default = "default_model_key")]
    pub model_key: String,

    #[serde(default = "default_aws_region")]
    pub aws_region: String,

    #[serde(default)]
    pub aws_access_key_id: Option<String>,

    #[serde(default)]
    pub aws_secret_access_key: Option<String>,

    #[serde(default)]
    pub aws_endpoint_url: Option<String>,

    /// Prebuilt frontend bundle served for non-API paths
    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_api_base_url() -> String {
    "https://api.twitter.com/2".to_string()
}

fn default_trending_query() -> String {
    "(#news OR #breaking) lang:en -is:retweet".to_string()
}

fn default_trending_limit() -> u32 {
    10
}

fn default_search_timeout_secs() -> u64 {
    15
}

fn default_lookup_timeout_secs() -> u64 {
    10
}

fn default_model_key() -> String {
    "mbert-sentiment-best".to_string()
}

fn default_aws_region() -> String {
    "eu-north-1".to_string()
}

fn default_frontend_dir() -> PathBuf {
    PathBuf::from("../frontend/build")
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.x_bearer_token.trim().is_empty() {
            return Err(ConfigError::MissingBearerToken);
        }

        if self.trending_default_limit == 0 || self.trending_default_limit > MAX_TRENDING_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "TRENDING_DEFAULT_LIMIT must be between 1 and {}, got {}",
                MAX_TRENDING_LIMIT, self.trending_default_limit
            )));
        }

        url::Url::parse(&self.x_api_base_url).map_err(|e| {
            ConfigError::Invalid(format!("X_API_BASE_URL is not a valid URL: {}", e))
        })?;

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    /// Where the model comes from, or `None` when nothing is configured
    pub fn model_source(&self) -> Option<ModelSource> {
        if let Some(dir) = &self.model_dir {
            return Some(ModelSource::LocalDir(dir.clone()));
        }

        let bucket = non_empty(&self.s3_bucket_name)?;
        let mut s3 = S3Config::new(bucket, self.aws_region.clone());
        if let (Some(id), Some(secret)) = (
            non_empty(&self.aws_access_key_id),
            non_empty(&self.aws_secret_access_key),
        ) {
            s3 = s3.with_static_credentials(id, secret);
        }
        if let Some(endpoint) = non_empty(&self.aws_endpoint_url) {
            s3 = s3.with_endpoint_url(endpoint);
        }

        Some(ModelSource::S3 {
            config: s3,
            prefix: self.model_key.clone(),
        })
    }

    /// Log which settings are present, never their secret values
    pub fn log_config(&self) {
        let presence = |set: bool| if set { "SET" } else { "MISSING" };

        tracing::info!(
            bind = %self.bind_address(),
            api_base = %self.x_api_base_url,
            bearer_token = presence(!self.x_bearer_token.is_empty()),
            model_dir = ?self.model_dir,
            s3_bucket = ?self.s3_bucket_name,
            model_key = %self.model_key,
            aws_region = %self.aws_region,
            aws_access_key_id = presence(non_empty(&self.aws_access_key_id).is_some()),
            aws_secret_access_key = presence(non_empty(&self.aws_secret_access_key).is_some()),
            frontend_dir = %self.frontend_dir.display(),
            "Configuration loaded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(vars(&[("X_BEARER_TOKEN", "token")])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.aws_region, "eu-north-1");
        assert_eq!(config.model_key, "mbert-sentiment-best");
        assert_eq!(config.trending_default_limit, 10);
        assert_eq!(config.search_timeout(), Duration::from_secs(15));
        assert_eq!(config.lookup_timeout(), Duration::from_secs(10));
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_bearer_token_fails() {
        let err = Config::from_vars(vars(&[("PORT", "9000")])).err().unwrap();
        assert!(matches!(err, ConfigError::MissingBearerToken));

        let err = Config::from_vars(vars(&[("X_BEARER_TOKEN", "  ")])).err().unwrap();
        assert!(matches!(err, ConfigError::MissingBearerToken));
    }

    #[test]
    fn test_invalid_port_is_env_error() {
        let err = Config::from_vars(vars(&[("X_BEARER_TOKEN", "t"), ("PORT", "http")]))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::Env(_)));
    }

    #[test]
    fn test_trending_limit_bounds() {
        let err = Config::from_vars(vars(&[
            ("X_BEARER_TOKEN", "t"),
            ("TRENDING_DEFAULT_LIMIT", "500"),
        ]))
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_model_source_prefers_local_dir() {
        let config = Config::from_vars(vars(&[
            ("X_BEARER_TOKEN", "t"),
            ("MODEL_DIR", "/models/sentiment"),
            ("S3_BUCKET_NAME", "bucket"),
        ]))
        .unwrap();

        match config.model_source() {
            Some(ModelSource::LocalDir(dir)) => assert_eq!(dir, PathBuf::from("/models/sentiment")),
            _ => panic!("expected local model source"),
        }
    }

    #[test]
    fn test_model_source_from_bucket() {
        let config = Config::from_vars(vars(&[
            ("X_BEARER_TOKEN", "t"),
            ("S3_BUCKET_NAME", "bucket"),
            ("MODEL_KEY", "models/v3"),
            ("AWS_ACCESS_KEY_ID", "AKIA"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
        ]))
        .unwrap();

        match config.model_source() {
            Some(ModelSource::S3 { config, prefix }) => {
                assert_eq!(config.bucket, "bucket");
                assert_eq!(config.region, "eu-north-1");
                assert!(config.has_static_credentials());
                assert_eq!(prefix, "models/v3");
            }
            _ => panic!("expected S3 model source"),
        }
    }

    #[test]
    fn test_no_model_source() {
        let config = Config::from_vars(vars(&[
            ("X_BEARER_TOKEN", "t"),
            ("S3_BUCKET_NAME", ""),
        ]))
        .unwrap();
        assert!(config.model_source().is_none());
    }
}
