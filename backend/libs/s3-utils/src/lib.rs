//! Shared S3 utilities
//!
//! Provides a configured AWS S3 client and the object operations
//! services need for pulling artifacts out of a bucket.
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::Client;
use std::sync::Arc;

pub mod config;
pub mod operations;

pub use config::S3Config;
pub use operations::S3Operations;

/// Boxed error returned by every S3 helper
pub type S3Error = Box<dyn std::error::Error + Send + Sync>;

/// Shared S3 client wrapper
#[derive(Clone)]
pub struct S3Client {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Client {
    /// Create new S3 client with custom configuration
    pub async fn with_config(config: S3Config) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if config.has_static_credentials() {
            if let (Some(id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
                loader = loader.credentials_provider(Credentials::new(
                    id.clone(),
                    secret.clone(),
                    None,
                    None,
                    "s3-utils-static",
                ));
            }
        }

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let shared = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.path_style)
            .build();

        tracing::debug!(
            bucket = %config.bucket,
            region = %config.region,
            static_credentials = config.has_static_credentials(),
            "S3 client configured"
        );

        Self {
            client: Arc::new(Client::from_conf(s3_config)),
            config,
        }
    }

    /// Get S3 configuration
    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Object operations bound to this client's bucket
    pub fn operations(&self) -> S3Operations {
        S3Operations::new(self.client.clone(), self.config.clone())
    }
}
