/// S3 configuration shared across services
use serde::Deserialize;
use std::fmt;

#[derive(Clone, Deserialize)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Static access key; the default AWS credential chain is used when unset
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Endpoint override for S3-compatible stores (MinIO, LocalStack)
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Whether to use path-style addressing (false = virtual-hosted-style)
    #[serde(default)]
    pub path_style: bool,
}

impl S3Config {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            access_key_id: None,
            secret_access_key: None,
            endpoint_url: None,
            path_style: false,
        }
    }

    /// Use a fixed key pair instead of the default credential chain
    pub fn with_static_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self.path_style = true;
        self
    }

    /// Both halves of the key pair are present
    pub fn has_static_credentials(&self) -> bool {
        matches!(
            (&self.access_key_id, &self.secret_access_key),
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty()
        )
    }
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "SET"))
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "SET"),
            )
            .field("endpoint_url", &self.endpoint_url)
            .field("path_style", &self.path_style)
            .finish()
    }
}
