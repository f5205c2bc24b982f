/// S3 operations for listing and downloading objects
use crate::config::S3Config;
use crate::S3Error;
use aws_sdk_s3::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone)]
pub struct S3Operations {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Operations {
    pub fn new(client: Arc<Client>, config: S3Config) -> Self {
        Self { client, config }
    }

    /// Download file from S3
    pub async fn download_file(&self, key: &str) -> Result<Vec<u8>, S3Error> {
        let response = self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await?;

        let body = response.body.collect().await?;
        Ok(body.into_bytes().to_vec())
    }

    /// List objects with prefix, following continuation tokens
    pub async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, S3Error> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.config.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|obj| obj.key().map(|k| k.to_string())),
            );
        }

        Ok(keys)
    }

    /// Download every object under `prefix` into `dest`, flattened to basenames.
    ///
    /// Directory placeholder keys (ending in `/`) are skipped. Returns the
    /// local paths written, in listing order.
    pub async fn download_prefix(&self, prefix: &str, dest: &Path) -> Result<Vec<PathBuf>, S3Error> {
        let keys = self.list_objects(prefix).await?;
        let mut written = Vec::with_capacity(keys.len());

        for key in keys {
            let Some(file_name) = file_name_for_key(&key) else {
                continue;
            };
            let local_path = dest.join(file_name);

            tracing::info!(key = %key, path = %local_path.display(), "Downloading object");
            let bytes = self.download_file(&key).await?;
            tokio::fs::write(&local_path, bytes).await?;
            written.push(local_path);
        }

        Ok(written)
    }
}

/// Normalize a key prefix so it names a "folder": no leading slash, one trailing slash
pub fn folder_prefix(key: &str) -> String {
    format!("{}/", key.trim_matches('/'))
}

/// Basename of an object key, or `None` for folder placeholders
pub fn file_name_for_key(key: &str) -> Option<&str> {
    match key.rsplit('/').next() {
        Some(name) if !name.is_empty() => Some(name),
        _ => None,
    }
}
