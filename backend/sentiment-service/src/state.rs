use crate::services::{ModelHandle, PostFetcher};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared handler state, built once before the server starts
#[derive(Clone)]
pub struct AppState {
    pub model: ModelHandle,
    pub fetcher: Arc<dyn PostFetcher>,
    pub default_trending_limit: u32,
    pub frontend_dir: PathBuf,
}

impl AppState {
    pub fn new(model: ModelHandle, fetcher: Arc<dyn PostFetcher>) -> Self {
        Self {
            model,
            fetcher,
            default_trending_limit: 10,
            frontend_dir: PathBuf::from("../frontend/build"),
        }
    }

    pub fn with_default_trending_limit(mut self, limit: u32) -> Self {
        self.default_trending_limit = limit;
        self
    }

    pub fn with_frontend_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.frontend_dir = dir.into();
        self
    }
}
