//! Sentiment analysis API over social-media posts.
//!
//! A pretrained transformer classifier is provisioned once at startup (from an
//! S3 prefix or a local folder) and shared by the HTTP handlers. Scoring
//! endpoints keep working without it: trending posts are returned unscored and
//! the single-text endpoints report the model as unavailable.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use models::{Post, Prediction, ScoredPost, Sentiment};
pub use services::{
    normalize_label, provision, ModelHandle, ModelSource, PostFetcher, SentimentScorer,
    XApiClient,
};
pub use state::AppState;
