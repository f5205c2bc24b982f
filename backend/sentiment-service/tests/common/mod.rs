#![allow(dead_code)]

use sentiment_service::services::scorer::Result as ScoreResult;
use sentiment_service::{Config, Prediction, SentimentScorer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const TEST_TOKEN: &str = "test-bearer-token";

/// Config pointed at a mock posts API
pub fn config_for(base_url: &str) -> Config {
    Config::from_vars(vec![
        ("X_BEARER_TOKEN".to_string(), TEST_TOKEN.to_string()),
        ("X_API_BASE_URL".to_string(), base_url.to_string()),
        ("TRENDING_QUERY".to_string(), "#news lang:en".to_string()),
    ])
    .expect("test config should load")
}

/// Scorer that gives every text the same label and counts its calls
pub struct FixedScorer {
    label: String,
    score: f32,
    calls: Arc<AtomicUsize>,
}

impl FixedScorer {
    pub fn new(label: &str, score: f32) -> Self {
        Self {
            label: label.to_string(),
            score,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl SentimentScorer for FixedScorer {
    fn score(&self, texts: &[String]) -> ScoreResult<Vec<Prediction>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|_| Prediction {
                label: self.label.clone(),
                score: self.score,
            })
            .collect())
    }
}
