pub mod labels;
pub mod post_fetcher;
pub mod provisioner;
pub mod scorer;

pub use labels::normalize_label;
pub use post_fetcher::{extract_post_id, FetchError, PostFetcher, XApiClient};
pub use provisioner::{provision, ModelSource, ProvisionError};
pub use scorer::{ModelHandle, OnnxSentimentScorer, ScorerError, SentimentScorer};
