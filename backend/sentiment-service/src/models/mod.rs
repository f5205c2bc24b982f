use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A post as returned by the posts API
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
}

/// Raw scorer output for one input text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Label exactly as the model names it (e.g. `LABEL_2`)
    pub label: String,
    /// Softmax probability of the predicted label, 0.0 to 1.0
    pub score: f32,
}

/// Human-readable sentiment category
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
    /// Label the normalizer does not recognize, passed through unchanged
    Raw(String),
}

impl Sentiment {
    pub fn as_str(&self) -> &str {
        match self {
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
            Sentiment::Positive => "Positive",
            Sentiment::Raw(label) => label,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Sentiment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A text with its sentiment; sentiment fields are absent when no model is loaded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPost {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl ScoredPost {
    pub fn unscored(text: String) -> Self {
        Self {
            text,
            sentiment: None,
            score: None,
        }
    }

    pub fn scored(text: String, sentiment: Sentiment, score: f32) -> Self {
        Self {
            text,
            sentiment: Some(sentiment),
            score: Some(score),
        }
    }
}

/// Response of `POST /api/fetch_and_analyze`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAnalysis {
    pub post_text: String,
    pub sentiment: Sentiment,
    pub score: f32,
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FetchAndAnalyzeRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unscored_post_omits_sentiment_fields() {
        let value = serde_json::to_value(ScoredPost::unscored("hello".into())).unwrap();
        assert_eq!(value, json!({ "text": "hello" }));
    }

    #[test]
    fn test_post_analysis_uses_camel_case() {
        let value = serde_json::to_value(PostAnalysis {
            post_text: "hi".into(),
            sentiment: Sentiment::Raw("LABEL_7".into()),
            score: 0.5,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({ "postText": "hi", "sentiment": "LABEL_7", "score": 0.5 })
        );
    }

    #[test]
    fn test_post_id_is_optional() {
        let post: Post = serde_json::from_value(json!({ "text": "no id" })).unwrap();
        assert_eq!(post.id, None);
    }
}
