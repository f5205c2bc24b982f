use crate::config::MAX_TRENDING_LIMIT;
use crate::error::{AppError, Result};
use crate::models::{
    AnalyzeRequest, FetchAndAnalyzeRequest, PostAnalysis, Prediction, ScoredPost, TrendingQuery,
};
use crate::services::{normalize_label, FetchError, SentimentScorer};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use std::sync::Arc;

/// GET /api/trending?limit=N
/// Score recent posts; without a model, return the bare texts
pub async fn get_trending(
    state: web::Data<AppState>,
    query: web::Query<TrendingQuery>,
) -> Result<HttpResponse> {
    let limit = query.limit.unwrap_or(state.default_trending_limit);
    if limit == 0 || limit > MAX_TRENDING_LIMIT {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {}",
            MAX_TRENDING_LIMIT
        )));
    }

    let posts = state
        .fetcher
        .fetch_trending(limit)
        .await
        .map_err(|e| AppError::UpstreamFetch {
            message: "Could not fetch recent posts".to_string(),
            details: e.to_string(),
        })?;
    let texts: Vec<String> = posts.into_iter().map(|post| post.text).collect();

    let results = match state.model.scorer() {
        Ok(scorer) => score_texts(scorer, texts).await?,
        Err(_) => {
            tracing::debug!("Model unavailable, returning unscored posts");
            texts.into_iter().map(ScoredPost::unscored).collect()
        }
    };

    Ok(HttpResponse::Ok().json(results))
}

/// POST /api/fetch_and_analyze
/// Fetch the post behind a URL and score it
pub async fn fetch_and_analyze(
    state: web::Data<AppState>,
    body: Option<web::Json<FetchAndAnalyzeRequest>>,
) -> Result<HttpResponse> {
    let url = body
        .and_then(|body| body.into_inner().url)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| AppError::Validation("No URL provided".to_string()))?;

    // Checked before the fetch so an unusable model costs no upstream call
    let scorer = state.model.scorer()?;

    let post = state
        .fetcher
        .fetch_by_url(&url)
        .await
        .map_err(post_fetch_error)?;

    let mut scored = score_texts(scorer, vec![post.text]).await?;
    let ScoredPost {
        text,
        sentiment,
        score,
    } = scored
        .pop()
        .ok_or_else(|| AppError::Analysis("No prediction returned".to_string()))?;

    Ok(HttpResponse::Ok().json(PostAnalysis {
        post_text: text,
        sentiment: sentiment
            .ok_or_else(|| AppError::Analysis("No sentiment returned".to_string()))?,
        score: score.unwrap_or_default(),
    }))
}

/// POST /analyze
/// Score a submitted text
pub async fn analyze(
    state: web::Data<AppState>,
    body: Option<web::Json<AnalyzeRequest>>,
) -> Result<HttpResponse> {
    let text = body
        .and_then(|body| body.into_inner().text)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| AppError::Validation("No text provided".to_string()))?;

    let scorer = state
        .model
        .scorer()
        .map_err(|_| AppError::ModelUnavailable("Model not loaded".to_string()))?;
    let mut scored = score_texts(scorer, vec![text]).await?;
    let result = scored
        .pop()
        .ok_or_else(|| AppError::Analysis("No prediction returned".to_string()))?;

    Ok(HttpResponse::Ok().json(result))
}

/// Run the scorer off the async workers and attach normalized labels
async fn score_texts(
    scorer: Arc<dyn SentimentScorer>,
    texts: Vec<String>,
) -> Result<Vec<ScoredPost>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let (texts, predictions) = web::block(move || {
        let predictions = scorer.score(&texts)?;
        Ok::<(Vec<String>, Vec<Prediction>), crate::services::ScorerError>((texts, predictions))
    })
    .await??;

    if predictions.len() != texts.len() {
        return Err(AppError::Analysis(format!(
            "Expected {} predictions, got {}",
            texts.len(),
            predictions.len()
        )));
    }

    Ok(texts
        .into_iter()
        .zip(predictions)
        .map(|(text, prediction)| {
            ScoredPost::scored(text, normalize_label(&prediction.label), prediction.score)
        })
        .collect())
}

fn post_fetch_error(err: FetchError) -> AppError {
    match err {
        FetchError::NotFound { .. } => AppError::NotFound {
            message: "Could not fetch post".to_string(),
            details: err.to_string(),
        },
        FetchError::InvalidUrl(_) => AppError::Validation(err.to_string()),
        other => AppError::UpstreamFetch {
            message: "Could not fetch post".to_string(),
            details: other.to_string(),
        },
    }
}
