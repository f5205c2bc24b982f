// Posts API client against a mock upstream

mod common;

use common::{config_for, TEST_TOKEN};
use sentiment_service::services::FetchError;
use sentiment_service::{PostFetcher, XApiClient};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client(server: &MockServer) -> XApiClient {
    XApiClient::from_config(&config_for(&server.uri())).unwrap()
}

#[tokio::test]
async fn test_trending_requests_minimum_page_and_truncates() {
    let server = MockServer::start().await;
    let posts: Vec<_> = (1..=8)
        .map(|i| json!({ "id": i.to_string(), "text": format!("post {}", i) }))
        .collect();

    Mock::given(method("GET"))
        .and(path("/tweets/search/recent"))
        .and(header("authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
        .and(query_param("query", "#news lang:en"))
        .and(query_param("max_results", "10"))
        .and(query_param("tweet.fields", "text,id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": posts })))
        .expect(1)
        .mount(&server)
        .await;

    let posts = client(&server).await.fetch_trending(5).await.unwrap();
    assert_eq!(posts.len(), 5);
    assert_eq!(posts[0].text, "post 1");
    assert_eq!(posts[4].id.as_deref(), Some("5"));
}

#[tokio::test]
async fn test_trending_passes_large_limits_through() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tweets/search/recent"))
        .and(query_param("max_results", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let posts = client(&server).await.fetch_trending(50).await.unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn test_trending_without_data_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tweets/search/recent"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "meta": { "result_count": 0 } })),
        )
        .mount(&server)
        .await;

    let posts = client(&server).await.fetch_trending(10).await.unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn test_trending_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(503).set_body_string("over capacity"))
        .mount(&server)
        .await;

    let err = client(&server).await.fetch_trending(10).await.unwrap_err();
    match err {
        FetchError::Upstream { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "over capacity");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_lookup_uses_last_path_segment() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tweets/1790000000000000001"))
        .and(header("authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
        .and(query_param("tweet.fields", "text"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "1790000000000000001", "text": "What a match!" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let post = client(&server)
        .await
        .fetch_by_url("https://x.com/someone/status/1790000000000000001?s=20")
        .await
        .unwrap();
    assert_eq!(post.text, "What a match!");
}

#[tokio::test]
async fn test_lookup_missing_post_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tweets/404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tweets/200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{
                "title": "Not Found Error",
                "detail": "Could not find tweet with id: [200]."
            }]
        })))
        .mount(&server)
        .await;

    let client = client(&server).await;

    let err = client.fetch_by_url("https://x.com/a/status/404").await.unwrap_err();
    assert!(matches!(err, FetchError::NotFound { .. }));

    let err = client.fetch_by_url("https://x.com/a/status/200").await.unwrap_err();
    match err {
        FetchError::NotFound { id, detail } => {
            assert_eq!(id, "200");
            assert!(detail.contains("Could not find tweet"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_lookup_server_error_is_upstream() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tweets/5"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .fetch_by_url("https://x.com/a/status/5")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Upstream { status: 500, .. }));
}

#[tokio::test]
async fn test_lookup_rejects_url_without_id() {
    let server = MockServer::start().await;

    let err = client(&server)
        .await
        .fetch_by_url("https://x.com/")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl(_)));
}
