//! Spotify search against a mock Web API.

use serde_json::{json, Value};
use tool_core::{ToolCallRequest, ToolCallResponse, ToolContext, ToolExecutor, ToolReference};
use toolkits::spotify::{self, SpotifyClient};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn executor(server: &MockServer) -> ToolExecutor {
    let catalog = toolkits::catalog_from(&[spotify::toolkit_with_client(
        SpotifyClient::with_base_url(server.uri()),
    )])
    .unwrap();
    ToolExecutor::new(catalog)
}

async fn call(server: &MockServer, inputs: Value) -> ToolCallResponse {
    let inputs = inputs.as_object().cloned().unwrap_or_default();
    let request = ToolCallRequest::new(ToolReference::new("Spotify", "Search"), inputs)
        .with_context(ToolContext::new().with_token("spotify-token"));
    executor(server).call(request).await.unwrap()
}

#[tokio::test]
async fn test_search_joins_types() {
    let server = MockServer::start().await;
    let results = json!({"tracks": {"items": [{"name": "Doxy"}]}, "artists": {"items": []}});
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("authorization", "Bearer spotify-token"))
        .and(query_param("q", "track:Doxy artist:Miles Davis"))
        .and(query_param("type", "track,artist"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let response = call(
        &server,
        json!({"q": "track:Doxy artist:Miles Davis", "types": ["track", "artist"]}),
    )
    .await;

    assert!(response.success);
    assert_eq!(response.output.value, Some(results));
}

#[tokio::test]
async fn test_search_rejects_unknown_type() {
    let server = MockServer::start().await;

    let response = call(&server, json!({"q": "jazz", "types": ["podcast"]})).await;

    assert!(!response.success);
}

#[tokio::test]
async fn test_search_failure_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
        .mount(&server)
        .await;

    let response = call(&server, json!({"q": "jazz", "types": ["album"], "limit": 5})).await;

    assert!(!response.success);
    let error = response.output.error.unwrap();
    assert_eq!(error.message, "Failed to search Spotify: status 401 Unauthorized");
    assert_eq!(error.developer_message.as_deref(), Some("expired"));
}

#[tokio::test]
async fn test_search_without_token_requires_authorization() {
    let server = MockServer::start().await;
    let inputs = json!({"q": "jazz", "types": ["album"]})
        .as_object()
        .cloned()
        .unwrap();
    let request = ToolCallRequest::new(ToolReference::new("Spotify", "Search"), inputs);

    let response = executor(&server).call(request).await.unwrap();

    assert!(!response.success);
    let requirement = response.output.requires_authorization.unwrap();
    assert_eq!(requirement.provider(), "spotify");
}
