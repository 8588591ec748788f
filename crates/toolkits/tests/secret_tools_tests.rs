//! Exa search and OpenAI images: tools authenticated with API key secrets.

use serde_json::{json, Value};
use tool_core::{ToolCallRequest, ToolCallResponse, ToolContext, ToolExecutor, ToolReference};
use toolkits::images::{self, OpenAiClient};
use toolkits::search::{self, ExaClient};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn executor(server: &MockServer) -> ToolExecutor {
    let catalog = toolkits::catalog_from(&[
        search::toolkit_with_client(ExaClient::with_base_url(server.uri())),
        images::toolkit_with_client(OpenAiClient::with_base_url(server.uri())),
    ])
    .unwrap();
    ToolExecutor::new(catalog)
}

async fn call(
    executor: &ToolExecutor,
    toolkit: &str,
    tool: &str,
    inputs: Value,
) -> ToolCallResponse {
    let inputs = inputs.as_object().cloned().unwrap_or_default();
    let context = ToolContext::new()
        .with_secret("EXA_API_KEY", "exa-key")
        .with_secret("OPENAI_API_KEY", "sk-test");
    let request =
        ToolCallRequest::new(ToolReference::new(toolkit, tool), inputs).with_context(context);
    executor.call(request).await.unwrap()
}

#[tokio::test]
async fn test_search_exa_defaults() {
    let server = MockServer::start().await;
    let results = json!({"results": [{"title": "Rust", "url": "https://www.rust-lang.org"}]});
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("x-api-key", "exa-key"))
        .and(body_json(json!({
            "query": "rust async runtimes",
            "type": "auto",
            "useAutoprompt": false,
            "numResults": 10
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(results.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let response = call(
        &executor(&server),
        "Search",
        "SearchExa",
        json!({"query": "rust async runtimes"}),
    )
    .await;

    assert!(response.success);
    assert_eq!(response.output.value, Some(results));
}

#[tokio::test]
async fn test_search_and_contents_requests_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_json(json!({
            "query": "tokio",
            "type": "keyword",
            "useAutoprompt": true,
            "numResults": 3,
            "contents": {"text": true}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let response = call(
        &executor(&server),
        "Search",
        "SearchAndContentsExa",
        json!({"query": "tokio", "search_type": "keyword", "use_autoprompt": true, "num_results": 3}),
    )
    .await;

    assert!(response.success);
}

#[tokio::test]
async fn test_search_type_is_checked() {
    let server = MockServer::start().await;
    let response = call(
        &executor(&server),
        "Search",
        "SearchExa",
        json!({"query": "tokio", "search_type": "fuzzy"}),
    )
    .await;

    assert_eq!(
        response.output.error.unwrap().message,
        "Invalid parameter 'search_type': must be one of: auto, neural, keyword"
    );
}

#[tokio::test]
async fn test_find_similar_invalid_url_is_retryable() {
    let server = MockServer::start().await;
    let response = call(
        &executor(&server),
        "Search",
        "FindSimilarExa",
        json!({"url": "example dot com"}),
    )
    .await;

    let error = response.output.error.unwrap();
    assert!(error.can_retry);
    assert_eq!(error.retry_after_ms, Some(500));
    assert_eq!(
        error.additional_prompt_content.as_deref(),
        Some("example dot com is not a valid URL.")
    );
}

#[tokio::test]
async fn test_find_similar_rejected_by_exa_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/findSimilar"))
        .respond_with(ResponseTemplate::new(400).set_body_string("url could not be crawled"))
        .mount(&server)
        .await;

    let response = call(
        &executor(&server),
        "Search",
        "FindSimilarAndContentsExa",
        json!({"url": "https://unreachable.invalid/page"}),
    )
    .await;

    let error = response.output.error.unwrap();
    assert!(error.can_retry);
    assert_eq!(
        error.message,
        "https://unreachable.invalid/page is not a valid URL. url could not be crawled"
    );
}

#[tokio::test]
async fn test_missing_exa_key_fails_before_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    std::env::remove_var("EXA_API_KEY");
    let inputs = json!({"query": "rust"}).as_object().cloned().unwrap_or_default();
    let request = ToolCallRequest::new(ToolReference::new("Search", "SearchExa"), inputs);
    let response = executor(&server).call(request).await.unwrap();

    assert_eq!(
        response.output.error.unwrap().message,
        "Secret EXA_API_KEY is not set."
    );
}

#[tokio::test]
async fn test_generate_image_returns_urls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_json(json!({
            "model": "dall-e-2",
            "prompt": "a lighthouse at dusk",
            "n": 1,
            "size": "256x256"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "created": 1700000000,
            "data": [{"url": "https://images.example.com/1.png"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = call(
        &executor(&server),
        "Images",
        "GenerateImage",
        json!({"prompt": "a lighthouse at dusk"}),
    )
    .await;

    assert_eq!(
        response.output.value,
        Some(json!(["https://images.example.com/1.png"]))
    );
}

#[tokio::test]
async fn test_generate_image_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": {"message": "Your request was rejected"}})),
        )
        .mount(&server)
        .await;

    let response = call(
        &executor(&server),
        "Images",
        "GenerateImage",
        json!({"prompt": "anything", "model": "dall-e-3"}),
    )
    .await;

    let error = response.output.error.unwrap();
    assert_eq!(error.message, "OpenAI API returned status 400 Bad Request");
    assert!(error
        .developer_message
        .unwrap()
        .contains("Your request was rejected"));
}
