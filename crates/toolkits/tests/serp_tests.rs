//! SerpAPI-backed search tools against a mock SerpAPI host.

use serde_json::{json, Value};
use tool_core::{ToolCallRequest, ToolCallResponse, ToolContext, ToolExecutor, ToolReference};
use toolkits::search::{self, ExaClient, SerpClient};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn executor(server: &MockServer) -> ToolExecutor {
    let catalog = toolkits::catalog_from(&[search::toolkit_with_clients(
        ExaClient::with_base_url(server.uri()),
        SerpClient::with_base_url(server.uri()),
    )])
    .unwrap();
    ToolExecutor::new(catalog)
}

async fn call(server: &MockServer, tool: &str, inputs: Value) -> ToolCallResponse {
    let inputs = inputs.as_object().cloned().unwrap_or_default();
    let context = ToolContext::new().with_secret("SERP_API_KEY", "serp-key");
    let request =
        ToolCallRequest::new(ToolReference::new("Search", tool), inputs).with_context(context);
    executor(server).call(request).await.unwrap()
}

fn error_message(response: &ToolCallResponse) -> String {
    response.output.error.as_ref().unwrap().message.clone()
}

#[tokio::test]
async fn test_directions_by_address() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google_maps_directions"))
        .and(query_param("api_key", "serp-key"))
        .and(query_param("start_addr", "Times Square, New York"))
        .and(query_param("end_addr", "Central Park, New York"))
        .and(query_param("hl", "en"))
        .and(query_param_is_missing("gl"))
        .and(query_param("distance_unit", "1"))
        .and(query_param("travel_mode", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "directions": [{"travel_mode": "Walking", "arrive_around": 1735732800}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = call(
        &server,
        "GetDirectionsByAddress",
        json!({
            "origin_address": "Times Square, New York",
            "destination_address": "Central Park, New York",
            "distance_unit": "mi",
            "travel_mode": "walking"
        }),
    )
    .await;

    assert!(response.success);
    let value = response.output.value.unwrap();
    assert_eq!(
        value["directions"][0]["arrive_around"],
        json!({"datetime": "2025-01-01T12:00:00+00:00", "timestamp": 1735732800})
    );
    assert_eq!(value["directions"][0]["travel_mode"], "Walking");
}

#[tokio::test]
async fn test_directions_by_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("start_coords", "40.7128,-74.006"))
        .and(query_param("end_coords", "40.7829,-73.9654"))
        .and(query_param("gl", "us"))
        .and(query_param("distance_unit", "0"))
        .and(query_param("travel_mode", "6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"directions": []})))
        .expect(1)
        .mount(&server)
        .await;

    let response = call(
        &server,
        "GetDirectionsByCoordinates",
        json!({
            "origin_latitude": 40.7128,
            "origin_longitude": -74.006,
            "destination_latitude": 40.7829,
            "destination_longitude": -73.9654,
            "country": "US"
        }),
    )
    .await;

    assert!(response.success);
    assert_eq!(response.output.value, Some(json!({"directions": []})));
}

#[tokio::test]
async fn test_directions_reject_bad_locale_and_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let response = call(
        &server,
        "GetDirectionsByAddress",
        json!({
            "origin_address": "a",
            "destination_address": "b",
            "language": "klingon"
        }),
    )
    .await;
    assert!(!response.success);
    assert_eq!(error_message(&response), "Invalid language: klingon");
    assert!(response.output.error.unwrap().can_retry);

    let response = call(
        &server,
        "GetDirectionsByCoordinates",
        json!({
            "origin_latitude": 91.0,
            "origin_longitude": 0.0,
            "destination_latitude": 0.0,
            "destination_longitude": 0.0
        }),
    )
    .await;
    assert!(!response.success);
    assert_eq!(
        error_message(&response),
        "Invalid parameter 'origin_latitude': must be between -90 and 90"
    );
}

#[tokio::test]
async fn test_search_jobs_limits_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google_jobs"))
        .and(query_param("q", "rust developer"))
        .and(query_param("location", "Berlin"))
        .and(query_param("next_page_token", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobs_results": [{"title": "A"}, {"title": "B"}, {"title": "C"}],
            "serpapi_pagination": {"next_page_token": "page-3"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = call(
        &server,
        "SearchJobs",
        json!({
            "query": "rust developer",
            "location": "Berlin",
            "limit": 2,
            "next_page_token": "page-2"
        }),
    )
    .await;

    assert!(response.success);
    assert_eq!(
        response.output.value,
        Some(json!({
            "jobs": [{"title": "A"}, {"title": "B"}],
            "next_page_token": "page-3"
        }))
    );
}

#[tokio::test]
async fn test_search_jobs_without_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "Google hasn't returned any results for this query."
        })))
        .mount(&server)
        .await;

    let response = call(&server, "SearchJobs", json!({"query": "underwater basket weaving"})).await;

    assert!(response.success);
    assert_eq!(
        response.output.value,
        Some(json!({"jobs": [], "next_page_token": null}))
    );
}

#[tokio::test]
async fn test_search_youtube_videos() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "youtube"))
        .and(query_param("search_query", "rust async"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "video_results": [{
                "title": "Async Rust",
                "link": "https://www.youtube.com/watch?v=abc123",
                "length": "12:34",
                "views": 1000,
                "channel": {"name": "Rustacean", "link": "https://www.youtube.com/@rust"}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = call(&server, "SearchYoutubeVideos", json!({"keywords": "rust async"})).await;

    assert!(response.success);
    let video = &response.output.value.unwrap()["videos"][0];
    assert_eq!(video["id"], "abc123");
    assert_eq!(video["duration"], "12:34");
    assert_eq!(video["channel"]["name"], "Rustacean");
}

#[tokio::test]
async fn test_search_walmart_products() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "walmart"))
        .and(query_param("query", "apple iphone"))
        .and(query_param("sort", "price_low"))
        .and(query_param("soft_sort", "false"))
        .and(query_param("nd_en", "true"))
        .and(query_param("min_price", "49.99"))
        .and(query_param("page", "2"))
        .and(query_param("include_filters", "false"))
        .and(query_param_is_missing("max_price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic_results": [{
                "us_item_id": "123",
                "title": "iPhone",
                "rating": 4.5,
                "primary_offer": {"offer_price": 199.0, "currency": "USD"},
                "product_page_url": "https://www.walmart.com/ip/123"
            }],
            "serpapi_pagination": {"other_pages": {"1": "u", "3": "u", "4": "u"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = call(
        &server,
        "SearchWalmartProducts",
        json!({
            "keywords": "apple iphone",
            "sort_by": "price_low_to_high",
            "min_price": 49.99,
            "next_day_delivery": true,
            "page": 2
        }),
    )
    .await;

    assert!(response.success);
    let value = response.output.value.unwrap();
    assert_eq!(value["current_page"], 2);
    assert_eq!(value["total_pages"], 4);
    assert_eq!(value["products"][0]["item_id"], "123");
    assert_eq!(
        value["products"][0]["price"],
        json!({"value": 199.0, "currency": "USD"})
    );
}

#[tokio::test]
async fn test_search_walmart_page_limit() {
    let server = MockServer::start().await;

    let response = call(
        &server,
        "SearchWalmartProducts",
        json!({"keywords": "tv", "page": 101}),
    )
    .await;

    assert!(!response.success);
    assert_eq!(
        error_message(&response),
        "The maximum page value for Walmart search is 100, got 101."
    );
}

#[tokio::test]
async fn test_serp_needs_api_key() {
    let server = MockServer::start().await;
    let inputs = json!({"query": "rust"}).as_object().cloned().unwrap();
    let request = ToolCallRequest::new(ToolReference::new("Search", "SearchJobs"), inputs);

    let response = executor(&server).call(request).await.unwrap();

    assert!(!response.success);
}
