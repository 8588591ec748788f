//! Discord tools against a mock Discord API.

use serde_json::{json, Value};
use tool_core::{ToolCallRequest, ToolCallResponse, ToolContext, ToolExecutor, ToolReference};
use toolkits::discord::{self, DiscordClient};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHANNEL_ID: &str = "123456789012345678";
const SERVER_ID: &str = "223456789012345678";

fn executor(server: &MockServer) -> ToolExecutor {
    let client = DiscordClient::with_base_url(server.uri());
    let catalog = toolkits::catalog_from(&[discord::toolkit_with_client(client)]).unwrap();
    ToolExecutor::new(catalog)
}

async fn call(executor: &ToolExecutor, tool: &str, inputs: Value) -> ToolCallResponse {
    let inputs = inputs.as_object().cloned().unwrap_or_default();
    let request = ToolCallRequest::new(ToolReference::new("Discord", tool), inputs)
        .with_context(ToolContext::new().with_token("discord-token"));
    executor.call(request).await.unwrap()
}

#[tokio::test]
async fn test_send_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/channels/{}/messages", CHANNEL_ID)))
        .and(header("authorization", "Bearer discord-token"))
        .and(body_json(json!({"tts": false, "content": "Hello everyone!"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "323456789012345678",
            "content": "Hello everyone!",
            "channel_id": CHANNEL_ID,
            "author": {"id": "1", "username": "bot", "global_name": null},
            "timestamp": "2025-01-01T12:00:00.000000+00:00",
            "edited_timestamp": null,
            "embeds": [],
            "attachments": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = call(
        &executor(&server),
        "SendMessage",
        json!({"channel_id": CHANNEL_ID, "content": "Hello everyone!"}),
    )
    .await;

    assert!(response.success);
    let value = response.output.value.unwrap();
    assert_eq!(value["message_id"], "323456789012345678");
    assert_eq!(value["author"]["display_name"], "bot");
    assert_eq!(value["channel_id"], CHANNEL_ID);
}

#[tokio::test]
async fn test_send_message_validates_before_calling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let executor = executor(&server);

    let response = call(
        &executor,
        "SendMessage",
        json!({"channel_id": "general", "content": "hi"}),
    )
    .await;
    assert_eq!(
        response.output.error.unwrap().message,
        "Invalid parameter 'channel_id': Invalid channel_id format"
    );

    let response = call(
        &executor,
        "SendMessage",
        json!({"channel_id": CHANNEL_ID, "content": "x".repeat(2001)}),
    )
    .await;
    assert_eq!(
        response.output.error.unwrap().message,
        "Message content cannot exceed 2000 characters"
    );
}

#[tokio::test]
async fn test_rate_limit_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/channels/{}/messages", CHANNEL_ID)))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "3")
                .set_body_json(json!({"message": "You are being rate limited.", "retry_after": 3.0})),
        )
        .mount(&server)
        .await;

    let response = call(
        &executor(&server),
        "SendMessage",
        json!({"channel_id": CHANNEL_ID, "content": "hi"}),
    )
    .await;

    let error = response.output.error.unwrap();
    assert!(error.can_retry);
    assert_eq!(error.retry_after_ms, Some(3000));
    assert_eq!(
        error.message,
        "Discord rate limit exceeded. Please try again after 3 seconds."
    );
    assert_eq!(
        error.developer_message.as_deref(),
        Some("You are being rate limited. (Code: 429)")
    );
}

#[tokio::test]
async fn test_not_found_and_forbidden() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/channels/{}/messages", CHANNEL_ID)))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Unknown Channel", "code": 10003})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/guilds/{}/channels", SERVER_ID)))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"message": "Missing Access", "code": 50001})),
        )
        .mount(&server)
        .await;
    let executor = executor(&server);

    let response = call(&executor, "ListMessages", json!({"channel_id": CHANNEL_ID})).await;
    let error = response.output.error.unwrap();
    assert_eq!(
        error.message,
        "The Discord resource was not found while trying to list messages."
    );
    assert!(!error.can_retry);

    let response = call(&executor, "ListChannels", json!({"server_id": SERVER_ID})).await;
    assert_eq!(
        response.output.error.unwrap().message,
        "You don't have permission to list channels."
    );
}

#[tokio::test]
async fn test_list_messages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/channels/{}/messages", CHANNEL_ID)))
        .and(query_param("limit", "10"))
        .and(query_param("before", "423456789012345678"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "323456789012345678",
                "content": "first",
                "channel_id": CHANNEL_ID,
                "author": {"id": "7", "username": "ann", "global_name": "Ann"},
                "timestamp": "2025-01-01T12:00:00.000000+00:00",
                "edited_timestamp": null,
                "attachments": [],
                "embeds": []
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let response = call(
        &executor(&server),
        "ListMessages",
        json!({"channel_id": CHANNEL_ID, "limit": 10, "before": "423456789012345678"}),
    )
    .await;

    let value = response.output.value.unwrap();
    assert_eq!(value["total_count"], 1);
    assert_eq!(value["channel_id"], CHANNEL_ID);
    assert_eq!(value["messages"][0]["content"], "first");
    assert_eq!(value["messages"][0]["author"]["display_name"], "Ann");
    assert_eq!(value["messages"][0]["reactions"], json!([]));
}

#[tokio::test]
async fn test_list_messages_rejects_bad_paging() {
    let server = MockServer::start().await;
    let executor = executor(&server);

    let response = call(
        &executor,
        "ListMessages",
        json!({
            "channel_id": CHANNEL_ID,
            "before": "423456789012345678",
            "after": "423456789012345679"
        }),
    )
    .await;
    assert_eq!(
        response.output.error.unwrap().message,
        "Can only use one of before, after, or around"
    );

    let response = call(
        &executor,
        "ListMessages",
        json!({"channel_id": CHANNEL_ID, "limit": 101}),
    )
    .await;
    assert_eq!(
        response.output.error.unwrap().message,
        "Invalid parameter 'limit': Limit must be between 1 and 100"
    );
}

#[tokio::test]
async fn test_list_channels_groups_by_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/guilds/{}/channels", SERVER_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "1", "name": "Info", "type": 4, "position": 0},
            {"id": "2", "name": "general", "type": 0, "position": 1, "parent_id": "1"},
            {"id": "3", "name": "Lounge", "type": 4, "position": 2},
            {"id": "4", "name": "voice", "type": 2, "position": 3, "parent_id": "3"},
            {"id": "5", "name": "news", "type": 5, "position": 4}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/guilds/{}", SERVER_ID)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": SERVER_ID, "name": "Test Server"})),
        )
        .mount(&server)
        .await;

    let response = call(&executor(&server), "ListChannels", json!({"server_id": SERVER_ID})).await;

    let value = response.output.value.unwrap();
    assert_eq!(value["server"], json!({"id": SERVER_ID, "name": "Test Server"}));
    assert_eq!(value["categories"].as_array().unwrap().len(), 2);
    assert_eq!(value["text_channels"][0]["name"], "general");
    assert_eq!(value["text_channels"][0]["parent_id"], "1");
    assert_eq!(value["voice_channels"][0]["type"], "voice");
    assert_eq!(value["other_channels"][0]["type"], "announcement");
    assert_eq!(value["total_channels"], 5);
}

#[tokio::test]
async fn test_list_servers_caps_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me/guilds"))
        .and(query_param("limit", "200"))
        .and(query_param("with_counts", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "175928847299117063",
                "name": "Animated",
                "icon": "a_hash",
                "owner": true,
                "permissions": "2147483647",
                "approximate_member_count": 12
            },
            {"id": "175928847299117064", "name": "Plain", "icon": null, "owner": false}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let response = call(&executor(&server), "ListServers", json!({"limit": 500})).await;

    let value = response.output.value.unwrap();
    assert_eq!(value["total_count"], 2);
    assert_eq!(
        value["servers"][0]["icon"],
        "https://cdn.discordapp.com/icons/175928847299117063/a_hash.gif"
    );
    assert_eq!(value["servers"][0]["approximate_member_count"], 12);
    assert_eq!(value["servers"][0]["created_at"], "2016-04-30T11:18:25.796+00:00");
    assert_eq!(value["servers"][1]["icon"], Value::Null);
}

#[tokio::test]
async fn test_get_current_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "80351110224678912",
            "username": "nelly",
            "discriminator": "1337",
            "global_name": "Nelly",
            "avatar": "8342729096ea3675442027381ff50dfe",
            "verified": true,
            "email": "nelly@discord.com",
            "flags": 64,
            "premium_type": 1,
            "locale": "en-US"
        })))
        .mount(&server)
        .await;

    let response = call(&executor(&server), "GetCurrentUser", json!({})).await;

    let value = response.output.value.unwrap();
    assert_eq!(value["username"], "nelly");
    assert_eq!(value["bot"], false);
    assert_eq!(value["accent_color"], Value::Null);
    assert_eq!(value["locale"], "en-US");
}

#[tokio::test]
async fn test_bad_token_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "401: Unauthorized", "code": 0})))
        .mount(&server)
        .await;

    let response = call(&executor(&server), "GetCurrentUser", json!({})).await;

    let error = response.output.error.unwrap();
    assert_eq!(
        error.message,
        "Authentication failed. Please make sure your Discord token is valid."
    );
    assert_eq!(
        error.developer_message.as_deref(),
        Some("401: Unauthorized (Code: 401)")
    );
}

#[tokio::test]
async fn test_get_user_builds_cdn_urls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/80351110224678912"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "80351110224678912",
            "username": "nelly",
            "discriminator": "1337",
            "avatar": "8342729096ea3675442027381ff50dfe",
            "banner": null
        })))
        .mount(&server)
        .await;

    let response = call(&executor(&server), "GetUser", json!({"user_id": "80351110224678912"})).await;

    let value = response.output.value.unwrap();
    assert_eq!(
        value["avatar"],
        "https://cdn.discordapp.com/avatars/80351110224678912/8342729096ea3675442027381ff50dfe.png"
    );
    assert_eq!(value["banner"], Value::Null);
    assert_eq!(value["bot"], false);
    assert_eq!(value["created_at"], "2015-08-10T17:26:37.529+00:00");
}

#[tokio::test]
async fn test_get_server_and_channel() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/guilds/{}", SERVER_ID)))
        .and(query_param("with_counts", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": SERVER_ID,
            "name": "Test Server",
            "owner_id": "1",
            "icon": "a_abc",
            "features": ["COMMUNITY"],
            "verification_level": 1
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/channels/{}", CHANNEL_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": CHANNEL_ID,
            "name": "general",
            "type": 0,
            "guild_id": SERVER_ID,
            "topic": "chat",
            "rate_limit_per_user": 10
        })))
        .mount(&server)
        .await;
    let executor = executor(&server);

    let response = call(
        &executor,
        "GetServer",
        json!({"server_id": SERVER_ID, "with_counts": false}),
    )
    .await;
    let value = response.output.value.unwrap();
    assert_eq!(value["name"], "Test Server");
    assert_eq!(
        value["icon"],
        format!("https://cdn.discordapp.com/icons/{}/a_abc.gif", SERVER_ID)
    );
    assert_eq!(value["features"], json!(["COMMUNITY"]));

    let response = call(&executor, "GetChannel", json!({"channel_id": CHANNEL_ID})).await;
    let value = response.output.value.unwrap();
    assert_eq!(value["type"], "text");
    assert_eq!(value["server_id"], SERVER_ID);
    assert_eq!(value["nsfw"], false);
    assert_eq!(value["permission_overwrites"], json!([]));
}

#[tokio::test]
async fn test_create_channel_maps_type_and_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/guilds/{}/channels", SERVER_ID)))
        .and(body_json(json!({"name": "team-voice", "type": 2, "nsfw": false})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "423456789012345678",
            "name": "team-voice",
            "type": 2,
            "guild_id": SERVER_ID,
            "position": 3
        })))
        .expect(1)
        .mount(&server)
        .await;
    let executor = executor(&server);

    let response = call(
        &executor,
        "CreateChannel",
        json!({"server_id": SERVER_ID, "name": "Team Voice", "type": "Voice"}),
    )
    .await;
    let value = response.output.value.unwrap();
    assert_eq!(value["type"], "voice");
    assert_eq!(value["server_id"], SERVER_ID);

    let response = call(
        &executor,
        "CreateChannel",
        json!({"server_id": SERVER_ID, "name": "lobby", "type": "hologram"}),
    )
    .await;
    assert!(response
        .output
        .error
        .unwrap()
        .message
        .starts_with("Invalid channel type: hologram."));
}

#[tokio::test]
async fn test_create_text_channel_checks_limits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/guilds/{}/channels", SERVER_ID)))
        .and(body_json(json!({
            "name": "announcements",
            "type": 0,
            "nsfw": false,
            "rate_limit_per_user": 60,
            "topic": "News only",
            "parent_id": CHANNEL_ID
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "423456789012345678",
            "name": "announcements",
            "type": 0,
            "guild_id": SERVER_ID,
            "topic": "News only",
            "parent_id": CHANNEL_ID,
            "rate_limit_per_user": 60
        })))
        .expect(1)
        .mount(&server)
        .await;
    let executor = executor(&server);

    let response = call(
        &executor,
        "CreateTextChannel",
        json!({
            "server_id": SERVER_ID,
            "name": "announcements",
            "topic": "News only",
            "parent_category_id": CHANNEL_ID,
            "slowmode_timeout": 60
        }),
    )
    .await;
    let value = response.output.value.unwrap();
    assert_eq!(value["type"], "text");
    assert_eq!(value["category_id"], CHANNEL_ID);
    assert_eq!(value["rate_limit_per_user"], 60);

    let response = call(
        &executor,
        "CreateTextChannel",
        json!({"server_id": SERVER_ID, "name": "x"}),
    )
    .await;
    assert_eq!(
        response.output.error.unwrap().message,
        "Channel Name must be between 2 and 100 characters"
    );

    let response = call(
        &executor,
        "CreateTextChannel",
        json!({"server_id": SERVER_ID, "name": "slow", "slowmode_timeout": 99999}),
    )
    .await;
    assert_eq!(
        response.output.error.unwrap().message,
        "Slowmode Timeout must be between 0 and 21600"
    );
}

#[tokio::test]
async fn test_edit_and_delete_message() {
    let server = MockServer::start().await;
    let message_path = format!("/channels/{}/messages/323456789012345678", CHANNEL_ID);
    Mock::given(method("PATCH"))
        .and(path(message_path.clone()))
        .and(body_json(json!({"content": "Updated"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "323456789012345678",
            "content": "Updated",
            "channel_id": CHANNEL_ID,
            "author": {"id": "1", "username": "bot"},
            "edited_timestamp": "2025-01-01T12:05:00.000000+00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(message_path))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let executor = executor(&server);

    let ids = json!({"channel_id": CHANNEL_ID, "message_id": "323456789012345678"});
    let mut edit = ids.clone();
    edit["content"] = json!("Updated");

    let response = call(&executor, "EditMessage", edit).await;
    let value = response.output.value.unwrap();
    assert_eq!(value["content"], "Updated");
    assert_eq!(value["edited_at"], "2025-01-01T12:05:00.000000+00:00");

    let mut blank = ids.clone();
    blank["content"] = json!("  ");
    let response = call(&executor, "EditMessage", blank).await;
    assert_eq!(
        response.output.error.unwrap().message,
        "Either content or embed must be provided"
    );

    let response = call(&executor, "DeleteMessage", ids).await;
    let value = response.output.value.unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["message"], "Message successfully deleted");
}

#[tokio::test]
async fn test_create_and_list_webhooks() {
    let server = MockServer::start().await;
    let webhook = json!({
        "id": "523456789012345678",
        "name": "Deploys",
        "channel_id": CHANNEL_ID,
        "guild_id": SERVER_ID,
        "token": "tok-en_1",
        "application_id": null,
        "avatar": null
    });
    Mock::given(method("POST"))
        .and(path(format!("/channels/{}/webhooks", CHANNEL_ID)))
        .and(body_json(json!({"name": "Deploys"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(webhook.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/channels/{}/webhooks", CHANNEL_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([webhook])))
        .mount(&server)
        .await;
    let executor = executor(&server);

    let response = call(
        &executor,
        "CreateWebhook",
        json!({"channel_id": CHANNEL_ID, "name": "Deploys"}),
    )
    .await;
    let value = response.output.value.unwrap();
    assert_eq!(
        value["url"],
        "https://discord.com/api/webhooks/523456789012345678/tok-en_1"
    );

    let response = call(&executor, "ListWebhooks", json!({"channel_id": CHANNEL_ID})).await;
    let value = response.output.value.unwrap();
    assert_eq!(value["total_count"], 1);
    assert_eq!(value["webhooks"][0]["name"], "Deploys");
}

#[tokio::test]
async fn test_send_webhook_message_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhooks/523456789012345678/tok-en_1"))
        .and(query_param("wait", "true"))
        .and(body_json(json!({
            "content": "Deployed",
            "username": "CI",
            "embeds": [{
                "color": 0xFF0000,
                "title": "Build 42",
                "fields": [{"name": "Branch", "value": "main", "inline": true}]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "623456789012345678"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = DiscordClient::with_base_url(server.uri());
    let executor = ToolExecutor::new(
        toolkits::catalog_from(&[discord::toolkit_with_client(client)]).unwrap(),
    );
    let url = "https://discord.com/api/webhooks/523456789012345678/tok-en_1";
    let inputs = json!({
        "webhook_url": url,
        "content": "Deployed",
        "username": "CI",
        "embed_title": "Build 42",
        "embed_color": "#FF0000",
        "embed_fields": [{"name": "Branch", "value": "main", "inline": true}]
    });
    let request = ToolCallRequest::new(
        ToolReference::new("Discord", "SendWebhookMessage"),
        inputs.as_object().cloned().unwrap(),
    );
    let response = executor.call(request).await.unwrap();

    let value = response.output.value.unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["message_id"], "623456789012345678");
    assert_eq!(value["status_code"], 200);
    assert_eq!(value["webhook_url"], "https://discord.com/api/webhoo...8/tok-en_1");
}

#[tokio::test]
async fn test_send_webhook_message_rejects_bad_input() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let executor = executor(&server);

    let response = call(
        &executor,
        "SendWebhookMessage",
        json!({"webhook_url": "https://example.com/hook", "content": "hi"}),
    )
    .await;
    assert_eq!(response.output.error.unwrap().message, "Invalid webhook URL format");

    let response = call(
        &executor,
        "SendWebhookMessage",
        json!({"webhook_url": "https://discord.com/api/webhooks/1/abc"}),
    )
    .await;
    assert_eq!(
        response.output.error.unwrap().message,
        "Message must include either text content or an embed"
    );
}
