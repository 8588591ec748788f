//! Discord users, servers, channels and messages.
//!
//! All tools act with the caller's OAuth token. Discord errors are mapped to
//! readable messages; rate limits (429) come back as retryable errors carrying
//! the server's `Retry-After` delay.

mod client;
mod validation;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tool_core::{
    InputParameter, Param, Tool, ToolArgs, ToolAuthRequirement, ToolContext, ToolError,
    ToolOutputSchema, ToolRequirements, Toolkit,
};

pub use client::{map_status, DiscordClient, DISCORD_API_URL};
pub use validation::{
    channel_type_code, channel_type_name, check_length, check_range, icon_url, is_snowflake,
    normalize_channel_name, parse_embed_color, parse_webhook_url, snowflake_created_at,
    validate_message_content, validate_snowflake, CREATABLE_CHANNEL_TYPES, DEFAULT_EMBED_COLOR,
    MAX_MESSAGE_LENGTH,
};

pub const TOOLKIT_NAME: &str = "Discord";

const IDENTIFY_SCOPES: [&str; 1] = ["identify"];
const MESSAGE_READ_SCOPES: [&str; 2] = ["bot", "messages.read"];
const MESSAGE_WRITE_SCOPES: [&str; 2] = ["bot", "messages.write"];
const CHANNEL_READ_SCOPES: [&str; 2] = ["bot", "channels.read"];
const SERVER_READ_SCOPES: [&str; 2] = ["bot", "guilds.read"];
const CHANNEL_WRITE_SCOPES: [&str; 2] = ["bot", "channels.write"];
const WEBHOOK_SCOPES: [&str; 2] = ["bot", "webhook.incoming"];

const MAX_SERVER_LIMIT: i64 = 200;
const MAX_MESSAGE_LIMIT: i64 = 100;
const DEFAULT_MESSAGE_LIMIT: i64 = 50;
const MAX_TOPIC_LENGTH: usize = 1024;
const MAX_SLOWMODE_SECS: i64 = 21600;
const MAX_WEBHOOK_NAME_LENGTH: usize = 80;
const MAX_EMBED_FIELDS: usize = 25;

fn requires(scopes: &[&str]) -> ToolRequirements {
    ToolRequirements {
        authorization: Some(ToolAuthRequirement::discord(scopes.iter().copied())),
        secrets: Vec::new(),
    }
}

fn author_summary(author: &Value) -> Value {
    json!({
        "id": author.get("id"),
        "username": author.get("username"),
        "display_name": author
            .get("global_name")
            .filter(|v| !v.is_null())
            .or_else(|| author.get("username")),
    })
}

fn items(data: &Value) -> &[Value] {
    data.as_array().map(Vec::as_slice).unwrap_or_default()
}

fn cdn_asset(kind: &str, user_id: &str, hash: &Value) -> Value {
    hash.as_str()
        .map(|hash| {
            Value::String(format!(
                "https://cdn.discordapp.com/{}/{}/{}.png",
                kind, user_id, hash
            ))
        })
        .unwrap_or(Value::Null)
}

fn created_at(id: &Value) -> Value {
    id.as_str()
        .and_then(snowflake_created_at)
        .map(|t| Value::String(t.to_rfc3339()))
        .unwrap_or(Value::Null)
}

pub struct GetCurrentUser {
    client: Arc<DiscordClient>,
}

#[async_trait]
impl Tool for GetCurrentUser {
    fn name(&self) -> &str {
        "GetCurrentUser"
    }

    fn description(&self) -> &str {
        "Get information about the currently authenticated Discord user."
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Information about the authenticated user")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(&IDENTIFY_SCOPES)
    }

    async fn execute(&self, context: &ToolContext, _args: ToolArgs) -> Result<Value, ToolError> {
        let user = self
            .client
            .request(
                context,
                Method::GET,
                "users/@me",
                &[],
                None,
                "get current user information",
            )
            .await?;

        Ok(json!({
            "id": user.get("id"),
            "username": user.get("username"),
            "discriminator": user.get("discriminator"),
            "global_name": user.get("global_name"),
            "avatar": user.get("avatar"),
            "bot": user.get("bot").cloned().unwrap_or(Value::Bool(false)),
            "email": user.get("email"),
            "verified": user.get("verified"),
            "flags": user.get("flags"),
            "premium_type": user.get("premium_type"),
            "accent_color": user.get("accent_color"),
            "locale": user.get("locale"),
        }))
    }
}

pub struct ListServers {
    client: Arc<DiscordClient>,
}

#[async_trait]
impl Tool for ListServers {
    fn name(&self) -> &str {
        "ListServers"
    }

    fn description(&self) -> &str {
        "List the Discord servers (guilds) the current user or bot is a member of."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<i64>("limit", "Maximum number of servers to retrieve (1-200)")
                .with_default(),
            Param::of::<bool>("with_counts", "Include approximate member counts").with_default(),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("List of Discord servers")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(&SERVER_READ_SCOPES)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let limit = args.get_i64_or("limit", 100)?;
        let mut query = Vec::new();
        if args.get_bool_or("with_counts", true) {
            query.push(("with_counts", "true".to_string()));
        }
        if limit > 0 {
            query.push(("limit", limit.min(MAX_SERVER_LIMIT).to_string()));
        }

        let data = self
            .client
            .request(
                context,
                Method::GET,
                "users/@me/guilds",
                &query,
                None,
                "list servers",
            )
            .await?;

        let servers: Vec<Value> = items(&data)
            .iter()
            .map(|server| {
                let id = server["id"].as_str().unwrap_or_default();
                let icon = server["icon"]
                    .as_str()
                    .map(|hash| Value::String(icon_url(id, hash)))
                    .unwrap_or(Value::Null);
                json!({
                    "id": server.get("id"),
                    "name": server.get("name"),
                    "icon": icon,
                    "owner": server.get("owner"),
                    "permissions": server.get("permissions"),
                    "approximate_member_count": server.get("approximate_member_count"),
                    "approximate_presence_count": server.get("approximate_presence_count"),
                    "created_at": created_at(&server["id"]),
                })
            })
            .collect();

        Ok(json!({
            "total_count": servers.len(),
            "servers": servers,
        }))
    }
}

pub struct ListChannels {
    client: Arc<DiscordClient>,
}

#[async_trait]
impl Tool for ListChannels {
    fn name(&self) -> &str {
        "ListChannels"
    }

    fn description(&self) -> &str {
        "List the channels of a Discord server, grouped by channel type."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![Param::of::<String>(
            "server_id",
            "ID of the server (guild) to list channels from",
        )]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("List of channels in the server")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(&CHANNEL_READ_SCOPES)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let server_id = args.get_string("server_id")?;
        validate_snowflake(&server_id, "server_id")?;

        let channels = self
            .client
            .request(
                context,
                Method::GET,
                &format!("guilds/{}/channels", server_id),
                &[],
                None,
                "list channels",
            )
            .await?;
        let server = self
            .client
            .request(
                context,
                Method::GET,
                &format!("guilds/{}", server_id),
                &[],
                None,
                "retrieve server information",
            )
            .await?;

        let mut categories = Vec::new();
        let mut text_channels = Vec::new();
        let mut voice_channels = Vec::new();
        let mut other_channels = Vec::new();

        for channel in items(&channels) {
            let kind = channel["type"].as_u64().unwrap_or(0);
            let info = json!({
                "id": channel.get("id"),
                "name": channel.get("name"),
                "type": channel_type_name(kind),
                "position": channel.get("position"),
                "parent_id": channel.get("parent_id"),
                "nsfw": channel["nsfw"].as_bool().unwrap_or(false),
            });
            match kind {
                0 => text_channels.push(info),
                2 => voice_channels.push(info),
                4 => categories.push(info),
                _ => other_channels.push(info),
            }
        }

        Ok(json!({
            "server": {"id": server.get("id"), "name": server.get("name")},
            "categories": categories,
            "text_channels": text_channels,
            "voice_channels": voice_channels,
            "other_channels": other_channels,
            "total_channels": items(&channels).len(),
        }))
    }
}

pub struct SendMessage {
    client: Arc<DiscordClient>,
}

#[async_trait]
impl Tool for SendMessage {
    fn name(&self) -> &str {
        "SendMessage"
    }

    fn description(&self) -> &str {
        "Send a new text message to a Discord channel."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("channel_id", "ID of the channel to send the message to"),
            Param::of::<String>("content", "Text content of the message (up to 2000 characters)"),
            Param::of::<bool>("tts", "Whether to send as a TTS (text-to-speech) message")
                .with_default(),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Details of the sent message")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(&MESSAGE_WRITE_SCOPES)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let channel_id = args.get_string("channel_id")?;
        validate_snowflake(&channel_id, "channel_id")?;
        let content = args.get_string_opt("content");
        let content = validate_message_content(content.as_deref())?;

        let payload = json!({
            "tts": args.get_bool_or("tts", false),
            "content": content,
        });
        let message = self
            .client
            .request(
                context,
                Method::POST,
                &format!("channels/{}/messages", channel_id),
                &[],
                Some(&payload),
                "send message",
            )
            .await?;

        Ok(json!({
            "message_id": message.get("id"),
            "content": message.get("content"),
            "author": author_summary(&message["author"]),
            "channel_id": message.get("channel_id"),
            "timestamp": message.get("timestamp"),
            "edited_at": message.get("edited_timestamp"),
            "embeds": message.get("embeds").cloned().unwrap_or_else(|| json!([])),
            "attachments": message.get("attachments").cloned().unwrap_or_else(|| json!([])),
        }))
    }
}

pub struct ListMessages {
    client: Arc<DiscordClient>,
}

#[async_trait]
impl Tool for ListMessages {
    fn name(&self) -> &str {
        "ListMessages"
    }

    fn description(&self) -> &str {
        "List messages from a Discord channel. \
         Use before, after or around (only one) to navigate the message history."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("channel_id", "ID of the channel to retrieve messages from"),
            Param::of::<i64>("limit", "Maximum number of messages to retrieve (1-100)")
                .with_default(),
            Param::of::<Option<String>>("before", "Get messages before this message ID"),
            Param::of::<Option<String>>("after", "Get messages after this message ID"),
            Param::of::<Option<String>>("around", "Get messages around this message ID"),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Messages from the channel")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(&MESSAGE_READ_SCOPES)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let channel_id = args.get_string("channel_id")?;
        validate_snowflake(&channel_id, "channel_id")?;

        let limit = args.get_i64_or("limit", DEFAULT_MESSAGE_LIMIT)?;
        if !(1..=MAX_MESSAGE_LIMIT).contains(&limit) {
            return Err(ToolError::invalid_parameter(
                "limit",
                "Limit must be between 1 and 100",
            ));
        }

        let mut query = vec![("limit", limit.to_string())];
        let cursors: Vec<(&str, String)> = ["before", "after", "around"]
            .into_iter()
            .filter_map(|key| args.get_string_opt(key).map(|id| (key, id)))
            .collect();
        if cursors.len() > 1 {
            return Err(ToolError::execution(
                "Can only use one of before, after, or around",
            )
            .with_developer_message("Multiple pagination parameters provided"));
        }
        for (key, id) in cursors {
            validate_snowflake(&id, key)?;
            query.push((key, id));
        }

        let data = self
            .client
            .request(
                context,
                Method::GET,
                &format!("channels/{}/messages", channel_id),
                &query,
                None,
                "list messages",
            )
            .await?;

        let messages: Vec<Value> = items(&data)
            .iter()
            .map(|message| {
                json!({
                    "id": message.get("id"),
                    "content": message.get("content"),
                    "author": author_summary(&message["author"]),
                    "created_at": message.get("timestamp"),
                    "edited_at": message.get("edited_timestamp"),
                    "attachments": message.get("attachments").cloned().unwrap_or_else(|| json!([])),
                    "embeds": message.get("embeds").cloned().unwrap_or_else(|| json!([])),
                    "reactions": message.get("reactions").cloned().unwrap_or_else(|| json!([])),
                    "channel_id": message.get("channel_id"),
                })
            })
            .collect();

        Ok(json!({
            "total_count": messages.len(),
            "messages": messages,
            "channel_id": channel_id,
        }))
    }
}

pub struct GetUser {
    client: Arc<DiscordClient>,
}

#[async_trait]
impl Tool for GetUser {
    fn name(&self) -> &str {
        "GetUser"
    }

    fn description(&self) -> &str {
        "Get information about a Discord user by ID."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![Param::of::<String>("user_id", "ID of the user to look up")]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Information about the user")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(&IDENTIFY_SCOPES)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let user_id = args.get_string("user_id")?;
        validate_snowflake(&user_id, "user_id")?;

        let user = self
            .client
            .request(
                context,
                Method::GET,
                &format!("users/{}", user_id),
                &[],
                None,
                "get user information",
            )
            .await?;

        Ok(json!({
            "id": user.get("id"),
            "username": user.get("username"),
            "discriminator": user.get("discriminator"),
            "global_name": user.get("global_name"),
            "avatar": cdn_asset("avatars", &user_id, &user["avatar"]),
            "banner": cdn_asset("banners", &user_id, &user["banner"]),
            "bot": user.get("bot").cloned().unwrap_or(Value::Bool(false)),
            "system": user.get("system").cloned().unwrap_or(Value::Bool(false)),
            "created_at": created_at(&user["id"]),
        }))
    }
}

pub struct GetServer {
    client: Arc<DiscordClient>,
}

#[async_trait]
impl Tool for GetServer {
    fn name(&self) -> &str {
        "GetServer"
    }

    fn description(&self) -> &str {
        "Get information about a Discord server (guild)."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("server_id", "ID of the server to look up"),
            Param::of::<bool>("with_counts", "Include approximate member counts").with_default(),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Information about the server")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(&SERVER_READ_SCOPES)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let server_id = args.get_string("server_id")?;
        validate_snowflake(&server_id, "server_id")?;
        let with_counts = args.get_bool_or("with_counts", true);

        let server = self
            .client
            .request(
                context,
                Method::GET,
                &format!("guilds/{}", server_id),
                &[("with_counts", with_counts.to_string())],
                None,
                "retrieve server information",
            )
            .await?;

        let icon = server["icon"]
            .as_str()
            .map(|hash| Value::String(icon_url(&server_id, hash)))
            .unwrap_or(Value::Null);

        Ok(json!({
            "id": server.get("id"),
            "name": server.get("name"),
            "description": server.get("description"),
            "owner_id": server.get("owner_id"),
            "icon": icon,
            "member_count": server.get("approximate_member_count"),
            "presence_count": server.get("approximate_presence_count"),
            "features": server.get("features").cloned().unwrap_or_else(|| json!([])),
            "preferred_locale": server.get("preferred_locale"),
            "verification_level": server.get("verification_level"),
            "created_at": created_at(&server["id"]),
        }))
    }
}

pub struct GetChannel {
    client: Arc<DiscordClient>,
}

#[async_trait]
impl Tool for GetChannel {
    fn name(&self) -> &str {
        "GetChannel"
    }

    fn description(&self) -> &str {
        "Get information about a Discord channel."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![Param::of::<String>("channel_id", "ID of the channel to look up")]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Information about the channel")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(&CHANNEL_READ_SCOPES)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let channel_id = args.get_string("channel_id")?;
        validate_snowflake(&channel_id, "channel_id")?;

        let channel = self
            .client
            .request(
                context,
                Method::GET,
                &format!("channels/{}", channel_id),
                &[],
                None,
                "retrieve channel information",
            )
            .await?;

        Ok(json!({
            "id": channel.get("id"),
            "name": channel.get("name"),
            "type": channel_type_name(channel["type"].as_u64().unwrap_or(0)),
            "position": channel.get("position"),
            "topic": channel.get("topic"),
            "nsfw": channel["nsfw"].as_bool().unwrap_or(false),
            "parent_id": channel.get("parent_id"),
            "server_id": channel.get("guild_id"),
            "rate_limit_per_user": channel.get("rate_limit_per_user"),
            "permission_overwrites": channel
                .get("permission_overwrites")
                .cloned()
                .unwrap_or_else(|| json!([])),
            "created_at": created_at(&channel["id"]),
        }))
    }
}

pub struct CreateChannel {
    client: Arc<DiscordClient>,
}

#[async_trait]
impl Tool for CreateChannel {
    fn name(&self) -> &str {
        "CreateChannel"
    }

    fn description(&self) -> &str {
        "Create a channel of any type in a Discord server."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        let types: Vec<&str> = CREATABLE_CHANNEL_TYPES.iter().map(|(name, _)| *name).collect();
        vec![
            Param::of::<String>("server_id", "ID of the server to create the channel in"),
            Param::of::<String>("name", "Name of the channel (2-100 characters)"),
            Param::of::<String>(
                "type",
                format!("Type of channel to create, one of: {}", types.join(", ")),
            )
            .with_default(),
            Param::of::<Option<String>>("topic", "Channel topic (up to 1024 characters)"),
            Param::of::<Option<String>>("parent_id", "ID of the parent category"),
            Param::of::<bool>("nsfw", "Whether the channel is age-restricted").with_default(),
            Param::of::<Option<i64>>(
                "rate_limit_per_user",
                "Slowmode delay in seconds (0-21600)",
            ),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Details of the created channel")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(&CHANNEL_WRITE_SCOPES)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let server_id = args.get_string("server_id")?;
        validate_snowflake(&server_id, "server_id")?;
        let name = normalize_channel_name(&args.get_string("name")?)?;
        let kind = channel_type_code(&args.get_string_opt("type").unwrap_or_else(|| "text".into()))?;

        let mut payload = json!({
            "name": name,
            "type": kind,
            "nsfw": args.get_bool_or("nsfw", false),
        });
        if let Some(topic) = args.get_string_opt("topic") {
            check_length(&topic, "topic", 0, MAX_TOPIC_LENGTH)?;
            payload["topic"] = json!(topic);
        }
        if let Some(parent_id) = args.get_string_opt("parent_id") {
            validate_snowflake(&parent_id, "parent_id")?;
            payload["parent_id"] = json!(parent_id);
        }
        if let Some(delay) = args.get_opt::<i64>("rate_limit_per_user")? {
            check_range(delay, "rate_limit_per_user", 0, MAX_SLOWMODE_SECS)?;
            payload["rate_limit_per_user"] = json!(delay);
        }

        let channel = self
            .client
            .request(
                context,
                Method::POST,
                &format!("guilds/{}/channels", server_id),
                &[],
                Some(&payload),
                "create channel",
            )
            .await?;

        Ok(json!({
            "id": channel.get("id"),
            "name": channel.get("name"),
            "type": channel_type_name(channel["type"].as_u64().unwrap_or(kind)),
            "server_id": channel.get("guild_id"),
            "parent_id": channel.get("parent_id"),
            "position": channel.get("position"),
            "topic": channel.get("topic"),
            "nsfw": channel["nsfw"].as_bool().unwrap_or(false),
            "rate_limit_per_user": channel.get("rate_limit_per_user"),
            "created_at": created_at(&channel["id"]),
        }))
    }
}

pub struct CreateTextChannel {
    client: Arc<DiscordClient>,
}

#[async_trait]
impl Tool for CreateTextChannel {
    fn name(&self) -> &str {
        "CreateTextChannel"
    }

    fn description(&self) -> &str {
        "Create a text channel in a Discord server, optionally inside a category."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("server_id", "ID of the server to create the channel in"),
            Param::of::<String>("name", "Name of the channel (2-100 characters)"),
            Param::of::<Option<String>>("topic", "Channel topic (up to 1024 characters)"),
            Param::of::<Option<String>>(
                "parent_category_id",
                "ID of the category to place the channel in",
            ),
            Param::of::<i64>("slowmode_timeout", "Slowmode delay in seconds (0-21600)")
                .with_default(),
            Param::of::<bool>("nsfw", "Whether the channel is age-restricted").with_default(),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Details of the created text channel")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(&CHANNEL_WRITE_SCOPES)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let server_id = args.get_string("server_id")?;
        validate_snowflake(&server_id, "server_id")?;
        let name = normalize_channel_name(&args.get_string("name")?)?;
        let slowmode = args.get_i64_or("slowmode_timeout", 0)?;
        check_range(slowmode, "slowmode_timeout", 0, MAX_SLOWMODE_SECS)?;

        let mut payload = json!({
            "name": name,
            "type": 0,
            "nsfw": args.get_bool_or("nsfw", false),
            "rate_limit_per_user": slowmode,
        });
        if let Some(topic) = args.get_string_opt("topic") {
            check_length(&topic, "topic", 0, MAX_TOPIC_LENGTH)?;
            payload["topic"] = json!(topic);
        }
        if let Some(category_id) = args.get_string_opt("parent_category_id") {
            validate_snowflake(&category_id, "parent_category_id")?;
            payload["parent_id"] = json!(category_id);
        }

        let channel = self
            .client
            .request(
                context,
                Method::POST,
                &format!("guilds/{}/channels", server_id),
                &[],
                Some(&payload),
                "create text channel",
            )
            .await?;

        Ok(json!({
            "id": channel.get("id"),
            "name": channel.get("name"),
            "type": "text",
            "server_id": channel.get("guild_id"),
            "topic": channel.get("topic"),
            "position": channel.get("position"),
            "nsfw": channel["nsfw"].as_bool().unwrap_or(false),
            "category_id": channel.get("parent_id"),
            "rate_limit_per_user": channel
                .get("rate_limit_per_user")
                .cloned()
                .unwrap_or_else(|| json!(0)),
        }))
    }
}

pub struct EditMessage {
    client: Arc<DiscordClient>,
}

#[async_trait]
impl Tool for EditMessage {
    fn name(&self) -> &str {
        "EditMessage"
    }

    fn description(&self) -> &str {
        "Edit the text of a message previously sent to a Discord channel."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("channel_id", "ID of the channel containing the message"),
            Param::of::<String>("message_id", "ID of the message to edit"),
            Param::of::<String>("content", "New text content (up to 2000 characters)"),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Details of the edited message")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(&MESSAGE_WRITE_SCOPES)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let channel_id = args.get_string("channel_id")?;
        validate_snowflake(&channel_id, "channel_id")?;
        let message_id = args.get_string("message_id")?;
        validate_snowflake(&message_id, "message_id")?;

        let content = args.get_string_opt("content").unwrap_or_default();
        if content.trim().is_empty() {
            return Err(ToolError::execution("Either content or embed must be provided"));
        }
        let content = validate_message_content(Some(&content))?;

        let message = self
            .client
            .request(
                context,
                Method::PATCH,
                &format!("channels/{}/messages/{}", channel_id, message_id),
                &[],
                Some(&json!({"content": content})),
                "edit message",
            )
            .await?;

        Ok(json!({
            "message_id": message.get("id"),
            "content": message.get("content"),
            "channel_id": message.get("channel_id"),
            "author": author_summary(&message["author"]),
            "edited_at": message.get("edited_timestamp"),
            "embeds": message.get("embeds").cloned().unwrap_or_else(|| json!([])),
        }))
    }
}

pub struct DeleteMessage {
    client: Arc<DiscordClient>,
}

#[async_trait]
impl Tool for DeleteMessage {
    fn name(&self) -> &str {
        "DeleteMessage"
    }

    fn description(&self) -> &str {
        "Delete a message from a Discord channel."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("channel_id", "ID of the channel containing the message"),
            Param::of::<String>("message_id", "ID of the message to delete"),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Confirmation of the deletion")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(&MESSAGE_WRITE_SCOPES)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let channel_id = args.get_string("channel_id")?;
        validate_snowflake(&channel_id, "channel_id")?;
        let message_id = args.get_string("message_id")?;
        validate_snowflake(&message_id, "message_id")?;

        self.client
            .request(
                context,
                Method::DELETE,
                &format!("channels/{}/messages/{}", channel_id, message_id),
                &[],
                None,
                "delete message",
            )
            .await?;

        Ok(json!({
            "success": true,
            "message": "Message successfully deleted",
            "channel_id": channel_id,
            "message_id": message_id,
        }))
    }
}

pub struct CreateWebhook {
    client: Arc<DiscordClient>,
}

#[async_trait]
impl Tool for CreateWebhook {
    fn name(&self) -> &str {
        "CreateWebhook"
    }

    fn description(&self) -> &str {
        "Create a webhook for a Discord channel. The returned URL can be used with \
         SendWebhookMessage without further authorization."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("channel_id", "ID of the channel to create the webhook for"),
            Param::of::<String>("name", "Name of the webhook (1-80 characters)"),
            Param::of::<Option<String>>("avatar_url", "Avatar image for the webhook"),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Details of the created webhook")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(&WEBHOOK_SCOPES)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let channel_id = args.get_string("channel_id")?;
        validate_snowflake(&channel_id, "channel_id")?;
        let name = args.get_string("name")?;
        check_length(&name, "name", 1, MAX_WEBHOOK_NAME_LENGTH)?;

        let mut payload = json!({"name": name});
        if let Some(avatar) = args.get_string_opt("avatar_url") {
            payload["avatar"] = json!(avatar);
        }

        let webhook = self
            .client
            .request(
                context,
                Method::POST,
                &format!("channels/{}/webhooks", channel_id),
                &[],
                Some(&payload),
                "create webhook",
            )
            .await?;

        Ok(webhook_summary(&webhook))
    }
}

pub struct ListWebhooks {
    client: Arc<DiscordClient>,
}

#[async_trait]
impl Tool for ListWebhooks {
    fn name(&self) -> &str {
        "ListWebhooks"
    }

    fn description(&self) -> &str {
        "List the webhooks configured on a Discord channel."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![Param::of::<String>("channel_id", "ID of the channel to list webhooks for")]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Webhooks on the channel")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(&WEBHOOK_SCOPES)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let channel_id = args.get_string("channel_id")?;
        validate_snowflake(&channel_id, "channel_id")?;

        let data = self
            .client
            .request(
                context,
                Method::GET,
                &format!("channels/{}/webhooks", channel_id),
                &[],
                None,
                "list webhooks",
            )
            .await?;

        let webhooks: Vec<Value> = items(&data).iter().map(webhook_summary).collect();
        Ok(json!({
            "total_count": webhooks.len(),
            "webhooks": webhooks,
            "channel_id": channel_id,
        }))
    }
}

pub struct SendWebhookMessage {
    client: Arc<DiscordClient>,
}

#[async_trait]
impl Tool for SendWebhookMessage {
    fn name(&self) -> &str {
        "SendWebhookMessage"
    }

    fn description(&self) -> &str {
        "Send a message through a Discord webhook URL, optionally with a rich embed. \
         No authorization is needed beyond the webhook URL itself."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("webhook_url", "Full Discord webhook URL").not_inferrable(),
            Param::of::<Option<String>>("content", "Text content (up to 2000 characters)"),
            Param::of::<Option<String>>("username", "Override the webhook's display name"),
            Param::of::<Option<String>>("avatar_url", "Override the webhook's avatar"),
            Param::of::<Option<String>>("embed_title", "Embed title (up to 256 characters)"),
            Param::of::<Option<String>>(
                "embed_description",
                "Embed description (up to 4096 characters)",
            ),
            Param::of::<String>("embed_color", "Embed color as hex, e.g. #FF0000").with_default(),
            Param::of::<Option<Vec<Map<String, Value>>>>(
                "embed_fields",
                "Embed fields, each with name, value and optional inline (up to 25)",
            ),
            Param::of::<Option<String>>("embed_image_url", "Image shown in the embed"),
            Param::of::<Option<String>>("embed_thumbnail_url", "Thumbnail shown in the embed"),
            Param::of::<Option<String>>("embed_footer_text", "Embed footer (up to 2048 characters)"),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Result of the webhook delivery")
    }

    async fn execute(&self, _context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let webhook_url = args.get_string("webhook_url")?;
        let (webhook_id, webhook_token) = parse_webhook_url(&webhook_url)?;

        let content = args.get_string_opt("content").filter(|c| !c.trim().is_empty());
        let title = args.get_string_opt("embed_title");
        let description = args.get_string_opt("embed_description");
        if content.is_none() && title.is_none() && description.is_none() {
            return Err(ToolError::execution(
                "Message must include either text content or an embed",
            ));
        }

        let mut payload = json!({});
        if let Some(content) = &content {
            payload["content"] = json!(validate_message_content(Some(content))?);
        }
        if let Some(username) = args.get_string_opt("username") {
            check_length(&username, "username", 1, MAX_WEBHOOK_NAME_LENGTH)?;
            payload["username"] = json!(username);
        }
        if let Some(avatar_url) = args.get_string_opt("avatar_url") {
            payload["avatar_url"] = json!(avatar_url);
        }
        if title.is_some() || description.is_some() {
            payload["embeds"] = json!([build_embed(&args, title, description)?]);
        }

        let (status, message) = self
            .client
            .execute_webhook(&webhook_id, &webhook_token, &payload)
            .await?;

        Ok(json!({
            "success": true,
            "message_id": message.get("id"),
            "webhook_url": mask_webhook_url(&webhook_url),
            "status_code": status.as_u16(),
        }))
    }
}

fn build_embed(
    args: &ToolArgs,
    title: Option<String>,
    description: Option<String>,
) -> Result<Value, ToolError> {
    let color = match args.get_string_opt("embed_color") {
        Some(color) => parse_embed_color(&color)?,
        None => DEFAULT_EMBED_COLOR,
    };
    let mut embed = json!({"color": color});

    if let Some(title) = title {
        check_length(&title, "embed_title", 0, 256)?;
        embed["title"] = json!(title);
    }
    if let Some(description) = description {
        check_length(&description, "embed_description", 0, 4096)?;
        embed["description"] = json!(description);
    }
    if let Some(fields) = args.get_opt::<Vec<Map<String, Value>>>("embed_fields")? {
        if fields.len() > MAX_EMBED_FIELDS {
            return Err(ToolError::execution("Embed cannot have more than 25 fields"));
        }
        let fields = fields
            .iter()
            .map(|field| {
                let name = field.get("name").and_then(Value::as_str);
                let value = field.get("value").and_then(Value::as_str);
                match (name, value) {
                    (Some(name), Some(value)) => Ok(json!({
                        "name": name,
                        "value": value,
                        "inline": field.get("inline").and_then(Value::as_bool).unwrap_or(false),
                    })),
                    _ => Err(ToolError::execution(
                        "Each embed field must have a name and a value",
                    )),
                }
            })
            .collect::<Result<Vec<Value>, ToolError>>()?;
        embed["fields"] = json!(fields);
    }
    if let Some(url) = args.get_string_opt("embed_image_url") {
        embed["image"] = json!({"url": url});
    }
    if let Some(url) = args.get_string_opt("embed_thumbnail_url") {
        embed["thumbnail"] = json!({"url": url});
    }
    if let Some(text) = args.get_string_opt("embed_footer_text") {
        check_length(&text, "embed_footer_text", 0, 2048)?;
        embed["footer"] = json!({"text": text});
    }
    Ok(embed)
}

fn webhook_summary(webhook: &Value) -> Value {
    let url = match (webhook["id"].as_str(), webhook["token"].as_str()) {
        (Some(id), Some(token)) => json!(format!("https://discord.com/api/webhooks/{}/{}", id, token)),
        _ => Value::Null,
    };
    json!({
        "id": webhook.get("id"),
        "name": webhook.get("name"),
        "channel_id": webhook.get("channel_id"),
        "server_id": webhook.get("guild_id"),
        "token": webhook.get("token"),
        "url": url,
        "application_id": webhook.get("application_id"),
        "avatar": webhook.get("avatar"),
    })
}

/// Keep the start and end of a long webhook URL so the token is not echoed.
fn mask_webhook_url(url: &str) -> String {
    let chars: Vec<char> = url.chars().collect();
    if chars.len() <= 40 {
        return url.to_string();
    }
    let head: String = chars[..30].iter().collect();
    let tail: String = chars[chars.len() - 10..].iter().collect();
    format!("{}...{}", head, tail)
}

pub fn toolkit() -> Toolkit {
    toolkit_with_client(DiscordClient::new())
}

pub fn toolkit_with_client(client: DiscordClient) -> Toolkit {
    let client = Arc::new(client);
    Toolkit::new(TOOLKIT_NAME, env!("CARGO_PKG_VERSION"))
        .description(
            "Read, send and edit Discord messages, manage channels and webhooks, \
             and look up users and servers.",
        )
        .tool(GetCurrentUser {
            client: Arc::clone(&client),
        })
        .tool(ListServers {
            client: Arc::clone(&client),
        })
        .tool(ListChannels {
            client: Arc::clone(&client),
        })
        .tool(SendMessage {
            client: Arc::clone(&client),
        })
        .tool(ListMessages {
            client: Arc::clone(&client),
        })
        .tool(GetUser {
            client: Arc::clone(&client),
        })
        .tool(GetServer {
            client: Arc::clone(&client),
        })
        .tool(GetChannel {
            client: Arc::clone(&client),
        })
        .tool(CreateChannel {
            client: Arc::clone(&client),
        })
        .tool(CreateTextChannel {
            client: Arc::clone(&client),
        })
        .tool(EditMessage {
            client: Arc::clone(&client),
        })
        .tool(DeleteMessage {
            client: Arc::clone(&client),
        })
        .tool(CreateWebhook {
            client: Arc::clone(&client),
        })
        .tool(ListWebhooks {
            client: Arc::clone(&client),
        })
        .tool(SendWebhookMessage { client })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_summary_prefers_global_name() {
        let author = json!({"id": "1", "username": "ann", "global_name": "Ann"});
        assert_eq!(author_summary(&author)["display_name"], "Ann");

        let author = json!({"id": "1", "username": "ann", "global_name": null});
        assert_eq!(author_summary(&author)["display_name"], "ann");
    }

    #[test]
    fn test_toolkit_requires_discord_auth() {
        let kit = toolkit();
        assert_eq!(kit.tools.len(), 15);
        for tool in &kit.tools {
            let auth = tool.requirements().authorization;
            if tool.name() == "SendWebhookMessage" {
                assert!(auth.is_none());
            } else {
                assert_eq!(auth.unwrap().provider(), "discord");
            }
        }
    }

    #[test]
    fn test_mask_webhook_url() {
        let url = "https://discord.com/api/webhooks/123456789012345678/secret-token-value";
        assert_eq!(mask_webhook_url(url), "https://discord.com/api/webhoo...oken-value");
        assert_eq!(mask_webhook_url("https://short.example"), "https://short.example");
    }
}
