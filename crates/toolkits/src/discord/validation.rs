use chrono::{DateTime, Utc};
use tool_core::ToolError;

pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Milliseconds between the Unix epoch and the first second of 2015.
const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

pub fn is_snowflake(value: &str) -> bool {
    (17..=20).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn validate_snowflake(value: &str, param: &str) -> Result<(), ToolError> {
    if value.is_empty() {
        return Err(ToolError::MissingParameter(param.to_string()));
    }
    if !is_snowflake(value) {
        return Err(ToolError::invalid_parameter(
            param,
            format!("Invalid {} format", param),
        ));
    }
    Ok(())
}

/// Message text must be non-blank and at most 2000 characters.
pub fn validate_message_content(content: Option<&str>) -> Result<&str, ToolError> {
    let content = content.unwrap_or_default();
    if content.trim().is_empty() {
        return Err(ToolError::execution(
            "Message must include content, an embed, or attachments",
        ));
    }
    let length = content.chars().count();
    if length > MAX_MESSAGE_LENGTH {
        return Err(
            ToolError::execution("Message content cannot exceed 2000 characters")
                .with_developer_message(format!("Content length: {}", length)),
        );
    }
    Ok(content)
}

/// The creation time encoded in the top bits of a snowflake.
pub fn snowflake_created_at(id: &str) -> Option<DateTime<Utc>> {
    let id: u64 = id.parse().ok()?;
    let millis = (id >> 22) + DISCORD_EPOCH_MS;
    DateTime::from_timestamp_millis(i64::try_from(millis).ok()?)
}

pub fn channel_type_name(kind: u64) -> &'static str {
    CREATABLE_CHANNEL_TYPES
        .iter()
        .find(|(_, code)| *code == kind)
        .map(|(name, _)| *name)
        .unwrap_or(match kind {
            14 => "directory",
            _ => "unknown",
        })
}

/// Animated icons (hash prefixed with `a_`) are served as GIF.
pub fn icon_url(server_id: &str, icon_hash: &str) -> String {
    let extension = if icon_hash.starts_with("a_") { "gif" } else { "png" };
    format!(
        "https://cdn.discordapp.com/icons/{}/{}.{}",
        server_id, icon_hash, extension
    )
}

/// Channel types that can be created, by name.
pub const CREATABLE_CHANNEL_TYPES: [(&str, u64); 12] = [
    ("text", 0),
    ("dm", 1),
    ("voice", 2),
    ("group_dm", 3),
    ("category", 4),
    ("announcement", 5),
    ("announcement_thread", 10),
    ("public_thread", 11),
    ("private_thread", 12),
    ("stage", 13),
    ("forum", 15),
    ("media", 16),
];

/// Resolve a channel type name such as `"Public Thread"` to its API code.
pub fn channel_type_code(name: &str) -> Result<u64, ToolError> {
    let normalized = name.trim().to_lowercase().replace(' ', "_");
    CREATABLE_CHANNEL_TYPES
        .iter()
        .find(|(known, _)| *known == normalized)
        .map(|(_, code)| *code)
        .ok_or_else(|| {
            let valid: Vec<&str> = CREATABLE_CHANNEL_TYPES.iter().map(|(n, _)| *n).collect();
            ToolError::execution(format!(
                "Invalid channel type: {}. Valid types are: {}",
                name,
                valid.join(", ")
            ))
            .with_developer_message(format!("Channel type '{}' is not supported", name))
        })
}

fn label(param: &str) -> String {
    param
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn check_length(value: &str, param: &str, min: usize, max: usize) -> Result<(), ToolError> {
    let length = value.chars().count();
    if length < min || length > max {
        return Err(ToolError::execution(format!(
            "{} must be between {} and {} characters",
            label(param),
            min,
            max
        ))
        .with_developer_message(format!("{} has invalid length: {}", param, length)));
    }
    Ok(())
}

pub fn check_range(value: i64, param: &str, min: i64, max: i64) -> Result<(), ToolError> {
    if value < min || value > max {
        return Err(ToolError::execution(format!(
            "{} must be between {} and {}",
            label(param),
            min,
            max
        ))
        .with_developer_message(format!("{} has invalid value: {}", param, value)));
    }
    Ok(())
}

/// Lowercase, spaces to hyphens, and only `a-z0-9_-` kept.
pub fn normalize_channel_name(name: &str) -> Result<String, ToolError> {
    if name.trim().is_empty() {
        return Err(ToolError::MissingParameter("name".to_string()));
    }
    check_length(name, "channel_name", 2, 100)?;
    Ok(name
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-')
        .collect())
}

const WEBHOOK_URL_PREFIXES: [&str; 2] = [
    "https://discord.com/api/webhooks/",
    "https://discordapp.com/api/webhooks/",
];

/// Split a webhook URL into its id and token.
pub fn parse_webhook_url(url: &str) -> Result<(String, String), ToolError> {
    if url.trim().is_empty() {
        return Err(ToolError::MissingParameter("webhook_url".to_string()));
    }
    let invalid = || {
        ToolError::execution("Invalid webhook URL format")
            .with_developer_message("Webhook URL does not match Discord webhook format")
    };

    let rest = WEBHOOK_URL_PREFIXES
        .iter()
        .find_map(|prefix| url.strip_prefix(prefix))
        .ok_or_else(invalid)?;
    let (id, token) = rest.split_once('/').ok_or_else(invalid)?;

    let id_ok = !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit());
    let token_ok = !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if !id_ok || !token_ok {
        return Err(invalid());
    }
    Ok((id.to_string(), token.to_string()))
}

/// Discord blurple, used when an embed has no color.
pub const DEFAULT_EMBED_COLOR: u32 = 0x5865F2;

/// Parse `#RRGGBB` (or `RRGGBB`) into the integer color Discord expects.
pub fn parse_embed_color(color: &str) -> Result<u32, ToolError> {
    let hex = color.trim().trim_start_matches('#');
    u32::from_str_radix(hex, 16)
        .ok()
        .filter(|value| hex.len() == 6 && *value <= 0xFF_FFFF)
        .ok_or_else(|| {
            ToolError::invalid_parameter("embed_color", "must be a hex color such as #FF0000")
        })
}
