//! Authorization declarations and the token context delivered at call time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Requirement {
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// What kind of authorization a tool needs before it can run.
///
/// The worker never performs the OAuth flow; it only reports the requirement
/// so the calling runtime can obtain a token and retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolAuthRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    pub provider_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth2: Option<OAuth2Requirement>,
}

impl ToolAuthRequirement {
    pub const OAUTH2: &'static str = "oauth2";

    pub fn oauth2<I, S>(provider_id: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            provider_id: Some(provider_id.into()),
            provider_type: Self::OAUTH2.to_string(),
            oauth2: Some(OAuth2Requirement {
                scopes: scopes.into_iter().map(Into::into).collect(),
            }),
        }
    }

    pub fn dropbox<I: IntoIterator<Item = S>, S: Into<String>>(scopes: I) -> Self {
        Self::oauth2("dropbox", scopes)
    }

    pub fn google<I: IntoIterator<Item = S>, S: Into<String>>(scopes: I) -> Self {
        Self::oauth2("google", scopes)
    }

    pub fn hubspot<I: IntoIterator<Item = S>, S: Into<String>>(scopes: I) -> Self {
        Self::oauth2("hubspot", scopes)
    }

    pub fn discord<I: IntoIterator<Item = S>, S: Into<String>>(scopes: I) -> Self {
        Self::oauth2("discord", scopes)
    }

    pub fn zoom<I: IntoIterator<Item = S>, S: Into<String>>(scopes: I) -> Self {
        Self::oauth2("zoom", scopes)
    }

    pub fn slack<I: IntoIterator<Item = S>, S: Into<String>>(scopes: I) -> Self {
        Self::oauth2("slack", scopes)
    }

    pub fn spotify<I: IntoIterator<Item = S>, S: Into<String>>(scopes: I) -> Self {
        Self::oauth2("spotify", scopes)
    }

    pub fn github<I: IntoIterator<Item = S>, S: Into<String>>(scopes: I) -> Self {
        Self::oauth2("github", scopes)
    }

    /// Provider name for messages; falls back to the provider type.
    pub fn provider(&self) -> &str {
        self.provider_id.as_deref().unwrap_or(&self.provider_type)
    }

    pub fn scopes(&self) -> &[String] {
        self.oauth2
            .as_ref()
            .map(|o| o.scopes.as_slice())
            .unwrap_or_default()
    }
}

/// Token and user profile supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolAuthorizationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default)]
    pub user_info: Map<String, Value>,
}

impl ToolAuthorizationContext {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user_info: Map::new(),
        }
    }
}
