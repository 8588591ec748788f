//! Spotify catalog search.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tool_core::{
    InputParameter, Param, Tool, ToolArgs, ToolAuthRequirement, ToolContext, ToolError,
    ToolOutputSchema, ToolRequirements, Toolkit,
};
use tracing::debug;

use crate::http::{build_client, join_url, json_body};

pub const TOOLKIT_NAME: &str = "Spotify";
pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

pub const SEARCH_TYPES: [&str; 7] = [
    "album",
    "artist",
    "playlist",
    "track",
    "show",
    "episode",
    "audiobook",
];

pub struct SpotifyClient {
    http: reqwest::Client,
    base_url: String,
}

impl SpotifyClient {
    pub fn new() -> Self {
        Self::with_base_url(SPOTIFY_API_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: build_client(),
            base_url: base_url.into(),
        }
    }

    pub async fn search(
        &self,
        context: &ToolContext,
        query: &str,
        types: &[String],
        limit: i64,
    ) -> Result<Value, ToolError> {
        let url = join_url(&self.base_url, "search");
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(context.auth_token()?)
            .query(&[
                ("q", query.to_string()),
                ("type", types.join(",")),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(
                ToolError::execution(format!("Failed to search Spotify: status {}", status))
                    .with_developer_message(body),
            );
        }
        json_body(response).await
    }
}

impl Default for SpotifyClient {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Search {
    client: Arc<SpotifyClient>,
}

#[async_trait]
impl Tool for Search {
    fn name(&self) -> &str {
        "Search"
    }

    fn description(&self) -> &str {
        "Search Spotify catalog information. The query accepts field filters such as \
         album, artist, track, year, upc, tag:hipster, tag:new, isrc and genre, \
         e.g. 'remaster track:Doxy artist:Miles Davis'."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("q", "The search query"),
            Param::of::<Vec<String>>("types", "The types of results to return")
                .one_of(SEARCH_TYPES),
            Param::of::<i64>("limit", "The maximum number of results to return").with_default(),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Catalog items matching the search query")
    }

    fn requirements(&self) -> ToolRequirements {
        ToolRequirements {
            authorization: Some(ToolAuthRequirement::spotify(Vec::<String>::new())),
            ..Default::default()
        }
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let query = args.get_string("q")?;
        let types: Vec<String> = args.get("types")?;
        if types.is_empty() {
            return Err(ToolError::invalid_parameter("types", "at least one type is required"));
        }
        let limit = args.get_i64_or("limit", 1)?;
        if !(1..=50).contains(&limit) {
            return Err(ToolError::invalid_parameter("limit", "must be between 1 and 50"));
        }
        self.client.search(context, &query, &types, limit).await
    }
}

pub fn toolkit() -> Toolkit {
    toolkit_with_client(SpotifyClient::new())
}

pub fn toolkit_with_client(client: SpotifyClient) -> Toolkit {
    Toolkit::new(TOOLKIT_NAME, env!("CARGO_PKG_VERSION"))
        .description("Spotify catalog search.")
        .tool(Search {
            client: Arc::new(client),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_definition() {
        let toolkit = toolkit();
        let tool = &toolkit.tools[0];
        assert_eq!(tool.name(), "Search");
        let auth = tool.requirements().authorization.unwrap();
        assert_eq!(auth.provider(), "spotify");
        assert!(auth.scopes().is_empty());
    }
}
