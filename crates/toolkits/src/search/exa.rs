//! Web search through the Exa API.
//!
//! Requires `EXA_API_KEY`, either as a context secret or in the environment.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tool_core::{
    resolve_secret, InputParameter, Param, Tool, ToolArgs, ToolContext, ToolError,
    ToolOutputSchema, ToolRequirements, ToolSecretRequirement,
};
use tracing::debug;
use url::Url;

use crate::http::{build_client, ensure_success, join_url, json_body};

pub const EXA_API_URL: &str = "https://api.exa.ai";
pub const EXA_API_KEY: &str = "EXA_API_KEY";

const SEARCH_TYPES: [&str; 3] = ["auto", "neural", "keyword"];
const DEFAULT_NUM_RESULTS: i64 = 10;
const INVALID_URL_RETRY_MS: u64 = 500;

pub struct ExaClient {
    http: reqwest::Client,
    base_url: String,
}

impl ExaClient {
    pub fn new() -> Self {
        Self::with_base_url(EXA_API_URL)
    }

    /// Point the client at another host, e.g. a mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: build_client(),
            base_url: base_url.into(),
        }
    }

    async fn post(
        &self,
        context: &ToolContext,
        path: &str,
        body: &Value,
    ) -> Result<reqwest::Response, ToolError> {
        let api_key = resolve_secret(context, EXA_API_KEY)?;
        let url = join_url(&self.base_url, path);
        debug!("POST {}", url);
        Ok(self
            .http
            .post(&url)
            .header("x-api-key", api_key)
            .json(body)
            .send()
            .await?)
    }
}

impl Default for ExaClient {
    fn default() -> Self {
        Self::new()
    }
}

fn exa_requirements() -> ToolRequirements {
    ToolRequirements {
        authorization: None,
        secrets: vec![ToolSecretRequirement {
            key: EXA_API_KEY.to_string(),
        }],
    }
}

fn num_results_param() -> InputParameter {
    Param::of::<i64>("num_results", "Number of results to retrieve").with_default()
}

fn num_results(args: &ToolArgs) -> Result<i64, ToolError> {
    let n = args.get_i64_or("num_results", DEFAULT_NUM_RESULTS)?;
    if n < 1 {
        return Err(ToolError::invalid_parameter(
            "num_results",
            "must be at least 1",
        ));
    }
    Ok(n)
}

/// Validate a page URL, asking the caller to retry with a corrected one.
pub fn check_page_url(raw: &str) -> Result<Url, ToolError> {
    let invalid = |detail: String| {
        let prompt = format!("{} is not a valid URL.", raw);
        ToolError::retryable(format!("{} {}", prompt, detail))
            .with_additional_prompt_content(prompt)
            .with_retry_after_ms(INVALID_URL_RETRY_MS)
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("Unsupported scheme '{}'.", other))),
    }
}

/// `SearchExa` and `SearchAndContentsExa`.
pub struct ExaSearch {
    client: Arc<ExaClient>,
    with_contents: bool,
}

impl ExaSearch {
    pub fn new(client: Arc<ExaClient>, with_contents: bool) -> Self {
        Self {
            client,
            with_contents,
        }
    }
}

#[async_trait]
impl Tool for ExaSearch {
    fn name(&self) -> &str {
        if self.with_contents {
            "SearchAndContentsExa"
        } else {
            "SearchExa"
        }
    }

    fn description(&self) -> &str {
        if self.with_contents {
            "Perform a search and get the contents of the results. \
             Uses Exa to retrieve relevant results with the webpage contents for each result."
        } else {
            "Perform a web search. \
             Uses Exa to retrieve a list of relevant results without the webpage contents."
        }
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("query", "Search query"),
            Param::of::<String>(
                "search_type",
                "Neural uses embeddings. Keyword uses traditional search. \
                 Auto decides between neural and keyword, based on the query.",
            )
            .one_of(SEARCH_TYPES)
            .with_default(),
            Param::of::<Option<bool>>(
                "use_autoprompt",
                "If true, the provided query will be converted to a prompt-engineered Exa query.",
            ),
            num_results_param(),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Value>("Search results")
    }

    fn requirements(&self) -> ToolRequirements {
        exa_requirements()
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let query = args.get_string("query")?;
        let search_type = args
            .get_string_opt("search_type")
            .unwrap_or_else(|| "auto".to_string());

        let mut body = json!({
            "query": query,
            "type": search_type,
            "useAutoprompt": args.get_bool_or("use_autoprompt", false),
            "numResults": num_results(&args)?,
        });
        if self.with_contents {
            body["contents"] = json!({"text": true});
        }

        let response = self.client.post(context, "/search", &body).await?;
        json_body(ensure_success(response, "Exa").await?).await
    }
}

/// `FindSimilarExa` and `FindSimilarAndContentsExa`.
pub struct ExaFindSimilar {
    client: Arc<ExaClient>,
    with_contents: bool,
}

impl ExaFindSimilar {
    pub fn new(client: Arc<ExaClient>, with_contents: bool) -> Self {
        Self {
            client,
            with_contents,
        }
    }
}

#[async_trait]
impl Tool for ExaFindSimilar {
    fn name(&self) -> &str {
        if self.with_contents {
            "FindSimilarAndContentsExa"
        } else {
            "FindSimilarExa"
        }
    }

    fn description(&self) -> &str {
        if self.with_contents {
            "Find similar results for a given URL and retrieve the contents of the results."
        } else {
            "Find similar results for a given URL."
        }
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("url", "URL of the page to find similar results for"),
            num_results_param(),
            Param::of::<Option<bool>>(
                "exclude_source_domain",
                "Whether to exclude the source domain from the results",
            ),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Value>("Search results")
    }

    fn requirements(&self) -> ToolRequirements {
        exa_requirements()
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let raw_url = args.get_string("url")?;
        let url = check_page_url(&raw_url)?;

        let mut body = json!({
            "url": url.as_str(),
            "numResults": num_results(&args)?,
            "excludeSourceDomain": args.get_bool_or("exclude_source_domain", false),
        });
        if self.with_contents {
            body["contents"] = json!({"text": true, "highlights": true});
        }

        let response = self.client.post(context, "/findSimilar", &body).await?;
        if response.status() == StatusCode::BAD_REQUEST {
            let detail = response.text().await.unwrap_or_default();
            let prompt = format!("{} is not a valid URL.", raw_url);
            return Err(ToolError::retryable(format!("{} {}", prompt, detail))
                .with_additional_prompt_content(prompt)
                .with_retry_after_ms(INVALID_URL_RETRY_MS));
        }
        json_body(ensure_success(response, "Exa").await?).await
    }
}
