//! Image generation with the OpenAI images API.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tool_core::{
    resolve_secret, InputParameter, Param, Tool, ToolArgs, ToolContext, ToolError,
    ToolOutputSchema, ToolRequirements, ToolSecretRequirement, Toolkit,
};
use tracing::{debug, info};

use crate::http::{build_client, ensure_success, join_url};

pub const TOOLKIT_NAME: &str = "Images";
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const DEFAULT_MODEL: &str = "dall-e-2";

const IMAGE_SIZE: &str = "256x256";

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenAiClient {
    pub fn new() -> Self {
        Self::with_base_url(OPENAI_API_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: build_client(),
            base_url: base_url.into(),
        }
    }

    /// Generate one image and return the URLs the API hands back.
    pub async fn generate(
        &self,
        context: &ToolContext,
        prompt: &str,
        model: &str,
    ) -> Result<Vec<String>, ToolError> {
        let api_key = resolve_secret(context, OPENAI_API_KEY)?;
        let url = join_url(&self.base_url, "images/generations");
        debug!("POST {} (model {})", url, model);

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&json!({
                "model": model,
                "prompt": prompt,
                "n": 1,
                "size": IMAGE_SIZE,
            }))
            .send()
            .await?;
        let response = ensure_success(response, "OpenAI").await?;
        let body: ImagesResponse = response.json().await?;

        Ok(body.data.into_iter().filter_map(|image| image.url).collect())
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

pub struct GenerateImage {
    client: Arc<OpenAiClient>,
}

#[async_trait]
impl Tool for GenerateImage {
    fn name(&self) -> &str {
        "GenerateImage"
    }

    fn description(&self) -> &str {
        "Generate an image based on a prompt"
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("prompt", "The prompt for the image to generate"),
            Param::of::<String>("model", "The model to use to generate the image").with_default(),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Vec<String>>("The URL(s) of the generated image(s)")
    }

    fn requirements(&self) -> ToolRequirements {
        ToolRequirements {
            authorization: None,
            secrets: vec![ToolSecretRequirement {
                key: OPENAI_API_KEY.to_string(),
            }],
        }
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let prompt = args.get_string("prompt")?;
        if prompt.trim().is_empty() {
            return Err(ToolError::invalid_parameter("prompt", "must not be empty"));
        }
        let model = args
            .get_string_opt("model")
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let urls = self.client.generate(context, &prompt, &model).await?;
        info!("Generated {} image(s) with {}", urls.len(), model);
        Ok(json!(urls))
    }
}

pub fn toolkit() -> Toolkit {
    toolkit_with_client(OpenAiClient::new())
}

pub fn toolkit_with_client(client: OpenAiClient) -> Toolkit {
    Toolkit::new(TOOLKIT_NAME, env!("CARGO_PKG_VERSION"))
        .description("Image generation.")
        .tool(GenerateImage {
            client: Arc::new(client),
        })
}
