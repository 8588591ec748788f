//! Dropbox file browsing, search, download and upload.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tool_core::{
    InputParameter, Param, Tool, ToolArgs, ToolAuthRequirement, ToolContext, ToolError,
    ToolOutputSchema, ToolRequirements, Toolkit,
};
use tracing::debug;

use crate::http::{build_client, join_url, json_body};

pub const TOOLKIT_NAME: &str = "Dropbox";
pub const DROPBOX_API_URL: &str = "https://api.dropboxapi.com/2";
pub const DROPBOX_CONTENT_URL: &str = "https://content.dropboxapi.com/2";

const API_ARG_HEADER: &str = "Dropbox-API-Arg";
const API_RESULT_HEADER: &str = "Dropbox-API-Result";
const DEFAULT_LIMIT: i64 = 100;
const MAX_LIST_LIMIT: i64 = 2000;
const MAX_SEARCH_LIMIT: i64 = 1000;

/// Errors from the Dropbox API, kept apart from transport errors so callers
/// can react to specific error summaries.
#[derive(Debug, Error)]
pub enum DropboxError {
    #[error("{message}")]
    Api {
        status: u16,
        summary: String,
        message: String,
    },
    #[error(transparent)]
    Tool(#[from] ToolError),
}

impl DropboxError {
    fn from_response(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct UserMessage {
            text: Option<String>,
        }
        #[derive(Deserialize)]
        struct ErrorBody {
            error_summary: Option<String>,
            user_message: Option<UserMessage>,
        }

        let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
        let summary = parsed
            .as_ref()
            .and_then(|b| b.error_summary.clone())
            .unwrap_or_else(|| body.trim().to_string());
        let user_message = parsed
            .and_then(|b| b.user_message)
            .and_then(|m| m.text);

        let message = if summary.contains("path/not_found") {
            "The specified path was not found by Dropbox".to_string()
        } else if summary.contains("unsupported_file") {
            "The specified file is not supported for the requested operation".to_string()
        } else {
            user_message.unwrap_or_else(|| summary.clone())
        };

        Self::Api {
            status,
            summary,
            message,
        }
    }

    pub fn is_path_not_found(&self) -> bool {
        matches!(self, Self::Api { summary, .. } if summary.contains("path/not_found"))
    }
}

impl From<reqwest::Error> for DropboxError {
    fn from(err: reqwest::Error) -> Self {
        Self::Tool(err.into())
    }
}

impl From<DropboxError> for ToolError {
    fn from(err: DropboxError) -> Self {
        match err {
            DropboxError::Api {
                status,
                summary,
                message,
            } => ToolError::execution(message)
                .with_developer_message(format!("Dropbox API error {}: {}", status, summary)),
            DropboxError::Tool(err) => err,
        }
    }
}

/// Normalize a user-supplied path: the root is `""`, everything else starts with `/`.
pub fn parse_dropbox_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() || trimmed == "/" {
        return String::new();
    }
    if trimmed.starts_with("id:") {
        return trimmed.to_string();
    }
    let trimmed = trimmed.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Reduce a Dropbox metadata entry to the fields callers care about.
pub fn clean_dropbox_entry(entry: &Value) -> Value {
    json!({
        "type": entry.get(".tag"),
        "id": entry.get("id"),
        "name": entry.get("name"),
        "path": entry.get("path_display"),
        "size": entry.get("size"),
        "modified_time": entry.get("server_modified"),
    })
}

fn next_page_token(data: &Value) -> Value {
    if data["has_more"].as_bool().unwrap_or(false) {
        data["cursor"].clone()
    } else {
        Value::Null
    }
}

pub struct DropboxClient {
    http: reqwest::Client,
    api_url: String,
    content_url: String,
}

impl DropboxClient {
    pub fn new() -> Self {
        Self::with_base_urls(DROPBOX_API_URL, DROPBOX_CONTENT_URL)
    }

    pub fn with_base_urls(api_url: impl Into<String>, content_url: impl Into<String>) -> Self {
        Self {
            http: build_client(),
            api_url: api_url.into(),
            content_url: content_url.into(),
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, DropboxError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(DropboxError::from_response(status.as_u16(), &body))
    }

    /// Call an RPC-style endpoint on the API host.
    pub async fn rpc(
        &self,
        context: &ToolContext,
        endpoint: &str,
        body: &Value,
    ) -> Result<Value, DropboxError> {
        let url = join_url(&self.api_url, endpoint);
        debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(context.auth_token()?)
            .json(body)
            .send()
            .await?;
        Ok(json_body(Self::check(response).await?).await?)
    }

    /// Download a file; returns its metadata and content.
    pub async fn download(
        &self,
        context: &ToolContext,
        path: &str,
    ) -> Result<(Value, String), DropboxError> {
        let url = join_url(&self.content_url, "files/download");
        let arg = json!({ "path": path }).to_string();
        let response = self
            .http
            .post(&url)
            .bearer_auth(context.auth_token()?)
            .header(API_ARG_HEADER, arg)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let metadata = response
            .headers()
            .get(API_RESULT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| serde_json::from_str(v).ok())
            .unwrap_or(Value::Null);
        let content = response.text().await?;
        Ok((metadata, content))
    }

    pub async fn upload(
        &self,
        context: &ToolContext,
        path: &str,
        content: String,
        overwrite: bool,
    ) -> Result<Value, DropboxError> {
        let url = join_url(&self.content_url, "files/upload");
        let arg = json!({
            "path": path,
            "mode": if overwrite { "overwrite" } else { "add" },
            "autorename": !overwrite,
            "mute": true,
        })
        .to_string();
        let response = self
            .http
            .post(&url)
            .bearer_auth(context.auth_token()?)
            .header(API_ARG_HEADER, arg)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(content)
            .send()
            .await?;
        Ok(json_body(Self::check(response).await?).await?)
    }
}

impl Default for DropboxClient {
    fn default() -> Self {
        Self::new()
    }
}

fn requires(scope: &str) -> ToolRequirements {
    ToolRequirements {
        authorization: Some(ToolAuthRequirement::dropbox([scope])),
        secrets: Vec::new(),
    }
}

fn limit_arg(args: &ToolArgs, max: i64) -> Result<i64, ToolError> {
    let limit = args.get_i64_or("limit", DEFAULT_LIMIT)?;
    if !(1..=max).contains(&limit) {
        return Err(ToolError::invalid_parameter(
            "limit",
            format!("must be between 1 and {}", max),
        ));
    }
    Ok(limit)
}

/// Lists the items in a folder, one page at a time.
pub struct ListItemsInFolder {
    client: Arc<DropboxClient>,
}

#[async_trait]
impl Tool for ListItemsInFolder {
    fn name(&self) -> &str {
        "ListItemsInFolder"
    }

    fn description(&self) -> &str {
        "Provides a dictionary containing the list of items in the specified folder path."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>(
                "folder_path",
                "The path to the folder to list the contents of. \
                 Defaults to an empty string (list items in the root folder).",
            )
            .with_default(),
            Param::of::<i64>("limit", "The maximum number of items to return. Defaults to 100.")
                .with_default(),
            Param::of::<Option<String>>(
                "next_page_token",
                "The token for the next page of results. Defaults to None (first page).",
            ),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>(
            "Items in the folder and a token for the next page, if any",
        )
    }

    fn requirements(&self) -> ToolRequirements {
        requires("files.metadata.read")
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let data = match args.get_string_opt("next_page_token") {
            Some(cursor) => {
                self.client
                    .rpc(context, "files/list_folder/continue", &json!({"cursor": cursor}))
                    .await?
            }
            None => {
                let path = parse_dropbox_path(&args.get_string_opt("folder_path").unwrap_or_default());
                let body = json!({"path": path, "limit": limit_arg(&args, MAX_LIST_LIMIT)?});
                self.client.rpc(context, "files/list_folder", &body).await?
            }
        };

        let items: Vec<Value> = data["entries"]
            .as_array()
            .map(|entries| entries.iter().map(clean_dropbox_entry).collect())
            .unwrap_or_default();

        Ok(json!({
            "items": items,
            "next_page_token": next_page_token(&data),
        }))
    }
}

/// Searches file and folder names (and content, where indexed).
pub struct SearchFiles {
    client: Arc<DropboxClient>,
}

#[async_trait]
impl Tool for SearchFiles {
    fn name(&self) -> &str {
        "SearchFiles"
    }

    fn description(&self) -> &str {
        "Returns a list of items matching the search keywords."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("keywords", "The keywords to search for. E.g. 'quarterly report'"),
            Param::of::<String>(
                "search_in_folder_path",
                "Restricts the search to the specified folder path. \
                 Defaults to an empty string (search in the entire Dropbox).",
            )
            .with_default(),
            Param::of::<i64>("limit", "The maximum number of items to return. Defaults to 100.")
                .with_default(),
            Param::of::<Option<String>>(
                "next_page_token",
                "The token for the next page of results. Defaults to None (first page).",
            ),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Matching items and a next page token")
    }

    fn requirements(&self) -> ToolRequirements {
        requires("files.metadata.read")
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let data = match args.get_string_opt("next_page_token") {
            Some(cursor) => {
                self.client
                    .rpc(context, "files/search/continue_v2", &json!({"cursor": cursor}))
                    .await?
            }
            None => {
                let mut options = json!({
                    "max_results": limit_arg(&args, MAX_SEARCH_LIMIT)?,
                    "file_status": "active",
                    "filename_only": false,
                });
                let path = parse_dropbox_path(
                    &args.get_string_opt("search_in_folder_path").unwrap_or_default(),
                );
                if !path.is_empty() {
                    options["path"] = Value::String(path);
                }
                let body = json!({"query": args.get_string("keywords")?, "options": options});
                self.client.rpc(context, "files/search_v2", &body).await?
            }
        };

        // search_v2 nests the entry under metadata.metadata
        let items: Vec<Value> = data["matches"]
            .as_array()
            .map(|matches| {
                matches
                    .iter()
                    .map(|m| clean_dropbox_entry(&m["metadata"]["metadata"]))
                    .collect()
            })
            .unwrap_or_default();

        Ok(json!({
            "items": items,
            "next_page_token": next_page_token(&data),
        }))
    }
}

pub struct DownloadFile {
    client: Arc<DropboxClient>,
}

#[async_trait]
impl Tool for DownloadFile {
    fn name(&self) -> &str {
        "DownloadFile"
    }

    fn description(&self) -> &str {
        "Downloads the specified file. Either one of `file_path` or `file_id` must be provided."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<Option<String>>(
                "file_path",
                "The path to the file to get the contents of. E.g. '/AcmeInc/Reports/Q1_2025.txt'.",
            ),
            Param::of::<Option<String>>(
                "file_id",
                "The ID of the file to get the contents of. E.g. 'id:a4ayc_80_OEAAAAAAAAAYa'.",
            ),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Contents of the specified file")
    }

    fn requirements(&self) -> ToolRequirements {
        requires("files.content.read")
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let file_path = args.get_string_opt("file_path").filter(|p| !p.is_empty());
        let file_id = args.get_string_opt("file_id").filter(|p| !p.is_empty());

        let target = match (&file_path, &file_id) {
            (None, None) => {
                return Err(ToolError::execution(
                    "Either `file_path` or `file_id` must be provided.",
                ))
            }
            (Some(_), Some(_)) => {
                return Err(ToolError::execution(
                    "Only one of `file_path` or `file_id` can be provided.",
                ))
            }
            (Some(path), None) => parse_dropbox_path(path),
            (None, Some(id)) => id.clone(),
        };

        match self.client.download(context, &target).await {
            Ok((metadata, content)) => {
                let mut file = clean_dropbox_entry(&metadata);
                file["content"] = Value::String(content);
                Ok(json!({ "file": file }))
            }
            Err(err) if err.is_path_not_found() => Ok(json!({
                "error": format!(
                    "The specified path was not found by Dropbox: '{}'",
                    file_path.or(file_id).unwrap_or_default()
                ),
            })),
            Err(err) => Err(err.into()),
        }
    }
}

pub struct UploadFile {
    client: Arc<DropboxClient>,
}

#[async_trait]
impl Tool for UploadFile {
    fn name(&self) -> &str {
        "UploadFile"
    }

    fn description(&self) -> &str {
        "Uploads text content to a file in Dropbox."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("file_path", "The Dropbox path of the file to write."),
            Param::of::<String>("content", "The text content to write into the file."),
            Param::of::<bool>(
                "overwrite",
                "Whether to replace an existing file. When false, Dropbox renames the new file. \
                 Defaults to true.",
            )
            .with_default(),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<String>("A confirmation message")
    }

    fn requirements(&self) -> ToolRequirements {
        requires("files.content.write")
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let path = parse_dropbox_path(&args.get_string("file_path")?);
        if path.is_empty() {
            return Err(ToolError::invalid_parameter(
                "file_path",
                "cannot upload to the root folder",
            ));
        }
        let overwrite = args.get_bool_or("overwrite", true);
        let data = self
            .client
            .upload(context, &path, args.get_string("content")?, overwrite)
            .await?;

        Ok(Value::String(format!(
            "File '{}' uploaded to '{}'.",
            data["name"].as_str().unwrap_or_default(),
            data["path_display"].as_str().unwrap_or(&path)
        )))
    }
}

pub fn toolkit() -> Toolkit {
    toolkit_with_client(DropboxClient::new())
}

pub fn toolkit_with_client(client: DropboxClient) -> Toolkit {
    let client = Arc::new(client);
    Toolkit::new(TOOLKIT_NAME, env!("CARGO_PKG_VERSION"))
        .description("Browse, search, download and upload Dropbox files.")
        .tool(ListItemsInFolder {
            client: Arc::clone(&client),
        })
        .tool(SearchFiles {
            client: Arc::clone(&client),
        })
        .tool(DownloadFile {
            client: Arc::clone(&client),
        })
        .tool(UploadFile { client })
}
