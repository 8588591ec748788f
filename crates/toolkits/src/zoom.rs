//! Zoom meetings.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tool_core::{
    InputParameter, Param, Tool, ToolArgs, ToolAuthRequirement, ToolContext, ToolError,
    ToolOutputSchema, ToolRequirements, Toolkit,
};
use tracing::debug;

use crate::http::{build_client, ensure_success, join_url, json_body};

pub const TOOLKIT_NAME: &str = "Zoom";
pub const ZOOM_API_URL: &str = "https://api.zoom.us/v2";

/// Zoom requires meeting UUIDs that start with `/` or contain `//` to be
/// percent-encoded twice before they go into a path.
pub fn double_encode_uuid(uuid: &str) -> String {
    if uuid.starts_with('/') || uuid.contains("//") {
        let once = urlencoding::encode(uuid);
        urlencoding::encode(&once).into_owned()
    } else {
        uuid.to_string()
    }
}

pub struct ZoomClient {
    http: reqwest::Client,
    base_url: String,
}

impl ZoomClient {
    pub fn new() -> Self {
        Self::with_base_url(ZOOM_API_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: build_client(),
            base_url: base_url.into(),
        }
    }

    pub async fn request(
        &self,
        context: &ToolContext,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value, ToolError> {
        let url = join_url(&self.base_url, endpoint);
        debug!("{} {}", method, url);
        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(context.auth_token()?);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        json_body(ensure_success(response, "Zoom").await?).await
    }
}

impl Default for ZoomClient {
    fn default() -> Self {
        Self::new()
    }
}

fn requires(scope: &str) -> ToolRequirements {
    ToolRequirements {
        authorization: Some(ToolAuthRequirement::zoom([scope])),
        secrets: Vec::new(),
    }
}

pub struct ListUpcomingMeetings {
    client: Arc<ZoomClient>,
}

#[async_trait]
impl Tool for ListUpcomingMeetings {
    fn name(&self) -> &str {
        "ListUpcomingMeetings"
    }

    fn description(&self) -> &str {
        "List a Zoom user's upcoming meetings within the next 24 hours."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![Param::of::<String>(
            "user_id",
            "The user's user ID or email address. Defaults to 'me' for the current user.",
        )
        .with_default()]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>(
            "List of upcoming meetings within the next 24 hours",
        )
    }

    fn requirements(&self) -> ToolRequirements {
        requires("meeting:read:list_upcoming_meetings")
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let user_id = args
            .get_string_opt("user_id")
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| "me".to_string());
        let endpoint = format!("users/{}/upcoming_meetings", urlencoding::encode(&user_id));
        self.client
            .request(context, Method::GET, &endpoint, None)
            .await
    }
}

pub struct GetMeetingInvitation {
    client: Arc<ZoomClient>,
}

#[async_trait]
impl Tool for GetMeetingInvitation {
    fn name(&self) -> &str {
        "GetMeetingInvitation"
    }

    fn description(&self) -> &str {
        "Retrieve the invitation note for the provided Zoom meeting."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![Param::of::<i64>("meeting_id", "The Zoom meeting ID")]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Meeting invitation string")
    }

    fn requirements(&self) -> ToolRequirements {
        requires("meeting:read:invitation")
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let meeting_id = args.get_i64("meeting_id")?;
        self.client
            .request(
                context,
                Method::GET,
                &format!("meetings/{}/invitation", meeting_id),
                None,
            )
            .await
    }
}

/// Only available on paid Zoom accounts.
pub struct GetMeetingSummary {
    client: Arc<ZoomClient>,
}

#[async_trait]
impl Tool for GetMeetingSummary {
    fn name(&self) -> &str {
        "GetMeetingSummary"
    }

    fn description(&self) -> &str {
        "Get the summary of a Zoom meeting given the meeting's UUID"
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![Param::of::<String>("meeting_uuid", "The Zoom meeting UUID")]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The meeting summary")
    }

    fn requirements(&self) -> ToolRequirements {
        requires("meeting:read:summary")
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let uuid = args.get_string("meeting_uuid")?;
        let endpoint = format!("meetings/{}/meeting_summary", double_encode_uuid(&uuid));
        self.client
            .request(context, Method::GET, &endpoint, None)
            .await
    }
}

pub struct CreateInstantMeeting {
    client: Arc<ZoomClient>,
}

#[async_trait]
impl Tool for CreateInstantMeeting {
    fn name(&self) -> &str {
        "CreateInstantMeeting"
    }

    fn description(&self) -> &str {
        "Create an instant Zoom meeting that starts immediately"
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("title", "The title of the meeting"),
            Param::of::<Option<String>>("description", "The description of the meeting"),
            Param::of::<Option<String>>("password", "The password required to join the meeting"),
            Param::of::<Option<Vec<String>>>(
                "alternative_host_emails",
                "The email addresses of the alternative hosts",
            ),
            Param::of::<Option<Vec<String>>>(
                "authentication_domains",
                "Authenticated domains. Only users with emails in these domains can join",
            ),
            Param::of::<bool>(
                "meeting_authentication",
                "If true, only authenticated users can join the meeting",
            )
            .with_default(),
            Param::of::<Option<Vec<String>>>(
                "attendee_email_addresses",
                "The email addresses of the attendees",
            ),
            Param::of::<bool>(
                "waiting_room",
                "If true, participants wait in a waiting room until admitted",
            )
            .with_default(),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The created meeting")
    }

    fn requirements(&self) -> ToolRequirements {
        requires("meeting:write:meeting")
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let body = instant_meeting_body(&args)?;
        self.client
            .request(context, Method::POST, "users/me/meetings", Some(&body))
            .await
    }
}

fn instant_meeting_body(args: &ToolArgs) -> Result<Value, ToolError> {
    let mut body = json!({
        "topic": args.get_string("title")?,
        "agenda": args.get_string_opt("description"),
        "password": args.get_string_opt("password"),
        "waiting_room": args.get_bool_or("waiting_room", false),
        "meeting_authentication": args.get_bool_or("meeting_authentication", false),
        "type": 1,
        "settings": {
            "host_video": false,
            "participant_video": false,
            "mute_upon_entry": true,
            "registrants_confirmation_email": true,
            "registrants_email_notification": true,
        },
    });

    let list = |key: &str| -> Result<Vec<String>, ToolError> {
        Ok(args.get_opt::<Vec<String>>(key)?.unwrap_or_default())
    };

    let hosts = list("alternative_host_emails")?;
    if !hosts.is_empty() {
        body["alternative_host_ids"] = Value::String(hosts.join(";"));
    }
    let domains = list("authentication_domains")?;
    if !domains.is_empty() {
        body["authentication_domains"] = Value::String(domains.join(","));
    }
    let invitees = list("attendee_email_addresses")?;
    if !invitees.is_empty() {
        body["meeting_invitees"] = invitees
            .iter()
            .map(|email| json!({"email": email}))
            .collect();
    }
    Ok(body)
}

pub fn toolkit() -> Toolkit {
    toolkit_with_client(ZoomClient::new())
}

pub fn toolkit_with_client(client: ZoomClient) -> Toolkit {
    let client = Arc::new(client);
    Toolkit::new(TOOLKIT_NAME, env!("CARGO_PKG_VERSION"))
        .description("Zoom meetings, invitations and summaries.")
        .tool(ListUpcomingMeetings {
            client: Arc::clone(&client),
        })
        .tool(GetMeetingInvitation {
            client: Arc::clone(&client),
        })
        .tool(GetMeetingSummary {
            client: Arc::clone(&client),
        })
        .tool(CreateInstantMeeting { client })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_encode_uuid() {
        assert_eq!(double_encode_uuid("abc123=="), "abc123==");
        assert_eq!(double_encode_uuid("/abc"), "%252Fabc");
        assert_eq!(double_encode_uuid("ab//c"), "ab%252F%252Fc");
    }

    #[test]
    fn test_instant_meeting_body() {
        let args = ToolArgs::from_value(json!({
            "title": "Standup",
            "alternative_host_emails": ["a@example.com", "b@example.com"],
            "authentication_domains": ["example.com", "example.org"],
            "attendee_email_addresses": ["c@example.com"],
            "waiting_room": true
        }));
        let body = instant_meeting_body(&args).unwrap();
        assert_eq!(body["topic"], "Standup");
        assert_eq!(body["type"], 1);
        assert_eq!(body["agenda"], Value::Null);
        assert_eq!(body["waiting_room"], true);
        assert_eq!(body["alternative_host_ids"], "a@example.com;b@example.com");
        assert_eq!(body["authentication_domains"], "example.com,example.org");
        assert_eq!(body["meeting_invitees"], json!([{"email": "c@example.com"}]));
    }

    #[test]
    fn test_instant_meeting_body_requires_title() {
        let args = ToolArgs::from_value(json!({}));
        assert!(instant_meeting_body(&args).is_err());
    }
}
