//! Gmail: send, draft, search and label email with the caller's Google token.

mod client;
mod message;
mod query;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tool_core::{
    InputParameter, Param, Tool, ToolArgs, ToolAuthRequirement, ToolContext, ToolError,
    ToolOutputSchema, ToolRequirements, Toolkit,
};
use tracing::warn;

pub use client::{GmailClient, GMAIL_API_URL};
pub use message::{
    bare_address, decode_base64, draft_url, parse_draft, parse_email, plain_text_body,
    sent_url, split_addresses, trash_url, OutgoingEmail, ReplyContext,
};
pub use query::{DateRange, MailFilter};

pub const TOOLKIT_NAME: &str = "Google";

const SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";
const COMPOSE_SCOPE: &str = "https://www.googleapis.com/auth/gmail.compose";
const MODIFY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";
const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";
const LABELS_SCOPE: &str = "https://www.googleapis.com/auth/gmail.labels";

/// Gmail caps a single list page at 500 threads.
const MAX_THREAD_PAGE: i64 = 500;

fn requires(scope: &str) -> ToolRequirements {
    ToolRequirements {
        authorization: Some(ToolAuthRequirement::google([scope])),
        secrets: Vec::new(),
    }
}

fn recipients_params(noun: &str) -> Vec<InputParameter> {
    vec![
        Param::of::<String>("subject", format!("The subject of the {}", noun)),
        Param::of::<String>("body", format!("The body of the {}", noun)),
        Param::of::<String>("recipient", format!("The recipient of the {}", noun)),
        Param::of::<Option<Vec<String>>>("cc", format!("CC recipients of the {}", noun)),
        Param::of::<Option<Vec<String>>>("bcc", format!("BCC recipients of the {}", noun)),
    ]
}

fn email_from_args(args: &ToolArgs) -> Result<OutgoingEmail, ToolError> {
    Ok(OutgoingEmail::new(
        args.get_string("recipient")?,
        args.get_string("subject")?,
        args.get_string("body")?,
    )
    .with_cc(args.get_opt("cc")?.unwrap_or_default())
    .with_bcc(args.get_opt("bcc")?.unwrap_or_default()))
}

fn with_url(mut email: Value, url: String) -> Value {
    email["url"] = Value::String(url);
    email
}

fn id_of(value: &Value) -> &str {
    value["id"].as_str().unwrap_or_default()
}

async fn reply_context(
    client: &GmailClient,
    context: &ToolContext,
    message_id: &str,
    failure: String,
) -> Result<ReplyContext, ToolError> {
    let current_user = client.profile_email(context).await?;
    let original = client
        .get_message(context, message_id)
        .await
        .map_err(|e| {
            ToolError::retryable(failure.clone())
                .with_developer_message(format!("{} Reason: {}", failure, e))
        })?;
    Ok(ReplyContext::from_message(&original, &current_user))
}

/// Fetch and parse each listed message, keeping list order.
async fn email_details(
    client: &GmailClient,
    context: &ToolContext,
    listed: &[Value],
) -> Result<Vec<Value>, ToolError> {
    let mut emails = Vec::with_capacity(listed.len());
    for item in listed {
        let id = id_of(item);
        let message = client.get_message(context, id).await.map_err(|e| {
            ToolError::execution(format!("Error reading email {}.", id))
                .with_developer_message(e.to_string())
        })?;
        emails.push(parse_email(&message));
    }
    Ok(emails)
}

/// Resolve label names to IDs. Unknown names come back separately.
async fn resolve_labels(
    client: &GmailClient,
    context: &ToolContext,
    names: &[String],
) -> Result<(Vec<(String, String)>, Vec<String>, Vec<String>), ToolError> {
    let labels = client.list_labels(context).await?;
    let mut found = Vec::new();
    let mut missing = Vec::new();
    for name in names {
        match labels.iter().find(|label| label["name"].as_str() == Some(name.as_str())) {
            Some(label) => found.push((name.clone(), id_of(label).to_string())),
            None => {
                warn!("Label '{}' does not exist", name);
                missing.push(name.clone());
            }
        }
    }
    let all_names = labels
        .iter()
        .filter_map(|label| label["name"].as_str().map(str::to_string))
        .collect();
    Ok((found, missing, all_names))
}

fn invalid_labels(prefix: &str, missing: &[String], valid: &[String]) -> ToolError {
    let message = format!("{}: {}", prefix, missing.join(", "));
    ToolError::retryable(message.clone())
        .with_developer_message(message)
        .with_additional_prompt_content(format!("List of valid labels: {}", valid.join(", ")))
}

fn filter_from_args(args: &ToolArgs) -> Result<MailFilter, ToolError> {
    let text = |key: &str| args.get_string_opt(key).filter(|v| !v.trim().is_empty());
    Ok(MailFilter {
        sender: text("sender"),
        recipient: text("recipient"),
        subject: text("subject"),
        body: text("body"),
        date_range: text("date_range").as_deref().map(DateRange::parse).transpose()?,
        label: None,
    })
}

fn filter_params() -> Vec<InputParameter> {
    vec![
        Param::of::<Option<String>>(
            "sender",
            "The name or email address of the sender of the email",
        ),
        Param::of::<Option<String>>("recipient", "The name or email address of the recipient"),
        Param::of::<Option<String>>("subject", "Words to find in the subject of the email"),
        Param::of::<Option<String>>("body", "Words to find in the body of the email"),
        Param::of::<Option<String>>("date_range", "The date range of the email")
            .one_of(DateRange::names()),
    ]
}

/// Page through `threads` until `max_results` are collected or pages run out.
async fn collect_threads(
    client: &GmailClient,
    context: &ToolContext,
    args: &ToolArgs,
    filter: &MailFilter,
) -> Result<Value, ToolError> {
    let max_results = args.get_i64_or("max_results", 10)?.max(1);
    let mut base = vec![(
        "includeSpamTrash",
        args.get_bool_or("include_spam_trash", false).to_string(),
    )];
    if !filter.is_empty() {
        base.push(("q", filter.to_query(Local::now().date_naive())));
    }
    for label_id in args.get_opt::<Vec<String>>("label_ids")?.unwrap_or_default() {
        base.push(("labelIds", label_id));
    }

    let mut threads: Vec<Value> = Vec::new();
    let mut page_token = args.get_string_opt("page_token");
    loop {
        let remaining = (max_results - threads.len() as i64).min(MAX_THREAD_PAGE);
        let mut query = base.clone();
        query.push(("maxResults", remaining.to_string()));
        if let Some(token) = &page_token {
            query.push(("pageToken", token.clone()));
        }

        let page = client.get(context, "threads", &query).await?;
        threads.extend(page["threads"].as_array().cloned().unwrap_or_default());
        page_token = page["nextPageToken"].as_str().map(str::to_string);

        if page_token.is_none() || threads.len() as i64 >= max_results {
            break;
        }
    }

    Ok(json!({
        "threads": threads,
        "num_threads": threads.len(),
        "next_page_token": page_token,
    }))
}

fn thread_paging_params() -> Vec<InputParameter> {
    vec![
        Param::of::<Option<String>>(
            "page_token",
            "Page token to retrieve a specific page of results in the list",
        ),
        Param::of::<i64>("max_results", "The maximum number of threads to return").with_default(),
        Param::of::<bool>(
            "include_spam_trash",
            "Whether to include spam and trash in the results",
        )
        .with_default(),
    ]
}

pub struct SendEmail {
    client: Arc<GmailClient>,
}

#[async_trait]
impl Tool for SendEmail {
    fn name(&self) -> &str {
        "SendEmail"
    }

    fn description(&self) -> &str {
        "Send an email using the Gmail API."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        recipients_params("email")
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The sent email details")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(SEND_SCOPE)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let email = email_from_args(&args)?;
        let sent = self.client.send_raw(context, email.to_raw(), None).await?;
        Ok(with_url(parse_email(&sent), sent_url(id_of(&sent))))
    }
}

pub struct SendDraftEmail {
    client: Arc<GmailClient>,
}

#[async_trait]
impl Tool for SendDraftEmail {
    fn name(&self) -> &str {
        "SendDraftEmail"
    }

    fn description(&self) -> &str {
        "Send a draft email using the Gmail API."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![Param::of::<String>("email_id", "The ID of the draft to send")]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The sent email details")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(SEND_SCOPE)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let draft_id = args.get_string("email_id")?;
        let sent = self
            .client
            .post(context, "drafts/send", &json!({"id": draft_id}))
            .await?;
        Ok(with_url(parse_email(&sent), sent_url(id_of(&sent))))
    }
}

pub struct ReplyToEmail {
    client: Arc<GmailClient>,
}

#[async_trait]
impl Tool for ReplyToEmail {
    fn name(&self) -> &str {
        "ReplyToEmail"
    }

    fn description(&self) -> &str {
        "Send a reply to an email, keeping it in the same thread. \
         The reply goes to the sender and the other recipients."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("body", "The body of the email"),
            Param::of::<String>("reply_to_message_id", "The ID of the message to reply to"),
            Param::of::<Option<Vec<String>>>("bcc", "BCC recipients of the email"),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The sent email details")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(SEND_SCOPE)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let message_id = args.get_string("reply_to_message_id")?;
        let reply = reply_context(
            &self.client,
            context,
            &message_id,
            format!("Could not retrieve the message with id {}.", message_id),
        )
        .await?;

        let email = reply.email(
            args.get_string("body")?,
            args.get_opt("bcc")?.unwrap_or_default(),
        );
        let sent = self
            .client
            .send_raw(context, email.to_raw(), Some(&reply.thread_id))
            .await?;
        Ok(with_url(parse_email(&sent), sent_url(id_of(&sent))))
    }
}

pub struct WriteDraftEmail {
    client: Arc<GmailClient>,
}

#[async_trait]
impl Tool for WriteDraftEmail {
    fn name(&self) -> &str {
        "WriteDraftEmail"
    }

    fn description(&self) -> &str {
        "Compose a new email draft using the Gmail API."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        recipients_params("draft email")
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The created draft email details")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(COMPOSE_SCOPE)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let email = email_from_args(&args)?;
        let draft = self
            .client
            .post(context, "drafts", &json!({"message": {"raw": email.to_raw()}}))
            .await?;
        Ok(with_url(parse_draft(&draft), draft_url(id_of(&draft))))
    }
}

pub struct WriteDraftReplyEmail {
    client: Arc<GmailClient>,
}

#[async_trait]
impl Tool for WriteDraftReplyEmail {
    fn name(&self) -> &str {
        "WriteDraftReplyEmail"
    }

    fn description(&self) -> &str {
        "Compose a draft reply to an email, keeping it in the same thread. \
         Use ReplyToEmail to send the reply right away instead."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>(
                "message_id",
                "The Gmail message ID of the message to draft a reply to",
            ),
            Param::of::<String>("body", "The body of the draft reply email"),
            Param::of::<Option<Vec<String>>>("bcc", "BCC recipients of the draft reply email"),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The created draft reply details")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(COMPOSE_SCOPE)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let message_id = args.get_string("message_id")?;
        let reply = reply_context(
            &self.client,
            context,
            &message_id,
            "Could not retrieve the message to respond to.".to_string(),
        )
        .await?;

        let email = reply.email(
            args.get_string("body")?,
            args.get_opt("bcc")?.unwrap_or_default(),
        );
        let payload = json!({
            "message": {"raw": email.to_raw(), "threadId": reply.thread_id}
        });
        let draft = self.client.post(context, "drafts", &payload).await?;
        Ok(with_url(parse_draft(&draft), draft_url(id_of(&draft))))
    }
}

pub struct UpdateDraftEmail {
    client: Arc<GmailClient>,
}

#[async_trait]
impl Tool for UpdateDraftEmail {
    fn name(&self) -> &str {
        "UpdateDraftEmail"
    }

    fn description(&self) -> &str {
        "Replace the contents of an existing email draft."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        let mut params = vec![Param::of::<String>(
            "draft_email_id",
            "The ID of the draft email to update.",
        )];
        params.extend(recipients_params("draft email"));
        params
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The updated draft email details")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(COMPOSE_SCOPE)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let draft_id = args.get_string("draft_email_id")?;
        let email = email_from_args(&args)?;
        let payload = json!({"id": draft_id, "message": {"raw": email.to_raw()}});
        let draft = self
            .client
            .request(
                context,
                Method::PUT,
                &format!("drafts/{}", draft_id),
                &[],
                Some(&payload),
            )
            .await?;
        Ok(with_url(parse_draft(&draft), draft_url(id_of(&draft))))
    }
}

pub struct DeleteDraftEmail {
    client: Arc<GmailClient>,
}

#[async_trait]
impl Tool for DeleteDraftEmail {
    fn name(&self) -> &str {
        "DeleteDraftEmail"
    }

    fn description(&self) -> &str {
        "Delete a draft email using the Gmail API."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![Param::of::<String>("draft_email_id", "The ID of the draft email to delete")]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<String>("A confirmation message")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(COMPOSE_SCOPE)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let draft_id = args.get_string("draft_email_id")?;
        self.client
            .request(
                context,
                Method::DELETE,
                &format!("drafts/{}", draft_id),
                &[],
                None,
            )
            .await?;
        Ok(json!(format!(
            "Draft email with ID {} deleted successfully.",
            draft_id
        )))
    }
}

pub struct TrashEmail {
    client: Arc<GmailClient>,
}

#[async_trait]
impl Tool for TrashEmail {
    fn name(&self) -> &str {
        "TrashEmail"
    }

    fn description(&self) -> &str {
        "Move an email to the trash folder."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![Param::of::<String>("email_id", "The ID of the email to trash")]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The trashed email details")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(MODIFY_SCOPE)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let email_id = args.get_string("email_id")?;
        let trashed = self
            .client
            .post(context, &format!("messages/{}/trash", email_id), &json!({}))
            .await?;
        Ok(with_url(parse_email(&trashed), trash_url(id_of(&trashed))))
    }
}

pub struct ListDraftEmails {
    client: Arc<GmailClient>,
}

#[async_trait]
impl Tool for ListDraftEmails {
    fn name(&self) -> &str {
        "ListDraftEmails"
    }

    fn description(&self) -> &str {
        "List draft emails in the user's mailbox."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![Param::of::<i64>("n_drafts", "Number of draft emails to read").with_default()]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("A list of draft email details")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(READONLY_SCOPE)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let n_drafts = args.get_i64_or("n_drafts", 5)?.max(0) as usize;
        let listed = self.client.get(context, "drafts", &[]).await?;
        let drafts = listed["drafts"].as_array().cloned().unwrap_or_default();

        let mut emails = Vec::new();
        for draft in drafts.iter().take(n_drafts) {
            let id = id_of(draft);
            let data = self
                .client
                .get(context, &format!("drafts/{}", id), &[("format", "full".to_string())])
                .await
                .map_err(|e| {
                    ToolError::execution(format!("Error reading draft email {}.", id))
                        .with_developer_message(e.to_string())
                })?;
            emails.push(parse_draft(&data));
        }
        Ok(json!({"emails": emails}))
    }
}

pub struct ListEmailsByHeader {
    client: Arc<GmailClient>,
}

#[async_trait]
impl Tool for ListEmailsByHeader {
    fn name(&self) -> &str {
        "ListEmailsByHeader"
    }

    fn description(&self) -> &str {
        "Search for emails by header. At least one of sender, recipient, subject, \
         body, date_range or label must be provided."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        let mut params = filter_params();
        params.push(Param::of::<Option<String>>("label", "The label name to filter by"));
        params.push(
            Param::of::<i64>("max_results", "The maximum number of emails to return")
                .with_default(),
        );
        params
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Emails matching the search criteria")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(READONLY_SCOPE)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let mut filter = filter_from_args(&args)?;
        filter.label = args.get_string_opt("label").filter(|l| !l.trim().is_empty());
        if filter.is_empty() {
            let message = "At least one of sender, recipient, subject, body, label, \
                           or date_range must be provided.";
            return Err(ToolError::retryable(message).with_developer_message(message));
        }

        if let Some(label) = &filter.label {
            let (_, missing, valid) =
                resolve_labels(&self.client, context, std::slice::from_ref(label)).await?;
            if !missing.is_empty() {
                return Err(invalid_labels("Invalid label", &missing, &valid));
            }
        }

        let max_results = args.get_i64_or("max_results", 25)?;
        let max_results = if max_results > 0 { max_results } else { 100 };
        let query = [
            ("q", filter.to_query(Local::now().date_naive())),
            ("maxResults", max_results.to_string()),
        ];
        let listed = self.client.get(context, "messages", &query).await?;
        let messages = listed["messages"].as_array().cloned().unwrap_or_default();

        let emails = email_details(&self.client, context, &messages).await?;
        Ok(json!({"emails": emails}))
    }
}

pub struct ListEmails {
    client: Arc<GmailClient>,
}

#[async_trait]
impl Tool for ListEmails {
    fn name(&self) -> &str {
        "ListEmails"
    }

    fn description(&self) -> &str {
        "Read the most recent emails and extract their plain text content."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![Param::of::<i64>("n_emails", "Number of emails to read").with_default()]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("A list of email details")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(READONLY_SCOPE)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let n_emails = args.get_i64_or("n_emails", 5)?.max(0) as usize;
        let listed = self.client.get(context, "messages", &[]).await?;
        let messages: Vec<Value> = listed["messages"]
            .as_array()
            .map(|m| m.iter().take(n_emails).cloned().collect())
            .unwrap_or_default();

        let emails = email_details(&self.client, context, &messages).await?;
        Ok(json!({"emails": emails}))
    }
}

pub struct SearchThreads {
    client: Arc<GmailClient>,
}

#[async_trait]
impl Tool for SearchThreads {
    fn name(&self) -> &str {
        "SearchThreads"
    }

    fn description(&self) -> &str {
        "Search for threads in the user's mailbox."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        let mut params = thread_paging_params();
        params.push(Param::of::<Option<Vec<String>>>(
            "label_ids",
            "The IDs of labels to filter by",
        ));
        params.extend(filter_params());
        params
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("A list of thread details")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(READONLY_SCOPE)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let filter = filter_from_args(&args)?;
        collect_threads(&self.client, context, &args, &filter).await
    }
}

pub struct ListThreads {
    client: Arc<GmailClient>,
}

#[async_trait]
impl Tool for ListThreads {
    fn name(&self) -> &str {
        "ListThreads"
    }

    fn description(&self) -> &str {
        "List threads in the user's mailbox."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        thread_paging_params()
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("A list of thread details")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(READONLY_SCOPE)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        collect_threads(&self.client, context, &args, &MailFilter::default()).await
    }
}

pub struct GetThread {
    client: Arc<GmailClient>,
}

#[async_trait]
impl Tool for GetThread {
    fn name(&self) -> &str {
        "GetThread"
    }

    fn description(&self) -> &str {
        "Get a thread and its messages by ID."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![Param::of::<String>("thread_id", "The ID of the thread to retrieve")]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The thread details")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(READONLY_SCOPE)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let thread_id = args.get_string("thread_id")?;
        let mut thread = self
            .client
            .get(
                context,
                &format!("threads/{}", thread_id),
                &[("format", "full".to_string())],
            )
            .await?;

        let messages: Vec<Value> = thread["messages"]
            .as_array()
            .map(|messages| messages.iter().map(parse_email).collect())
            .unwrap_or_default();
        thread["messages"] = Value::Array(messages);
        Ok(thread)
    }
}

pub struct ChangeEmailLabels {
    client: Arc<GmailClient>,
}

#[async_trait]
impl Tool for ChangeEmailLabels {
    fn name(&self) -> &str {
        "ChangeEmailLabels"
    }

    fn description(&self) -> &str {
        "Add and remove labels on an email, by label name."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("email_id", "The ID of the email to modify labels for"),
            Param::of::<Vec<String>>("labels_to_add", "List of label names to add"),
            Param::of::<Vec<String>>("labels_to_remove", "List of label names to remove"),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The labels that were added and removed")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(MODIFY_SCOPE)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let email_id = args.get_string("email_id")?;
        let to_add: Vec<String> = args.get("labels_to_add")?;
        let to_remove: Vec<String> = args.get("labels_to_remove")?;

        let mut names = to_add.clone();
        names.extend(to_remove.iter().cloned());
        let (found, missing, valid) = resolve_labels(&self.client, context, &names).await?;
        if !missing.is_empty() {
            return Err(invalid_labels("Invalid labels", &missing, &valid));
        }

        let ids_for = |wanted: &[String]| -> Vec<String> {
            found
                .iter()
                .filter(|(name, _)| wanted.contains(name))
                .map(|(_, id)| id.clone())
                .collect()
        };
        let body = json!({
            "addLabelIds": ids_for(&to_add),
            "removeLabelIds": ids_for(&to_remove),
        });

        self.client
            .post(context, &format!("messages/{}/modify", email_id), &body)
            .await
            .map_err(|e| {
                ToolError::execution(format!("Error modifying labels for email {}", email_id))
                    .with_developer_message(e.to_string())
            })?;

        Ok(json!({
            "confirmation": {
                "addedLabels": to_add,
                "removedLabels": to_remove,
            }
        }))
    }
}

pub struct ListLabels {
    client: Arc<GmailClient>,
}

#[async_trait]
impl Tool for ListLabels {
    fn name(&self) -> &str {
        "ListLabels"
    }

    fn description(&self) -> &str {
        "List all the labels in the user's mailbox."
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("A list of label details")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(READONLY_SCOPE)
    }

    async fn execute(&self, context: &ToolContext, _args: ToolArgs) -> Result<Value, ToolError> {
        let labels = self.client.list_labels(context).await?;
        Ok(json!({"labels": labels}))
    }
}

pub struct CreateLabel {
    client: Arc<GmailClient>,
}

#[async_trait]
impl Tool for CreateLabel {
    fn name(&self) -> &str {
        "CreateLabel"
    }

    fn description(&self) -> &str {
        "Create a new label in the user's mailbox."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![Param::of::<String>("label_name", "The name of the label to create")]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The details of the created label")
    }

    fn requirements(&self) -> ToolRequirements {
        requires(LABELS_SCOPE)
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let name = args.get_string("label_name")?;
        let label = self
            .client
            .post(context, "labels", &json!({"name": name}))
            .await?;
        Ok(json!({"label": label}))
    }
}

pub fn toolkit() -> Toolkit {
    toolkit_with_client(GmailClient::new())
}

pub fn toolkit_with_client(client: GmailClient) -> Toolkit {
    let client = Arc::new(client);
    macro_rules! with_client {
        ($kit:expr, $($tool:ident),+ $(,)?) => {
            $kit$(.tool($tool { client: Arc::clone(&client) }))+
        };
    }
    with_client!(
        Toolkit::new(TOOLKIT_NAME, env!("CARGO_PKG_VERSION"))
            .description("Send, draft, search and organize Gmail email."),
        SendEmail,
        SendDraftEmail,
        ReplyToEmail,
        WriteDraftEmail,
        WriteDraftReplyEmail,
        UpdateDraftEmail,
        DeleteDraftEmail,
        TrashEmail,
        ListDraftEmails,
        ListEmailsByHeader,
        ListEmails,
        SearchThreads,
        ListThreads,
        GetThread,
        ChangeEmailLabels,
        ListLabels,
        CreateLabel,
    )
}
