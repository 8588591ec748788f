//! Building raw RFC 822 messages and reading Gmail message payloads.

use std::collections::HashMap;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, PAD, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde_json::{json, Value};
use tracing::debug;

/// Gmail emits URL-safe base64 with and without padding.
const GMAIL_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub const MAIL_URL: &str = "https://mail.google.com/mail/u/0";

pub fn sent_url(id: &str) -> String {
    format!("{}/#sent/{}", MAIL_URL, id)
}

pub fn draft_url(id: &str) -> String {
    format!("{}/#drafts/{}", MAIL_URL, id)
}

pub fn trash_url(id: &str) -> String {
    format!("{}/#trash/{}", MAIL_URL, id)
}

/// A plain-text message ready to be encoded for the Gmail API.
#[derive(Debug, Clone, Default)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub in_reply_to: Option<String>,
    pub references: Option<String>,
}

impl OutgoingEmail {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_cc(mut self, cc: Vec<String>) -> Self {
        self.cc = cc;
        self
    }

    pub fn with_bcc(mut self, bcc: Vec<String>) -> Self {
        self.bcc = bcc;
        self
    }

    /// The MIME text of the message.
    pub fn to_mime(&self) -> String {
        let mut headers = vec![
            ("To", self.to.clone()),
            ("Subject", encode_header(&self.subject)),
        ];
        if !self.cc.is_empty() {
            headers.push(("Cc", self.cc.join(", ")));
        }
        if !self.bcc.is_empty() {
            headers.push(("Bcc", self.bcc.join(", ")));
        }
        if let Some(id) = &self.in_reply_to {
            headers.push(("In-Reply-To", id.clone()));
        }
        if let Some(references) = &self.references {
            headers.push(("References", references.clone()));
        }
        headers.push(("MIME-Version", "1.0".to_string()));
        headers.push(("Content-Type", "text/plain; charset=\"utf-8\"".to_string()));
        headers.push(("Content-Transfer-Encoding", "8bit".to_string()));

        let mut mime: String = headers
            .iter()
            .map(|(name, value)| format!("{}: {}\r\n", name, value))
            .collect();
        mime.push_str("\r\n");
        mime.push_str(&self.body.replace("\r\n", "\n").replace('\n', "\r\n"));
        mime
    }

    /// URL-safe base64 of the MIME text, as the `raw` field expects.
    pub fn to_raw(&self) -> String {
        GMAIL_BASE64.encode(self.to_mime())
    }
}

/// RFC 2047 encoded-word for non-ASCII header values.
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value))
    }
}

pub fn decode_base64(data: &str) -> Option<String> {
    let bytes = GMAIL_BASE64.decode(data.trim()).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Lowercased header names to values.
pub fn headers(payload: &Value) -> HashMap<String, String> {
    payload["headers"]
        .as_array()
        .map(|headers| {
            headers
                .iter()
                .filter_map(|h| {
                    Some((
                        h["name"].as_str()?.to_lowercase(),
                        h["value"].as_str()?.to_string(),
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn part_data(part: &Value) -> Option<String> {
    part["body"]["data"]
        .as_str()
        .filter(|data| !data.is_empty())
        .and_then(decode_base64)
}

fn find_part(parts: &[Value], mime_type: &str) -> Option<String> {
    for part in parts {
        let kind = part["mimeType"].as_str().unwrap_or_default();
        if kind == mime_type {
            if let Some(data) = part_data(part) {
                return Some(data);
            }
        } else if kind.starts_with("multipart/") {
            let nested = part["parts"].as_array().map(Vec::as_slice).unwrap_or_default();
            if let Some(data) = find_part(nested, mime_type) {
                return Some(data);
            }
        }
    }
    None
}

fn parts(payload: &Value) -> &[Value] {
    payload["parts"].as_array().map(Vec::as_slice).unwrap_or_default()
}

/// Collapse whitespace and strip markup.
pub fn clean_body(body: &str) -> String {
    let looks_like_html = body.contains('<') && body.contains('>');
    let text = if looks_like_html {
        html2text::from_read(body.as_bytes(), 80).unwrap_or_else(|e| {
            debug!("Keeping email body as-is, HTML parsing failed: {}", e);
            body.to_string()
        })
    } else {
        body.to_string()
    };
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Plain-text body: the payload body itself, a `text/plain` part, or the
/// `text/html` part with markup removed.
pub fn plain_text_body(payload: &Value) -> String {
    if let Some(data) = part_data(payload) {
        return clean_body(&data);
    }
    let parts = parts(payload);
    find_part(parts, "text/plain")
        .or_else(|| find_part(parts, "text/html"))
        .map(|body| clean_body(&body))
        .unwrap_or_default()
}

pub fn html_body(payload: &Value) -> String {
    part_data(payload)
        .or_else(|| find_part(parts(payload), "text/html"))
        .unwrap_or_default()
}

/// Summary of a message with its plain-text body.
pub fn parse_email(message: &Value) -> Value {
    let payload = &message["payload"];
    let headers = headers(payload);
    let header = |name: &str| headers.get(name).cloned().unwrap_or_default();

    json!({
        "id": message["id"].as_str().unwrap_or_default(),
        "thread_id": message["threadId"].as_str().unwrap_or_default(),
        "label_ids": message.get("labelIds").cloned().unwrap_or_else(|| json!([])),
        "history_id": message["historyId"].as_str().unwrap_or_default(),
        "snippet": message["snippet"].as_str().unwrap_or_default(),
        "to": header("to"),
        "cc": header("cc"),
        "from": header("from"),
        "reply_to": header("reply-to"),
        "in_reply_to": header("in-reply-to"),
        "references": header("references"),
        "header_message_id": header("message-id"),
        "date": header("date"),
        "subject": header("subject"),
        "body": plain_text_body(payload),
    })
}

pub fn parse_draft(draft: &Value) -> Value {
    let message = &draft["message"];
    let payload = &message["payload"];
    let headers = headers(payload);
    let header = |name: &str| headers.get(name).cloned().unwrap_or_default();

    json!({
        "id": draft["id"].as_str().unwrap_or_default(),
        "thread_id": message["threadId"].as_str().unwrap_or_default(),
        "to": header("to"),
        "from": header("from"),
        "date": header("date"),
        "subject": header("subject"),
        "body": plain_text_body(payload),
    })
}

/// Split an address list on commas outside quotes and angle brackets.
pub fn split_addresses(list: &str) -> Vec<String> {
    let mut addresses = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut in_angle = false;
    for c in list.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => in_angle = true,
            '>' if !in_quotes => in_angle = false,
            ',' if !in_quotes && !in_angle => {
                addresses.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    addresses.push(current.trim().to_string());
    addresses.retain(|a| !a.is_empty());
    addresses
}

/// The bare address from `"Name" <user@example.com>` or `user@example.com`.
pub fn bare_address(address: &str) -> String {
    match (address.rfind('<'), address.rfind('>')) {
        (Some(start), Some(end)) if start < end => address[start + 1..end].trim().to_lowercase(),
        _ => address.trim().to_lowercase(),
    }
}

/// What a reply needs from the message being answered.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyContext {
    pub thread_id: String,
    pub subject: String,
    pub recipients: String,
    pub cc: Vec<String>,
    pub in_reply_to: Option<String>,
    pub references: Option<String>,
}

impl ReplyContext {
    /// Reply to the sender (or `Reply-To`) and the other `To` recipients,
    /// leaving out the current user. `Cc` carries over unchanged.
    pub fn from_message(message: &Value, current_user: &str) -> Self {
        let headers = headers(&message["payload"]);
        let header = |name: &str| headers.get(name).cloned().unwrap_or_default();
        let me = bare_address(current_user);

        let sender = Some(header("reply-to"))
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| header("from"));

        let mut recipients: Vec<String> = Vec::new();
        for address in split_addresses(&sender)
            .into_iter()
            .chain(split_addresses(&header("to")))
        {
            let bare = bare_address(&address);
            if bare == me || recipients.iter().any(|r| bare_address(r) == bare) {
                continue;
            }
            recipients.push(address);
        }

        let subject = header("subject");
        let subject = if subject.to_lowercase().starts_with("re:") {
            subject
        } else {
            format!("Re: {}", subject)
        };

        let message_id = Some(header("message-id")).filter(|id| !id.is_empty());
        let references = match (header("references"), &message_id) {
            (refs, Some(id)) if !refs.is_empty() => Some(format!("{} {}", refs, id)),
            (_, Some(id)) => Some(id.clone()),
            (refs, None) => Some(refs).filter(|r| !r.is_empty()),
        };

        Self {
            thread_id: message["threadId"].as_str().unwrap_or_default().to_string(),
            subject,
            recipients: recipients.join(", "),
            cc: split_addresses(&header("cc")),
            in_reply_to: message_id,
            references,
        }
    }

    pub fn email(&self, body: impl Into<String>, bcc: Vec<String>) -> OutgoingEmail {
        OutgoingEmail {
            to: self.recipients.clone(),
            subject: self.subject.clone(),
            body: body.into(),
            cc: self.cc.clone(),
            bcc,
            in_reply_to: self.in_reply_to.clone(),
            references: self.references.clone(),
        }
    }
}
