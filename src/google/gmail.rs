//! Gmail API client: unread listing, thread fetch, label management,
//! and reply drafts. Also the text-cleaning pipeline that turns the
//! API's messy payloads into something an LLM can read.

use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use chrono::{Duration, Utc};
use htmd::HtmlToMarkdown;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MessageRef {
    pub id: String,
    #[serde(rename = "threadId")]
    pub thread_id: String,
}

#[derive(Debug, Deserialize)]
struct ListMessagesResponse {
    messages: Option<Vec<MessageRef>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(rename = "threadId")]
    pub thread_id: String,
    pub snippet: Option<String>,
    pub payload: Option<MessagePayload>,
    #[serde(rename = "labelIds")]
    pub label_ids: Option<Vec<String>>,
    #[serde(rename = "internalDate")]
    pub internal_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    pub headers: Option<Vec<MessageHeader>>,
    #[serde(rename = "mimeType")]
    pub mimetype: String,
    pub body: Option<MessagePartBody>,
    pub parts: Option<Vec<MessagePart>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePart {
    #[serde(rename = "mimeType")]
    pub mimetype: String,
    pub body: Option<MessagePartBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePartBody {
    #[serde(rename = "attachmentId")]
    pub attachment_id: Option<String>,
    // Base64url encoded
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ListLabelsResponse {
    labels: Vec<Label>,
}

#[derive(Debug, Deserialize)]
pub struct Draft {
    pub id: String,
}

/// Authenticated Gmail client. The API base is swappable so tests can
/// point it at a local mock server.
pub struct Gmail {
    access_token: String,
    base_url: String,
    client: Client,
}

impl Gmail {
    pub fn new(access_token: String) -> Self {
        Self::with_base_url(access_token, "https://gmail.googleapis.com".to_string())
    }

    pub fn with_base_url(access_token: String, base_url: String) -> Self {
        Self {
            access_token,
            base_url,
            client: Client::new(),
        }
    }

    /// List unread inbox messages received in the last `n_days`.
    pub async fn list_unread_messages(&self, n_days: i64) -> Result<Vec<MessageRef>, anyhow::Error> {
        let after_date = (Utc::now() - Duration::days(n_days))
            .format("%Y/%m/%d")
            .to_string();
        let url = format!(
            "{}/gmail/v1/users/me/messages?labelIds=UNREAD&q=is:unread%20after:{}%20in:inbox",
            self.base_url, after_date
        );
        let text = self.get(&url, "Unread fetch").await?;
        let msgs: ListMessagesResponse = serde_json::from_str(&text)?;
        Ok(msgs.messages.unwrap_or_default())
    }

    /// Fetch the full thread for a given thread ID.
    pub async fn fetch_thread(&self, thread_id: &str) -> Result<Thread, anyhow::Error> {
        let url = format!(
            "{}/gmail/v1/users/me/threads/{}?format=full",
            self.base_url, thread_id
        );
        let text = self.get(&url, "Thread fetch").await?;
        let thread: Thread = serde_json::from_str(&text)?;
        Ok(thread)
    }

    pub async fn list_labels(&self) -> Result<Vec<Label>, anyhow::Error> {
        let url = format!("{}/gmail/v1/users/me/labels", self.base_url);
        let text = self.get(&url, "Label list").await?;
        let labels: ListLabelsResponse = serde_json::from_str(&text)?;
        Ok(labels.labels)
    }

    pub async fn create_label(&self, name: &str) -> Result<Label, anyhow::Error> {
        let url = format!("{}/gmail/v1/users/me/labels", self.base_url);
        let body = serde_json::json!({
            "name": name,
            "labelListVisibility": "labelShow",
            "messageListVisibility": "show",
        });
        let text = self.post(&url, &body, "Label create").await?;
        let label: Label = serde_json::from_str(&text)?;
        Ok(label)
    }

    /// Return the ID for a label name, creating the label if it does
    /// not exist yet.
    pub async fn ensure_label(&self, name: &str) -> Result<Label, anyhow::Error> {
        let existing = self.list_labels().await?;
        if let Some(label) = existing.into_iter().find(|l| l.name == name) {
            return Ok(label);
        }
        tracing::info!("Creating missing Gmail label: {}", name);
        self.create_label(name).await
    }

    /// Add and remove label IDs on every message in a thread.
    pub async fn modify_thread_labels(
        &self,
        thread_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<(), anyhow::Error> {
        let url = format!(
            "{}/gmail/v1/users/me/threads/{}/modify",
            self.base_url, thread_id
        );
        let body = serde_json::json!({
            "addLabelIds": add_label_ids,
            "removeLabelIds": remove_label_ids,
        });
        self.post(&url, &body, "Label modify").await?;
        Ok(())
    }

    /// Create a reply draft attached to an existing thread. The draft
    /// is never sent; it waits for human review in the Gmail UI.
    pub async fn create_reply_draft(
        &self,
        thread_id: &str,
        to: &str,
        subject: &str,
        body_text: &str,
    ) -> Result<Draft, anyhow::Error> {
        let subject = if subject.to_lowercase().starts_with("re:") {
            subject.to_string()
        } else {
            format!("Re: {}", subject)
        };
        let raw = format!(
            "To: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\n\r\n{}",
            to, subject, body_text
        );
        let url = format!("{}/gmail/v1/users/me/drafts", self.base_url);
        let body = serde_json::json!({
            "message": {
                "threadId": thread_id,
                "raw": URL_SAFE.encode(raw.as_bytes()),
            }
        });
        let text = self.post(&url, &body, "Draft create").await?;
        let draft: Draft = serde_json::from_str(&text)?;
        Ok(draft)
    }

    async fn get(&self, url: &str, what: &str) -> Result<String, anyhow::Error> {
        let res = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("{} failed: {} ({})", what, status, text);
        }
        Ok(text)
    }

    async fn post(
        &self,
        url: &str,
        body: &serde_json::Value,
        what: &str,
    ) -> Result<String, anyhow::Error> {
        let res = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("{} failed: {} ({})", what, status, text);
        }
        Ok(text)
    }
}

/// Look up a header by name (case-insensitive) and clean its value.
pub fn header(message: &Message, name: &str) -> String {
    message
        .payload
        .as_ref()
        .and_then(|p| p.headers.as_ref())
        .and_then(|headers| {
            headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case(name))
                .map(|h| clean_text(&h.value))
        })
        .unwrap_or_default()
}

/// Extract a readable body from a message payload.
///
/// The body lives either in `payload.body.data` or in one of
/// `payload.parts[]`; plain text parts win over HTML. HTML is
/// converted to markdown. Falls back to the snippet when no part
/// carries data, which happens for some threads.
pub fn extract_body(message: &Message) -> String {
    if let Some(payload) = &message.payload {
        if let Some(data) = payload.body.as_ref().and_then(|b| b.data.as_deref()) {
            return render_part(&payload.mimetype, data);
        }

        if let Some(parts) = &payload.parts {
            for wanted in ["text/plain", "text/html"] {
                for part in parts {
                    let Some(body) = &part.body else { continue };
                    if body.attachment_id.is_some() {
                        continue;
                    }
                    if part.mimetype == wanted
                        && let Some(data) = body.data.as_deref()
                        && !data.is_empty()
                    {
                        return render_part(&part.mimetype, data);
                    }
                }
            }
        }
    }

    if let Some(snippet) = &message.snippet {
        return strip_reply_noise(&clean_text(snippet));
    }

    tracing::warn!(
        "Body was empty for message {} in thread {}",
        message.id,
        message.thread_id
    );
    String::new()
}

fn render_part(mimetype: &str, data: &str) -> String {
    let decoded = decode_base64(data);
    if mimetype == "text/html" {
        let converter = HtmlToMarkdown::builder()
            .skip_tags(vec!["script", "style", "footer", "img", "svg"])
            .build();
        return converter.convert(&decoded).unwrap_or(decoded);
    }
    strip_reply_noise(&clean_text(&decoded))
}

fn decode_base64(data: &str) -> String {
    URL_SAFE
        .decode(data)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| {
            tracing::error!("Base64 decode failed for message part");
            String::new()
        })
}

/// Decode quoted-printable sequences, HTML entities, and escaped
/// unicode; normalize smart quotes.
fn clean_text(content: &str) -> String {
    let mut content = decode_quoted_printable(content);
    content = decode_entities(&content);

    let escape_re = Regex::new(r"\\u([0-9a-fA-F]{4})").unwrap();
    content = escape_re
        .replace_all(&content, |caps: &regex::Captures| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(|c| c.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .to_string();

    content
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201c}', '\u{201d}'], "\"")
}

fn decode_quoted_printable(input: &str) -> String {
    let mut bytes = Vec::with_capacity(input.len());
    let raw = input.as_bytes();
    let mut i = 0;

    while i < raw.len() {
        if raw[i] == b'=' && i + 1 < raw.len() {
            // Soft line breaks disappear entirely
            if raw[i + 1] == b'\n' {
                i += 2;
                continue;
            }
            if raw[i + 1] == b'\r' && i + 2 < raw.len() && raw[i + 2] == b'\n' {
                i += 3;
                continue;
            }
            if i + 2 < raw.len()
                && let Ok(hex) = std::str::from_utf8(&raw[i + 1..=i + 2])
                && let Ok(byte) = u8::from_str_radix(hex, 16)
            {
                bytes.push(byte);
                i += 3;
                continue;
            }
        }
        bytes.push(raw[i]);
        i += 1;
    }

    String::from_utf8_lossy(&bytes).to_string()
}

fn decode_entities(input: &str) -> String {
    let mut result = input
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ");

    let numeric = Regex::new(r"&#(?:(\d+)|x([0-9a-fA-F]+));").unwrap();
    result = numeric
        .replace_all(&result, |caps: &regex::Captures| {
            let codepoint = match (caps.get(1), caps.get(2)) {
                (Some(dec), _) => dec.as_str().parse::<u32>().ok(),
                (_, Some(hex)) => u32::from_str_radix(hex.as_str(), 16).ok(),
                _ => None,
            };
            codepoint
                .and_then(char::from_u32)
                .map(|c| c.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .to_string();

    result
}

/// Drop quoted reply history and trailing signatures so the LLM only
/// sees the new content of each message.
fn strip_reply_noise(content: &str) -> String {
    let quote_header = Regex::new(
        r"(?is)(?:\r?\n){2,}On (?:Mon|Tue|Wed|Thu|Fri|Sat|Sun),? .+? wrote:\r?\n",
    )
    .unwrap();
    let mut result = if let Some(m) = quote_header.find(content) {
        content[..m.start()].to_string()
    } else {
        content
            .lines()
            .filter(|line| !line.trim_start().starts_with('>'))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let signature = Regex::new(
        r"(?is)(?:^|\n)\s*(?:--\s*\n|---+\s*\n).*$|(?is)\n\n\s*(?:Regards|Best regards,?|Kind regards,?|Thanks,?|Thank you,?|Sincerely,?|Cheers,?|Best,?|Sent from my (?:iPhone|iPad|Android)).*$",
    )
    .unwrap();
    if let Some(m) = signature.find(&result) {
        result.truncate(m.start());
    }

    result.trim_end().to_string()
}
