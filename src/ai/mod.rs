pub mod classify;
pub mod draft;
pub mod interpret;
pub mod prompt;
pub mod tools;

use anyhow::Result;
use serde_json::json;

use crate::google::gmail::{Thread, extract_body, header};
use prompt::{Prompt, templates};

/// Render a Gmail thread into the markdown form the prompts consume.
pub fn render_thread(thread: &Thread) -> Result<String> {
    let first = thread.messages.first();
    let subject = first.map(|m| header(m, "Subject")).unwrap_or_default();
    let from = first.map(|m| header(m, "From")).unwrap_or_default();
    let to = first.map(|m| header(m, "To")).unwrap_or_default();

    let messages: Vec<_> = thread
        .messages
        .iter()
        .map(|m| {
            json!({
                "from": header(m, "From"),
                "received": header(m, "Date"),
                "body": extract_body(m),
            })
        })
        .collect();

    let registry = templates();
    let rendered = registry.render(
        &Prompt::EmailThread.to_string(),
        &json!({
            "subject": subject,
            "from": from,
            "to": to,
            "messages": messages,
        }),
    )?;
    Ok(rendered)
}
