//! Thread classification into workflow labels.

use anyhow::Result;
use serde_json::json;

use crate::ai::interpret::LlmConfig;
use crate::ai::prompt::{Prompt, templates};
use crate::core::config::WORKFLOW_LABELS;
use crate::openai::core::{Message, Role, completion};

/// Classify a rendered email thread into one of the workflow labels.
///
/// The model is told to return a bare label name. Anything else is
/// normalized by [`validate_label`], so the caller always gets a label
/// that exists.
pub async fn classify_thread(thread_content: &str, llm: &LlmConfig<'_>) -> Result<String> {
    let registry = templates();
    let system = registry.render(&Prompt::ClassifyThread.to_string(), &json!({}))?;

    let messages = vec![
        Message::new(Role::System, &system),
        Message::new(Role::User, thread_content),
    ];
    let resp = completion(&messages, &None, llm.api_hostname, llm.api_key, llm.model).await?;

    let content = resp["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or_default();
    Ok(validate_label(content))
}

/// Match the model's answer against the known labels, tolerating case,
/// quotes, and surrounding chatter. Unrecognizable answers fall back
/// to FYI, the least disruptive label.
pub fn validate_label(raw: &str) -> String {
    let cleaned = raw.trim().trim_matches(['"', '`', '\'']).trim();

    for label in WORKFLOW_LABELS {
        if cleaned.eq_ignore_ascii_case(label) {
            return label.to_string();
        }
    }
    // A chatty response that still names exactly one label is salvageable.
    let mentioned: Vec<&str> = WORKFLOW_LABELS
        .iter()
        .filter(|label| cleaned.to_lowercase().contains(&label.to_lowercase()))
        .copied()
        .collect();
    if let [only] = mentioned[..] {
        return only.to_string();
    }

    tracing::warn!("Unrecognized classification '{}', defaulting to FYI", raw);
    "FYI".to_string()
}
