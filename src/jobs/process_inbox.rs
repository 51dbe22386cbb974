//! Inbox triage: classify unread threads, apply workflow labels, and
//! draft replies for actionable ones. Runs on a timer when the server
//! is up and on demand from the CLI.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

use super::PeriodicJob;
use crate::ai::classify::classify_thread;
use crate::ai::draft::draft_reply;
use crate::ai::interpret::LlmConfig;
use crate::ai::render_thread;
use crate::core::config::{AppConfig, HISTORY_LABEL, WORKFLOW_LABELS};
use crate::google::gcal::GoogleCalendar;
use crate::google::gmail::{Gmail, Thread, extract_body, header};
use crate::google::oauth::{load_token, refresh_access_token};

#[derive(Debug, Default, Serialize)]
pub struct TriageSummary {
    pub scanned: usize,
    pub labeled: usize,
    pub drafted: usize,
    pub skipped: usize,
}

enum Outcome {
    AlreadyTriaged,
    Labeled { label: String, drafted: bool },
}

#[derive(Default, Debug)]
pub struct ProcessInbox;

#[async_trait]
impl PeriodicJob for ProcessInbox {
    fn interval(&self) -> Duration {
        Duration::from_secs(60 * 10)
    }

    async fn run_job(&self, config: &AppConfig) {
        match triage_once(config).await {
            Ok(summary) => tracing::info!(
                "Inbox triage done: {} scanned, {} labeled, {} drafted, {} skipped",
                summary.scanned,
                summary.labeled,
                summary.drafted,
                summary.skipped
            ),
            Err(err) => tracing::error!("Inbox triage failed: {:#}", err),
        }
    }
}

/// Run one full triage pass against the live Gmail and Calendar APIs.
pub async fn triage_once(config: &AppConfig) -> Result<TriageSummary> {
    let token = load_token(&config.token_path)?;
    let access = refresh_access_token(
        &config.gmail_api_client_id,
        &config.gmail_api_client_secret,
        &token.refresh_token,
    )
    .await?;
    let gmail = Gmail::new(access.access_token);

    // Classification still runs if the calendar is down; only reply
    // drafting needs it.
    let calendar = match GoogleCalendar::connect(
        &config.gmail_api_client_id,
        &config.gmail_api_client_secret,
        &config.token_path,
    )
    .await
    {
        Ok(calendar) => Some(calendar),
        Err(err) => {
            tracing::warn!("Calendar unavailable, skipping reply drafts: {}", err);
            None
        }
    };

    triage_with(&gmail, calendar.as_ref(), config).await
}

/// Triage pass against an already connected client pair. Split out so
/// tests can point both clients at a mock server.
pub async fn triage_with(
    gmail: &Gmail,
    calendar: Option<&GoogleCalendar>,
    config: &AppConfig,
) -> Result<TriageSummary> {
    let labels = ensure_workflow_labels(gmail).await?;
    let history_id = labels
        .get(HISTORY_LABEL)
        .context("History label missing after ensure")?
        .clone();

    let refs = gmail.list_unread_messages(config.history_days).await?;
    let mut thread_ids: Vec<String> = Vec::new();
    for msg in refs {
        if !thread_ids.contains(&msg.thread_id) {
            thread_ids.push(msg.thread_id);
        }
    }

    let mut summary = TriageSummary::default();
    for thread_id in thread_ids {
        summary.scanned += 1;
        match triage_thread(gmail, calendar, config, &labels, &history_id, &thread_id).await {
            Ok(Outcome::AlreadyTriaged) => {
                tracing::debug!("Thread {} already triaged", thread_id);
                summary.skipped += 1;
            }
            Ok(Outcome::Labeled { label, drafted }) => {
                tracing::info!("Thread {} labeled {} (draft: {})", thread_id, label, drafted);
                summary.labeled += 1;
                if drafted {
                    summary.drafted += 1;
                }
            }
            // One bad thread never stops the pass.
            Err(err) => {
                tracing::error!("Triage of thread {} failed: {:#}", thread_id, err);
                summary.skipped += 1;
            }
        }
    }
    Ok(summary)
}

/// Make sure every workflow label and the history marker exist,
/// returning a name to ID map.
async fn ensure_workflow_labels(gmail: &Gmail) -> Result<HashMap<String, String>> {
    let mut ids = HashMap::new();
    for name in WORKFLOW_LABELS.iter().chain(std::iter::once(&HISTORY_LABEL)) {
        let label = gmail.ensure_label(name).await?;
        ids.insert(label.name, label.id);
    }
    Ok(ids)
}

async fn triage_thread(
    gmail: &Gmail,
    calendar: Option<&GoogleCalendar>,
    config: &AppConfig,
    labels: &HashMap<String, String>,
    history_id: &str,
    thread_id: &str,
) -> Result<Outcome> {
    let thread = gmail.fetch_thread(thread_id).await?;
    if is_triaged(&thread, history_id) {
        return Ok(Outcome::AlreadyTriaged);
    }

    let content = render_thread(&thread)?;
    let llm = LlmConfig {
        api_hostname: &config.openai_api_hostname,
        api_key: &config.openai_api_key,
        model: &config.openai_model,
    };
    let label = classify_thread(&content, &llm).await?;
    let label_id = labels
        .get(&label)
        .with_context(|| format!("No Gmail label ID for {}", label))?;

    gmail
        .modify_thread_labels(
            thread_id,
            &[label_id.clone(), history_id.to_string()],
            &[],
        )
        .await?;

    let mut drafted = false;
    if label == "To Do"
        && let Some(calendar) = calendar
    {
        drafted = draft_thread_reply(gmail, calendar, config, &thread, &content).await?;
    }

    Ok(Outcome::Labeled { label, drafted })
}

/// A thread is triaged once any of its messages carries the history
/// marker label.
fn is_triaged(thread: &Thread, history_id: &str) -> bool {
    thread.messages.iter().any(|m| {
        m.label_ids
            .as_ref()
            .is_some_and(|ids| ids.iter().any(|id| id == history_id))
    })
}

async fn draft_thread_reply(
    gmail: &Gmail,
    calendar: &GoogleCalendar,
    config: &AppConfig,
    thread: &Thread,
    content: &str,
) -> Result<bool> {
    let Some(latest) = thread.messages.last() else {
        return Ok(false);
    };
    let to = header(latest, "From");
    if to.is_empty() {
        tracing::warn!("Thread {} has no sender to reply to", thread.id);
        return Ok(false);
    }
    let subject = thread
        .messages
        .first()
        .map(|m| header(m, "Subject"))
        .unwrap_or_default();

    let now = Utc::now().fixed_offset();
    let body = draft_reply(
        calendar,
        content,
        &extract_body(latest),
        config,
        &config.api_base_url,
        now,
    )
    .await?;
    gmail
        .create_reply_draft(&thread.id, &to, &subject, &body)
        .await?;
    Ok(true)
}
