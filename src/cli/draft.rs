use anyhow::{Context, Result, bail};
use chrono::Utc;

use crate::ai::draft::draft_reply;
use crate::ai::render_thread;
use crate::core::config::AppConfig;
use crate::google::gcal::GoogleCalendar;
use crate::google::gmail::{Gmail, extract_body, header};
use crate::google::oauth::{load_token, refresh_access_token};

pub async fn run(thread_id: String) -> Result<()> {
    let config = AppConfig::default();

    let token = load_token(&config.token_path)?;
    let access = refresh_access_token(
        &config.gmail_api_client_id,
        &config.gmail_api_client_secret,
        &token.refresh_token,
    )
    .await?;
    let gmail = Gmail::new(access.access_token);
    let calendar = GoogleCalendar::connect(
        &config.gmail_api_client_id,
        &config.gmail_api_client_secret,
        &config.token_path,
    )
    .await?;

    let thread = gmail.fetch_thread(&thread_id).await?;
    let Some(latest) = thread.messages.last() else {
        bail!("Thread {} has no messages", thread_id);
    };
    let to = header(latest, "From");
    if to.is_empty() {
        bail!("Thread {} has no sender to reply to", thread_id);
    }
    let subject = thread
        .messages
        .first()
        .map(|m| header(m, "Subject"))
        .context("Thread has no messages")?;

    let content = render_thread(&thread)?;
    let now = Utc::now().fixed_offset();
    let body = draft_reply(
        &calendar,
        &content,
        &extract_body(latest),
        &config,
        &config.api_base_url,
        now,
    )
    .await?;

    let draft = gmail
        .create_reply_draft(&thread_id, &to, &subject, &body)
        .await?;
    println!("Created draft {} for thread {}:\n\n{}", draft.id, thread_id, body);
    Ok(())
}
