use anyhow::Result;

use crate::core::config::AppConfig;
use crate::jobs::process_inbox::triage_once;

pub async fn run() -> Result<()> {
    let config = AppConfig::default();
    let summary = triage_once(&config).await?;
    println!(
        "Triage done: {} scanned, {} labeled, {} drafted, {} skipped",
        summary.scanned, summary.labeled, summary.drafted, summary.skipped
    );
    Ok(())
}
