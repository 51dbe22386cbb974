use anyhow::Result;

use crate::core::config::AppConfig;
use crate::google::gcal::GoogleCalendar;
use crate::schedule::{TimeInterval, check_availability, parse_timestamp};

pub async fn run(start: String, end: Option<String>, duration: Option<i64>) -> Result<()> {
    let config = AppConfig::default();

    let start = parse_timestamp(&start, Some(config.timezone))?;
    let interval = match end {
        Some(end) => TimeInterval::new(start, parse_timestamp(&end, Some(config.timezone))?)?,
        None => {
            TimeInterval::starting_at(start, duration.unwrap_or(config.default_duration_minutes))?
        }
    };

    let calendar = GoogleCalendar::connect(
        &config.gmail_api_client_id,
        &config.gmail_api_client_secret,
        &config.token_path,
    )
    .await?;
    let result = check_availability(&calendar, &config.calendar_id, interval).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
