use anyhow::Result;
use chrono::Utc;

use crate::core::config::AppConfig;
use crate::google::gcal::GoogleCalendar;
use crate::schedule::{SlotQuery, find_free_slots};

pub async fn run(
    horizon_days: Option<i64>,
    duration: Option<i64>,
    max: Option<usize>,
    all_hours: bool,
) -> Result<()> {
    let config = AppConfig::default();

    let query = SlotQuery {
        horizon_days: horizon_days.unwrap_or(config.horizon_days),
        duration_minutes: duration.unwrap_or(config.default_duration_minutes),
        business_hours_only: !all_hours && config.business_hours_only,
        max_suggestions: max.unwrap_or(config.max_suggestions),
    };

    let calendar = GoogleCalendar::connect(
        &config.gmail_api_client_id,
        &config.gmail_api_client_secret,
        &config.token_path,
    )
    .await?;
    let now = Utc::now().fixed_offset();
    let slots =
        find_free_slots(&calendar, &config.calendar_id, &query, now, config.timezone).await?;

    if slots.is_empty() {
        println!("No free slots found in the search window.");
        return Ok(());
    }
    for slot in slots {
        println!(
            "{} from {} to {}",
            slot.day_of_week,
            slot.interval.start.to_rfc3339(),
            slot.interval.end.to_rfc3339()
        );
    }
    Ok(())
}
