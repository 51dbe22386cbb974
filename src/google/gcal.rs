//! Google Calendar event source backing the scheduling core.
//!
//! Connection is an explicit step: [`GoogleCalendar::connect`] refreshes
//! an access token from the stored credential and fails loudly if it
//! cannot. No global client, no lazy init.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;

use crate::google::oauth::{load_token, refresh_access_token};
use crate::schedule::{CalendarEvent, CalendarEvents, ResponseStatus, ScheduleError};

#[derive(Debug, Deserialize)]
struct EventsResponse {
    items: Option<Vec<WireEvent>>,
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    summary: Option<String>,
    start: Option<WireTime>,
    end: Option<WireTime>,
    attendees: Option<Vec<WireAttendee>>,
}

/// Either `dateTime` (timed event) or `date` (all-day) is set, never
/// both.
#[derive(Debug, Deserialize)]
struct WireTime {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireAttendee {
    #[serde(rename = "self")]
    is_self: Option<bool>,
    #[serde(rename = "responseStatus")]
    response_status: Option<ResponseStatus>,
}

pub struct GoogleCalendar {
    access_token: String,
    api_base: String,
    client: reqwest::Client,
}

impl GoogleCalendar {
    /// Refresh an access token from the stored credential and return a
    /// ready client. Every failure along the way surfaces as
    /// [`ScheduleError::CalendarUnavailable`].
    pub async fn connect(
        client_id: &str,
        client_secret: &str,
        token_path: &Path,
    ) -> Result<Self, ScheduleError> {
        let stored = load_token(token_path)
            .map_err(|e| ScheduleError::CalendarUnavailable(e.to_string()))?;
        let token = refresh_access_token(client_id, client_secret, &stored.refresh_token)
            .await
            .map_err(|e| ScheduleError::CalendarUnavailable(e.to_string()))?;
        Ok(Self::with_base_url(
            token.access_token,
            "https://www.googleapis.com".to_string(),
        ))
    }

    pub fn with_base_url(access_token: String, api_base: String) -> Self {
        Self {
            access_token,
            api_base,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CalendarEvents for GoogleCalendar {
    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<FixedOffset>,
        time_max: DateTime<FixedOffset>,
    ) -> Result<Vec<CalendarEvent>, ScheduleError> {
        let url = format!(
            "{}/calendar/v3/calendars/{}/events?timeMin={}&timeMax={}&singleEvents=true&orderBy=startTime",
            self.api_base,
            urlencoding::encode(calendar_id),
            urlencoding::encode(&time_min.to_rfc3339()),
            urlencoding::encode(&time_max.to_rfc3339()),
        );

        let res = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| ScheduleError::CalendarUnavailable(e.to_string()))?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ScheduleError::CalendarUnavailable(format!(
                "Event fetch failed: {} ({})",
                status, text
            )));
        }

        let parsed: EventsResponse = serde_json::from_str(&text)
            .map_err(|e| ScheduleError::CalendarUnavailable(format!("Malformed events: {}", e)))?;

        Ok(parsed
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(map_event)
            .collect())
    }
}

/// Map one wire event to the core representation. Events with
/// unparseable times are dropped with a warning rather than failing
/// the whole fetch.
fn map_event(wire: WireEvent) -> Option<CalendarEvent> {
    let title = wire.summary.unwrap_or_else(|| "(no title)".to_string());
    let start = wire.start?;
    let end = wire.end?;

    let response_status = wire
        .attendees
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find(|a| a.is_self == Some(true))
        .and_then(|a| a.response_status)
        // Events without an attendee list are the owner's own, which
        // count as accepted.
        .unwrap_or(ResponseStatus::Accepted);

    let is_all_day = start.date_time.is_none();
    let (start, end) = if is_all_day {
        (midnight_utc(start.date.as_deref()?)?, midnight_utc(end.date.as_deref()?)?)
    } else {
        (
            parse_rfc3339(&title, start.date_time.as_deref()?)?,
            parse_rfc3339(&title, end.date_time.as_deref()?)?,
        )
    };

    Some(CalendarEvent {
        title,
        start,
        end,
        is_all_day,
        response_status,
    })
}

fn parse_rfc3339(title: &str, s: &str) -> Option<DateTime<FixedOffset>> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Some(dt),
        Err(e) => {
            tracing::warn!("Skipping event '{}' with bad timestamp {}: {}", title, s, e);
            None
        }
    }
}

/// All-day events carry only a date. They are filtered out of busy
/// time anyway, so a midnight UTC placeholder is enough to keep the
/// event representable.
fn midnight_utc(date: &str) -> Option<DateTime<FixedOffset>> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some(
        date.and_hms_opt(0, 0, 0)?
            .and_utc()
            .fixed_offset(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn window() -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
        (
            DateTime::parse_from_rfc3339("2025-03-10T00:00:00+00:00").unwrap(),
            DateTime::parse_from_rfc3339("2025-03-11T00:00:00+00:00").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_list_events_maps_wire_shapes() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Regex(r"^/calendar/v3/calendars/primary/events".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "items": [
                        {
                            "summary": "Design review",
                            "start": {"dateTime": "2025-03-10T14:00:00+05:30"},
                            "end": {"dateTime": "2025-03-10T15:00:00+05:30"},
                            "attendees": [
                                {"email": "other@example.com", "responseStatus": "accepted"},
                                {"self": true, "responseStatus": "declined"}
                            ]
                        },
                        {
                            "summary": "Company offsite",
                            "start": {"date": "2025-03-10"},
                            "end": {"date": "2025-03-11"}
                        }
                    ]
                }"#,
            )
            .create_async()
            .await;

        let calendar = GoogleCalendar::with_base_url("test_token".to_string(), server.url());
        let (time_min, time_max) = window();
        let events = calendar
            .list_events("primary", time_min, time_max)
            .await
            .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "Design review");
        assert_eq!(events[0].response_status, ResponseStatus::Declined);
        assert!(!events[0].is_all_day);
        assert_eq!(
            events[0].start,
            DateTime::parse_from_rfc3339("2025-03-10T14:00:00+05:30").unwrap()
        );
        assert!(events[1].is_all_day);
        assert_eq!(events[1].response_status, ResponseStatus::Accepted);
    }

    #[tokio::test]
    async fn test_http_error_becomes_calendar_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Regex(r"^/calendar/v3/".to_string()))
            .with_status(503)
            .with_body("backend unavailable")
            .create_async()
            .await;

        let calendar = GoogleCalendar::with_base_url("test_token".to_string(), server.url());
        let (time_min, time_max) = window();
        let result = calendar.list_events("primary", time_min, time_max).await;

        assert!(matches!(
            result,
            Err(ScheduleError::CalendarUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_becomes_calendar_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Regex(r"^/calendar/v3/".to_string()))
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let calendar = GoogleCalendar::with_base_url("test_token".to_string(), server.url());
        let (time_min, time_max) = window();
        let result = calendar.list_events("primary", time_min, time_max).await;

        assert!(matches!(
            result,
            Err(ScheduleError::CalendarUnavailable(_))
        ));
    }

    #[test]
    fn test_event_with_bad_timestamp_is_dropped() {
        let wire = WireEvent {
            summary: Some("broken".to_string()),
            start: Some(WireTime {
                date_time: Some("not a time".to_string()),
                date: None,
            }),
            end: Some(WireTime {
                date_time: Some("2025-03-10T15:00:00+00:00".to_string()),
                date: None,
            }),
            attendees: None,
        };
        assert!(map_event(wire).is_none());
    }

    #[test]
    fn test_untitled_event_gets_placeholder() {
        let wire = WireEvent {
            summary: None,
            start: Some(WireTime {
                date_time: Some("2025-03-10T14:00:00+00:00".to_string()),
                date: None,
            }),
            end: Some(WireTime {
                date_time: Some("2025-03-10T15:00:00+00:00".to_string()),
                date: None,
            }),
            attendees: None,
        };
        assert_eq!(map_event(wire).unwrap().title, "(no title)");
    }

    #[test]
    fn test_unknown_response_status_defaults_to_none() {
        let attendee: WireAttendee =
            serde_json::from_str(r#"{"self": true, "responseStatus": "delegated"}"#).unwrap();
        assert_eq!(attendee.response_status, Some(ResponseStatus::None));
    }
}
