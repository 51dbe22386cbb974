//! LLM interpretation of email text: is this a meeting request, and
//! which concrete times does it mention.
//!
//! Both calls use a JSON contract with the model. Malformed output
//! never aborts triage; it degrades to "not a meeting request" or an
//! empty time list with a warning.

use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::ai::prompt::{Prompt, templates};
use crate::openai::core::{Message, Role, completion};
use crate::schedule::parse_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    SpecificTimeSuggested,
    GeneralMeetingRequest,
    #[serde(other)]
    None,
}

#[derive(Debug, Deserialize)]
pub struct MeetingAnalysis {
    pub is_meeting_request: bool,
    pub request_type: RequestType,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub meeting_topic: String,
}

impl MeetingAnalysis {
    fn none() -> Self {
        Self {
            is_meeting_request: false,
            request_type: RequestType::None,
            confidence: 0.0,
            meeting_topic: String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireSuggestion {
    original_phrase: String,
    absolute_datetime: String,
    #[serde(default)]
    confidence: f64,
}

/// A concrete meeting time the sender proposed, resolved to an
/// offset-carrying instant in the configured zone.
#[derive(Debug, Clone, Serialize)]
pub struct TimeSuggestion {
    pub original_phrase: String,
    pub start: DateTime<FixedOffset>,
    pub confidence: f64,
}

pub struct LlmConfig<'a> {
    pub api_hostname: &'a str,
    pub api_key: &'a str,
    pub model: &'a str,
}

/// Classify an email as a meeting request (or not) and extract any
/// proposed times when it suggests a specific slot.
pub async fn analyze_meeting_request(
    email_content: &str,
    now: DateTime<FixedOffset>,
    tz: Tz,
    llm: &LlmConfig<'_>,
) -> Result<(MeetingAnalysis, Vec<TimeSuggestion>)> {
    let registry = templates();
    let prompt = registry.render(
        &Prompt::MeetingAnalysis.to_string(),
        &json!({"email_content": email_content}),
    )?;

    let messages = vec![
        Message::new(
            Role::System,
            "You are a precise meeting request analyzer. Return only valid JSON.",
        ),
        Message::new(Role::User, &prompt),
    ];
    let resp = completion(&messages, &None, llm.api_hostname, llm.api_key, llm.model).await?;

    let analysis = match parse_json_content::<MeetingAnalysis>(&resp) {
        Ok(a) => a,
        Err(e) => {
            tracing::warn!("Meeting analysis response was unusable: {}", e);
            return Ok((MeetingAnalysis::none(), Vec::new()));
        }
    };

    let suggestions = if analysis.request_type == RequestType::SpecificTimeSuggested {
        extract_times(email_content, now, tz, llm).await?
    } else {
        Vec::new()
    };

    Ok((analysis, suggestions))
}

/// Extract the concrete times mentioned in an email, anchored to "now"
/// so relative phrases ("tomorrow at 2pm") resolve correctly.
pub async fn extract_times(
    email_content: &str,
    now: DateTime<FixedOffset>,
    tz: Tz,
    llm: &LlmConfig<'_>,
) -> Result<Vec<TimeSuggestion>> {
    let now_local = now.with_timezone(&tz);
    let registry = templates();
    let prompt = registry.render(
        &Prompt::ExtractTimes.to_string(),
        &json!({
            "current_date": now_local.format("%A, %B %d, %Y").to_string(),
            "current_time": now_local.format("%I:%M %p").to_string(),
            "email_content": email_content,
        }),
    )?;

    let messages = vec![
        Message::new(
            Role::System,
            "You are a precise time extraction expert. Return only valid JSON arrays.",
        ),
        Message::new(Role::User, &prompt),
    ];
    let resp = completion(&messages, &None, llm.api_hostname, llm.api_key, llm.model).await?;

    let wire = match parse_json_content::<Vec<WireSuggestion>>(&resp) {
        Ok(w) => w,
        Err(e) => {
            tracing::warn!("Time extraction response was unusable: {}", e);
            return Ok(Vec::new());
        }
    };

    Ok(resolve_suggestions(wire, tz))
}

/// Localize the model's naive timestamps, dropping any it got wrong.
fn resolve_suggestions(wire: Vec<WireSuggestion>, tz: Tz) -> Vec<TimeSuggestion> {
    wire.into_iter()
        .filter_map(|w| match parse_timestamp(&w.absolute_datetime, Some(tz)) {
            Ok(start) => Some(TimeSuggestion {
                original_phrase: w.original_phrase,
                start,
                confidence: w.confidence,
            }),
            Err(e) => {
                tracing::warn!(
                    "Dropping unparseable time suggestion '{}': {}",
                    w.absolute_datetime,
                    e
                );
                None
            }
        })
        .collect()
}

/// Pull the assistant's content out of a completion response and parse
/// it as JSON, tolerating markdown code fences around the payload.
fn parse_json_content<T: serde::de::DeserializeOwned>(resp: &serde_json::Value) -> Result<T> {
    let content = resp["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("No content in completion response"))?;
    let parsed = serde_json::from_str(strip_code_fences(content))?;
    Ok(parsed)
}

/// Models wrap JSON in ```json fences despite instructions not to.
pub fn strip_code_fences(content: &str) -> &str {
    let content = content.trim();
    let inner = if let Some(rest) = content.strip_prefix("```json") {
        rest
    } else if let Some(rest) = content.strip_prefix("```") {
        rest
    } else {
        return content;
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Asia::Kolkata;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn llm_mock(url: &str) -> (String, &'static str, &'static str) {
        (url.to_string(), "test-key", "gpt-4")
    }

    fn mock_completion_body(content: &str) -> String {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
        .to_string()
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_request_type_unknown_maps_to_none() {
        let parsed: RequestType = serde_json::from_str(r#""something_else""#).unwrap();
        assert_eq!(parsed, RequestType::None);
    }

    #[test]
    fn test_resolve_suggestions_localizes_naive_times() {
        let wire = vec![WireSuggestion {
            original_phrase: "tomorrow at 2pm".to_string(),
            absolute_datetime: "2025-03-11 14:00:00".to_string(),
            confidence: 0.9,
        }];
        let resolved = resolve_suggestions(wire, Kolkata);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].start, ts("2025-03-11T14:00:00+05:30"));
    }

    #[test]
    fn test_resolve_suggestions_drops_garbage() {
        let wire = vec![WireSuggestion {
            original_phrase: "next tuesday".to_string(),
            absolute_datetime: "calculate-next-tuesday 10:30:00".to_string(),
            confidence: 0.9,
        }];
        assert!(resolve_suggestions(wire, Kolkata).is_empty());
    }

    #[tokio::test]
    async fn test_analyze_meeting_request_specific_time() {
        let mut server = mockito::Server::new_async().await;
        let analysis = mock_completion_body(
            r#"{"is_meeting_request": true, "request_type": "specific_time_suggested", "confidence": 0.95, "meeting_topic": "project sync"}"#,
        );
        let times = mock_completion_body(
            r#"```json
[{"original_phrase": "tomorrow at 2pm", "absolute_datetime": "2025-03-11 14:00:00", "confidence": 0.9}]
```"#,
        );
        let _m1 = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(&analysis)
            .create_async()
            .await;
        // Newer mocks match first, so the extraction mock keys on its
        // distinctive prompt text.
        let _m2 = server
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::Regex(
                "time extraction expert".to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(&times)
            .create_async()
            .await;

        let (url, key, model) = llm_mock(&server.url());
        let llm = LlmConfig {
            api_hostname: &url,
            api_key: key,
            model,
        };
        let (result, suggestions) = analyze_meeting_request(
            "Can we meet tomorrow at 2pm?",
            ts("2025-03-10T09:00:00+05:30"),
            Kolkata,
            &llm,
        )
        .await
        .unwrap();

        assert!(result.is_meeting_request);
        assert_eq!(result.request_type, RequestType::SpecificTimeSuggested);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].start, ts("2025-03-11T14:00:00+05:30"));
    }

    #[tokio::test]
    async fn test_unusable_analysis_degrades_to_none() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(mock_completion_body("I think this is probably a meeting"))
            .create_async()
            .await;

        let (url, key, model) = llm_mock(&server.url());
        let llm = LlmConfig {
            api_hostname: &url,
            api_key: key,
            model,
        };
        let (result, suggestions) = analyze_meeting_request(
            "Here are the documents",
            ts("2025-03-10T09:00:00+05:30"),
            Kolkata,
            &llm,
        )
        .await
        .unwrap();

        assert!(!result.is_meeting_request);
        assert_eq!(result.request_type, RequestType::None);
        assert!(suggestions.is_empty());
    }
}
