//! Reply drafting with calendar awareness.
//!
//! Before the model writes anything, the thread is analyzed for a
//! meeting request and any proposed times are checked against the
//! calendar. The results go into the prompt as ground truth, so the
//! model never guesses at availability. It still gets the calendar
//! tools for follow-up lookups it decides it needs.

use anyhow::{Error, Result, anyhow, bail};
use chrono::{DateTime, FixedOffset};
use futures_util::future::try_join_all;
use serde_json::{Value, json};

use crate::ai::interpret::{LlmConfig, RequestType, TimeSuggestion, analyze_meeting_request};
use crate::ai::prompt::{Prompt, templates};
use crate::ai::tools::{CheckAvailabilityTool, FindFreeTimeTool};
use crate::core::config::AppConfig;
use crate::openai::core::{
    BoxedToolCall, FunctionCall, FunctionCallFn, Message, Role, completion,
};
use crate::schedule::{
    CalendarEvents, ScheduleError, SlotQuery, TimeInterval, check_availability, find_free_slots,
};

/// Upper bound on tool-call rounds per draft. The model gets enough
/// turns to look things up, not enough to loop forever.
const MAX_TOOL_ROUNDS: usize = 4;

/// Draft a reply to the latest message of a thread.
///
/// `thread_content` is the rendered full thread; `latest_body` is the
/// newest incoming message, which drives the meeting analysis.
pub async fn draft_reply<C>(
    calendar: &C,
    thread_content: &str,
    latest_body: &str,
    config: &AppConfig,
    api_base_url: &str,
    now: DateTime<FixedOffset>,
) -> Result<String>
where
    C: CalendarEvents + ?Sized,
{
    let llm = LlmConfig {
        api_hostname: &config.openai_api_hostname,
        api_key: &config.openai_api_key,
        model: &config.openai_model,
    };

    let (analysis, suggestions) =
        analyze_meeting_request(latest_body, now, config.timezone, &llm).await?;

    // A calendar outage means availability is unknown, not that the
    // draft should fail: the reply still goes out, steering the sender
    // to the scheduling link instead of asserting any time is free.
    let scheduling_notes = if analysis.is_meeting_request {
        match scheduling_notes(calendar, config, &analysis.request_type, &suggestions, now).await {
            Ok(notes) => Some(notes),
            Err(ScheduleError::CalendarUnavailable(reason)) => {
                tracing::warn!("Calendar unavailable while drafting: {}", reason);
                Some(unavailable_notes(config.scheduling_link.as_deref()))
            }
            Err(err) => return Err(err.into()),
        }
    } else {
        None
    };

    let registry = templates();
    let system = registry.render(
        &Prompt::DraftReply.to_string(),
        &json!({"scheduling_notes": scheduling_notes}),
    )?;

    let messages = vec![
        Message::new(Role::System, &system),
        Message::new(Role::User, thread_content),
    ];
    let tools: Vec<BoxedToolCall> = vec![
        Box::new(CheckAvailabilityTool::new(api_base_url)),
        Box::new(FindFreeTimeTool::new(api_base_url)),
    ];

    complete_with_tools(messages, Some(tools), &llm).await
}

/// Verify proposed times against the calendar and gather alternatives,
/// formatted as prompt-ready lines.
async fn scheduling_notes<C>(
    calendar: &C,
    config: &AppConfig,
    request_type: &RequestType,
    suggestions: &[TimeSuggestion],
    now: DateTime<FixedOffset>,
) -> Result<String, ScheduleError>
where
    C: CalendarEvents + ?Sized,
{
    let mut notes = Vec::new();
    let mut any_proposed_time_free = false;

    if *request_type == RequestType::SpecificTimeSuggested {
        for suggestion in suggestions {
            let candidate =
                TimeInterval::starting_at(suggestion.start, config.default_duration_minutes)?;
            let result = check_availability(calendar, &config.calendar_id, candidate).await?;
            if result.available {
                any_proposed_time_free = true;
                notes.push(format!(
                    "- Proposed time \"{}\" ({}) is FREE.",
                    suggestion.original_phrase,
                    suggestion.start.to_rfc3339()
                ));
            } else {
                let conflicts: Vec<String> =
                    result.conflicts.iter().map(|c| c.title.clone()).collect();
                notes.push(format!(
                    "- Proposed time \"{}\" ({}) CONFLICTS with: {}.",
                    suggestion.original_phrase,
                    suggestion.start.to_rfc3339(),
                    conflicts.join(", ")
                ));
            }
        }
    }

    // Offer alternatives when nothing proposed works, or when the
    // sender asked for a meeting without naming a time.
    if !any_proposed_time_free {
        let query = SlotQuery {
            horizon_days: config.horizon_days,
            duration_minutes: config.default_duration_minutes,
            business_hours_only: config.business_hours_only,
            max_suggestions: config.max_suggestions,
        };
        let slots =
            find_free_slots(calendar, &config.calendar_id, &query, now, config.timezone).await?;
        if slots.is_empty() {
            notes.push("- No free slots found in the coming days.".to_string());
        } else {
            notes.push("- Free slots that can be offered:".to_string());
            for slot in slots {
                notes.push(format!(
                    "  - {} from {} to {}",
                    slot.day_of_week,
                    slot.interval.start.to_rfc3339(),
                    slot.interval.end.to_rfc3339()
                ));
            }
        }
    }

    if let Some(link) = &config.scheduling_link {
        notes.push(format!(
            "- The user's self-serve scheduling link may be offered: {}",
            link
        ));
    }

    Ok(notes.join("\n"))
}

/// Prompt lines for when the calendar cannot be reached. The model is
/// told availability is unknown rather than left to guess.
fn unavailable_notes(scheduling_link: Option<&str>) -> String {
    let mut notes = vec![
        "- Availability could not be determined (the calendar is unreachable). \
         Do not state whether any time is free or busy."
            .to_string(),
    ];
    match scheduling_link {
        Some(link) => notes.push(format!(
            "- Offer the user's self-serve scheduling link instead: {}",
            link
        )),
        None => notes.push("- Ask the sender to propose a few times instead.".to_string()),
    }
    notes.join("\n")
}

/// Run a completion, resolving tool calls until the model produces
/// content or runs out of rounds.
pub async fn complete_with_tools(
    messages: Vec<Message>,
    tools: Option<Vec<BoxedToolCall>>,
    llm: &LlmConfig<'_>,
) -> Result<String> {
    let mut history = messages;
    let mut resp = completion(&history, &tools, llm.api_hostname, llm.api_key, llm.model).await?;

    for _ in 0..MAX_TOOL_ROUNDS {
        let Some(tool_calls) = resp["choices"][0]["message"]["tool_calls"].as_array() else {
            break;
        };
        if tool_calls.is_empty() {
            break;
        }
        let tools_ref = tools
            .as_ref()
            .ok_or_else(|| anyhow!("Received tool call but no tools were specified"))?;

        let futures = tool_calls.iter().map(|call| handle_tool_call(tools_ref, call));
        let tool_msgs: Vec<Message> = try_join_all(futures).await?.into_iter().flatten().collect();
        history.extend(tool_msgs);

        resp = completion(&history, &tools, llm.api_hostname, llm.api_key, llm.model).await?;
    }

    match resp["choices"][0]["message"]["content"].as_str() {
        Some(content) if !content.trim().is_empty() => Ok(content.trim().to_string()),
        _ => bail!("No content in completion response: {}", resp),
    }
}

/// Execute one tool call and produce the request/response message pair
/// the API expects back.
async fn handle_tool_call(
    tools: &[BoxedToolCall],
    tool_call: &Value,
) -> Result<Vec<Message>, Error> {
    let tool_call_id = tool_call["id"]
        .as_str()
        .ok_or_else(|| anyhow!("Tool call missing ID: {}", tool_call))?;
    let function = &tool_call["function"];
    let args = function["arguments"]
        .as_str()
        .ok_or_else(|| anyhow!("Tool call missing arguments: {}", tool_call))?;
    let name = function["name"]
        .as_str()
        .ok_or_else(|| anyhow!("Tool call missing name: {}", tool_call))?;

    tracing::debug!("Tool call: {} args: {}", name, args);

    let result = tools
        .iter()
        .find(|t| t.function_name() == name)
        .ok_or_else(|| anyhow!("Received tool call that doesn't exist: {}", name))?
        .call(args)
        .await?;

    let request = vec![FunctionCall {
        function: FunctionCallFn {
            arguments: args.to_string(),
            name: name.to_string(),
        },
        id: tool_call_id.to_string(),
        r#type: String::from("function"),
    }];

    Ok(vec![
        Message::new_tool_call_request(request),
        Message::new_tool_call_response(&result, tool_call_id),
    ])
}
