//! Reusable prompts using Handlebars for templating. Handlebars adds
//! additional security controls since it can't do much out of the box
//! without registering your own helpers. This is ideal since output
//! from LLMs should be considered untrusted and Handlebars forces you
//! to add only what you need.

use std::fmt;

use handlebars::{Handlebars, handlebars_helper};

// A simple `inc` helper for use with `each` and `@index` so that
// there can be natural number sequences when rendering (instead of
// starting at 0).
handlebars_helper!(inc: |v: i64| format!("{}", v + 1));

#[derive(Debug)]
pub enum Prompt {
    ClassifyThread,
    MeetingAnalysis,
    ExtractTimes,
    DraftReply,
    EmailThread,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<Prompt> for String {
    fn from(item: Prompt) -> String {
        format!("{:?}", item)
    }
}

const CLASSIFY_THREAD_PROMPT: &str = r#"
You are an email classification agent. Analyze the entire email thread and classify it into exactly one of these workflow labels:

- "To Do": an action or response is explicitly or implicitly required from the user. Direct requests, questions aimed at the user, meeting invitations, deadlines, documents to review.
- "Awaiting Reply": the user has taken action and is waiting on the other party. The user's last message asks a question, proposes something, or follows up.
- "FYI": informational content requiring no action. Newsletters, announcements, CC'd threads where others own the action, resolved requests answered by someone else. Default for ambiguous informational email.
- "Done": the conversation reached a confirmed conclusion acknowledged by the parties ("Thanks, all set", final approval given).
- "SPAM": unsolicited or promotional content. Unsubscribe links, marketing language, phishing, generic greetings.

Priority order, stop at the first match: SPAM, then To Do, then Done, then Awaiting Reply, then FYI.

Analyze the ENTIRE thread in chronological order, identify the user's role, and apply the priority order strictly. When uncertain, prefer the label requiring less urgent action.

Return ONLY the label name, exactly as listed, with no explanation, formatting, or code blocks.
"#;

const MEETING_ANALYSIS_PROMPT: &str = r#"
You are a meeting request analyzer. Analyze this email to determine if it is requesting a meeting and what type of request it is.

**Email Content:**
{{email_content}}

**Output Format (JSON):**
Return a JSON object with this exact structure:
{
    "is_meeting_request": true/false,
    "request_type": "specific_time_suggested" | "general_meeting_request" | "none",
    "confidence": 0.0-1.0,
    "meeting_topic": "brief description of what the meeting is about"
}

**Request Type Definitions:**
- "specific_time_suggested": the email contains specific date/time suggestions (e.g., "tomorrow at 2pm", "Monday at 10AM")
- "general_meeting_request": asks for a meeting but no specific time (e.g., "let's schedule a call", "when are you available?")
- "none": not a meeting request

**Examples:**
"Can we meet tomorrow at 2pm?" -> {"is_meeting_request": true, "request_type": "specific_time_suggested"}
"Let's schedule a call sometime" -> {"is_meeting_request": true, "request_type": "general_meeting_request"}
"Here are the documents you requested" -> {"is_meeting_request": false, "request_type": "none"}

Return only valid JSON. Analyze the email now:
"#;

const EXTRACT_TIMES_PROMPT: &str = r#"
You are a time extraction expert. Analyze the email text and extract any specific meeting times mentioned.

**Current Context:**
- Today is: {{current_date}}
- Current time: {{current_time}}

**Email Text to Analyze:**
{{email_content}}

**Output Format (JSON):**
Return a JSON array of objects with this exact structure:
[
    {
        "original_phrase": "exact text from email",
        "absolute_datetime": "YYYY-MM-DD HH:MM:SS",
        "confidence": 0.9
    }
]

**Rules:**
- Only extract specific times (e.g., "2pm tomorrow", "Monday at 10AM", "March 15th at 3pm")
- Skip vague references (e.g., "sometime next week", "when you're free")
- Convert relative times to absolute dates using the current context
- Use 24-hour format for absolute_datetime
- If no specific times are found, return an empty array []

Return only a valid JSON array. Extract times from the email now:
"#;

const DRAFT_REPLY_PROMPT: &str = r#"
You are a professional assistant that drafts replies to important emails. Read the full email thread and draft a clear, accurate, personalized reply to the latest message.

Whenever specific personal input is needed but not present in the thread, insert an explicit placeholder in square brackets, e.g. [Attach the requested file] or [Name of the client]. Never fabricate unknown information and never use vague placeholders like [INFO].

Your reply should be written as if the user is sending it, start directly with the greeting, match the tone of the thread (defaulting to professional and polite), and be concise but complete.
{{#if scheduling_notes}}

**Scheduling context (already checked against the user's calendar, trust it over your own reasoning):**
{{scheduling_notes}}

When the email is about scheduling, use this context to accept, decline, or propose times. Only offer times listed as free.
{{/if}}

Return only the draft body text with no subject line, commentary, or markdown fences.
"#;

const EMAIL_THREAD_PROMPT: &str = r"
**Subject:** {{subject}}
**From:** {{from}}
**To:** {{to}}

{{#each messages}}
## Message {{inc @index}}

**From:** {{from}}
**Date:** {{received}}
**Body:**
{{body}}

---

{{/each}}
";

pub fn templates<'a>() -> Handlebars<'a> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_helper("inc", Box::new(inc));
    for (prompt, template) in [
        (Prompt::ClassifyThread, CLASSIFY_THREAD_PROMPT),
        (Prompt::MeetingAnalysis, MEETING_ANALYSIS_PROMPT),
        (Prompt::ExtractTimes, EXTRACT_TIMES_PROMPT),
        (Prompt::DraftReply, DRAFT_REPLY_PROMPT),
        (Prompt::EmailThread, EMAIL_THREAD_PROMPT),
    ] {
        registry
            .register_template_string(&prompt.to_string(), template)
            .expect("Failed to register template");
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_templates_render() {
        let registry = templates();

        let classify = registry
            .render(&Prompt::ClassifyThread.to_string(), &json!({}))
            .unwrap();
        assert!(classify.contains("Awaiting Reply"));

        let analysis = registry
            .render(
                &Prompt::MeetingAnalysis.to_string(),
                &json!({"email_content": "Can we meet tomorrow?"}),
            )
            .unwrap();
        assert!(analysis.contains("Can we meet tomorrow?"));

        let extract = registry
            .render(
                &Prompt::ExtractTimes.to_string(),
                &json!({
                    "current_date": "Monday, March 10, 2025",
                    "current_time": "09:00 AM",
                    "email_content": "Tuesday at 2pm works",
                }),
            )
            .unwrap();
        assert!(extract.contains("Monday, March 10, 2025"));
    }

    #[test]
    fn test_draft_reply_scheduling_notes_are_optional() {
        let registry = templates();

        let with_notes = registry
            .render(
                &Prompt::DraftReply.to_string(),
                &json!({"scheduling_notes": "Free Monday 10:00-11:00"}),
            )
            .unwrap();
        assert!(with_notes.contains("Free Monday 10:00-11:00"));

        let without = registry
            .render(&Prompt::DraftReply.to_string(), &json!({"scheduling_notes": null}))
            .unwrap();
        assert!(!without.contains("Scheduling context"));
    }

    #[test]
    fn test_email_thread_renders_numbered_messages() {
        let registry = templates();
        let out = registry
            .render(
                &Prompt::EmailThread.to_string(),
                &json!({
                    "subject": "Quick sync",
                    "from": "alice@example.com",
                    "to": "me@example.com",
                    "messages": [
                        {"from": "alice@example.com", "received": "1", "body": "First"},
                        {"from": "me@example.com", "received": "2", "body": "Second"},
                    ],
                }),
            )
            .unwrap();
        assert!(out.contains("## Message 1"));
        assert!(out.contains("## Message 2"));
    }
}
