use std::env;
use std::path::PathBuf;

use chrono_tz::Tz;

/// Workflow labels applied to triaged threads. Order matters for the
/// classifier prompt.
pub const WORKFLOW_LABELS: [&str; 5] = ["To Do", "Awaiting Reply", "FYI", "Done", "SPAM"];

/// Marker label for threads that have already been triaged.
pub const HISTORY_LABEL: &str = "History";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub gmail_api_client_id: String,
    pub gmail_api_client_secret: String,
    pub token_path: PathBuf,
    pub openai_model: String,
    pub openai_api_hostname: String,
    pub openai_api_key: String,
    pub calendar_id: String,
    /// Base URL the LLM tools use to reach this server's own API.
    pub api_base_url: String,
    /// Local zone for interpreting naive timestamps and day windows.
    pub timezone: Tz,
    pub history_days: i64,
    pub default_duration_minutes: i64,
    pub horizon_days: i64,
    pub business_hours_only: bool,
    pub max_suggestions: usize,
    /// Optional self-serve scheduling link included in drafted replies.
    pub scheduling_link: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let gmail_api_client_id =
            env::var("MAILPILOT_GMAIL_CLIENT_ID").expect("Missing MAILPILOT_GMAIL_CLIENT_ID");
        let gmail_api_client_secret = env::var("MAILPILOT_GMAIL_CLIENT_SECRET")
            .expect("Missing MAILPILOT_GMAIL_CLIENT_SECRET");
        let token_path = env::var("MAILPILOT_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./token.json"));
        let openai_api_hostname = env::var("MAILPILOT_LLM_HOST")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        let openai_api_key =
            env::var("OPENAI_API_KEY").unwrap_or_else(|_| "thiswontworkforopenai".to_string());
        let openai_model =
            env::var("MAILPILOT_LLM_MODEL").unwrap_or_else(|_| "gpt-4.1-mini".to_string());
        let calendar_id =
            env::var("MAILPILOT_CALENDAR_ID").unwrap_or_else(|_| "primary".to_string());
        let api_base_url = env::var("MAILPILOT_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:2222".to_string());
        let timezone = env::var("MAILPILOT_TIMEZONE")
            .unwrap_or_else(|_| "Asia/Kolkata".to_string())
            .parse()
            .expect("Invalid MAILPILOT_TIMEZONE, expected an IANA zone name");
        let scheduling_link = env::var("MAILPILOT_SCHEDULING_LINK").ok();

        Self {
            gmail_api_client_id,
            gmail_api_client_secret,
            token_path,
            openai_api_hostname,
            openai_api_key,
            openai_model,
            calendar_id,
            api_base_url,
            timezone,
            history_days: 10,
            default_duration_minutes: 60,
            horizon_days: 7,
            business_hours_only: true,
            max_suggestions: 5,
            scheduling_link,
        }
    }
}
