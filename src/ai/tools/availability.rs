use anyhow::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::openai::core::{Function, Parameters, Property, ToolCall, ToolType};

#[derive(Serialize)]
pub struct AvailabilityProps {
    pub start_time: Property,
    pub end_time: Property,
    pub duration_minutes: Property,
}

#[derive(Deserialize)]
pub struct AvailabilityArgs {
    pub start_time: String,
    pub end_time: Option<String>,
    pub duration_minutes: Option<i64>,
}

/// Lets the model check whether a specific interval is free by calling
/// the availability endpoint.
#[derive(Serialize)]
pub struct CheckAvailabilityTool {
    pub r#type: ToolType,
    pub function: Function<AvailabilityProps>,
    #[serde(skip)]
    api_base_url: String,
}

#[async_trait]
impl ToolCall for CheckAvailabilityTool {
    async fn call(&self, args: &str) -> Result<String, Error> {
        let fn_args: AvailabilityArgs = serde_json::from_str(args)?;

        let mut url = reqwest::Url::parse(&format!("{}/api/availability", self.api_base_url))?;
        url.query_pairs_mut().append_pair("start", &fn_args.start_time);
        if let Some(end) = &fn_args.end_time {
            url.query_pairs_mut().append_pair("end", end);
        }
        if let Some(duration) = fn_args.duration_minutes {
            url.query_pairs_mut()
                .append_pair("duration_minutes", &duration.to_string());
        }

        let resp = reqwest::Client::new()
            .get(url.as_str())
            .header("Content-Type", "application/json")
            .send()
            .await?
            .error_for_status()?;
        let result: serde_json::Value = resp.json().await?;

        // A compact readout keeps the model from inventing fields.
        let available = result["available"].as_bool().unwrap_or(false);
        let mut out = if available {
            "The requested time is free.".to_string()
        } else {
            "The requested time has conflicts:".to_string()
        };
        if let Some(conflicts) = result["conflicts"].as_array() {
            for c in conflicts {
                out.push_str(&format!(
                    "\n- {} from {} to {}",
                    c["title"].as_str().unwrap_or("busy"),
                    c["interval"]["start"].as_str().unwrap_or("?"),
                    c["interval"]["end"].as_str().unwrap_or("?"),
                ));
            }
        }
        Ok(out)
    }

    fn function_name(&self) -> String {
        self.function.name.clone()
    }
}

impl CheckAvailabilityTool {
    pub fn new(api_base_url: &str) -> Self {
        let function = Function {
            name: String::from("check_availability"),
            description: String::from(
                "Check whether the user's calendar is free for a specific time interval.",
            ),
            parameters: Parameters {
                r#type: String::from("object"),
                properties: AvailabilityProps {
                    start_time: Property {
                        r#type: String::from("string"),
                        description: String::from(
                            "Interval start as an RFC3339 timestamp with offset, e.g. 2025-03-10T14:00:00+05:30.",
                        ),
                    },
                    end_time: Property {
                        r#type: String::from("string"),
                        description: String::from(
                            "Interval end as an RFC3339 timestamp. Omit to use duration_minutes instead.",
                        ),
                    },
                    duration_minutes: Property {
                        r#type: String::from("integer"),
                        description: String::from(
                            "Meeting length in minutes when end_time is omitted (default is 60).",
                        ),
                    },
                },
                required: vec![String::from("start_time")],
                additional_properties: false,
            },
            strict: true,
        };

        Self {
            r#type: ToolType::Function,
            function,
            api_base_url: api_base_url.to_string(),
        }
    }
}
