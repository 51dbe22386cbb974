use anyhow::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::openai::core::{Function, Parameters, Property, ToolCall, ToolType};

#[derive(Serialize)]
pub struct FreeTimeProps {
    pub horizon_days: Property,
    pub duration_minutes: Property,
    pub max_suggestions: Property,
}

#[derive(Deserialize)]
pub struct FreeTimeArgs {
    pub horizon_days: Option<i64>,
    pub duration_minutes: Option<i64>,
    pub max_suggestions: Option<usize>,
}

/// Lets the model ask for open slots on the user's calendar by calling
/// the slots endpoint.
#[derive(Serialize)]
pub struct FindFreeTimeTool {
    pub r#type: ToolType,
    pub function: Function<FreeTimeProps>,
    #[serde(skip)]
    api_base_url: String,
}

#[async_trait]
impl ToolCall for FindFreeTimeTool {
    async fn call(&self, args: &str) -> Result<String, Error> {
        let fn_args: FreeTimeArgs = serde_json::from_str(args)?;

        let mut url = reqwest::Url::parse(&format!("{}/api/slots", self.api_base_url))?;
        if let Some(horizon) = fn_args.horizon_days {
            url.query_pairs_mut()
                .append_pair("horizon_days", &horizon.to_string());
        }
        if let Some(duration) = fn_args.duration_minutes {
            url.query_pairs_mut()
                .append_pair("duration_minutes", &duration.to_string());
        }
        if let Some(max) = fn_args.max_suggestions {
            url.query_pairs_mut()
                .append_pair("max_suggestions", &max.to_string());
        }

        let resp = reqwest::Client::new()
            .get(url.as_str())
            .header("Content-Type", "application/json")
            .send()
            .await?
            .error_for_status()?;
        let slots: Vec<serde_json::Value> = resp.json().await?;

        if slots.is_empty() {
            return Ok("No free slots found in the search window.".to_string());
        }

        let lines: Vec<String> = slots
            .iter()
            .map(|s| {
                format!(
                    "- {} from {} to {}",
                    s["day_of_week"].as_str().unwrap_or("?"),
                    s["interval"]["start"].as_str().unwrap_or("?"),
                    s["interval"]["end"].as_str().unwrap_or("?"),
                )
            })
            .collect();
        Ok(format!("Free slots:\n{}", lines.join("\n")))
    }

    fn function_name(&self) -> String {
        self.function.name.clone()
    }
}

impl FindFreeTimeTool {
    pub fn new(api_base_url: &str) -> Self {
        let function = Function {
            name: String::from("find_free_time"),
            description: String::from(
                "Find open slots on the user's calendar to propose for a meeting.",
            ),
            parameters: Parameters {
                r#type: String::from("object"),
                properties: FreeTimeProps {
                    horizon_days: Property {
                        r#type: String::from("integer"),
                        description: String::from("Days ahead to search, 1 to 90 (default is 7)."),
                    },
                    duration_minutes: Property {
                        r#type: String::from("integer"),
                        description: String::from("Meeting length in minutes (default is 60)."),
                    },
                    max_suggestions: Property {
                        r#type: String::from("integer"),
                        description: String::from("Maximum number of slots to return (default is 5)."),
                    },
                },
                required: vec![],
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
