//! Tool definitions and implementations for the research agent.

use super::calc;
use super::web::{self, SearchHit};
use crate::config::ToolSettings;
use crate::error::{Result, SiftError};
use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use chrono::{FixedOffset, Local, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DDG_HTML_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Available tools for the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    /// Web search.
    DuckduckgoSearch {
        query: String,
        #[serde(default)]
        max_results: Option<usize>,
    },

    /// Web search restricted to the past week.
    DuckduckgoNews {
        query: String,
        #[serde(default)]
        max_results: Option<usize>,
    },

    /// Fetch a page and return its readable text.
    ReadArticle { url: String },

    /// Current weather for a city.
    GetWeather { city: String },

    /// Evaluate an arithmetic expression.
    CalculateExpression { expression: String },

    /// Short preview of a page.
    SummarizeUrl {
        url: String,
        #[serde(default)]
        max_length: Option<usize>,
    },

    /// Current time, optionally in a timezone.
    GetTimeInfo {
        #[serde(default)]
        timezone: Option<String>,
    },
}

impl ToolCall {
    /// Whether this tool belongs to the extra toolset.
    pub fn is_extra(&self) -> bool {
        !matches!(
            self,
            ToolCall::DuckduckgoSearch { .. }
                | ToolCall::DuckduckgoNews { .. }
                | ToolCall::ReadArticle { .. }
        )
    }
}

/// Tool execution context: HTTP client and tool settings.
#[derive(Clone)]
pub struct ToolContext {
    http: reqwest::Client,
    settings: ToolSettings,
    extra_tools: bool,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(settings: &ToolSettings, extra_tools: bool) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(Duration::from_secs(settings.fetch_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            settings: settings.clone(),
            extra_tools,
        })
    }

    /// Tool definitions advertised to the model.
    pub fn definitions(&self) -> Vec<ChatCompletionTool> {
        tool_definitions(self.extra_tools)
    }

    /// Execute a tool call and return the result as a string.
    pub async fn execute(&self, tool: &ToolCall) -> Result<String> {
        if tool.is_extra() && !self.extra_tools {
            return Err(SiftError::Tool(format!("{:?} is not enabled", tool)));
        }

        match tool {
            ToolCall::DuckduckgoSearch { query, max_results } => {
                self.execute_search(query, *max_results, false).await
            }
            ToolCall::DuckduckgoNews { query, max_results } => {
                self.execute_search(query, *max_results, true).await
            }
            ToolCall::ReadArticle { url } => self.execute_read_article(url).await,
            ToolCall::GetWeather { city } => Ok(get_weather(city)),
            ToolCall::CalculateExpression { expression } => Ok(calculate_expression(expression)),
            ToolCall::SummarizeUrl { url, max_length } => {
                Ok(self.execute_summarize_url(url, *max_length).await)
            }
            ToolCall::GetTimeInfo { timezone } => Ok(get_time_info(timezone.as_deref())),
        }
    }

    async fn execute_search(&self, query: &str, max_results: Option<usize>, recent: bool) -> Result<String> {
        let max_results = max_results.unwrap_or(self.settings.search_max_results).max(1);

        let mut request = self.http.get(DDG_HTML_ENDPOINT).query(&[("q", query)]);
        if recent {
            request = request.query(&[("df", "w")]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(SiftError::Tool(format!(
                "DuckDuckGo search failed with status: {}",
                response.status()
            )));
        }

        let html = response.text().await?;
        let hits: Vec<SearchHit> = web::parse_search_results(&html, max_results);
        debug!("DuckDuckGo returned {} results for {:?}", hits.len(), query);

        if hits.is_empty() {
            return Ok(format!("No results found for: {}", query));
        }

        Ok(serde_json::to_string_pretty(&hits)?)
    }

    async fn execute_read_article(&self, url: &str) -> Result<String> {
        let parsed = parse_http_url(url)?;

        let response = self.http.get(parsed).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SiftError::Tool(format!("HTTP error: {}", status)));
        }

        let html = response.text().await?;
        let title = web::extract_title(&html);
        let text = web::extract_text(&html);

        if text.is_empty() {
            return Ok(format!("No readable text found at {}", url));
        }

        let (body, truncated) = web::truncate_chars(&text, self.settings.article_max_chars);
        let mut result = String::new();
        if let Some(title) = title {
            result.push_str(&format!("Title: {}\n\n", title));
        }
        result.push_str(body);
        if truncated {
            result.push_str("... [article truncated]");
        }
        Ok(result)
    }

    async fn execute_summarize_url(&self, url: &str, max_length: Option<usize>) -> String {
        let max_length = max_length.unwrap_or(self.settings.summary_max_chars);

        let parsed = match parse_http_url(url) {
            Ok(u) => u,
            Err(e) => return format!("Error fetching URL {}: {}", url, e),
        };

        let response = match self
            .http
            .get(parsed)
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return format!(
                    "Error: Request to {} timed out after {} seconds",
                    url, self.settings.fetch_timeout_secs
                )
            }
            Err(e) => return format!("Error fetching URL {}: {}", url, e),
        };

        match response.text().await {
            Ok(text) => {
                let content = text.replace('\n', " ").replace('\r', "");
                match web::truncate_chars(&content, max_length) {
                    (preview, true) => format!("Content preview for {}: {}...", url, preview),
                    (all, false) => format!("Content for {}: {}", url, all),
                }
            }
            Err(e) => format!("Unexpected error processing {}: {}", url, e),
        }
    }
}

fn parse_http_url(url: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(url)
        .map_err(|e| SiftError::InvalidInput(format!("Invalid URL '{}': {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(SiftError::InvalidInput(format!(
            "Unsupported URL scheme '{}'",
            other
        ))),
    }
}

/// Canned weather data.
fn get_weather(city: &str) -> String {
    let weather = match city {
        "Tokyo" => "Sunny, 22°C (72°F), Wind: 10 km/h".to_string(),
        "New York" => "Partly Cloudy, 18°C (64°F), Wind: 15 km/h".to_string(),
        "London" => "Rainy, 12°C (54°F), Wind: 20 km/h".to_string(),
        "Paris" => "Clear, 20°C (68°F), Wind: 8 km/h".to_string(),
        other => format!("Weather data for {}: Sunny, 22°C (72°F), Wind: 10 km/h", other),
    };
    format!("Current weather in {}: {}", city, weather)
}

fn calculate_expression(expression: &str) -> String {
    match calc::evaluate(expression) {
        Ok(value) => format!(
            "Calculation Result: {} = {}",
            expression,
            calc::format_number(value)
        ),
        Err(e) => format!(
            "Calculation Error: Unable to evaluate '{}'. Error: {}",
            expression, e
        ),
    }
}

fn get_time_info(timezone: Option<&str>) -> String {
    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    match timezone.map(str::trim).filter(|tz| !tz.is_empty()) {
        None => format!("Current local time: {}", Local::now().format(FORMAT)),
        Some(tz) if tz.eq_ignore_ascii_case("UTC") || tz.eq_ignore_ascii_case("GMT") => {
            format!("Current time in {}: {} UTC", tz, Utc::now().format(FORMAT))
        }
        Some(tz) => match parse_offset(tz) {
            Some(offset) => format!(
                "Current time in {}: {}",
                tz,
                Utc::now().with_timezone(&offset).format("%Y-%m-%d %H:%M:%S %:z")
            ),
            None => format!(
                "Error getting time: unknown timezone '{}' (use UTC or an offset like +05:30)",
                tz
            ),
        },
    }
}

/// Parse `+HH:MM`, `-HH`, `UTC+HH:MM` style offsets.
fn parse_offset(tz: &str) -> Option<FixedOffset> {
    let tz = tz
        .strip_prefix("UTC")
        .or_else(|| tz.strip_prefix("GMT"))
        .unwrap_or(tz);
    let (sign, rest) = match tz.chars().next()? {
        '+' => (1, &tz[1..]),
        '-' => (-1, &tz[1..]),
        _ => return None,
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?),
        None => (rest.parse::<i32>().ok()?, 0),
    };
    if hours > 14 || minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn function_tool(name: &str, description: &str, parameters: serde_json::Value) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: name.to_string(),
            description: Some(description.to_string()),
            parameters: Some(parameters),
            strict: None,
        },
    }
}

/// Get OpenAI function/tool definitions for the agent.
pub fn tool_definitions(extra_tools: bool) -> Vec<ChatCompletionTool> {
    let mut tools = vec![
        function_tool(
            "duckduckgo_search",
            "Search the web with DuckDuckGo. Returns a JSON list of results with title, href and body.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The query to search for"
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum number of results to return (default: 5)"
                    }
                },
                "required": ["query"]
            }),
        ),
        function_tool(
            "duckduckgo_news",
            "Search DuckDuckGo for recent news and current events (past week).",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The news topic to search for"
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum number of results to return (default: 5)"
                    }
                },
                "required": ["query"]
            }),
        ),
        function_tool(
            "read_article",
            "Read the full text of an article or web page given its URL.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "The http(s) URL of the article"
                    }
                },
                "required": ["url"]
            }),
        ),
    ];

    if extra_tools {
        tools.extend([
            function_tool(
                "get_weather",
                "Get current weather information for a specific city.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "city": {
                            "type": "string",
                            "description": "Name of the city (e.g., \"Tokyo\", \"New York\")"
                        }
                    },
                    "required": ["city"]
                }),
            ),
            function_tool(
                "calculate_expression",
                "Safely evaluate a mathematical expression and return the result.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "expression": {
                            "type": "string",
                            "description": "Expression to evaluate (e.g., \"2 + 2\", \"10 * 5 + 3\")"
                        }
                    },
                    "required": ["expression"]
                }),
            ),
            function_tool(
                "summarize_url",
                "Fetch content from a URL and return a brief preview.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "url": {
                            "type": "string",
                            "description": "Web URL to fetch and summarize"
                        },
                        "max_length": {
                            "type": "integer",
                            "description": "Maximum length of the preview in characters (default: 200)"
                        }
                    },
                    "required": ["url"]
                }),
            ),
            function_tool(
                "get_time_info",
                "Get current time information, optionally for a timezone.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "timezone": {
                            "type": "string",
                            "description": "Optional timezone: \"UTC\" or an offset like \"+05:30\""
                        }
                    }
                }),
            ),
        ]);
    }

    tools
}

/// Parse a tool call from the OpenAI response format.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let arguments = if arguments.trim().is_empty() { "{}" } else { arguments };

    let mut args: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| SiftError::Tool(format!("Invalid tool arguments: {}", e)))?;

    let object = args
        .as_object_mut()
        .ok_or_else(|| SiftError::Tool("Tool arguments must be a JSON object".to_string()))?;
    object.insert("name".to_string(), serde_json::Value::String(name.to_string()));

    serde_json::from_value(args)
        .map_err(|e| SiftError::Tool(format!("Cannot call '{}': {}", name, e)))
}
