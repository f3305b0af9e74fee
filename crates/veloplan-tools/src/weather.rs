//! OpenWeatherMap current-weather adapter.
//!
//! Returns a pre-formatted text block; downstream synthesis consumes it
//! verbatim, so no structured record is exposed.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use veloplan_core::tool::{OperationMeta, Tool, ToolArgs, ToolError, ToolOutput};

pub const WEATHER_NAMESPACE: &str = "weather";
pub const OP_CURRENT_WEATHER: &str = "current_weather";

/// Weather adapter configuration.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// OpenWeatherMap API base URL.
    pub endpoint: String,
    /// API key.
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openweathermap.org/data/2.5".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

/// OpenWeatherMap-backed weather tool.
pub struct WeatherTool {
    client: reqwest::Client,
    config: WeatherConfig,
}

#[derive(Debug, Deserialize)]
struct OwmResponse {
    name: String,
    sys: OwmSys,
    main: OwmMain,
    weather: Vec<OwmCondition>,
    wind: OwmWind,
    visibility: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OwmSys {
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    feels_like: f64,
    humidity: u64,
    pressure: u64,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

impl WeatherTool {
    /// Create a new weather tool.
    pub fn new(config: WeatherConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ToolError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }

    async fn current_weather(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let city = args.str_required("city")?;
        let location = match args.str_opt("country_code") {
            Some(country_code) => format!("{},{}", city, country_code),
            None => city.to_string(),
        };

        tracing::debug!(%location, "weather request");
        let url = format!("{}/weather", self.config.endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", location.as_str()),
                ("appid", self.config.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| ToolError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ToolError::Response(format!("HTTP {}: {}", status, text)));
        }

        let report: OwmResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Response(e.to_string()))?;
        Ok(ToolOutput::text(format_weather(&report)))
    }
}

fn format_weather(report: &OwmResponse) -> String {
    let description = report
        .weather
        .first()
        .map(|condition| title_case(&condition.description))
        .unwrap_or_else(|| "Unknown".to_string());
    let visibility = report
        .visibility
        .map(|meters| format!("{} meters", meters))
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "Current weather in {}, {}:\n\
         Temperature: {:.1}°C (feels like {:.1}°C)\n\
         Conditions: {}\n\
         Humidity: {}%\n\
         Wind speed: {} m/s\n\
         Pressure: {} hPa\n\
         Visibility: {}",
        report.name,
        report.sys.country,
        report.main.temp,
        report.main.feels_like,
        description,
        report.main.humidity,
        report.wind.speed,
        report.main.pressure,
        visibility,
    )
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl Tool for WeatherTool {
    fn namespace(&self) -> &str {
        WEATHER_NAMESPACE
    }

    fn description(&self) -> &str {
        "Fetches current weather conditions for a city"
    }

    fn operations(&self) -> Vec<OperationMeta> {
        vec![OperationMeta::new(
            OP_CURRENT_WEATHER,
            "Get current weather for a city as a formatted text report",
        )
        .with_args_schema(json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "City name, e.g. 'Dhaka'"
                },
                "country_code": {
                    "type": "string",
                    "description": "Optional 2-letter country code, e.g. 'BD'"
                }
            },
            "required": ["city"]
        }))]
    }

    async fn invoke(&self, operation: &str, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        match operation {
            OP_CURRENT_WEATHER => self.current_weather(args).await,
            other => Err(ToolError::unknown_operation(WEATHER_NAMESPACE, other)),
        }
    }
}
