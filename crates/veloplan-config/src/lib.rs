//! # Veloplan Config
//!
//! Unified single-file configuration management for Veloplan.
//! A single `veloplan.yaml` configures the LLM backend, planner and
//! synthesizer models, tool adapter endpoints, and observability.

mod loader;

pub use loader::{load_config, ConfigError};

use serde::Deserialize;

/// Top-level configuration schema for Veloplan.
#[derive(Debug, Clone, Deserialize)]
pub struct VeloplanConfig {
    /// Config schema version.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub synthesizer: SynthesizerConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for VeloplanConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            app: AppConfig::default(),
            llm: LlmConfig::default(),
            planner: PlannerConfig::default(),
            synthesizer: SynthesizerConfig::default(),
            tools: ToolsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            environment: default_env(),
        }
    }
}

fn default_app_name() -> String {
    "veloplan".to_string()
}

fn default_env() -> String {
    "development".to_string()
}

/// Shared chat-completion backend settings; planner and synthesizer pick
/// their own model and temperature on top of it.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_llm_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            api_key_env: default_llm_api_key_env(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_llm_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_planner_model")]
    pub model: String,
    #[serde(default = "default_planner_temperature")]
    pub temperature: f32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            model: default_planner_model(),
            temperature: default_planner_temperature(),
        }
    }
}

fn default_planner_model() -> String {
    "gpt-4o".to_string()
}

fn default_planner_temperature() -> f32 {
    0.2
}

#[derive(Debug, Clone, Deserialize)]
pub struct SynthesizerConfig {
    #[serde(default = "default_synthesizer_model")]
    pub model: String,
    #[serde(default = "default_synthesizer_temperature")]
    pub temperature: f32,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            model: default_synthesizer_model(),
            temperature: default_synthesizer_temperature(),
        }
    }
}

fn default_synthesizer_model() -> String {
    "gpt-4o".to_string()
}

fn default_synthesizer_temperature() -> f32 {
    0.4
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ToolsConfig {
    #[serde(default)]
    pub geocoding: GeocodingSection,
    #[serde(default)]
    pub weather: WeatherSection,
    #[serde(default)]
    pub routing: RoutingSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingSection {
    #[serde(default = "default_geocoding_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_geocoding_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_country_code")]
    pub default_country_code: String,
    #[serde(default = "default_tool_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeocodingSection {
    fn default() -> Self {
        Self {
            endpoint: default_geocoding_endpoint(),
            user_agent: default_geocoding_user_agent(),
            default_country_code: default_country_code(),
            timeout_secs: default_tool_timeout_secs(),
        }
    }
}

fn default_geocoding_endpoint() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_geocoding_user_agent() -> String {
    "veloplan/0.4 (route planning)".to_string()
}

fn default_country_code() -> String {
    "bd".to_string()
}

fn default_tool_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherSection {
    #[serde(default = "default_weather_endpoint")]
    pub endpoint: String,
    /// Environment variable holding the OpenWeatherMap API key.
    #[serde(default = "default_weather_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_tool_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WeatherSection {
    fn default() -> Self {
        Self {
            endpoint: default_weather_endpoint(),
            api_key_env: default_weather_api_key_env(),
            timeout_secs: default_tool_timeout_secs(),
        }
    }
}

impl WeatherSection {
    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

fn default_weather_endpoint() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_weather_api_key_env() -> String {
    "OPEN_WEATHER_KEY".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingSection {
    #[serde(default = "default_routing_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_routing_profile")]
    pub profile: String,
    #[serde(default = "default_tool_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RoutingSection {
    fn default() -> Self {
        Self {
            endpoint: default_routing_endpoint(),
            profile: default_routing_profile(),
            timeout_secs: default_tool_timeout_secs(),
        }
    }
}

fn default_routing_endpoint() -> String {
    "http://router.project-osrm.org/route/v1".to_string()
}

fn default_routing_profile() -> String {
    "cycling".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
