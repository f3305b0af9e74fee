//! # Veloplan Tools
//!
//! HTTP tool adapters behind the core `Tool` trait:
//! - `geocoding` - OpenStreetMap Nominatim place search
//! - `weather` - OpenWeatherMap current conditions
//! - `routing` - OSRM cycling routes
//!
//! Adapters own their HTTP clients and map every transport, decoding and
//! service failure into `ToolError` so the executor can degrade per step.

mod geocoding;
mod routing;
mod weather;

pub use geocoding::{GeocodingConfig, GeocodingTool, GEOCODING_NAMESPACE, OP_GEOCODE_LOCATION};
pub use routing::{RoutingConfig, RoutingTool, OP_ROUTE, ROUTING_NAMESPACE};
pub use weather::{WeatherConfig, WeatherTool, OP_CURRENT_WEATHER, WEATHER_NAMESPACE};

use std::sync::Arc;

use veloplan_core::tool::{ToolError, ToolRegistry};

/// Build the standard three-adapter registry.
pub fn standard_registry(
    geocoding: GeocodingConfig,
    weather: WeatherConfig,
    routing: RoutingConfig,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(GeocodingTool::new(geocoding)?));
    registry.register(Arc::new(WeatherTool::new(weather)?));
    registry.register(Arc::new(RoutingTool::new(routing)?));
    Ok(registry)
}
