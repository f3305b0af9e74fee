//! Nominatim geocoding adapter.
//!
//! Converts a free-form location name into coordinates via the
//! OpenStreetMap Nominatim search API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use veloplan_core::tool::{OperationMeta, Tool, ToolArgs, ToolError, ToolOutput};

pub const GEOCODING_NAMESPACE: &str = "geocoding";
pub const OP_GEOCODE_LOCATION: &str = "geocode_location";

/// Geocoding adapter configuration.
#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    /// Nominatim search endpoint.
    pub endpoint: String,
    /// Nominatim requires an identifying User-Agent.
    pub user_agent: String,
    /// Country code used to bias results when the plan does not pass one.
    pub default_country_code: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org/search".to_string(),
            user_agent: "veloplan/0.4 (route planning)".to_string(),
            default_country_code: "bd".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Nominatim-backed geocoding tool.
pub struct GeocodingTool {
    client: reqwest::Client,
    config: GeocodingConfig,
}

// Nominatim serializes coordinates as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

impl GeocodingTool {
    /// Create a new geocoding tool.
    pub fn new(config: GeocodingConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ToolError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }

    async fn geocode_location(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let location_name = args.str_required("location_name")?;
        let country_code = args
            .str_opt("country_code")
            .unwrap_or(&self.config.default_country_code);

        tracing::debug!(location_name, country_code, "geocoding request");
        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("q", location_name),
                ("format", "json"),
                ("limit", "1"),
                ("countrycodes", country_code),
            ])
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en")
            .send()
            .await
            .map_err(|e| ToolError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ToolError::Response(format!("HTTP {}: {}", status, text)));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| ToolError::Response(e.to_string()))?;
        place_to_output(places)
    }
}

/// An empty result set is a legitimate answer (an empty record), not an
/// adapter failure.
fn place_to_output(places: Vec<NominatimPlace>) -> Result<ToolOutput, ToolError> {
    let Some(place) = places.into_iter().next() else {
        return Ok(ToolOutput::record(Vec::<(String, serde_json::Value)>::new()));
    };
    let latitude: f64 = place
        .lat
        .parse()
        .map_err(|_| ToolError::Response(format!("invalid latitude '{}'", place.lat)))?;
    let longitude: f64 = place
        .lon
        .parse()
        .map_err(|_| ToolError::Response(format!("invalid longitude '{}'", place.lon)))?;
    Ok(ToolOutput::record([
        ("latitude", json!(latitude)),
        ("longitude", json!(longitude)),
        ("display_name", json!(place.display_name)),
    ]))
}

#[async_trait]
impl Tool for GeocodingTool {
    fn namespace(&self) -> &str {
        GEOCODING_NAMESPACE
    }

    fn description(&self) -> &str {
        "Converts location names or addresses into latitude and longitude"
    }

    fn operations(&self) -> Vec<OperationMeta> {
        vec![OperationMeta::new(
            OP_GEOCODE_LOCATION,
            "Geocode a location name; returns latitude, longitude and display_name",
        )
        .with_args_schema(json!({
            "type": "object",
            "properties": {
                "location_name": {
                    "type": "string",
                    "description": "The location to geocode, e.g. 'Gulshan 1, Dhaka'"
                },
                "country_code": {
                    "type": "string",
                    "description": "Optional 2-letter country code to bias results, e.g. 'bd'"
                }
            },
            "required": ["location_name"]
        }))]
    }

    async fn invoke(&self, operation: &str, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        match operation {
            OP_GEOCODE_LOCATION => self.geocode_location(args).await,
            other => Err(ToolError::unknown_operation(GEOCODING_NAMESPACE, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_places() -> Vec<NominatimPlace> {
        serde_json::from_str(
            r#"[{
                "lat": "23.8408",
                "lon": "90.2665",
                "display_name": "Savar, Dhaka District, Bangladesh"
            }]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_place_converts_to_coordinate_record() {
        let output = place_to_output(sample_places()).unwrap();
        let ToolOutput::Record(fields) = output else {
            panic!("expected record output");
        };
        assert_eq!(fields.get("latitude").unwrap().as_f64(), Some(23.8408));
        assert_eq!(fields.get("longitude").unwrap().as_f64(), Some(90.2665));
        assert_eq!(
            fields.get("display_name").unwrap().as_str(),
            Some("Savar, Dhaka District, Bangladesh")
        );
    }

    #[test]
    fn test_no_results_yields_empty_record() {
        let output = place_to_output(Vec::new()).unwrap();
        assert_eq!(output, ToolOutput::record(Vec::<(String, serde_json::Value)>::new()));
    }

    #[test]
    fn test_unparsable_coordinates_are_a_response_error() {
        let places: Vec<NominatimPlace> = serde_json::from_str(
            r#"[{"lat": "north", "lon": "90.1", "display_name": "x"}]"#,
        )
        .unwrap();
        assert!(matches!(
            place_to_output(places),
            Err(ToolError::Response(_))
        ));
    }

    #[test]
    fn test_unknown_operation_is_rejected() {
        tokio_test::block_on(async {
            let tool = GeocodingTool::new(GeocodingConfig::default()).unwrap();
            let result = tool.invoke("reverse_geocode", ToolArgs::default()).await;
            assert!(matches!(result, Err(ToolError::UnknownOperation { .. })));
        });
    }

    #[test]
    fn test_missing_location_name_is_rejected_before_any_request() {
        tokio_test::block_on(async {
            let tool = GeocodingTool::new(GeocodingConfig::default()).unwrap();
            let result = tool.invoke(OP_GEOCODE_LOCATION, ToolArgs::default()).await;
            assert!(matches!(result, Err(ToolError::MissingArgument(_))));
        });
    }
}
