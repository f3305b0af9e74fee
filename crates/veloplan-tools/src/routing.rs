//! OSRM routing adapter.
//!
//! Computes a cycling route between two coordinate pairs and renders it
//! as a text block with a distance summary and numbered turn-by-turn
//! directions derived from OSRM maneuver data.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use veloplan_core::tool::{OperationMeta, Tool, ToolArgs, ToolError, ToolOutput};

pub const ROUTING_NAMESPACE: &str = "routing";
pub const OP_ROUTE: &str = "route";

/// Routing adapter configuration.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// OSRM route service base URL.
    pub endpoint: String,
    /// Travel profile; cycling is the whole point here.
    pub profile: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://router.project-osrm.org/route/v1".to_string(),
            profile: "cycling".to_string(),
            timeout_secs: 30,
        }
    }
}

/// OSRM-backed routing tool.
pub struct RoutingTool {
    client: reqwest::Client,
    config: RoutingConfig,
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    #[serde(default)]
    name: String,
    #[serde(default)]
    distance: f64,
    maneuver: OsrmManeuver,
}

#[derive(Debug, Deserialize)]
struct OsrmManeuver {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    modifier: Option<String>,
}

impl RoutingTool {
    /// Create a new routing tool.
    pub fn new(config: RoutingConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ToolError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn build_url(&self, origin: (f64, f64), destination: (f64, f64)) -> String {
        // OSRM expects longitude,latitude pairs separated by semicolons.
        format!(
            "{}/{}/{},{};{},{}?overview=full&steps=true",
            self.config.endpoint,
            self.config.profile,
            origin.1,
            origin.0,
            destination.1,
            destination.0,
        )
    }

    async fn route(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let origin = (
            args.f64_required("origin_latitude")?,
            args.f64_required("origin_longitude")?,
        );
        let destination = (
            args.f64_required("destination_latitude")?,
            args.f64_required("destination_longitude")?,
        );

        let url = self.build_url(origin, destination);
        tracing::debug!(%url, "routing request");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ToolError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ToolError::Response(format!("HTTP {}: {}", status, text)));
        }

        let decoded: OsrmResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Response(e.to_string()))?;
        route_to_output(decoded)
    }
}

/// "NoRoute" is a legitimate answer rendered as text; any other non-Ok
/// code is a service failure.
fn route_to_output(response: OsrmResponse) -> Result<ToolOutput, ToolError> {
    match response.code.as_str() {
        "Ok" => {
            let Some(route) = response.routes.first() else {
                return Err(ToolError::Response("OSRM returned no routes".to_string()));
            };
            Ok(ToolOutput::text(summarize_route(route)))
        }
        "NoRoute" => Ok(ToolOutput::text(
            "No route found between the given coordinates.".to_string(),
        )),
        code => Err(ToolError::Response(format!(
            "OSRM error {}: {}",
            code,
            response.message.unwrap_or_default()
        ))),
    }
}

fn summarize_route(route: &OsrmRoute) -> String {
    let mut summary = format!(
        "Route overview\nDistance: {:.2} km\nEstimated duration: {} min\n",
        route.distance / 1000.0,
        (route.duration / 60.0).round() as i64,
    );

    let has_steps = route.legs.iter().any(|leg| !leg.steps.is_empty());
    if has_steps {
        summary.push_str("\nTurn-by-turn directions:\n");
        let mut step_number = 1;
        for leg in &route.legs {
            for step in &leg.steps {
                summary.push_str(&format!(
                    "{}. {} ({:.2} km)\n",
                    step_number,
                    describe_step(step),
                    step.distance / 1000.0,
                ));
                step_number += 1;
            }
        }
    }
    summary
}

fn describe_step(step: &OsrmStep) -> String {
    let road = if step.name.trim().is_empty() {
        "an unnamed road"
    } else {
        step.name.trim()
    };
    let modifier = step.maneuver.modifier.as_deref().unwrap_or("");

    match step.maneuver.kind.as_str() {
        "depart" => format!("Depart onto {}", road),
        "arrive" => "Arrive at your destination".to_string(),
        "roundabout" => format!("Enter roundabout and take the exit onto {}", road),
        "end of road" => format!("End of road {} onto {}", capitalize(modifier), road),
        "merge" => format!("Merge {} onto {}", capitalize(modifier), road),
        "on ramp" => format!("Take on ramp {} onto {}", capitalize(modifier), road),
        "off ramp" => format!("Take off ramp {} onto {}", capitalize(modifier), road),
        kind => {
            let direction = capitalize(&modifier.replace('_', " "));
            format!("{} {} onto {}", capitalize(kind), direction, road)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl Tool for RoutingTool {
    fn namespace(&self) -> &str {
        ROUTING_NAMESPACE
    }

    fn description(&self) -> &str {
        "Calculates a cycling route between two coordinate points"
    }

    fn operations(&self) -> Vec<OperationMeta> {
        vec![OperationMeta::new(
            OP_ROUTE,
            "Compute a cycling route; returns distance, duration and directions as text",
        )
        .with_args_schema(json!({
            "type": "object",
            "properties": {
                "origin_latitude": {"type": "number", "description": "Latitude of the starting point"},
                "origin_longitude": {"type": "number", "description": "Longitude of the starting point"},
                "destination_latitude": {"type": "number", "description": "Latitude of the ending point"},
                "destination_longitude": {"type": "number", "description": "Longitude of the ending point"}
            },
            "required": [
                "origin_latitude",
                "origin_longitude",
                "destination_latitude",
                "destination_longitude"
            ]
        }))]
    }

    async fn invoke(&self, operation: &str, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        match operation {
            OP_ROUTE => self.route(args).await,
            other => Err(ToolError::unknown_operation(ROUTING_NAMESPACE, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "code": "Ok",
        "routes": [{
            "distance": 12430.5,
            "duration": 2890.0,
            "legs": [{
                "steps": [
                    {"name": "Mirpur Road", "distance": 320.0,
                     "maneuver": {"type": "depart"}},
                    {"name": "", "distance": 1250.0,
                     "maneuver": {"type": "turn", "modifier": "slight_left"}},
                    {"name": "Satmasjid Road", "distance": 880.0,
                     "maneuver": {"type": "merge", "modifier": "right"}},
                    {"name": "", "distance": 0.0,
                     "maneuver": {"type": "arrive"}}
                ]
            }]
        }]
    }"#;

    #[test]
    fn test_summarize_route_renders_distance_and_directions() {
        let response: OsrmResponse = serde_json::from_str(SAMPLE).unwrap();
        let ToolOutput::Text(text) = route_to_output(response).unwrap() else {
            panic!("expected text output");
        };

        assert!(text.contains("Distance: 12.43 km"));
        assert!(text.contains("Estimated duration: 48 min"));
        assert!(text.contains("1. Depart onto Mirpur Road (0.32 km)"));
        assert!(text.contains("2. Turn Slight left onto an unnamed road (1.25 km)"));
        assert!(text.contains("3. Merge Right onto Satmasjid Road (0.88 km)"));
        assert!(text.contains("4. Arrive at your destination (0.00 km)"));
    }

    #[test]
    fn test_no_route_is_text_not_error() {
        let response: OsrmResponse =
            serde_json::from_str(r#"{"code": "NoRoute", "routes": []}"#).unwrap();
        let ToolOutput::Text(text) = route_to_output(response).unwrap() else {
            panic!("expected text output");
        };
        assert!(text.contains("No route found"));
    }

    #[test]
    fn test_service_error_code_is_a_response_error() {
        let response: OsrmResponse = serde_json::from_str(
            r#"{"code": "InvalidQuery", "message": "Query string malformed", "routes": []}"#,
        )
        .unwrap();
        match route_to_output(response) {
            Err(ToolError::Response(message)) => {
                assert!(message.contains("InvalidQuery"));
                assert!(message.contains("Query string malformed"));
            }
            other => panic!("expected response error, got {:?}", other),
        }
    }

    #[test]
    fn test_build_url_uses_longitude_latitude_order() {
        let tool = RoutingTool::new(RoutingConfig::default()).unwrap();
        let url = tool.build_url((23.84, 90.26), (23.7, 90.4));
        assert!(url.contains("/cycling/90.26,23.84;90.4,23.7?"));
        assert!(url.contains("overview=full&steps=true"));
    }

    #[test]
    fn test_missing_coordinate_is_rejected_before_any_request() {
        tokio_test::block_on(async {
            let tool = RoutingTool::new(RoutingConfig::default()).unwrap();
            let args: ToolArgs = [("origin_latitude".to_string(), serde_json::json!(23.84))]
                .into_iter()
                .collect();
            let result = tool.invoke(OP_ROUTE, args).await;
            assert!(matches!(result, Err(ToolError::MissingArgument(_))));
        });
    }
}
