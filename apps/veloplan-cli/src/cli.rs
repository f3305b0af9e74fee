use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use veloplan_agents::{
    HttpLlmClient, HttpLlmClientConfig, LlmClient, LlmReportSynthesizer, LlmRoutePlanner,
    ReportSynthesizerConfig, RoutePlannerConfig,
};
use veloplan_config::VeloplanConfig;
use veloplan_core::executor::PlanExecutor;
use veloplan_core::tool::ToolRegistry;
use veloplan_tools::{standard_registry, GeocodingConfig, RoutingConfig, WeatherConfig};

use crate::pipeline::{Pipeline, PipelineOutcome};

#[derive(Debug, Parser)]
#[command(name = "veloplan", about = "LLM-planned cycling route assistant")]
pub struct Cli {
    /// Path to the unified YAML config
    #[arg(long, default_value = "configs/veloplan.yaml")]
    config: PathBuf,
    /// Log everything the pipeline does
    #[arg(long)]
    verbose: bool,
    /// The route request, e.g. "from Savar to Dhanmondi with weather"
    #[arg(value_name = "QUERY", required = true)]
    query: Vec<String>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = veloplan_config::load_config(&self.config)
            .with_context(|| format!("failed to load config from {}", self.config.display()))?;
        init_tracing(&config, self.verbose);

        let query = self.query.join(" ");
        let registry = build_registry(&config)?;
        let catalog = registry.catalog();

        let api_key = config.llm.api_key();
        anyhow::ensure!(
            api_key.is_some(),
            "no LLM API key found; set the {} environment variable",
            config.llm.api_key_env
        );
        let client: Arc<dyn LlmClient> = Arc::new(HttpLlmClient::new(HttpLlmClientConfig {
            endpoint: config.llm.endpoint.clone(),
            api_key,
            timeout_secs: config.llm.timeout_secs,
        })?);

        let planner = LlmRoutePlanner::new(
            client.clone(),
            RoutePlannerConfig {
                model: config.planner.model.clone(),
                temperature: config.planner.temperature,
                ..RoutePlannerConfig::default()
            },
            catalog,
        );
        let synthesizer = LlmReportSynthesizer::new(
            client,
            ReportSynthesizerConfig {
                model: config.synthesizer.model.clone(),
                temperature: config.synthesizer.temperature,
                ..ReportSynthesizerConfig::default()
            },
        );

        let pipeline = Pipeline::new(planner, PlanExecutor::new(registry), synthesizer);
        match pipeline.run(&query).await? {
            PipelineOutcome::NoSteps => {
                println!("The planner produced no steps to run for this request.");
            }
            PipelineOutcome::Completed { report, trace } => {
                println!(
                    "Plan executed: {} succeeded, {} failed, {} skipped\n",
                    trace.succeeded(),
                    trace.failed(),
                    trace.skipped(),
                );
                println!("{}", report);
            }
        }
        Ok(())
    }
}

fn build_registry(config: &VeloplanConfig) -> anyhow::Result<ToolRegistry> {
    if config.tools.weather.api_key().is_none() {
        tracing::warn!(
            api_key_env = %config.tools.weather.api_key_env,
            "no weather API key found; weather steps will fail"
        );
    }
    let registry = standard_registry(
        GeocodingConfig {
            endpoint: config.tools.geocoding.endpoint.clone(),
            user_agent: config.tools.geocoding.user_agent.clone(),
            default_country_code: config.tools.geocoding.default_country_code.clone(),
            timeout_secs: config.tools.geocoding.timeout_secs,
        },
        WeatherConfig {
            endpoint: config.tools.weather.endpoint.clone(),
            api_key: config.tools.weather.api_key().unwrap_or_default(),
            timeout_secs: config.tools.weather.timeout_secs,
        },
        RoutingConfig {
            endpoint: config.tools.routing.endpoint.clone(),
            profile: config.tools.routing.profile.clone(),
            timeout_secs: config.tools.routing.timeout_secs,
        },
    )?;
    Ok(registry)
}

fn init_tracing(config: &VeloplanConfig, verbose: bool) {
    let fallback_level = if verbose {
        "debug"
    } else {
        match config
            .observability
            .log_level
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => "info",
        }
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_query_and_flags() {
        let cli = Cli::parse_from([
            "veloplan",
            "--config",
            "configs/veloplan.yaml",
            "--verbose",
            "from",
            "Savar",
            "to",
            "Dhanmondi",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.query.join(" "), "from Savar to Dhanmondi");
        assert_eq!(cli.config, PathBuf::from("configs/veloplan.yaml"));
    }

    #[test]
    fn test_cli_requires_a_query() {
        assert!(Cli::try_parse_from(["veloplan"]).is_err());
    }

    #[test]
    fn test_registry_builds_from_default_config() {
        let registry = build_registry(&VeloplanConfig::default()).unwrap();
        assert_eq!(registry.catalog().len(), 3);
    }
}
