//! Command line interface
//!
//! Every command scores one subject from a telemetry file and prints JSON to
//! stdout. Logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Serialize;
use telematics_common::{DemographicProfile, ScoreQuery, UsageProfile};
use telematics_pricing::{
    CompareRequest, InMemoryDemographics, PricingCalculator, PricingService, QuoteRequest,
};
use telematics_scoring::{
    DisabledPredictor, HeuristicPredictor, InMemoryTelemetrySource, ResultCache, RiskPredictor,
    ScoringMetrics, ScoringService, SubprocessPredictor,
};
use tracing::info;

use crate::config::EngineConfig;
use crate::input;

#[derive(Parser, Debug)]
#[command(
    name = "telematics-engine",
    about = "Score driver risk from telemetry and price usage-based premiums",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Blended risk score for the subject
    Score {
        /// Rules-only score, no ML stage
        #[arg(long)]
        traditional: bool,
        /// Include driving recommendations
        #[arg(long, conflicts_with = "traditional")]
        recommendations: bool,
    },
    /// Weekly risk trend over the lookback
    Trend,
    /// Aggregate driving statistics
    Stats,
    /// Monthly premium quote for one coverage tier
    Quote {
        /// Coverage tier (basic, standard, full, premium)
        #[arg(long)]
        coverage: Option<String>,
        #[command(flatten)]
        usage: UsageArgs,
    },
    /// Quotes for several tiers with a recommendation
    Compare {
        /// Coverage tier, repeatable; all tiers when omitted
        #[arg(long = "coverage")]
        coverages: Vec<String>,
        #[command(flatten)]
        usage: UsageArgs,
    },
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// Telemetry JSON: a record array or a map of subject id to records
    #[arg(long, global = true)]
    pub telemetry: Option<PathBuf>,
    /// Subject to score
    #[arg(long, global = true, default_value = "cli")]
    pub subject: String,
    /// Lookback window in days
    #[arg(long, global = true, default_value_t = 30)]
    pub days: i64,
    /// Anchor the window at this instant instead of now (RFC 3339)
    #[arg(long, global = true)]
    pub as_of: Option<DateTime<Utc>>,
    /// Demographics JSON: a map of subject id to profile
    #[arg(long, global = true)]
    pub demographics: Option<PathBuf>,
    /// Date of birth for the subject (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub dob: Option<NaiveDate>,
    /// Licence issue date for the subject (YYYY-MM-DD)
    #[arg(long, global = true, requires = "dob")]
    pub license_date: Option<NaiveDate>,
    /// Print Prometheus metrics to stderr after the command
    #[arg(long, global = true)]
    pub metrics: bool,
}

#[derive(Args, Debug, Default)]
pub struct UsageArgs {
    /// Annual mileage; derived from telemetry when omitted
    #[arg(long)]
    pub annual_mileage: Option<f64>,
    /// Night driving percentage; derived from telemetry when omitted
    #[arg(long)]
    pub night_pct: Option<f64>,
}

impl UsageArgs {
    fn profile(&self) -> Option<UsageProfile> {
        if self.annual_mileage.is_none() && self.night_pct.is_none() {
            return None;
        }
        Some(UsageProfile::new(self.annual_mileage, self.night_pct))
    }
}

/// Wired services for one invocation
struct Engine {
    scoring: Arc<ScoringService>,
    pricing: PricingService,
    registry: Registry,
}

impl Engine {
    fn build(config: &EngineConfig, args: &InputArgs) -> Result<Self> {
        let mut telemetry = InMemoryTelemetrySource::new();
        if let Some(as_of) = args.as_of {
            telemetry = telemetry.with_reference_time(as_of);
        }
        if let Some(path) = &args.telemetry {
            input::read_telemetry(path, &telemetry, &args.subject)?;
        }

        let demographics = InMemoryDemographics::new();
        if let Some(path) = &args.demographics {
            input::read_demographics(path, &demographics)?;
        }
        if let Some(dob) = args.dob {
            demographics.insert(
                args.subject.clone(),
                DemographicProfile::new(dob, args.license_date),
            );
        }

        let registry = Registry::new();
        let metrics = Arc::new(ScoringMetrics::new()?);
        metrics.register(&registry)?;

        let scoring = Arc::new(
            ScoringService::new(
                config.scoring.clone(),
                Arc::new(telemetry),
                predictor(config),
                Arc::new(ResultCache::new()),
            )
            .with_metrics(metrics),
        );

        let mut pricing = PricingService::new(
            PricingCalculator::new(config.pricing.clone()),
            scoring.clone(),
            Arc::new(demographics),
        );
        if let Some(as_of) = args.as_of {
            pricing = pricing.with_reference_date(as_of.date_naive());
        }

        Ok(Self {
            scoring,
            pricing,
            registry,
        })
    }

    fn dump_metrics(&self) -> Result<()> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .context("failed to encode metrics")?;
        eprint!("{}", String::from_utf8_lossy(&buffer));
        Ok(())
    }
}

/// Predictor selected by configuration
fn predictor(config: &EngineConfig) -> Arc<dyn RiskPredictor> {
    if config.predictor.disabled {
        info!("ML stage disabled");
        return Arc::new(DisabledPredictor);
    }

    match &config.predictor.command {
        Some(command) => {
            info!(command = %command, "Using external ML predictor");
            Arc::new(
                SubprocessPredictor::new(command)
                    .with_args(config.predictor.args.clone())
                    .with_timeout(config.predictor_timeout()),
            )
        }
        None => {
            info!("Using in-process heuristic predictor");
            Arc::new(HeuristicPredictor::new())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run(cli: Cli, config: EngineConfig) -> Result<()> {
    let engine = Engine::build(&config, &cli.input)?;
    let query = ScoreQuery::new(cli.input.subject.clone(), cli.input.days);

    match cli.command {
        Command::Score {
            traditional: true, ..
        } => print_json(&engine.scoring.traditional_score(&query).await?)?,
        Command::Score {
            recommendations: true,
            ..
        } => print_json(&engine.scoring.risk_analysis(&query).await?)?,
        Command::Score { .. } => print_json(&engine.scoring.risk_score(&query).await?)?,
        Command::Trend => print_json(&engine.scoring.risk_trend(&query).await?)?,
        Command::Stats => print_json(&engine.scoring.driving_stats(&query).await?)?,
        Command::Quote { coverage, usage } => {
            let mut request = QuoteRequest::new(query.subject_id, query.window_days);
            if let Some(coverage) = coverage {
                request = request.with_coverage(coverage);
            }
            if let Some(profile) = usage.profile() {
                request = request.with_usage(profile);
            }
            print_json(&engine.pricing.quote(&request).await?)?
        }
        Command::Compare { coverages, usage } => {
            let mut request = CompareRequest::new(query.subject_id, query.window_days)
                .with_coverage_types(coverages);
            if let Some(profile) = usage.profile() {
                request = request.with_usage(profile);
            }
            print_json(&engine.pricing.compare(&request).await?)?
        }
    }

    if cli.input.metrics {
        engine.dump_metrics()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_compare() {
        let cli = Cli::try_parse_from([
            "telematics-engine",
            "compare",
            "--coverage",
            "basic",
            "--coverage",
            "full",
            "--telemetry",
            "drive.json",
            "--days",
            "14",
        ])
        .unwrap();

        assert_eq!(cli.input.days, 14);
        assert_eq!(cli.input.subject, "cli");
        match cli.command {
            Command::Compare { coverages, usage } => {
                assert_eq!(coverages, vec!["basic", "full"]);
                assert!(usage.profile().is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_usage_args() {
        let usage = UsageArgs {
            annual_mileage: Some(4_000.0),
            night_pct: None,
        };
        assert_eq!(usage.profile(), Some(UsageProfile::new(Some(4_000.0), None)));
    }

    #[test]
    fn test_license_requires_dob() {
        let parsed = Cli::try_parse_from([
            "telematics-engine",
            "quote",
            "--license-date",
            "2010-01-01",
        ]);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn test_quote_without_telemetry_is_neutral() {
        let cli = Cli::try_parse_from(["telematics-engine", "quote", "--coverage", "basic"]).unwrap();
        let config = EngineConfig::default();
        let engine = Engine::build(&config, &cli.input).unwrap();

        let quote = engine
            .pricing
            .quote(&QuoteRequest::new("cli", 30).with_coverage("basic"))
            .await
            .unwrap();
        assert_eq!(quote.risk_score, 50);
        assert_eq!(quote.final_premium, rust_decimal::Decimal::from(85));
        assert_eq!(engine.scoring.cache().len(), 1);
    }
}
