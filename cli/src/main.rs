//! CLI entrypoint for Ensemble Broker
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, bail};
use broker_application::AnswerQueryUseCase;
use broker_domain::{CallerId, QueryOptions};
use broker_infrastructure::{ConfigError, ConfigLoader, FileConfig, build_handles};
use broker_presentation::{Cli, ConsoleFormatter, OutputFormat, ProgressReporter};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Throttling identity for requests issued from the command line
const CLI_CALLER: &str = "cli";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    info!("Starting Ensemble Broker");

    let mut config: FileConfig = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(ConfigError::Load)?
    };
    if let Some(floor) = cli.floor {
        config.answer.confidence_floor = floor;
    }
    for issue in config.ensure_valid()? {
        warn!("{}", issue.message);
    }

    let question = match cli.question.as_deref() {
        Some(q) => q,
        None => bail!("Question is required. Use --show-config to inspect configuration."),
    };

    // === Dependency Injection ===
    let (providers, groups) = config.build_registries().map_err(ConfigError::from)?;
    info!(
        "Loaded {} provider(s) and {} mix group(s)",
        providers.len(),
        groups.len()
    );
    let handles = build_handles(&config.providers)?;
    let params = config.answer.to_broker_params();

    let use_case = AnswerQueryUseCase::new(
        Arc::new(providers),
        Arc::new(groups),
        Arc::new(handles),
        &params,
    );

    let options = apply_overrides(use_case.defaults().clone(), &cli);
    let caller = CallerId::new(CLI_CALLER);

    // Execute with or without progress reporting
    let outcome = if cli.quiet {
        use_case.answer(&caller, question, options).await?
    } else {
        let progress = ProgressReporter::new();
        use_case
            .answer_with_progress(&caller, question, options, &progress)
            .await?
    };

    // Output results
    let output = match cli.output {
        OutputFormat::Answer => ConsoleFormatter::format_answer_only(&outcome),
        OutputFormat::Full => ConsoleFormatter::format(question, &outcome),
        OutputFormat::Json => ConsoleFormatter::format_json(&outcome),
    };

    println!("{}", output);

    Ok(())
}

fn apply_overrides(mut options: QueryOptions, cli: &Cli) -> QueryOptions {
    if let Some(budget_ms) = cli.budget_ms {
        options = options.with_time_budget_ms(budget_ms);
    }
    if let Some(limit) = cli.limit {
        options = options.with_cross_request_limit(limit);
    }
    if let Some(lag_ms) = cli.lag_ms {
        options = options.with_cross_request_lag_ms(lag_ms);
    }
    if let Some(priority) = cli.priority {
        options = options.with_priority(priority);
    }
    if let Some(group) = &cli.group {
        options = options.with_mix_group(group.clone());
    }
    options
}
