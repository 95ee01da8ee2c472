use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use profile_gate::ci_group::CiConsole;
use profile_gate::config::{Config, ConfigOverrides};
use profile_gate::constraints::MetricConstraint;
use profile_gate::output::csv::{drift_to_csv, outcomes_to_csv, pipeline_to_csv};
use profile_gate::output::table::{render_drift_table, render_outcomes_table, render_pipeline_table};
use profile_gate::output::{render_json, OutputFormat};
use profile_gate::profile::IoRegistry;
use profile_gate::tasks::{
    run_pipeline, CheckOutcome, ConstraintCheckConfig, ConstraintCheckTask, DriftReportConfig,
    DriftReportTask, Task,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "profile-gate",
    about = "Constraint checks and summary drift reports over stored dataset profiles"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[arg(long)]
    reader: Option<String>,
    #[arg(long)]
    writer: Option<String>,
    #[arg(long = "log-json")]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check constraints such as `a.min>0` or `b.mean=0..125` against a profile.
    Check {
        #[arg(long)]
        profile: String,
        #[arg(long = "constraint", required = true)]
        constraints: Vec<String>,
        #[arg(long = "break-pipeline")]
        break_pipeline: bool,
        #[arg(long = "task-id", default_value = "constraint_check")]
        task_id: String,
    },
    /// Write a summary drift report comparing a target profile to a reference.
    Drift {
        #[arg(long)]
        target: String,
        #[arg(long)]
        reference: String,
        #[arg(long = "out")]
        write_report_path: String,
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long = "task-id", default_value = "drift_report")]
        task_id: String,
    },
    /// Run the checks and drift reports defined in the config file.
    Run,
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        reader: cli.reader.clone(),
        writer: cli.writer.clone(),
        break_pipeline: match &cli.command {
            Commands::Check {
                break_pipeline: true,
                ..
            } => Some(true),
            _ => None,
        },
        relative_threshold: match &cli.command {
            Commands::Drift { threshold, .. } => *threshold,
            _ => None,
        },
    });

    let registry = Arc::new(IoRegistry::with_defaults(config.http_timeout())?);

    match &cli.command {
        Commands::Check {
            profile,
            constraints,
            task_id,
            ..
        } => {
            let parsed = constraints
                .iter()
                .map(|raw| MetricConstraint::from_str(raw).map_err(|e| anyhow!(e)))
                .collect::<Result<Vec<_>>>()?;
            let check_config = ConstraintCheckConfig::for_profile(
                task_id.as_str(),
                profile.as_str(),
                config.storage.reader.as_str(),
                parsed,
                config.constraints.break_pipeline,
                &registry,
            )
            .await?;
            let task = ConstraintCheckTask::from_config(check_config, Arc::clone(&registry))?;
            let outcome = task.run().await?;
            print_check(&outcome, cli.output)?;
        }
        Commands::Drift {
            target,
            reference,
            write_report_path,
            task_id,
            ..
        } => {
            let drift_config = DriftReportConfig::new(
                task_id.as_str(),
                target.as_str(),
                reference.as_str(),
                write_report_path.as_str(),
            )
            .with_reader(config.storage.reader.clone())
            .with_writer(config.storage.writer.clone())
            .with_threshold(config.drift.relative_threshold);
            let report = DriftReportTask::new(drift_config, Arc::clone(&registry))
                .execute()
                .await?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_drift_table(&report)),
                OutputFormat::Json => println!("{}", render_json(&report)?),
                OutputFormat::Csv => print!("{}", drift_to_csv(&report)?),
            }
        }
        Commands::Run => {
            if config.checks.is_empty() && config.drift_reports.is_empty() {
                warn!(config = %config_path.display(), "no checks or drift reports configured");
            }
            let console = CiConsole::stdout(config.ci_environment()).with_color(config.ci.color);
            let summary = run_pipeline(&config, Arc::clone(&registry), &console).await?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_pipeline_table(&summary)),
                OutputFormat::Json => println!("{}", render_json(&summary)?),
                OutputFormat::Csv => print!("{}", pipeline_to_csv(&summary)?),
            }
        }
        Commands::Config { init, show } => {
            if *init {
                Config::write_template(&config_path)?;
                println!("Wrote config template to {}", config_path.display());
            }
            if *show || !*init {
                println!("{}", render_json(&config)?);
            }
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_check(outcome: &CheckOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_outcomes_table(&outcome.outcomes)),
        OutputFormat::Json => println!("{}", render_json(outcome)?),
        OutputFormat::Csv => print!("{}", outcomes_to_csv(&outcome.outcomes)?),
    }
    Ok(())
}
