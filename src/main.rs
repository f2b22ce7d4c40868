use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use premium_watch::changes::Changeset;
use premium_watch::config::{Config, ConfigOverrides};
use premium_watch::mapping::load_mapping;
use premium_watch::output::csv::{changeset_to_csv, snapshots_to_csv, summary_to_csv};
use premium_watch::output::json::{render_json, render_snapshots_json, SnapshotRow};
use premium_watch::output::table::{
    render_changeset_table, render_snapshot_table, render_summary_table,
};
use premium_watch::pipeline::{preview, run_job, RunSummary};
use premium_watch::pricing::HttpPricingSource;
use premium_watch::snapshot::store::SnapshotStore;
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "premium-watch",
    about = "Tracks dealer spreads and premiums and mails what changed"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Product mapping JSON file.
    #[arg(short, long)]
    mapping: Option<String>,
    /// SQLite database holding the current readings.
    #[arg(long)]
    db: Option<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the job once.
    Run {
        /// Print the report instead of mailing it.
        #[arg(long)]
        dry_run: bool,
    },
    Watch {
        #[arg(long, default_value_t = 3600)]
        interval_secs: u64,
        #[arg(long, default_value_t = 1)]
        iterations: u32,
        #[arg(long)]
        dry_run: bool,
    },
    /// Fetch and diff against the stored readings without saving or sending.
    Preview,
    /// Print the stored readings.
    Snapshots,
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[derive(Serialize)]
struct PreviewView<'a> {
    snapshots: Vec<SnapshotRow<'a>>,
    changes: &'a Changeset,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides::from_env());
    config.apply_overrides(ConfigOverrides {
        mapping_path: cli.mapping.clone(),
        db_path: cli.db.clone(),
        ..ConfigOverrides::default()
    });

    match &cli.command {
        Commands::Run { dry_run } => {
            let summary = run_job(&config, *dry_run).await?;
            print_summary(&summary, cli.output)?;
        }
        Commands::Watch {
            interval_secs,
            iterations,
            dry_run,
        } => {
            run_watch_loop(&config, *interval_secs, *iterations, *dry_run, cli.output).await?;
        }
        Commands::Preview => {
            let mappings = load_mapping(&config.resolved_mapping_path())?;
            let source = HttpPricingSource::new(&config.pricing)?;
            let store = SnapshotStore::open(&config.resolved_db_path())?;
            let result = preview(&mappings, &source, &store).await?;
            match cli.output {
                OutputFormat::Table => {
                    println!("{}", render_snapshot_table(&result.snapshots));
                    println!("{}", render_changeset_table(&result.changeset));
                }
                OutputFormat::Json => {
                    let view = PreviewView {
                        snapshots: result.snapshots.iter().map(SnapshotRow::from).collect(),
                        changes: &result.changeset,
                    };
                    println!("{}", render_json(&view)?);
                }
                OutputFormat::Csv => {
                    print!("{}", snapshots_to_csv(&result.snapshots)?);
                    println!();
                    print!("{}", changeset_to_csv(&result.changeset)?);
                }
            }
        }
        Commands::Snapshots => {
            let store = SnapshotStore::open(&config.resolved_db_path())?;
            let snapshots = store.load_all()?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_snapshot_table(&snapshots)),
                OutputFormat::Json => println!("{}", render_snapshots_json(&snapshots)?),
                OutputFormat::Csv => print!("{}", snapshots_to_csv(&snapshots)?),
            }
        }
        Commands::Config { .. } => {
            return handle_config_command(&cli.command, &config, &config_path);
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Table => println!("{}", render_summary_table(summary)),
        OutputFormat::Json => println!("{}", render_json(summary)?),
        OutputFormat::Csv => print!("{}", summary_to_csv(summary)?),
    }
    Ok(())
}

fn handle_config_command(command: &Commands, config: &Config, config_path: &PathBuf) -> Result<()> {
    let Commands::Config { init, show } = command else {
        return Ok(());
    };
    if *init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if *show || !*init {
        println!("{}", render_json(&config.redacted())?);
    }
    Ok(())
}

async fn run_watch_loop(
    config: &Config,
    interval_secs: u64,
    iterations: u32,
    dry_run: bool,
    output: OutputFormat,
) -> Result<()> {
    let interval = Duration::from_secs(interval_secs.max(1));
    let total_iterations = iterations.max(1);
    for i in 0..total_iterations {
        info!("watch iteration {}", i + 1);
        match run_job(config, dry_run).await {
            Ok(summary) => print_summary(&summary, output)?,
            Err(err) => error!("watch iteration {} failed: {err:#}", i + 1),
        }
        if i + 1 < total_iterations {
            tokio::time::sleep(interval).await;
        }
    }
    Ok(())
}
