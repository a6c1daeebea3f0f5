pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Args, Parser, Subcommand};
use revive_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing_subscriber::EnvFilter;

use crate::commands::impact::{ImpactArgs, SelectionMode};
use crate::commands::report::ReportArgs;
use crate::commands::{DatasetArgs, ZoneArgs};

#[derive(Debug, Parser)]
#[command(
    name = "revive",
    about = "Inactive SKU lost-GMV estimation",
    long_about = "Estimate GMV lost to inactive SKUs per zone and project the monthly impact of \
                  reactivating a selection of them.",
    after_help = "Examples:\n  revive zones --input skus.csv\n  revive report --zone Salvador \
                  --brand Omo\n  revive impact --zone Salvador --top 10 --activation-export \
                  ean_reativar_salvador.csv\n  revive config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct DatasetOpts {
    #[arg(long, help = "Inactive SKU CSV export (falls back to dataset.path)")]
    input: Option<PathBuf>,
    #[arg(long, value_name = "YYYY-MM-DD", help = "Date recency is measured against")]
    reference_date: Option<String>,
}

#[derive(Debug, Args)]
struct ZoneOpts {
    #[arg(long)]
    zone: String,
    #[arg(long)]
    brand: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List zones with SKU counts and estimated lost GMV")]
    Zones {
        #[command(flatten)]
        dataset: DatasetOpts,
    },
    #[command(about = "Rank a zone's inactive SKUs by estimated lost GMV")]
    Report {
        #[command(flatten)]
        zone: ZoneOpts,
        #[command(flatten)]
        dataset: DatasetOpts,
        #[arg(long, help = "Write the ranked zone table to this CSV path")]
        export: Option<PathBuf>,
    },
    #[command(about = "Project monthly GMV from reactivating a selection of SKUs")]
    #[command(group(ArgGroup::new("selection").required(true).args(["top", "all", "select"])))]
    Impact {
        #[command(flatten)]
        zone: ZoneOpts,
        #[command(flatten)]
        dataset: DatasetOpts,
        #[arg(long, num_args = 0..=1, value_name = "N", help = "Select the N highest losses")]
        top: Option<Option<usize>>,
        #[arg(long, help = "Select every SKU in the zone view")]
        all: bool,
        #[arg(long, value_name = "EANS", help = "Comma separated EAN list")]
        select: Option<String>,
        #[arg(long, help = "Write the selected EANs to this CSV path")]
        activation_export: Option<PathBuf>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

impl From<DatasetOpts> for DatasetArgs {
    fn from(opts: DatasetOpts) -> Self {
        Self { input: opts.input, reference_date: opts.reference_date }
    }
}

impl From<ZoneOpts> for ZoneArgs {
    fn from(opts: ZoneOpts) -> Self {
        Self { zone: opts.zone, brand: opts.brand }
    }
}

fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level.trim()).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_logging(config: &AppConfig) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(log_filter(&config.logging.level))
        .with_writer(std::io::stderr);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow::anyhow!("failed to install log subscriber: {error}"))
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Config errors are reported by the command itself.
    let logging_config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    if let Err(error) = init_logging(&logging_config) {
        eprintln!("{error:#}");
    }

    let result = match cli.command {
        Command::Zones { dataset } => commands::zones::run(dataset.into()),
        Command::Report { zone, dataset, export } => commands::report::run(ReportArgs {
            dataset: dataset.into(),
            zone: zone.into(),
            export,
        }),
        Command::Impact { zone, dataset, top, all, select, activation_export } => {
            let selection = match (top, all, select) {
                (Some(n), _, _) => SelectionMode::Top(n),
                (None, true, _) => SelectionMode::All,
                (None, false, Some(eans)) => SelectionMode::Eans(eans),
                (None, false, None) => SelectionMode::Top(None),
            };
            commands::impact::run(ImpactArgs {
                dataset: dataset.into(),
                zone: zone.into(),
                selection,
                activation_export,
            })
        }
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
