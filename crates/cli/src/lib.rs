pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use bakecast_core::config::{AppConfig, LoadOptions, LogFormat};
use bakecast_core::domain::recipe::Language;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use commands::forecast::ForecastArgs;
use commands::generate::GenerateArgs;
use commands::predict::PredictArgs;
use commands::train::TrainArgs;

#[derive(Debug, Parser)]
#[command(
    name = "bakecast",
    about = "Bakecast operator CLI",
    long_about = "Train the bakery trend model, score segments, and generate trend-aware recipes.",
    after_help = "Examples:\n  bakecast train --data records.json\n  bakecast predict --segment gen_z --date 2025-10-15\n  bakecast generate --segment gen_z --trend matcha\n  bakecast forecast --segment gen_z --horizon-days 45\n  bakecast doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a bakecast.toml configuration file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Train the trend model from historical records and save the artifact bundle")]
    Train {
        #[arg(long, help = "JSON array of historical engagement records")]
        data: PathBuf,
    },
    #[command(about = "Score trend strength for a segment on a date")]
    Predict {
        #[arg(long)]
        segment: String,
        #[arg(long, help = "Date as YYYY-MM-DD (defaults to today)")]
        date: Option<NaiveDate>,
    },
    #[command(about = "Generate a recipe and print it with the stage trace")]
    Generate {
        #[arg(long)]
        segment: String,
        #[arg(long, help = "Date as YYYY-MM-DD (defaults to today)")]
        date: Option<NaiveDate>,
        #[arg(long)]
        trend: Option<String>,
        #[arg(long)]
        occasion: Option<String>,
        #[arg(long, help = "Comma separated ingredients to build the recipe around")]
        ingredients: Option<String>,
        #[arg(long, help = "Output language (vi|en)")]
        language: Option<Language>,
    },
    #[command(about = "Scan upcoming weeks, rank events and generate a scored recipe for each")]
    Forecast {
        #[arg(long)]
        segment: String,
        #[arg(long, help = "First scan date as YYYY-MM-DD (defaults to today)")]
        start: Option<NaiveDate>,
        #[arg(long, default_value_t = 30, help = "Days to scan, clamped to 7..=90")]
        horizon_days: u32,
        #[arg(long, default_value_t = 3, help = "Number of events to generate recipes for")]
        top_k: usize,
        #[arg(long, help = "Output language (vi|en)")]
        language: Option<Language>,
        #[arg(long, help = "Leave market insights out of the viral score")]
        skip_market_analysis: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, artifact bundle, threshold document and context tables")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

/// Installs the fmt subscriber on stderr so stdout stays machine-readable.
pub fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = || LoadOptions { config_path: cli.config.clone(), ..LoadOptions::default() };

    if let Ok(config) = AppConfig::load(options()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Train { data } => commands::train::run(&TrainArgs { data }, options()),
        Command::Predict { segment, date } => {
            commands::predict::run(&PredictArgs { segment, date }, options())
        }
        Command::Generate { segment, date, trend, occasion, ingredients, language } => {
            commands::generate::run(
                &GenerateArgs { segment, date, trend, occasion, ingredients, language },
                options(),
            )
        }
        Command::Forecast { segment, start, horizon_days, top_k, language, skip_market_analysis } => {
            commands::forecast::run(
                &ForecastArgs { segment, start, horizon_days, top_k, language, skip_market_analysis },
                options(),
            )
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(options()) }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json, options()) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
