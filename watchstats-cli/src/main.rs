use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use watchstats::config::{parse_config, Config};
use watchstats::entry;
use watchstats::validation;
use watchstats::{Store, ViewName};
use std::path::{Path, PathBuf};
use std::process;

/// watchstats CLI: summarize an IMDb watchlist export from the command line
#[derive(Parser)]
#[command(name = "watchstats", version, about)]
struct Cli {
    /// Config file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Genre taxonomy JSON; overrides the config file
    #[arg(long)]
    genres: Option<PathBuf>,

    /// Evaluate the watchlist age as of this date (YYYY-MM-DD, default: today)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,

    /// Output format
    #[arg(long, default_value = "yaml")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Compute every view of an export
    Analyze {
        /// Watchlist CSV export
        csv: PathBuf,
    },

    /// Compute a single view (see `views` for names)
    View {
        /// View name
        name: String,
        /// Watchlist CSV export
        csv: PathBuf,
    },

    /// Check an export's columns without aggregating
    Validate {
        /// Watchlist CSV export
        csv: PathBuf,
    },

    /// Show snapshot info, taxonomy size and available views
    Status {
        /// Watchlist CSV export
        csv: PathBuf,
    },

    /// List the available views
    Views,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{s}' (expected YYYY-MM-DD): {e}"))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let today = cli
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    match &cli.command {
        Command::Analyze { csv } => {
            let store = open_store(&cli, csv)?;
            let report = store.report(today)?;
            print_output(&serde_json::to_value(report)?, &cli.format)?;
        }

        Command::View { name, csv } => {
            let view: ViewName = name.parse()?;
            let store = open_store(&cli, csv)?;
            let result = store.view(view, today)?;
            print_output(&serde_json::to_value(result)?, &cli.format)?;
        }

        Command::Validate { csv } => {
            entry::ensure_csv_extension(csv)?;
            let rows = entry::read_rows_from_path(csv)?;
            let result = validation::validate_rows(&rows);
            print_output(
                &serde_json::json!({
                    "valid": result.is_ok(),
                    "rows": rows.len(),
                    "errors": result.errors,
                    "warnings": result.warnings,
                }),
                &cli.format,
            )?;
            if !result.is_ok() {
                return Err("Export is not a compatible watchlist".into());
            }
        }

        Command::Status { csv } => {
            let store = open_store(&cli, csv)?;
            print_output(&store.status(), &cli.format)?;
        }

        Command::Views => {
            let views: Vec<_> = ViewName::ALL
                .iter()
                .map(|v| serde_json::json!({ "name": v.as_str(), "description": v.describe() }))
                .collect();
            print_output(&serde_json::Value::Array(views), &cli.format)?;
        }
    }

    Ok(())
}

/// Merge the config file with command-line overrides and open the store.
fn open_store(cli: &Cli, csv: &Path) -> Result<Store, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => parse_config(path)?,
        None => Config::default(),
    };
    if cli.genres.is_some() {
        config.genres = cli.genres.clone();
    }
    config.watchlist = Some(csv.to_path_buf());

    log::debug!("Effective config: {config:?}");
    Ok(Store::open(config)?)
}

fn print_output(
    value: &serde_json::Value,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(value)?);
        }
    }
    Ok(())
}
