use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jobroller_import::config::{Config, ConfigOverrides};
use jobroller_import::error::Result;
use jobroller_import::geocode::DisabledGeocoder;
use jobroller_import::importer::{JobrollerImporter, Registry};
use jobroller_import::output::Format;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "jobroller-import",
    version,
    about = "Convert JobRoller job listings to WP Job Manager format. BACKUP your data first!"
)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "json")]
    format: Format,
    /// Shorthand for --format pretty
    #[arg(long, global = true, hide = true)]
    pretty: bool,
    /// Config file (default: ./jobroller-import.yaml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Site database, overrides `database` from the config file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Table prefix, overrides `table_prefix`
    #[arg(long, global = true)]
    table_prefix: Option<String>,
    /// UTC offset for expiry dates, overrides `timezone`
    #[arg(long, global = true, allow_hyphen_values = true)]
    timezone: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert all published JobRoller jobs and rename their taxonomies
    Run,
    /// List registered importers
    Importers,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jobroller_import=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Composition root: every importer this binary ships is registered here.
fn build_registry(config: &Config) -> Result<Registry> {
    let mut registry = Registry::new();
    registry.register(Box::new(JobrollerImporter::new(
        Box::new(DisabledGeocoder),
        config.utc_offset()?,
    )));
    Ok(registry)
}

fn run(cli: Cli, format: Format) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let mut config = Config::load(cli.config.as_deref(), &cwd)?;
    config.apply(ConfigOverrides {
        database: cli.db,
        table_prefix: cli.table_prefix,
        timezone: cli.timezone,
    });
    let registry = build_registry(&config)?;

    match cli.command {
        Commands::Run => jobroller_import::commands::run::run(&registry, &config, format).map(|_| ()),
        Commands::Importers => jobroller_import::commands::importers::run(&registry, format),
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let format = if cli.pretty {
        Format::Pretty
    } else {
        cli.format
    };
    if let Err(e) = run(cli, format) {
        match format {
            Format::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "error": e.code(),
                        "message": e.to_string()
                    })
                );
            }
            _ => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}
