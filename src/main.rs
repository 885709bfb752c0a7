//! `riverdata` command-line entry point.
//!
//! `fetch` runs the pipeline over the registry and writes the snapshot,
//! `parks` prints the park view of a stored snapshot, and `sites` lists the
//! configured registry.

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use riverdata_service::config::AppConfig;
use riverdata_service::ingest::usgs::UsgsClient;
use riverdata_service::logging::{self, DataSource};
use riverdata_service::parks;
use riverdata_service::pipeline;

#[derive(Parser)]
#[command(name = "riverdata")]
#[command(about = "Fetch USGS river gauge data and record trend statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every registry site and write the snapshot
    Fetch {
        /// Configuration file (defaults to ./riverdata.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Snapshot path, overriding the configuration
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print park statistics from a stored snapshot as JSON
    Parks {
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Snapshot to read, overriding the configured output path
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// List the configured sites
    Sites {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Fetch {
        config: None,
        output: None,
    });

    match command {
        Commands::Fetch { config, output } => run_fetch(load_config(config)?, output),
        Commands::Parks { config, input } => run_parks(load_config(config)?, input),
        Commands::Sites { config } => run_sites(load_config(config)?),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<AppConfig, Box<dyn Error>> {
    let config = AppConfig::load(path.as_deref())?;
    logging::init(&config.logging.level, config.logging.file.as_deref())?;
    Ok(config)
}

fn run_fetch(config: AppConfig, output: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let registry = config.registry()?;
    let output = output.unwrap_or_else(|| config.output.path.clone());

    let client = UsgsClient::new(config.fetch_options())?;
    logging::info(
        DataSource::System,
        None,
        &format!(
            "Fetching {} site(s) from {}",
            registry.sites().len(),
            client.options().base_url
        ),
    );

    if let Err(e) = pipeline::fetch_and_store(&client, &registry, &config.pipeline_options(), &output) {
        logging::error(DataSource::System, None, &e.to_string());
        return Err(e.into());
    }

    logging::info(
        DataSource::Storage,
        None,
        &format!("Snapshot written to {}", output.display()),
    );
    Ok(())
}

fn run_parks(config: AppConfig, input: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let registry = config.registry()?;
    let input = input.unwrap_or_else(|| config.output.path.clone());
    let parks = parks::read_park_statistics(&input, registry.parks())?;
    println!("{}", serde_json::to_string_pretty(&parks)?);
    Ok(())
}

fn run_sites(config: AppConfig) -> Result<(), Box<dyn Error>> {
    let registry = config.registry()?;
    for site in registry.sites() {
        let mut features = Vec::new();
        if site.feature_discharge {
            features.push("discharge");
        }
        if site.feature_temperature {
            features.push("temperature");
        }
        println!(
            "{}  {:<2}  {:<16}  {}  [{}]",
            site.site_no,
            site.region,
            site.timezone,
            site.name_short,
            features.join(", ")
        );
    }
    for park in registry.parks() {
        println!(
            "park: {} ({}) discharge={} temperature={}",
            park.name, park.region, park.site_no_discharge, park.site_no_temperature
        );
    }
    Ok(())
}
