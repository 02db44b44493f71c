//! 'main' for the Harbour snapshot CLI
//! Crawls an account ledger and turns it into a verified genesis fixture

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use config::{Config, Environment, File};
use harbour_common::configuration::GenesisConfig;
use harbour_common::persist::read_document;
use harbour_common::snapshot::{AccountsDump, GenesisSnapshot};
use harbour_module_account_crawler::{Crawler, CrawlerConfig, SubscanClient};
use harbour_module_genesis_assembler::{
    convert, inspect, load_raw_dump, write_converted, write_genesis, write_raw_dump,
    GenesisAssembler,
};
use std::path::PathBuf;
use tracing::{info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

mod output;

use output::OutputConfig;

const DEFAULT_LOG_FILTER: &str = "info,reqwest=warn,hyper=warn,hyper_util=warn";

#[derive(Debug, Parser)]
#[command(name = "harbour-snapshot")]
#[command(about = "Crawl an account ledger into a verified genesis balances fixture")]
struct Args {
    /// Configuration files; later files override earlier ones
    #[arg(long, value_name = "PATH", default_values_t = vec!["harbour.toml".to_string()])]
    config: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Crawl every account and save the raw dump
    Crawl,

    /// Build the genesis fixture, from a fresh crawl or a saved raw dump
    Assemble {
        #[arg(long, value_name = "RAW_DUMP")]
        from: Option<PathBuf>,
    },

    /// Re-key a genesis fixture with addresses of the configured network
    Convert {
        #[arg(long, value_name = "FIXTURE")]
        input: PathBuf,
    },

    /// Report record count and total issuance of a genesis fixture
    Inspect {
        #[arg(long, value_name = "FIXTURE")]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(&args.config)?;
    let output = OutputConfig::try_load(&config)?;

    match args.command {
        Command::Crawl => {
            crawl(&config, &output).instrument(info_span!("crawl")).await?;
        }
        Command::Assemble { from } => {
            assemble(&config, &output, from).instrument(info_span!("assemble")).await?;
        }
        Command::Convert { input } => {
            let genesis = GenesisConfig::try_load(&config)?;
            let snapshot: GenesisSnapshot = read_document(&input).await?;
            let converted = convert(&snapshot, &genesis.codec());
            let path = output.converted_path(&input, &now());
            write_converted(&path, &converted).await?;
            println!("{}", path.display());
        }
        Command::Inspect { input } => {
            let summary = inspect(&input).await?;
            println!(
                "{}: {} balances, total issuance {}",
                input.display(),
                summary.records,
                summary.total_issuance
            );
        }
    }

    Ok(())
}

fn load_config(files: &[String]) -> Result<Config> {
    let mut builder = Config::builder();
    for file in files {
        builder = builder.add_source(File::with_name(file).required(false));
    }
    builder
        .add_source(Environment::with_prefix("HARBOUR").prefix_separator("_").separator("__"))
        .build()
        .context("Failed to load configuration")
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

async fn crawl(config: &Config, output: &OutputConfig) -> Result<(AccountsDump, PathBuf)> {
    let crawler_config = CrawlerConfig::try_load(config)?;
    let client = SubscanClient::new(&crawler_config)?;
    info!(
        "Crawling {} with {} rows per page, one request every {:?}",
        client.url(),
        crawler_config.rows_per_page,
        crawler_config.request_interval()
    );

    let crawler = Crawler::new(client, crawler_config.rows_per_page)?;
    let state = crawler.crawl_with_retries(crawler_config.max_attempts).await?;

    let path = output.raw_dump_path(&crawler_config, &now());
    let dump = write_raw_dump(&path, &state).await?;
    println!("{}", path.display());
    Ok((dump, path))
}

async fn assemble(config: &Config, output: &OutputConfig, from: Option<PathBuf>) -> Result<()> {
    // Fail on bad genesis parameters before spending time on a crawl
    let genesis = GenesisConfig::try_load(config)?;
    let assembler = GenesisAssembler::from_config(&genesis)?;

    let (dump, source) = match from {
        Some(path) => (load_raw_dump(&path).await?, path),
        None => crawl(config, output).await?,
    };

    let snapshot = assembler.assemble(&dump.accounts)?;
    let path = output.genesis_path(&source, &now());
    write_genesis(&path, &snapshot).await?;
    info!(
        "Genesis fixture for network {} holds {} balances, total issuance {}",
        genesis.network_id,
        snapshot.len(),
        snapshot.total_issuance()
    );
    println!("{}", path.display());
    Ok(())
}
