use clap::{Parser, Subcommand};
use std::path::PathBuf;

use scrap_market::config::Config;
use scrap_market::prices::initialize_default_prices;
use scrap_market::serve::{open_store, serve_market};
use scrap_market::DynError;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scrap material marketplace: listing submissions and admin dashboard")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the submission form, admin dashboard and JSON API via HTTP
    Serve {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides config file)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Insert the default scrap price list where prices are missing
    SeedPrices {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<(), DynError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match args.command {
        Command::Serve { config, port } => {
            let config = Config::load(config.as_deref())?;
            serve_market(config, port)
        }
        Command::SeedPrices { config } => {
            let config = Config::load(config.as_deref())?;
            seed_prices(config)
        }
    }
}

fn seed_prices(config: Config) -> Result<(), DynError> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let store = open_store(&config).await?;
        let added = initialize_default_prices(&store).await?;
        println!("Initialized {} default prices", added);
        Ok::<(), DynError>(())
    })
}
