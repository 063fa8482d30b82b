//! covid-server - Main Entry Point

use clap::Parser;
use covid_common::init_logging;
use covid_config::ConfigLoader;
use covid_server::{App, ServerResult};
use std::path::PathBuf;
use tracing::{error, info};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level, overrides the configuration file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Address to listen on, overrides the configuration file
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> ServerResult<()> {
    let args = Args::parse();

    let mut config = ConfigLoader::load(args.config.as_deref())?;
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    config.validate()?;

    init_logging(config.logging_config()?)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        source = %config.source.url,
        interval_secs = config.refresh.interval_secs,
        "Starting covid-server"
    );

    let app = App::new(config)?;
    if let Err(e) = app.run().await {
        error!("Server failed: {e}");
        return Err(e);
    }

    Ok(())
}
