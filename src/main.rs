use clap::Parser;
use log::{trace, LevelFilter};

use wertigo::{
    commands::{self, Cli, Context},
    config::Config,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off"));
    if cli.verbose {
        logger.filter_module("wertigo", LevelFilter::Trace);
    } else if std::env::var_os("RUST_LOG").is_none() {
        logger.filter_module("wertigo", LevelFilter::Warn);
    }
    logger.init();
    trace!("Logger init with level TRACE.");

    let config = Config::load();
    let ctx = match Context::new(config) {
        Ok(ctx) => ctx,
        Err(why) => {
            eprintln!("Error creating client: {why}");
            std::process::exit(1);
        }
    };

    if let Err(why) = commands::run(&ctx, cli.command).await {
        eprintln!("{why}");
        std::process::exit(1);
    }
}
