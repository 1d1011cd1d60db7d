use anyhow::Result;
use chrono::Utc;
use log::error;
use std::path::Path;

mod args;
use args::Args;

mod channels;
use channels::{default_channels, load_channels};

mod csv;
mod error;
mod fetch;
use fetch::HttpFetcher;

mod orchestrator;
mod programme;
mod sources;
mod time;
mod xmltv;

async fn run(args: &Args) -> Result<()> {
    let channels = match &args.channels {
        Some(path) => load_channels(Path::new(path))?,
        None => default_channels(),
    };
    let fetcher = HttpFetcher::new(args.timeout)?;
    orchestrator::run(&fetcher, &channels, Path::new(&args.output_dir), Utc::now()).await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();

    // Per-channel failures are already logged; the exit status stays 0.
    if let Err(e) = run(&args).await {
        error!("{e:#}");
    }
}
