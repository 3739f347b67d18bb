use annal::config::Config;
use annal::site::Site;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process;

/// Regenerates a static site from a dated, tagged markdown log.
#[derive(Parser)]
#[command(name = "annal", version, about)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long)]
    config: PathBuf,
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("loading configuration '{}'", cli.config.display()))?;

    Site::new(config).regenerate().context("regenerating site")?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Err(err) = run() {
        eprintln!("annal: {:#}", err);
        process::exit(1);
    }
}
