use anyhow::Context;
use clap::Parser;
use fleet_config::ConfigLoader;
use fleet_server::{app, logging};
use fleet_shutdown::SignalHandler;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::new(&args.config)
        .load()
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.print_config {
        println!("{}", config.to_toml_string()?);
        return Ok(());
    }

    logging::init_logging(&config.logging)?;
    info!("Loaded config: {}", args.config.display());

    let handler = SignalHandler::default();
    let listener = handler.clone();
    tokio::spawn(async move {
        if let Err(e) = listener.wait_for_system_signal().await {
            error!(error = %e, "Failed to install signal handlers, shutting down");
            listener.trigger_shutdown();
        }
    });

    let report = app::run(config, handler).await?;
    info!(
        signal = ?report.signal,
        phase = ?report.phase,
        elapsed = ?report.elapsed,
        "Fleet control plane stopped"
    );

    Ok(())
}
