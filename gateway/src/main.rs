mod config;
mod logging;
mod statsd;

use clap::Parser;
use config::{Config, ConfigError};
use forwarder::errors::ForwarderError;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(about = "Forwards requests to the first healthy region cluster")]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, env = "CONFIG_FILE", default_value = "./config/config.yml")]
    config: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Metrics(#[from] statsd::MetricsError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Forwarder(#[from] ForwarderError),
}

fn main() {
    let cli = Cli::parse();

    // Logging is not set up until the config is read
    let config = match Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {e}", cli.config.display());
            process::exit(1);
        }
    };

    if let Err(e) = run(config) {
        eprintln!("gateway exited with error: {e}");
        process::exit(1);
    }
}

fn run(config: Config) -> Result<(), GatewayError> {
    // Held until the runtime shuts down so pending sentry events are flushed
    let _sentry_guard = logging::init(&config.common.logging);

    if let Some(metrics_config) = &config.common.metrics {
        statsd::init(metrics_config)
            .inspect_err(|e| tracing::error!(error = %e, "could not set up metrics"))?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        tracing::info!(region = %config.regions.name, "starting gateway");

        tokio::select! {
            result = forwarder::run(config.forwarder, config.monitor, config.regions) => {
                result.inspect_err(|e| tracing::error!(error = %e, "gateway failed"))?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received ctrl-c, shutting down");
            }
        }
        Ok::<_, GatewayError>(())
    })
}
