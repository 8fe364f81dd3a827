//! slidesync-server: WebSocket sync point for presentation controllers and
//! displays.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use slidesync_config::LoggingConfig;
use slidesync_server::{resolve_config, Server, StartupConfig};

#[derive(Parser)]
#[command(
    name = "slidesync-server",
    about = "Keeps presentation controllers and displays on the same slide"
)]
struct Args {
    /// Config file to load instead of the platform default.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on.
    #[arg(short, long)]
    port: Option<u16>,

    /// Log filter used when RUST_LOG is unset (e.g. `debug`, `slidesync=trace`).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let resolved = resolve_config(args.config.as_deref());

    let filter = args
        .log_level
        .as_deref()
        .map(|level| {
            if level.contains('=') {
                level.to_string()
            } else {
                format!("slidesync={level}")
            }
        })
        .unwrap_or_else(|| match &resolved {
            Ok(startup) => startup.config.logging.directive(),
            Err(_) => LoggingConfig::default().directive(),
        });
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .init();

    let StartupConfig {
        mut config,
        fallback,
    } = match resolved {
        Ok(startup) => startup,
        Err(e) => {
            tracing::error!(path = ?args.config, error = %e, "Config file unusable");
            return ExitCode::FAILURE;
        }
    };
    if let Some(e) = fallback {
        tracing::warn!(error = %e, "Default config unusable, falling back to built-in defaults");
    }

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let server = match Server::bind(&config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    match server.serve_with_shutdown(shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server stopped with error");
            ExitCode::FAILURE
        }
    }
}
