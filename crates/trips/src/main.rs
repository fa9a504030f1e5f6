//! Trips - entry point
//!
//! Loads configuration, installs logging and serves until SIGINT/SIGTERM.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use trips::build_server;
use trips_config::{ConfigLoader, TripsConfig};
use trips_telemetry::init_logging;

/// Configuration file read when `--config` is not given, if it exists.
const DEFAULT_CONFIG_FILE: &str = "trips.toml";

/// Command-line arguments.
#[derive(Debug)]
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
}

#[derive(Debug)]
enum Command {
    Run(Args),
    Help,
    Version,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Command> {
    let mut config = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config requires a path")?;
                config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            other => anyhow::bail!("unknown argument: {other} (use --help for usage)"),
        }
    }

    Ok(Command::Run(Args { config }))
}

fn print_help() {
    println!(
        r"trips - trip endpoint resolver

USAGE:
    trips [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Configuration file (TOML or JSON, default: ./trips.toml if present)
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    TRIPS__SERVER__HTTP_ADDR             Listen address (default: 0.0.0.0:8080)
    TRIPS__SERVER__REQUEST_TIMEOUT_MS    Body read and handler timeout (default: 10000)
    TRIPS__SERVER__SHUTDOWN_TIMEOUT_SECS Connection drain period (default: 30)
    TRIPS__SERVER__MAX_BODY_BYTES        Request body limit (default: 1048576)
    TRIPS__RATE_LIMIT__ENABLED           Per-client rate limiting (default: true)
    TRIPS__RATE_LIMIT__REQUESTS          Requests per window (default: 100)
    TRIPS__RATE_LIMIT__WINDOW_MS         Window length (default: 1000)
    TRIPS__LOGGING__LEVEL                Log filter (default: info)
    TRIPS__LOGGING__FORMAT               json, pretty or compact (default: json)

A .env file in the working directory is read before the environment.
"
    );
}

fn load_config(args: &Args) -> anyhow::Result<TripsConfig> {
    let loader = match &args.config {
        Some(path) => ConfigLoader::new()
            .with_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => ConfigLoader::new()
            .with_optional_file(DEFAULT_CONFIG_FILE)
            .context("failed to load trips.toml")?,
    };

    loader
        .with_dotenv()
        .with_env_prefix("TRIPS")
        .load()
        .context("invalid configuration")
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(&args)?;

    init_logging(&config.logging.to_log_config(&config.service.name))
        .context("failed to initialize logging")?;

    tracing::info!(
        service.name = %config.service.name,
        service.version = %config.service.version,
        http_addr = %config.server.http_addr,
        rate_limit.enabled = config.rate_limit.enabled,
        "starting trips"
    );

    build_server(&config).run().await.context("server error")?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let command = match parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let args = match command {
        Command::Help => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Command::Version => {
            println!("trips {}", trips::VERSION);
            return ExitCode::SUCCESS;
        }
        Command::Run(args) => args,
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "trips failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<Command> {
        parse_args(args.iter().map(ToString::to_string))
    }

    #[test]
    fn test_no_args() {
        let Command::Run(args) = parse(&[]).unwrap() else {
            panic!("expected run");
        };
        assert!(args.config.is_none());
    }

    #[test]
    fn test_config_flag() {
        let Command::Run(args) = parse(&["--config", "/etc/trips.toml"]).unwrap() else {
            panic!("expected run");
        };
        assert_eq!(args.config, Some(PathBuf::from("/etc/trips.toml")));
    }

    #[test]
    fn test_help_and_version() {
        assert!(matches!(parse(&["-h"]).unwrap(), Command::Help));
        assert!(matches!(parse(&["--version"]).unwrap(), Command::Version));
    }

    #[test]
    fn test_errors() {
        assert!(parse(&["--config"]).is_err());
        assert!(parse(&["--port", "80"]).unwrap_err().to_string().contains("--port"));
    }
}
