//! cyberpid - CyberPi daemon
//!
//! Mirrors a vehicle's door, lock and awake state onto indicator relays.
//!
//! # Usage
//!
//! ```bash
//! # Uses ~/.cyber_pi.config and ./cyber_pi.log
//! cyberpid
//!
//! # Explicit config, debug output on the console
//! cyberpid --config /etc/cyber_pi.config --verbose
//! ```
//!
//! Exit status: 0 after SIGINT/SIGTERM, 2 on a configuration error
//! (including an unknown vehicle), 1 on any other unrecoverable failure.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use cyberpi_core::{
    create_output_device, create_provider, shutdown_channel, CyberPiConfig, ExitReason,
    ShutdownTrigger, Supervisor, SupervisorError,
};
use tracing::{error, info, warn};

mod logging;

const EXIT_FATAL: u8 = 1;
const EXIT_CONFIGURATION: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "cyberpid")]
#[command(about = "Mirror vehicle door and lock state onto indicator relays")]
struct Args {
    /// Configuration file path (JSON). Defaults to ~/.cyber_pi.config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file, appended to on every run
    #[arg(long, default_value = "cyber_pi.log")]
    log_file: PathBuf,

    /// Debug output on the console
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log = match logging::init(&args.log_file, args.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            return ExitCode::from(EXIT_FATAL);
        }
    };

    match run(&args).await {
        Ok(ExitReason::Shutdown) => {
            info!("Exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_status(&e))
        }
    }
}

async fn run(args: &Args) -> Result<ExitReason> {
    let config = load_config(args)?;
    info!(vin = %config.vin, "Starting CyberPi");

    let device = create_output_device(&config.gpio);
    let provider = create_provider(&config.provider);
    let mut supervisor = Supervisor::from_config(&config, provider, device);

    let (trigger, shutdown) = shutdown_channel();
    tokio::spawn(forward_signals(trigger));

    Ok(supervisor.run(shutdown).await?)
}

fn load_config(args: &Args) -> Result<CyberPiConfig, SupervisorError> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => CyberPiConfig::default_path()?,
    };
    info!("Loading config from: {}", path.display());
    Ok(CyberPiConfig::load(&path)?)
}

/// Trigger shutdown on the first SIGINT or SIGTERM
async fn forward_signals(trigger: ShutdownTrigger) {
    match wait_for_signal().await {
        Ok(()) => {
            info!("Shutdown signal received");
            trigger.trigger();
        }
        Err(e) => {
            warn!(error = %e, "Failed to listen for shutdown signals");
            // Keep the trigger alive so the supervisor is not woken spuriously
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<SupervisorError>() {
        Some(e) if e.is_configuration() => EXIT_CONFIGURATION,
        _ => EXIT_FATAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyberpi_core::{ConfigError, LifecycleError};

    #[test]
    fn test_exit_status_mapping() {
        let not_found = anyhow::Error::from(SupervisorError::from(
            LifecycleError::Configuration("no VIN configured".into()),
        ));
        assert_eq!(exit_status(&not_found), EXIT_CONFIGURATION);

        let fatal = anyhow::Error::from(SupervisorError::from(LifecycleError::Fatal(
            "decode".into(),
        )));
        assert_eq!(exit_status(&fatal), EXIT_FATAL);

        let missing =
            anyhow::Error::from(SupervisorError::from(ConfigError::HomeDirUnavailable));
        assert_eq!(exit_status(&missing), EXIT_CONFIGURATION);
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["cyberpid"]);
        assert!(args.config.is_none());
        assert_eq!(args.log_file, PathBuf::from("cyber_pi.log"));
        assert!(!args.verbose);
    }

    #[tokio::test]
    async fn test_missing_config_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::parse_from([
            "cyberpid",
            "--config",
            dir.path().join("absent.config").to_str().unwrap(),
        ]);

        let err = run(&args).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SupervisorError>(),
            Some(SupervisorError::Config(ConfigError::Io { .. }))
        ));
        assert_eq!(exit_status(&err), EXIT_CONFIGURATION);
    }
}
