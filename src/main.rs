//! Orientation-following caption session
//!
//! Listens for head orientation on UDP and renders the current caption for
//! the selected video section, pinned or following the viewer.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orientation_captions::cli::Args;
use orientation_captions::config::LogFormat;
use orientation_captions::config_file::{self, ConfigFile};
use orientation_captions::orientation::IngestExit;
use orientation_captions::presenter::LogSurface;
use orientation_captions::{CaptionError, Result, Session, SessionConfig};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "orientation-captions";

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(ref path) = args.write_default_config {
        return match config_file::generate_default_config(path) {
            Ok(()) => {
                println!("Wrote default configuration to {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to write {}: {}", path.display(), e);
                ExitCode::FAILURE
            }
        };
    }

    let (mut config, load_warning) = load_config(&args.config);
    args.apply(&mut config);

    init_logging(&config);
    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    if let Some(warning) = load_warning {
        tracing::warn!("{}", warning);
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: SessionConfig) -> Result<()> {
    tracing::info!("Configuration loaded: {:?}", config);
    let frame_interval = config.display.frame_interval();
    let mut surface = LogSurface::new(config.display.width, config.display.height);

    let session = Session::start(config)?;
    let mut driver = session.frame_driver();

    // the headless surface has no player to report playback, so start now
    session.start_playback();

    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut ingest_lost = false;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                driver.on_frame(&mut surface);

                if !ingest_lost && session.ingest_finished() {
                    ingest_lost = true;
                    tracing::warn!("Orientation ingest stopped; holding last orientation");
                }
                if session.captions_finished() {
                    tracing::info!("All captions shown after {} frames", driver.frames());
                    break;
                }
            }
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    tracing::warn!("Failed to listen for ctrl-c: {}", e);
                }
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    tracing::info!("Drew {} captions", surface.drawn());
    let report = tokio::task::spawn_blocking(move || session.shutdown())
        .await
        .map_err(|e| CaptionError::Thread(e.to_string()))??;
    if let IngestExit::SourceFailed(ref reason) = report.ingest.exit {
        tracing::warn!("Orientation source failed during the session: {}", reason);
    }
    Ok(())
}

/// Load the configuration file, falling back to defaults when it is
/// missing or unreadable
fn load_config(path: &Path) -> (SessionConfig, Option<String>) {
    if !path.exists() {
        return (SessionConfig::default(), None);
    }
    match ConfigFile::from_file(path) {
        Ok(cf) => (cf.into_session_config(), None),
        Err(e) => (
            SessionConfig::default(),
            Some(format!(
                "Failed to load config file {}: {}. Using defaults.",
                path.display(),
                e
            )),
        ),
    }
}

/// Initialize logging with tracing
fn init_logging(config: &SessionConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("orientation_captions={}", config.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let (config, warning) = load_config(Path::new("/nonexistent/config.toml"));
        assert!(warning.is_none());
        assert_eq!(config.video_section, 1);
    }

    #[test]
    fn test_unreadable_config_warns() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "not = [valid").unwrap();
        let (config, warning) = load_config(file.path());
        assert!(warning.is_some());
        assert_eq!(config.orientation.port, 8080);
    }
}
