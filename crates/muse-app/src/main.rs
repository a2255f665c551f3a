mod cli;
mod commands;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use muse_ai::{GeminiClient, GeminiConfig};
use muse_common::ConfigError;
use muse_config::MuseConfig;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Load environment variables from a .env file (KEY=VALUE lines).
/// Variables already set in the environment win.
fn load_dotenv() {
    let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let candidates = [
        std::path::PathBuf::from(".env"),
        // Workspace root, two levels up from crates/muse-app/
        manifest_dir.join("..").join("..").join(".env"),
    ];

    for path in &candidates {
        if let Ok(contents) = std::fs::read_to_string(path) {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim().trim_matches('"').trim_matches('\'');
                    if std::env::var(key).is_err() {
                        std::env::set_var(key, value);
                    }
                }
            }
            return;
        }
    }
}

fn init_logging(directive: &str) {
    let filter = EnvFilter::from_default_env().add_directive(
        directive
            .parse()
            .unwrap_or_else(|_| LevelFilter::INFO.into()),
    );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<MuseConfig, ConfigError> {
    match path {
        Some(path) => muse_config::load_config_from(path),
        None => muse_config::load_config(),
    }
}

/// Decide what to run with after a load attempt. Only a missing default
/// file falls back to defaults; an explicit `--config` must load cleanly.
fn settle_config(
    loaded: Result<MuseConfig, ConfigError>,
    explicit: bool,
) -> Result<MuseConfig, ConfigError> {
    match loaded {
        Err(ConfigError::FileNotFound(path)) if !explicit => {
            tracing::warn!(path = %path.display(), "Config file missing, using defaults");
            Ok(MuseConfig::default())
        }
        other => other,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();

    let args = cli::parse();

    // Config is read before logging is up so its level can apply; any
    // load error is reported once the subscriber exists.
    let loaded = load_config(args.config.as_deref());

    let directive = match (&args.log_level, &loaded) {
        (Some(level), _) => level.clone(),
        (None, Ok(config)) => config.logging.level.directive().to_string(),
        (None, Err(_)) => "muse=info".to_string(),
    };
    init_logging(&directive);

    tracing::info!("Muse v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match settle_config(loaded, args.config.is_some()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Config load failed: {e}");
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {}", path.display());
    }

    let client = Arc::new(GeminiClient::new(GeminiConfig::from_api_config(&config.api)));

    match commands::run(args.command, &config, client).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("muse.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn invalid_override_is_reported_not_replaced_by_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[api]\napi_key = \"k-from-file\"\n\n[image]\naspect_ratio = \"2:1\"\n",
        );

        let err = settle_config(load_config(Some(&path)), true).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        let message = err.to_string();
        assert!(message.contains("image.aspect_ratio"));
        assert!(!message.to_lowercase().contains("api key"));
    }

    #[test]
    fn valid_override_keeps_its_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[api]\napi_key = \"k-from-file\"\n");

        let config = settle_config(load_config(Some(&path)), true).unwrap();
        assert_eq!(config.api.api_key.as_deref(), Some("k-from-file"));
    }

    #[test]
    fn missing_override_is_an_error() {
        let missing = Path::new("/tmp/muse_missing_override.toml");
        let err = settle_config(load_config(Some(missing)), true).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn missing_default_file_falls_back_to_defaults() {
        let loaded = Err(ConfigError::FileNotFound("/nowhere/config.toml".into()));
        let config = settle_config(loaded, false).unwrap();
        assert_eq!(config.image.aspect_ratio, "1:1");
    }

    #[test]
    fn invalid_default_file_is_still_an_error() {
        let loaded = Err(ConfigError::ValidationError("retry.max_retries = 99".into()));
        assert!(settle_config(loaded, false).is_err());
    }
}
