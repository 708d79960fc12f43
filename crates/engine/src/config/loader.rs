use std::path::{Path, PathBuf};

use gosafe_common::config::SystemConfig;

use super::validation;

/// Complete engine configuration loaded from the config directory.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Parsed engine.toml.
    pub system: SystemConfig,
    /// Base config directory path.
    pub config_dir: PathBuf,
}

/// Load configuration from `{config_dir}/engine.toml`.
///
/// Fails loudly with clear error messages if anything is misconfigured.
/// The engine refuses to start on validation failure.
pub fn load_config(config_dir: &Path) -> Result<EngineConfig, ConfigError> {
    tracing::info!(config_dir = %config_dir.display(), "Loading configuration");

    let path = config_dir.join("engine.toml");
    let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileRead {
        path: path.clone(),
        source: e,
    })?;

    let system = parse_config(&content).map_err(|e| match e {
        ConfigError::Parse { detail, .. } => ConfigError::Parse {
            path: path.clone(),
            detail,
        },
        other => other,
    })?;

    let config = EngineConfig {
        system,
        config_dir: config_dir.to_path_buf(),
    };

    tracing::info!(
        routing = %config.system.routing.base_url,
        location_provider = ?config.system.location.provider,
        "Configuration loaded successfully"
    );

    Ok(config)
}

/// Parse and validate engine.toml content.
pub fn parse_config(content: &str) -> Result<SystemConfig, ConfigError> {
    let system: SystemConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
        path: PathBuf::from("engine.toml"),
        detail: e.to_string(),
    })?;

    validation::validate(&system)?;

    Ok(system)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {detail}")]
    Parse { path: PathBuf, detail: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl From<ConfigError> for gosafe_common::GoSafeError {
    fn from(e: ConfigError) -> Self {
        gosafe_common::GoSafeError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_read_error() {
        let err = load_config(Path::new("/nonexistent/gosafe-config")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    #[test]
    fn test_bundled_config_is_valid() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config");
        let config = load_config(&dir).expect("bundled engine.toml should load");
        assert_eq!(config.system.routing.profile, "driving");
        assert_eq!(config.system.routing.timeout_seconds, 10);
    }

    #[test]
    fn test_parse_error_reports_detail() {
        let err = parse_config("[map]\ninitial_delta = \"wide\"").unwrap_err();
        match err {
            ConfigError::Parse { detail, .. } => assert!(!detail.is_empty()),
            other => panic!("expected parse error, got {other}"),
        }
    }
}
