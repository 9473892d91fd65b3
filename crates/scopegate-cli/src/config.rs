//! Configuration management for the scopegate CLI
//!
//! Sources, lowest precedence first: the YAML file (`conf/scopegate.yml`
//! unless `--config` names another), `SCOPEGATE_` environment variables with
//! `__` between key segments, then command line overrides.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use scopegate_common::{DEFAULT_DATA_DIR, ScopegateError};
use scopegate_control::ControlOptions;
use scopegate_persistence::StorageType;
use serde::Deserialize;

use crate::command::GlobalArgs;

pub const DEFAULT_CONFIG_FILE: &str = "conf/scopegate.yml";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_ROTATION: &str = "daily";

const STORAGE_KIND: &str = "storage.kind";
const STORAGE_PATH: &str = "storage.path";
const LOGGING_LEVEL: &str = "logging.level";
const LOGGING_DIR: &str = "logging.dir";
const LOGGING_FILE: &str = "logging.file";
const LOGGING_CONSOLE: &str = "logging.console";
const LOGGING_ROTATION: &str = "logging.rotation";
const SERVICES: &str = "services";

/// A service registered at startup
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    #[serde(default)]
    pub disable_on_default: bool,
    #[serde(default)]
    pub help: String,
}

impl ServiceConfig {
    pub fn options(&self) -> ControlOptions {
        ControlOptions {
            disable_on_default: self.disable_on_default,
            help: self.help.clone(),
        }
    }
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    pub fn new(args: &GlobalArgs) -> Result<Self, ScopegateError> {
        // An explicitly named file must exist; the default one is optional
        let (path, required) = match &args.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        Self::load(&path, required, args)
    }

    fn load(path: &Path, required: bool, args: &GlobalArgs) -> Result<Self, ScopegateError> {
        let mut builder = Config::builder()
            .add_source(config::File::from(path).required(required))
            .add_source(
                Environment::with_prefix("scopegate")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(v) = &args.storage {
            builder = builder.set_override(STORAGE_KIND, v.as_str()).map_err(config_error)?;
        }
        if let Some(v) = &args.data_dir {
            builder = builder
                .set_override(STORAGE_PATH, v.to_string_lossy().into_owned())
                .map_err(config_error)?;
        }
        if let Some(v) = &args.log_level {
            builder = builder.set_override(LOGGING_LEVEL, v.as_str()).map_err(config_error)?;
        }

        let config = builder.build().map_err(config_error)?;
        Ok(Configuration { config })
    }

    // ========================================================================
    // Storage Configuration
    // ========================================================================

    pub fn storage_type(&self) -> Result<StorageType, ScopegateError> {
        match self.config.get_string(STORAGE_KIND) {
            Ok(kind) => kind.parse().map_err(ScopegateError::Config),
            Err(ConfigError::NotFound(_)) => Ok(StorageType::default()),
            Err(e) => Err(config_error(e)),
        }
    }

    pub fn storage_path(&self) -> PathBuf {
        self.config
            .get_string(STORAGE_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR))
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    pub fn log_level(&self) -> String {
        self.config
            .get_string(LOGGING_LEVEL)
            .unwrap_or(DEFAULT_LOG_LEVEL.to_string())
    }

    pub fn log_dir(&self) -> PathBuf {
        self.config
            .get_string(LOGGING_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_DIR))
    }

    pub fn file_logging(&self) -> bool {
        self.config.get_bool(LOGGING_FILE).unwrap_or(false)
    }

    pub fn console_logging(&self) -> bool {
        self.config.get_bool(LOGGING_CONSOLE).unwrap_or(true)
    }

    /// `daily`, `hourly` or `never`
    pub fn log_rotation(&self) -> String {
        self.config
            .get_string(LOGGING_ROTATION)
            .unwrap_or(DEFAULT_LOG_ROTATION.to_string())
    }

    // ========================================================================
    // Services
    // ========================================================================

    /// Services to register at startup; none when the key is absent
    pub fn services(&self) -> Result<Vec<ServiceConfig>, ScopegateError> {
        match self.config.get::<Vec<ServiceConfig>>(SERVICES) {
            Ok(services) => Ok(services),
            Err(ConfigError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(config_error(e)),
        }
    }
}

fn config_error(e: ConfigError) -> ScopegateError {
    ScopegateError::Config(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scopegate.yml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    fn args_with_config(path: PathBuf) -> GlobalArgs {
        GlobalArgs {
            config: Some(path),
            ..GlobalArgs::default()
        }
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yml");
        let configuration = Configuration::load(&path, false, &GlobalArgs::default()).unwrap();

        assert_eq!(configuration.storage_type().unwrap(), StorageType::File);
        assert_eq!(configuration.storage_path(), PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(configuration.log_level(), "info");
        assert!(!configuration.file_logging());
        assert!(configuration.console_logging());
        assert_eq!(configuration.log_rotation(), "daily");
        assert!(configuration.services().unwrap().is_empty());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = args_with_config(dir.path().join("missing.yml"));
        let err = Configuration::new(&args).unwrap_err();
        assert!(matches!(err, ScopegateError::Config(_)));
    }

    #[test]
    fn test_load_yaml() {
        let (_dir, path) = write_config(
            r#"
storage:
  kind: memory
  path: /var/lib/scopegate
logging:
  level: debug
  file: true
  dir: /var/log/scopegate
  rotation: hourly
services:
  - name: weather
    disable_on_default: true
    help: "- weather <city>"
  - name: music
"#,
        );
        let configuration = Configuration::new(&args_with_config(path)).unwrap();

        assert_eq!(configuration.storage_type().unwrap(), StorageType::Memory);
        assert_eq!(
            configuration.storage_path(),
            PathBuf::from("/var/lib/scopegate")
        );
        assert_eq!(configuration.log_level(), "debug");
        assert!(configuration.file_logging());
        assert_eq!(configuration.log_dir(), PathBuf::from("/var/log/scopegate"));
        assert_eq!(configuration.log_rotation(), "hourly");

        let services = configuration.services().unwrap();
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].name, "weather");
        assert!(services[0].options().disable_on_default);
        assert_eq!(services[0].options().help, "- weather <city>");
        assert_eq!(services[1].options(), ControlOptions::default());
    }

    #[test]
    fn test_cli_overrides_file() {
        let (_dir, path) = write_config("storage:\n  kind: memory\nlogging:\n  level: warn\n");
        let args = GlobalArgs {
            config: Some(path),
            storage: Some("file".to_string()),
            data_dir: Some(PathBuf::from("/tmp/toggles")),
            log_level: Some("trace".to_string()),
        };
        let configuration = Configuration::new(&args).unwrap();

        assert_eq!(configuration.storage_type().unwrap(), StorageType::File);
        assert_eq!(configuration.storage_path(), PathBuf::from("/tmp/toggles"));
        assert_eq!(configuration.log_level(), "trace");
    }

    #[test]
    fn test_invalid_storage_kind() {
        let (_dir, path) = write_config("storage:\n  kind: postgres\n");
        let configuration = Configuration::new(&args_with_config(path)).unwrap();
        assert!(matches!(
            configuration.storage_type(),
            Err(ScopegateError::Config(_))
        ));
    }
}
