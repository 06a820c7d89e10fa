//! Configuration management for the docguard service.
//!
//! Configuration is assembled from three sources, later ones winning:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML)
//! 3. Environment variables prefixed with `DOCGUARD_`
//!
//! # Example
//!
//! ```ignore
//! use docguard_server::config::ServerConfig;
//!
//! // Load from file with env overrides
//! let config = ServerConfig::load("docguard.yaml")?;
//!
//! // Or load from environment only
//! let config = ServerConfig::from_env()?;
//! ```

use config::{Config, ConfigError, Environment, File, FileFormat};
use docguard_domain::{EngineConfig, PermissionKey};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::logging::LoggingConfig;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "DOCGUARD";

/// Service configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    /// Authorization engine limits
    #[serde(default)]
    pub engine: EngineSettings,

    /// Permission registry settings
    #[serde(default)]
    pub registry: RegistrySettings,

    /// Storage settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Authorization engine settings.
///
/// Overridable with e.g. `DOCGUARD_ENGINE__MAX_MEMBERSHIP_DEPTH=10`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EngineSettings {
    /// Maximum depth of nested group membership; deeper nesting fails the check
    #[serde(default = "default_max_membership_depth")]
    pub max_membership_depth: u32,

    /// Maximum owner hops followed when resolving a check target
    #[serde(default = "default_max_resolution_hops")]
    pub max_resolution_hops: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_membership_depth: default_max_membership_depth(),
            max_resolution_hops: default_max_resolution_hops(),
        }
    }
}

fn default_max_membership_depth() -> u32 {
    25
}

fn default_max_resolution_hops() -> u32 {
    8
}

impl EngineSettings {
    /// Converts the settings into the engine's configuration.
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_max_membership_depth(self.max_membership_depth)
            .with_max_resolution_hops(self.max_resolution_hops)
    }
}

/// Permission registry settings.
///
/// # Example YAML Configuration
///
/// ```yaml
/// registry:
///   builtin_catalog: true
///   public_permissions:
///     - documents.document_view
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RegistrySettings {
    /// Register the built-in document-manager permissions at startup
    #[serde(default = "default_true")]
    pub builtin_catalog: bool,

    /// Permissions anonymous principals may pass, as "namespace.name"
    #[serde(default)]
    pub public_permissions: Vec<String>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            builtin_catalog: true,
            public_permissions: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Storage settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StorageSettings {
    /// Storage backend: only "memory" is available
    #[serde(default = "default_storage_backend")]
    pub backend: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
        }
    }
}

fn default_storage_backend() -> String {
    "memory".to_string()
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format (true for production, false for development)
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingSettings {
    /// Converts the settings into a [`LoggingConfig`].
    ///
    /// Call after [`ServerConfig::validate`]; an unparsable level falls
    /// back to INFO.
    pub fn to_logging_config(&self) -> LoggingConfig {
        let config = if self.json {
            LoggingConfig::json()
        } else {
            LoggingConfig::text()
        };
        match self.level.parse::<tracing::Level>() {
            Ok(level) => config.with_level(level),
            Err(_) => config,
        }
    }
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    ///
    /// Environment variables are prefixed with `DOCGUARD_` and use `__` as
    /// separator, e.g. `DOCGUARD_LOGGING__LEVEL=debug` overrides
    /// `logging.level`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(environment())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(environment())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.engine.max_membership_depth == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "engine.max_membership_depth must be greater than 0".to_string(),
            });
        }
        if self.engine.max_resolution_hops == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "engine.max_resolution_hops must be greater than 0".to_string(),
            });
        }

        for permission in &self.registry.public_permissions {
            if let Err(err) = PermissionKey::parse(permission) {
                return Err(ConfigLoadError::Invalid {
                    message: format!("registry.public_permissions: {err}"),
                });
            }
        }

        let valid_backends = ["memory"];
        if !valid_backends.contains(&self.storage.backend.as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "storage.backend must be one of: {:?}, got: {}",
                    valid_backends, self.storage.backend
                ),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        Ok(())
    }
}

// DOCGUARD_ENGINE__MAX_RESOLUTION_HOPS -> engine.max_resolution_hops
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("registry.public_permissions")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    #[serial]
    fn test_can_load_config_from_yaml_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
engine:
  max_membership_depth: 10
  max_resolution_hops: 4

registry:
  builtin_catalog: false
  public_permissions:
    - documents.document_view

storage:
  backend: memory

logging:
  level: debug
  json: true
"#
        )
        .unwrap();

        let config = ServerConfig::load(file.path()).unwrap();

        assert_eq!(config.engine.max_membership_depth, 10);
        assert_eq!(config.engine.max_resolution_hops, 4);
        assert!(!config.registry.builtin_catalog);
        assert_eq!(
            config.registry.public_permissions,
            vec!["documents.document_view".to_string()]
        );
        assert_eq!(config.storage.backend, "memory");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    #[serial]
    fn test_can_override_config_with_env_vars() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
engine:
  max_membership_depth: 10

logging:
  level: info
"#
        )
        .unwrap();

        std::env::set_var("DOCGUARD_ENGINE__MAX_RESOLUTION_HOPS", "3");
        std::env::set_var("DOCGUARD_LOGGING__LEVEL", "warn");

        let config = ServerConfig::load(file.path());

        std::env::remove_var("DOCGUARD_ENGINE__MAX_RESOLUTION_HOPS");
        std::env::remove_var("DOCGUARD_LOGGING__LEVEL");

        let config = config.unwrap();
        assert_eq!(config.engine.max_resolution_hops, 3); // Overridden by env
        assert_eq!(config.engine.max_membership_depth, 10); // From file
        assert_eq!(config.logging.level, "warn"); // Overridden by env
    }

    #[test]
    #[serial]
    fn test_from_env_loads_defaults_with_env_overrides() {
        std::env::set_var("DOCGUARD_LOGGING__JSON", "true");

        let config = ServerConfig::from_env();

        std::env::remove_var("DOCGUARD_LOGGING__JSON");

        let config = config.unwrap();
        assert!(config.logging.json);
        assert_eq!(config.engine, EngineSettings::default());
    }

    #[test]
    fn test_config_validation_catches_errors() {
        let mut config = ServerConfig::default();
        config.engine.max_membership_depth = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("engine.max_membership_depth"));

        let mut config = ServerConfig::default();
        config.engine.max_resolution_hops = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("engine.max_resolution_hops"));

        let mut config = ServerConfig::default();
        config.storage.backend = "postgres".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("storage.backend"));

        let mut config = ServerConfig::default();
        config.logging.level = "loud".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.level"));

        for bad in ["document_view", "documents.", ".document_view", "a.b.c"] {
            let mut config = ServerConfig::default();
            config.registry.public_permissions = vec![bad.to_string()];
            let err = config.validate().unwrap_err();
            assert!(
                err.to_string().contains("registry.public_permissions"),
                "expected rejection of '{bad}'"
            );
        }
    }

    #[test]
    fn test_invalid_config_returns_clear_error() {
        let result = ServerConfig::load("/nonexistent/path/docguard.yaml");
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigLoadError::FileNotFound { .. }));
        assert!(err.to_string().contains("not found"));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid: yaml: syntax: [").unwrap();
        let err = ServerConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Load(_)));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());

        assert_eq!(config.engine.max_membership_depth, 25);
        assert_eq!(config.engine.max_resolution_hops, 8);
        assert!(config.registry.builtin_catalog);
        assert!(config.registry.public_permissions.is_empty());
        assert_eq!(config.storage.backend, "memory");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_engine_settings_convert_to_engine_config() {
        let settings = EngineSettings {
            max_membership_depth: 3,
            max_resolution_hops: 2,
        };
        let config = settings.to_engine_config();
        assert_eq!(config.max_membership_depth, 3);
        assert_eq!(config.max_resolution_hops, 2);
    }

    #[test]
    fn test_logging_settings_convert_to_logging_config() {
        let settings = LoggingSettings {
            level: "debug".to_string(),
            json: true,
        };
        let config = settings.to_logging_config();
        assert!(config.json_format);
        assert_eq!(config.default_level, tracing::Level::DEBUG);
    }
}
