use std::path::{Path, PathBuf};

use crate::config::schema::StoreConfig;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/store-config-v1.json");

/// Environment variable overriding `databasePath`.
pub const DATABASE_PATH_ENV: &str = "UPLOAD_RECORDS_DATABASE";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<StoreConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<StoreConfig, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let mut config: StoreConfig = serde_json::from_value(json_value)?;

    apply_env_overrides(&mut config);

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn apply_env_overrides(config: &mut StoreConfig) {
    match std::env::var(DATABASE_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => {
            log::debug!("{} overrides databasePath with {}", DATABASE_PATH_ENV, path);
            config.database_path = Some(PathBuf::from(path));
        }
        _ => {}
    }
}

fn validate_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.event_capacity == 0 {
        return Err(ConfigError::Validation {
            message: "eventCapacity must be greater than zero".to_string(),
        });
    }

    if let Some(path) = &config.database_path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                message: "databasePath must not be empty".to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard;

    impl EnvGuard {
        fn set(value: &str) -> Self {
            std::env::set_var(DATABASE_PATH_ENV, value);
            EnvGuard
        }

        fn cleared() -> Self {
            std::env::remove_var(DATABASE_PATH_ENV);
            EnvGuard
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            std::env::remove_var(DATABASE_PATH_ENV);
        }
    }

    #[test]
    #[serial]
    fn test_minimal_config_gets_defaults() {
        let _env = EnvGuard::cleared();
        let config = load_config_from_str(r#"{"version": "1.0"}"#).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    #[serial]
    fn test_full_config() {
        let _env = EnvGuard::cleared();
        let config = load_config_from_str(
            r#"{
                "version": "1.0",
                "databasePath": "/var/lib/uploads/records.db",
                "busyTimeoutMs": 250,
                "recoverInterruptedOnOpen": true,
                "eventCapacity": 16
            }"#,
        )
        .unwrap();
        assert_eq!(
            config.database_path,
            Some(PathBuf::from("/var/lib/uploads/records.db"))
        );
        assert_eq!(config.busy_timeout_ms, 250);
        assert!(config.recover_interrupted_on_open);
        assert_eq!(config.event_capacity, 16);
    }

    #[test]
    #[serial]
    fn test_schema_rejects_unknown_fields_and_bad_types() {
        let _env = EnvGuard::cleared();
        let err = load_config_from_str(r#"{"version": "1.0", "tableName": "x"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::SchemaValidation { .. }));

        let err = load_config_from_str(r#"{"version": "1.0", "busyTimeoutMs": -1}"#).unwrap_err();
        assert!(matches!(err, ConfigError::SchemaValidation { .. }));

        let err = load_config_from_str(r#"{"databasePath": "/x.db"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::SchemaValidation { .. }));
    }

    #[test]
    #[serial]
    fn test_rejects_unsupported_version() {
        let _env = EnvGuard::cleared();
        let err = load_config_from_str(r#"{"version": "2.0"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    #[serial]
    fn test_rejects_invalid_json() {
        let _env = EnvGuard::cleared();
        let err = load_config_from_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::ParseJson(_)));
    }

    #[test]
    #[serial]
    fn test_env_overrides_database_path() {
        let _env = EnvGuard::set("/from/env.db");
        let config =
            load_config_from_str(r#"{"version": "1.0", "databasePath": "/from/file.db"}"#).unwrap();
        assert_eq!(config.database_path, Some(PathBuf::from("/from/env.db")));
    }

    #[test]
    #[serial]
    fn test_load_config_from_file() {
        let _env = EnvGuard::cleared();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, r#"{"version": "1.0", "eventCapacity": 8}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.event_capacity, 8);

        let err = load_config(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
