// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict validation.
//!
//! Any invalid field results in a HardValidationError that prevents startup.
//! JSON is a subset of YAML, so JSON config files load through the same path.
//! The PascalCase field names of older JSON configs are accepted as aliases.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{HardValidationError, ProbeError, ProbeResult};
use crate::scenario::Scenario;
use crate::types::{EncryptionKey, JobTotal, Subject};

/// Largest generated payload for the `emptybytes` scenario (16 MB).
pub const MAX_NUM_BYTES: usize = 16 * 1024 * 1024;

/// Raw configuration as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default = "default_subject", alias = "Subject")]
    subject: String,
    #[serde(alias = "Total")]
    total: Option<u64>,
    #[serde(default = "default_server_url", alias = "NATSServerURL")]
    server_url: String,
    #[serde(default = "default_timeout")]
    timeout_ms: u64,
    #[serde(default = "default_scenario", alias = "Scenario")]
    scenario: String,
    #[serde(alias = "AESEncryptionKey")]
    encryption_key: Option<String>,
    #[serde(default, alias = "NumBytes")]
    num_bytes: usize,
    #[serde(default, alias = "Filename")]
    filename: Option<PathBuf>,
}

fn default_subject() -> String {
    "speedtest".to_string()
}

fn default_server_url() -> String {
    "127.0.0.1:4222".to_string()
}

fn default_timeout() -> u64 {
    30000 // 30 seconds
}

fn default_scenario() -> String {
    Scenario::default().name().to_string()
}

/// Validated probe configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub subject: Subject,
    pub total: JobTotal,
    pub server_url: String,
    pub timeout: Duration,
    pub scenario: Scenario,
    pub encryption_key: EncryptionKey,
    pub num_bytes: usize,
    pub filename: Option<PathBuf>,
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> ProbeResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ProbeError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ProbeError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> ProbeResult<Config> {
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| ProbeError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Self::validate(raw)
    }

    /// Validate raw configuration and convert to validated types.
    fn validate(raw: RawConfig) -> ProbeResult<Config> {
        let subject = Subject::new(raw.subject)?;

        let total = raw
            .total
            .ok_or_else(|| HardValidationError::MissingRequiredField {
                field: "total",
                context: "configuration".to_string(),
            })?;
        let total = JobTotal::new(total)?;

        if raw.server_url.trim().is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "server_url",
                value: raw.server_url,
                reason: "Server address cannot be empty".to_string(),
            }
            .into());
        }

        if raw.timeout_ms == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "timeout_ms",
                value: "0".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            }
            .into());
        }

        let scenario: Scenario = raw.scenario.parse()?;

        // required for every scenario, encrypted or not
        let key = raw
            .encryption_key
            .ok_or_else(|| HardValidationError::MissingRequiredField {
                field: "encryption_key",
                context: "configuration".to_string(),
            })?;
        let encryption_key = EncryptionKey::try_from(key.as_str())?;

        if raw.num_bytes > MAX_NUM_BYTES {
            return Err(HardValidationError::InvalidFieldValue {
                field: "num_bytes",
                value: raw.num_bytes.to_string(),
                reason: format!("Must not exceed {} bytes", MAX_NUM_BYTES),
            }
            .into());
        }

        if scenario.needs_file() && raw.filename.is_none() {
            return Err(HardValidationError::MissingRequiredField {
                field: "filename",
                context: format!("scenario {}", scenario),
            }
            .into());
        }

        Ok(Config {
            subject,
            total,
            server_url: raw.server_url,
            timeout: Duration::from_millis(raw.timeout_ms),
            scenario,
            encryption_key,
            num_bytes: raw.num_bytes,
            filename: raw.filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CONFIG: &str = r#"
subject: probe
total: 1000
server_url: 127.0.0.1:5222
timeout_ms: 5000
scenario: emptybytes
encryption_key: "0123456789abcdef0123456789abcdef"
num_bytes: 16000
"#;

    #[test]
    fn test_valid_config() {
        let config = ConfigLoader::load_string(VALID_CONFIG).unwrap();
        assert_eq!(config.subject.as_str(), "probe");
        assert_eq!(config.total.value(), 1000);
        assert_eq!(config.server_url, "127.0.0.1:5222");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.scenario, Scenario::EmptyBytes);
        assert_eq!(config.num_bytes, 16000);
        assert!(config.filename.is_none());
    }

    #[test]
    fn test_defaults_applied() {
        let yaml = r#"
total: 5
encryption_key: "0123456789abcdef0123456789abcdef"
"#;
        let config = ConfigLoader::load_string(yaml).unwrap();
        assert_eq!(config.subject.as_str(), "speedtest");
        assert_eq!(config.server_url, "127.0.0.1:4222");
        assert_eq!(config.timeout, Duration::from_millis(30000));
        assert_eq!(config.scenario, Scenario::EmptyBytes);
        assert_eq!(config.num_bytes, 0);
    }

    #[test]
    fn test_legacy_json_field_names() {
        let json = r#"{
            "Subject": "legacy",
            "Total": 10,
            "Scenario": "json.encrypted",
            "AESEncryptionKey": "0123456789abcdef0123456789abcdef"
        }"#;
        let config = ConfigLoader::load_string(json).unwrap();
        assert_eq!(config.subject.as_str(), "legacy");
        assert_eq!(config.total.value(), 10);
        assert_eq!(config.scenario, Scenario::JsonEncrypted);
    }

    #[test]
    fn test_bad_key_length() {
        let yaml = r#"
total: 5
encryption_key: "too-short"
"#;
        let result = ConfigLoader::load_string(yaml);
        assert!(matches!(
            result,
            Err(ProbeError::HardValidation(
                HardValidationError::InvalidKeyLength {
                    expected: 32,
                    actual: 9
                }
            ))
        ));
    }

    #[test]
    fn test_missing_key() {
        let result = ConfigLoader::load_string("total: 5\n");
        assert!(matches!(
            result,
            Err(ProbeError::HardValidation(
                HardValidationError::MissingRequiredField {
                    field: "encryption_key",
                    ..
                }
            ))
        ));
    }

    #[test]
    fn test_zero_total() {
        let yaml = r#"
total: 0
encryption_key: "0123456789abcdef0123456789abcdef"
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_missing_total() {
        let yaml = r#"
encryption_key: "0123456789abcdef0123456789abcdef"
"#;
        assert!(matches!(
            ConfigLoader::load_string(yaml),
            Err(ProbeError::HardValidation(
                HardValidationError::MissingRequiredField { field: "total", .. }
            ))
        ));
    }

    #[test]
    fn test_zero_timeout() {
        let yaml = r#"
total: 5
timeout_ms: 0
encryption_key: "0123456789abcdef0123456789abcdef"
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_file_scenario_requires_filename() {
        let yaml = r#"
total: 5
scenario: file.encrypted
encryption_key: "0123456789abcdef0123456789abcdef"
"#;
        assert!(matches!(
            ConfigLoader::load_string(yaml),
            Err(ProbeError::HardValidation(
                HardValidationError::MissingRequiredField {
                    field: "filename",
                    ..
                }
            ))
        ));
    }

    #[test]
    fn test_unknown_scenario() {
        let yaml = r#"
total: 5
scenario: xml
encryption_key: "0123456789abcdef0123456789abcdef"
"#;
        assert!(matches!(
            ConfigLoader::load_string(yaml),
            Err(ProbeError::HardValidation(
                HardValidationError::InvalidFieldValue {
                    field: "scenario",
                    ..
                }
            ))
        ));
    }

    #[test]
    fn test_oversized_num_bytes() {
        let yaml = format!(
            "total: 5\nnum_bytes: {}\nencryption_key: \"0123456789abcdef0123456789abcdef\"\n",
            MAX_NUM_BYTES + 1
        );
        assert!(ConfigLoader::load_string(&yaml).is_err());
    }

    #[test]
    fn test_subject_with_whitespace() {
        let yaml = r#"
subject: "two words"
total: 5
encryption_key: "0123456789abcdef0123456789abcdef"
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            ConfigLoader::load_string("total: [unclosed"),
            Err(ProbeError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ConfigLoader::load_file("/nonexistent/busprobe.yaml"),
            Err(ProbeError::ConfigNotFound { .. })
        ));
    }
}
