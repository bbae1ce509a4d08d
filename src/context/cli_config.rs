//! CLI configuration file I/O

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::store as store_config;
use crate::error::{CtxError, Result};

use super::atomic::write_atomic;

/// Persistent CLI settings (`<config-dir>/config.json`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Name of the currently active context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_context: Option<String>,
    /// Default stack orchestrator when the context sets none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_orchestrator: Option<String>,
    #[serde(default, skip_serializing_if = "KubernetesConfig::is_empty")]
    pub kubernetes: KubernetesConfig,
}

/// Kubernetes-specific CLI settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesConfig {
    /// `"disabled"` turns off cluster-wide listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_namespaces: Option<String>,
}

impl KubernetesConfig {
    pub fn is_empty(&self) -> bool {
        self.all_namespaces.is_none()
    }
}

/// Reads and writes the CLI configuration file
#[derive(Debug, Clone)]
pub struct CliConfigFile {
    path: PathBuf,
}

impl CliConfigFile {
    /// Configuration file inside `config_dir`
    pub fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(store_config::CONFIG_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration.
    /// Returns Default if the file doesn't exist, errors on corrupt JSON.
    pub fn load(&self) -> Result<CliConfig> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CliConfig::default()),
            Err(e) => {
                return Err(CtxError::Config(format!(
                    "Failed to read config {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&content).map_err(|e| {
            CtxError::Config(format!(
                "Failed to parse config {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Save the configuration (temp file + rename, 0600)
    pub fn save(&self, config: &CliConfig) -> Result<()> {
        let json = serde_json::to_vec_pretty(config)
            .map_err(|e| CtxError::Config(format!("Failed to serialize config: {}", e)))?;
        write_atomic(&self.path, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = TempDir::new().unwrap();
        let file = CliConfigFile::new(&dir.path().join("nonexistent"));
        assert_eq!(file.load().unwrap(), CliConfig::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let file = CliConfigFile::new(dir.path());

        let config = CliConfig {
            current_context: Some("prod".to_string()),
            stack_orchestrator: Some("swarm".to_string()),
            kubernetes: KubernetesConfig {
                all_namespaces: Some("disabled".to_string()),
            },
        };
        file.save(&config).unwrap();
        assert_eq!(file.load().unwrap(), config);
    }

    #[test]
    fn test_json_field_names() {
        let dir = TempDir::new().unwrap();
        let file = CliConfigFile::new(dir.path());
        file.save(&CliConfig {
            current_context: Some("prod".to_string()),
            kubernetes: KubernetesConfig {
                all_namespaces: Some("enabled".to_string()),
            },
            ..Default::default()
        })
        .unwrap();

        let raw = fs::read_to_string(file.path()).unwrap();
        assert!(raw.contains("\"currentContext\""));
        assert!(raw.contains("\"allNamespaces\""));
        assert!(!raw.contains("stackOrchestrator"));
    }

    #[test]
    fn test_load_corrupt_json_errors() {
        let dir = TempDir::new().unwrap();
        let file = CliConfigFile::new(dir.path());
        fs::write(file.path(), "{ not valid json").unwrap();

        let err = file.load().unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_save_creates_parent_dir() {
        let dir = TempDir::new().unwrap();
        let file = CliConfigFile::new(&dir.path().join("nested").join("dir"));
        file.save(&CliConfig::default()).unwrap();
        assert!(file.path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_save_sets_0600_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let file = CliConfigFile::new(dir.path());
        file.save(&CliConfig::default()).unwrap();

        let mode = fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
