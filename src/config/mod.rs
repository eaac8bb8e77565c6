//! Configuration management.
//!
//! This module resolves MediaSync paths and loads `config.json`.
//!
//! # Layout
//!
//! Everything lives under a single global directory:
//! - **Database**: `~/.mediasync/data/mediasync.db`
//! - **Config**: `~/.mediasync/config.json`
//! - **Test database**: `~/.mediasync/test/mediasync.db` (with `MSYNC_TEST_DB=1`)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Account, Section};
use crate::sync::{DEFAULT_SMOOTHING, ModePrecedence, OrchestratorSettings};

/// Get the global MediaSync directory location (`~/.mediasync/`).
#[must_use]
pub fn global_mediasync_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".mediasync"))
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `MSYNC_TEST_DB=1` (or any non-empty value
/// other than `0`/`false`). This redirects the history database to an
/// isolated test location.
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var("MSYNC_TEST_DB")
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}

/// Get the test database path.
#[must_use]
pub fn test_db_path() -> Option<PathBuf> {
    global_mediasync_dir().map(|dir| dir.join("test").join("mediasync.db"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `MSYNC_TEST_DB` environment variable → uses test database
/// 3. `MSYNC_DB` environment variable
/// 4. Global location: `~/.mediasync/data/mediasync.db`
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if is_test_mode() {
        return test_db_path();
    }

    if let Ok(db_path) = std::env::var("MSYNC_DB") {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    global_mediasync_dir().map(|dir| dir.join("data").join("mediasync.db"))
}

/// Resolve the config file path: `--config`, then `MSYNC_CONFIG`, then
/// `~/.mediasync/config.json`.
#[must_use]
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("MSYNC_CONFIG") {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    global_mediasync_dir().map(|dir| dir.join("config.json"))
}

/// Progress estimation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Weight of the newest per-unit sample in the moving average.
    pub smoothing: f64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
        }
    }
}

/// Contents of `config.json`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the remote service, used in status titles.
    pub remote: String,
    pub accounts: Vec<Account>,
    /// Library sections that can be pushed individually.
    pub sections: Vec<Section>,
    pub precedence: ModePrecedence,
    pub progress: ProgressConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: "trakt".to_string(),
            accounts: Vec::new(),
            sections: Vec::new(),
            precedence: ModePrecedence::default(),
            progress: ProgressConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path`. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be parsed or holds
    /// out-of-range values.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;

        debug!(
            path = %path.display(),
            accounts = config.accounts.len(),
            sections = config.sections.len(),
            "Loaded config"
        );
        Ok(config)
    }

    /// Load from the resolved config path, falling back to defaults.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn resolve(explicit_path: Option<&Path>) -> Result<Self> {
        match resolve_config_path(explicit_path) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Write configuration as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let smoothing = self.progress.smoothing;
        if !(smoothing > 0.0 && smoothing <= 1.0) {
            return Err(Error::Config(format!(
                "progress.smoothing must be in (0, 1], got {smoothing}"
            )));
        }

        for (i, account) in self.accounts.iter().enumerate() {
            if self.accounts[..i].iter().any(|a| a.id == account.id) {
                return Err(Error::Config(format!("duplicate account id {}", account.id)));
            }
        }
        Ok(())
    }

    /// Look up an account by id.
    ///
    /// With no accounts configured any id is accepted under a placeholder
    /// name.
    ///
    /// # Errors
    ///
    /// Returns `Error::AccountNotFound` if accounts are configured and none
    /// has this id.
    pub fn account(&self, id: i64) -> Result<Account> {
        if self.accounts.is_empty() {
            return Ok(Account::unnamed(id));
        }

        self.accounts
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| Error::AccountNotFound {
                id,
                available: self.accounts.iter().map(|a| (a.id, a.name.clone())).collect(),
            })
    }

    /// Accounts to show when none is selected explicitly.
    #[must_use]
    pub fn listed_accounts(&self) -> Vec<Account> {
        if self.accounts.is_empty() {
            vec![Account::unnamed(1)]
        } else {
            self.accounts.clone()
        }
    }

    #[must_use]
    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            precedence: self.precedence,
            smoothing: self.progress.smoothing,
        }
    }

    /// Account names for the orchestrator's conflict messages.
    #[must_use]
    pub fn account_directory(&self) -> Arc<Vec<Account>> {
        Arc::new(self.accounts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_db_path_with_explicit() {
        let explicit = PathBuf::from("/custom/path/history.db");
        let result = resolve_db_path(Some(&explicit));
        assert_eq!(result, Some(explicit));
    }

    #[test]
    fn test_test_db_path_is_separate() {
        let global = global_mediasync_dir().unwrap();
        let test = test_db_path().unwrap();

        assert!(test.to_string_lossy().contains("test"));
        assert!(test.ends_with("mediasync.db"));
        assert_ne!(global.join("data").join("mediasync.db"), test);
    }

    #[test]
    fn test_is_truthy() {
        assert!(!is_truthy(""));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy("FALSE"));
        assert!(is_truthy("1"));
        assert!(is_truthy("yes"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.remote, "trakt");
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"accounts":[{"id":2,"name":"bob"}],"precedence":{"push":3}}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.accounts, vec![Account::new(2, "bob")]);
        assert_eq!(config.precedence.push, 3);
        assert_eq!(config.precedence.full, 3);
        assert!((config.progress.smoothing - DEFAULT_SMOOTHING).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_smoothing_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"progress":{"smoothing":0}}"#).unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.accounts.push(Account::new(1, "alice"));
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_account_lookup() {
        let open = Config::default();
        assert_eq!(open.account(5).unwrap().name, "Account 5");

        let mut strict = Config::default();
        strict.accounts.push(Account::new(1, "alice"));
        assert_eq!(strict.account(1).unwrap().name, "alice");
        match strict.account(2) {
            Err(Error::AccountNotFound { id, available }) => {
                assert_eq!(id, 2);
                assert_eq!(available, vec![(1, "alice".to_string())]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
