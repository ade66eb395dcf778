use crate::db::DEFAULT_CATEGORIES;
use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings shared by the CLI, the terminal UI and the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Flat text file backing the contact book
    pub contacts_file: PathBuf,
    /// SQLite database backing the expense log
    pub expenses_db: PathBuf,
    /// Categories offered by the expense form, in order
    pub categories: Vec<String>,
    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contacts_file: PathBuf::from("contact_book.txt"),
            expenses_db: PathBuf::from("expenses.db"),
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the per-user config file
    /// is used when present and defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    tracing::debug!("no config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// `<config_dir>/record-keeper/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("record-keeper").join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        let config = Self::from_toml(&content).map_err(|e| match e {
            StoreError::Config { reason } => StoreError::config(format!("{:?}: {}", path, reason)),
            other => other,
        })?;
        tracing::debug!(path = ?path, "loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| StoreError::config(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(StoreError::config("categories must not be empty"));
        }
        if self.categories.iter().any(|c| c.is_empty() || c == "All") {
            return Err(StoreError::config(
                "categories must be non-empty and may not be named \"All\"",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_use_working_directory_files() {
        let config = Config::default();

        assert_eq!(config.contacts_file, PathBuf::from("contact_book.txt"));
        assert_eq!(config.expenses_db, PathBuf::from("expenses.db"));
        assert_eq!(config.categories.len(), 7);
        assert_eq!(config.categories[0], "Food");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml("contacts_file = \"/tmp/people.txt\"\n").unwrap();

        assert_eq!(config.contacts_file, PathBuf::from("/tmp/people.txt"));
        assert_eq!(config.expenses_db, PathBuf::from("expenses.db"));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_rejects_bad_categories() {
        assert!(Config::from_toml("categories = []").is_err());
        assert!(Config::from_toml("categories = [\"All\", \"Food\"]").is_err());
        assert!(Config::from_toml("categories = [\"Pets\"]").is_ok());
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml("contacts_file = ").unwrap_err();
        assert!(matches!(err, StoreError::Config { .. }));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");

        let err = Config::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));

        let present = dir.path().join("config.toml");
        fs::write(&present, "log_level = \"debug\"\n").unwrap();
        assert_eq!(Config::load(Some(&present)).unwrap().log_level, "debug");
    }
}
