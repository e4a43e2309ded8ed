use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Deployment preferences for one installation of the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional custom root directory for stored books. Defaults to the
    /// platform data directory under `greenbooks/books`.
    pub data_root: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional custom root directory for backups. Defaults to the platform
    /// data directory under `greenbooks/backups`.
    pub backup_root: Option<PathBuf>,

    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened_books: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: None,
            backup_root: None,
            backup_retention: Self::default_backup_retention(),
            last_opened_books: None,
        }
    }
}

impl Config {
    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn resolve_data_root(&self) -> PathBuf {
        if let Some(path) = &self.data_root {
            return path.clone();
        }
        platform_base().join("books")
    }

    pub fn resolve_backup_root(&self) -> PathBuf {
        if let Some(path) = &self.backup_root {
            return path.clone();
        }
        platform_base().join("backups")
    }
}

fn platform_base() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("greenbooks")
}
