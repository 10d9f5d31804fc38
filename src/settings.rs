use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{FinboardError, Result};
use crate::periods::CycleTable;

pub const DB_FILE_NAME: &str = "finboard.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir_string")]
    pub data_dir: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_pluggy_base_url")]
    pub pluggy_base_url: String,
    #[serde(default = "default_pluggy_page_size")]
    pub pluggy_page_size: u32,
    #[serde(default = "default_pluggy_max_pages")]
    pub pluggy_max_pages: u32,
    /// Cap on the transaction list returned with a dashboard.
    #[serde(default = "default_transaction_page_limit")]
    pub transaction_page_limit: u32,
    #[serde(default)]
    pub billing_cycles: CycleTable,
}

fn default_data_dir_string() -> String {
    default_data_dir().to_string_lossy().to_string()
}

fn default_listen_addr() -> String {
    "127.0.0.1:3001".to_string()
}

fn default_pluggy_base_url() -> String {
    "https://api.pluggy.ai".to_string()
}

fn default_pluggy_page_size() -> u32 {
    500
}

fn default_pluggy_max_pages() -> u32 {
    50
}

fn default_transaction_page_limit() -> u32 {
    500
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir_string(),
            listen_addr: default_listen_addr(),
            pluggy_base_url: default_pluggy_base_url(),
            pluggy_page_size: default_pluggy_page_size(),
            pluggy_max_pages: default_pluggy_max_pages(),
            transaction_page_limit: default_transaction_page_limit(),
            billing_cycles: CycleTable::default(),
        }
    }
}

impl Settings {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DB_FILE_NAME)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("finboard")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".local")
        .join("share")
        .join("finboard")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable settings file, using defaults");
                Settings::default()
            }
        }
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    settings.billing_cycles.validate()?;
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| FinboardError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::periods::{CycleOverride, CycleRule};

    #[test]
    fn test_load_returns_defaults_when_missing() {
        let s = Settings::default();
        assert_eq!(s.listen_addr, "127.0.0.1:3001");
        assert_eq!(s.pluggy_max_pages, 50);
        assert_eq!(s.billing_cycles.default, CycleRule::default());
        assert!(s.billing_cycles.overrides.is_empty());
        assert!(s.db_path().ends_with(DB_FILE_NAME));
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{
            "data_dir": "/tmp/finboard",
            "billing_cycles": {
                "overrides": [{"bank": "Itaú", "owner": "Bruno", "start_day": 27, "end_day": 26}]
            }
        }"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.data_dir, "/tmp/finboard");
        assert_eq!(s.pluggy_base_url, "https://api.pluggy.ai");
        assert_eq!(s.transaction_page_limit, 500);
        assert_eq!(s.billing_cycles.default.start_day, 29);
        assert_eq!(
            s.billing_cycles.overrides,
            vec![CycleOverride {
                bank: "Itaú".to_string(),
                owner: "Bruno".to_string(),
                start_day: 27,
                end_day: 26,
            }]
        );
    }

    #[test]
    fn test_save_and_load_roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/test".to_string(),
            listen_addr: "0.0.0.0:8080".to_string(),
            ..Settings::default()
        };
        std::fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();
        let loaded: Settings = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.listen_addr, "0.0.0.0:8080");
        assert_eq!(loaded.db_path(), PathBuf::from("/tmp/test").join(DB_FILE_NAME));
    }
}
