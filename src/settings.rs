use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PaymatchError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default)]
    pub business_name: String,
    #[serde(default = "default_vat_rate")]
    pub vat_rate_percent: u32,
}

fn default_vat_rate() -> u32 {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            business_name: String::new(),
            vat_rate_percent: default_vat_rate(),
        }
    }
}

impl Settings {
    /// Rates above 100% are almost certainly a typo for a fraction.
    pub fn set_vat_rate(&mut self, rate_percent: u32) -> Result<()> {
        if rate_percent > 100 {
            return Err(PaymatchError::Settings(format!(
                "VAT rate must be between 0 and 100, got {rate_percent}"
            )));
        }
        self.vat_rate_percent = rate_percent;
        Ok(())
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("paymatch")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("paymatch")
}

fn load_from(path: &Path) -> Settings {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Settings::default();
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
        Settings::default()
    })
}

pub fn load_settings() -> Settings {
    load_from(&settings_path())
}

fn save_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| PaymatchError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_to(&settings_path(), settings)
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(&load_settings().data_dir)
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

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/test".to_string(),
            business_name: "블루인쇄".to_string(),
            vat_rate_percent: 0,
        };
        save_to(&path, &settings).unwrap();
        let loaded = load_from(&path);
        assert_eq!(loaded.business_name, "블루인쇄");
        assert_eq!(loaded.data_dir, "/tmp/test");
        assert_eq!(loaded.vat_rate_percent, 0);
    }

    #[test]
    fn test_load_returns_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_from(&dir.path().join("nope.json"));
        assert!(s.business_name.is_empty());
        assert_eq!(s.vat_rate_percent, 10);
        assert!(!s.data_dir.is_empty());
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test", "business_name": "Green Print"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.vat_rate_percent, 10);
        assert_eq!(s.business_name, "Green Print");
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(load_from(&path).vat_rate_percent, 10);
    }

    #[test]
    fn test_vat_rate_bounds() {
        let mut s = Settings::default();
        s.set_vat_rate(0).unwrap();
        assert_eq!(s.vat_rate_percent, 0);
        assert!(s.set_vat_rate(110).is_err());
        assert_eq!(s.vat_rate_percent, 0);
    }

    #[test]
    fn test_save_creates_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("nested").join("settings.json");
        save_to(&path, &Settings::default()).unwrap();
        assert!(path.exists());
    }
}
