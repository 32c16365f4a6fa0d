use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{FpnaError, Result};
use crate::period::ReportingPeriod;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_company")]
    pub selected_company: String,
    #[serde(default = "default_year")]
    pub current_year: i32,
    #[serde(default = "default_month")]
    pub current_month: u32,
    /// Line-item layout to use instead of the bundled one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_path: Option<String>,
}

fn default_company() -> String {
    "AFP".to_string()
}

fn default_year() -> i32 {
    ReportingPeriod::today().year
}

fn default_month() -> u32 {
    ReportingPeriod::today().month
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            selected_company: default_company(),
            current_year: default_year(),
            current_month: default_month(),
            template_path: None,
        }
    }
}

impl Settings {
    pub fn reporting_period(&self) -> Result<ReportingPeriod> {
        ReportingPeriod::new(self.current_year, self.current_month)
    }

    pub fn set_reporting_period(&mut self, period: ReportingPeriod) {
        self.current_year = period.year;
        self.current_month = period.month;
    }
}

fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("FPNA_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("fpna")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("fpna")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "unreadable settings, using defaults");
            Settings::default()
        })
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| FpnaError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(&load_settings().data_dir)
}

pub fn db_path() -> PathBuf {
    get_data_dir().join("fpna.db")
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
            selected_company: "Company1".to_string(),
            current_year: 2025,
            current_month: 4,
            template_path: Some("/tmp/layout.json".to_string()),
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.selected_company, "Company1");
        assert_eq!(loaded.data_dir, "/tmp/test");
        assert_eq!(loaded.current_month, 4);
        assert_eq!(loaded.template_path.as_deref(), Some("/tmp/layout.json"));
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.selected_company, "AFP");
        assert!(s.template_path.is_none());
        assert!((1..=12).contains(&s.current_month));
        assert!(!s.data_dir.is_empty());
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test", "current_year": 2024, "current_month": 12}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.selected_company, "AFP");
        assert_eq!(s.reporting_period().unwrap(), ReportingPeriod { year: 2024, month: 12 });
    }

    #[test]
    fn test_invalid_month_is_rejected() {
        let json = r#"{"data_dir": "/tmp/test", "current_month": 13}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert!(matches!(s.reporting_period(), Err(FpnaError::InvalidPeriod(_))));
    }

    #[test]
    fn test_set_reporting_period() {
        let mut s = Settings::default();
        s.set_reporting_period(ReportingPeriod { year: 2026, month: 1 });
        assert_eq!((s.current_year, s.current_month), (2026, 1));
    }
}
