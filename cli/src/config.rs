use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "off" => LogLevel::Off,
            "error" => LogLevel::Error,
            "warn" => LogLevel::Warn,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            _ => LogLevel::Info,
        }
    }

    pub fn as_tracing_level(&self) -> Option<tracing::Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(tracing::Level::ERROR),
            LogLevel::Warn => Some(tracing::Level::WARN),
            LogLevel::Info => Some(tracing::Level::INFO),
            LogLevel::Debug => Some(tracing::Level::DEBUG),
            LogLevel::Trace => Some(tracing::Level::TRACE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Battery device names to watch; empty means discover all of them.
    pub batteries: Vec<String>,
    /// Alert thresholds as percentages, danger <= critical <= warning.
    pub warning: u8,
    pub critical: u8,
    pub danger: u8,
    /// Also notify when every battery reports full.
    pub full_alert: bool,
    /// Base poll interval; the monitor loop adapts around it.
    pub interval_secs: u64,
    /// Treat an unreadable battery attribute as fatal.
    pub required: bool,
    /// Shell command to run when the danger level is reached.
    pub danger_command: Option<String>,
    pub log_level: LogLevel,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            batteries: Vec::new(),
            warning: 15,
            critical: 10,
            danger: 5,
            full_alert: false,
            interval_secs: 60,
            required: false,
            danger_command: None,
            log_level: LogLevel::Info,
        }
    }
}

impl UserConfig {
    pub fn load() -> Self {
        let path = config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("battwatch")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

pub fn runtime_dir() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("battwatch")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_survive_an_empty_config_file() {
        let parsed: UserConfig = toml::from_str("").unwrap();
        assert_eq!(parsed, UserConfig::default());
    }

    #[test]
    fn file_values_override_defaults_field_by_field() {
        let parsed: UserConfig =
            toml::from_str("warning = 30\nfull_alert = true\nlog_level = \"debug\"").unwrap();
        assert_eq!(parsed.warning, 30);
        assert!(parsed.full_alert);
        assert_eq!(parsed.log_level, LogLevel::Debug);
        assert_eq!(parsed.critical, UserConfig::default().critical);
    }
}
