//! Alert levels and desktop notification delivery.

use std::process::Command;

use tracing::{debug, info, warn};

use battwatch_power::Snapshot;

use crate::config::UserConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Charging,
    Discharging,
    Full,
    Warning,
    Critical,
    Danger,
}

impl AlertLevel {
    fn classify(snapshot: &Snapshot, warning: u8, critical: u8, danger: u8) -> Self {
        if snapshot.discharging {
            match snapshot.level {
                level if level <= danger => AlertLevel::Danger,
                level if level <= critical => AlertLevel::Critical,
                level if level <= warning => AlertLevel::Warning,
                _ => AlertLevel::Discharging,
            }
        } else if snapshot.full {
            AlertLevel::Full
        } else {
            AlertLevel::Charging
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Low,
    Normal,
    Critical,
}

impl Urgency {
    fn flag(self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Normal => "normal",
            Urgency::Critical => "critical",
        }
    }
}

/// A notification owed to the user for a level transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub urgency: Urgency,
    pub summary: &'static str,
    pub body: String,
    pub command: Option<String>,
}

impl Alert {
    pub fn deliver(&self) {
        send_notification(self.urgency, self.summary, &self.body);
        if let Some(command) = &self.command {
            info!(%command, "running danger command");
            if let Err(err) = Command::new("sh").args(["-c", command]).spawn() {
                warn!(error = %err, "could not run danger command");
            }
        }
    }
}

/// Turns refreshed snapshots into alerts, one per level transition.
///
/// Recharging above a threshold re-arms it, so the next crossing alerts
/// again.
pub struct Alerter {
    warning: u8,
    critical: u8,
    danger: u8,
    full_alert: bool,
    danger_command: Option<String>,
    last: Option<AlertLevel>,
}

impl Alerter {
    pub fn new(config: &UserConfig) -> Self {
        Self {
            warning: config.warning,
            critical: config.critical,
            danger: config.danger,
            full_alert: config.full_alert,
            danger_command: config.danger_command.clone(),
            last: None,
        }
    }

    /// Classify `snapshot` and return the alert its level transition owes,
    /// if any. Staying on the same level owes nothing.
    pub fn step(&mut self, snapshot: &Snapshot) -> Option<Alert> {
        let level = AlertLevel::classify(snapshot, self.warning, self.critical, self.danger);
        let previous = self.last.replace(level);
        if previous == Some(level) {
            return None;
        }
        debug!(?previous, current = ?level, "battery alert level changed");

        let body = format!("Battery at {}%", snapshot.level);
        match level {
            AlertLevel::Warning => Some(Alert {
                urgency: Urgency::Normal,
                summary: "Battery low",
                body,
                command: None,
            }),
            AlertLevel::Critical => Some(Alert {
                urgency: Urgency::Critical,
                summary: "Battery critically low",
                body,
                command: None,
            }),
            AlertLevel::Danger => Some(Alert {
                urgency: Urgency::Critical,
                summary: "Battery almost empty",
                body,
                command: self.danger_command.clone(),
            }),
            AlertLevel::Full if self.full_alert => Some(Alert {
                urgency: Urgency::Low,
                summary: "Battery full",
                body,
                command: None,
            }),
            _ => None,
        }
    }
}

fn send_notification(urgency: Urgency, summary: &str, body: &str) {
    let result = Command::new("notify-send")
        .args(["-u", urgency.flag(), "-a", "battwatch", summary, body])
        .status();
    match result {
        Ok(status) if status.success() => debug!(summary, "notification sent"),
        Ok(status) => warn!(%status, "notify-send exited with failure"),
        Err(err) => warn!(error = %err, "could not run notify-send"),
    }
}
