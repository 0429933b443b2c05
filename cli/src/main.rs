mod alert;
mod app;
mod config;
mod logging;

use std::fs;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};

use config::{runtime_dir, LogLevel, UserConfig};
use logging::LogMode;

#[derive(Debug, Parser)]
#[command(
    name = "battwatch",
    version,
    about = "Battery charge watcher that sends desktop alerts at low-battery thresholds"
)]
struct Cli {
    /// Battery device names to watch (repeatable; default: discover all)
    #[arg(short = 'n', long = "battery", value_name = "NAME")]
    batteries: Vec<String>,

    /// Warning threshold percent
    #[arg(short, long, value_name = "PERCENT")]
    warning: Option<u8>,

    /// Critical threshold percent
    #[arg(short, long, value_name = "PERCENT")]
    critical: Option<u8>,

    /// Danger threshold percent
    #[arg(short, long, value_name = "PERCENT")]
    danger: Option<u8>,

    /// Also notify when every battery reports full
    #[arg(short, long)]
    full: bool,

    /// Base poll interval, e.g. "90s" or "2m"
    #[arg(short, long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    interval: Option<Duration>,

    /// Treat an unreadable battery attribute as fatal
    #[arg(short, long)]
    required: bool,

    /// Detach from the terminal and run in the background
    #[arg(short, long)]
    background: bool,

    /// Shell command to run when the danger level is reached
    #[arg(long, value_name = "CMD")]
    danger_command: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn apply_overrides(config: &mut UserConfig, cli: &Cli) {
    if !cli.batteries.is_empty() {
        config.batteries = cli.batteries.clone();
    }
    if let Some(warning) = cli.warning {
        config.warning = warning;
    }
    if let Some(critical) = cli.critical {
        config.critical = critical;
    }
    if let Some(danger) = cli.danger {
        config.danger = danger;
    }
    if cli.full {
        config.full_alert = true;
    }
    if let Some(interval) = cli.interval {
        config.interval_secs = interval.as_secs().max(1);
    }
    if cli.required {
        config.required = true;
    }
    if let Some(command) = &cli.danger_command {
        config.danger_command = Some(command.clone());
    }
}

fn check_thresholds(config: &UserConfig) -> Result<()> {
    if config.warning > 100 {
        return Err(eyre!("warning threshold must be at most 100"));
    }
    if config.danger > config.critical || config.critical > config.warning {
        return Err(eyre!(
            "thresholds must be ordered: danger <= critical <= warning"
        ));
    }
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let mut config = UserConfig::load();
    let log_level_override = cli.log_level.as_deref().map(LogLevel::from_str);
    apply_overrides(&mut config, &cli);
    check_thresholds(&config)?;

    if cli.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    if cli.background {
        fs::create_dir_all(runtime_dir())?;
        daemonize::Daemonize::new()
            .working_directory(runtime_dir())
            .start()
            .map_err(|e| eyre!("failed to daemonize: {e}"))?;
    }

    let mode = if cli.background {
        LogMode::File
    } else {
        LogMode::Stderr
    };
    let _guard = logging::init(config.log_level, mode, log_level_override);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "battwatch starting");
    app::run(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_values_override_config_field_by_field() {
        let cli = Cli::parse_from([
            "battwatch", "-n", "BAT1", "-w", "30", "-f", "--interval", "2m",
        ]);
        let mut config = UserConfig::default();
        apply_overrides(&mut config, &cli);

        assert_eq!(config.batteries, vec!["BAT1".to_string()]);
        assert_eq!(config.warning, 30);
        assert!(config.full_alert);
        assert_eq!(config.interval_secs, 120);
        assert_eq!(config.critical, UserConfig::default().critical);
        assert_eq!(config.danger_command, None);
    }

    #[test]
    fn unordered_thresholds_are_rejected() {
        let config = UserConfig {
            critical: 50,
            ..UserConfig::default()
        };
        assert!(check_thresholds(&config).is_err());
        assert!(check_thresholds(&UserConfig::default()).is_ok());
    }
}
