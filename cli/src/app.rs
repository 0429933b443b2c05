//! The monitor loop: discovery, the watcher handle, adaptive polling, and
//! shutdown.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use color_eyre::eyre::{eyre, Result};
use tracing::{debug, info, warn};

use battwatch_power::{discover, validate, BatterySet, Snapshot, POWER_SUPPLY_ROOT};

use crate::alert::Alerter;
use crate::config::UserConfig;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_signal(_signal: libc::c_int) {
    SHUTDOWN.store(true, Ordering::Relaxed);
}

fn install_signal_handlers() {
    let handler = handle_signal as extern "C" fn(libc::c_int);
    unsafe {
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handler as libc::sighandler_t);
    }
}

/// Pick the next wait: poll faster while discharging near the warning
/// threshold, slower on external power.
fn next_timeout(snapshot: &Snapshot, warning: u8, base: Duration) -> Duration {
    if snapshot.no_data {
        return base;
    }
    if snapshot.discharging {
        if snapshot.level <= warning.saturating_add(5) {
            return (base / 4).clamp(Duration::from_secs(1), base);
        }
        return base;
    }
    base.saturating_mul(2)
}

pub fn run(config: UserConfig) -> Result<()> {
    let root = Path::new(POWER_SUPPLY_ROOT);

    let names = if config.batteries.is_empty() {
        let found = discover(root);
        if found.is_empty() {
            return Err(eyre!("no batteries found under {}", root.display()));
        }
        info!(batteries = ?found, "discovered batteries");
        found
    } else {
        if let Some(index) = validate(root, &config.batteries) {
            return Err(eyre!(
                "'{}' is not a usable battery device",
                config.batteries[index]
            ));
        }
        config.batteries.clone()
    };

    let mut set = BatterySet::open(root, names)?;
    if set.watched() < set.count() {
        warn!(
            watched = set.watched(),
            total = set.count(),
            "some batteries have no change notification; relying on timeout polling"
        );
    }

    install_signal_handlers();
    let mut alerter = Alerter::new(&config);
    let base = Duration::from_secs(config.interval_secs.max(1));

    // First pass with a zero wait seeds the snapshot, so alerts don't lag a
    // full interval behind startup.
    let mut timeout = Duration::ZERO;
    while !SHUTDOWN.load(Ordering::Relaxed) {
        set.wait_and_refresh(config.required, timeout)?;
        let snapshot = *set.snapshot();
        timeout = next_timeout(&snapshot, config.warning, base);

        if snapshot.no_data {
            warn!("no readable battery data this cycle");
            continue;
        }
        debug!(
            level = snapshot.level,
            discharging = snapshot.discharging,
            full = snapshot.full,
            "battery state refreshed"
        );
        if let Some(alert) = alerter.step(&snapshot) {
            alert.deliver();
        }
    }

    info!("shutting down");
    set.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(level: u8, discharging: bool, full: bool) -> Snapshot {
        Snapshot {
            discharging,
            full,
            level,
            energy_now: level as u64,
            energy_full: 100,
            no_data: false,
        }
    }

    #[test]
    fn discharging_near_warning_polls_faster() {
        let base = Duration::from_secs(60);
        let near = next_timeout(&snapshot(18, true, false), 15, base);
        let idle = next_timeout(&snapshot(100, false, true), 15, base);
        assert!(near < base);
        assert!(idle > base);
    }

    #[test]
    fn steady_discharge_uses_the_base_interval() {
        let base = Duration::from_secs(60);
        assert_eq!(next_timeout(&snapshot(80, true, false), 15, base), base);
    }

    #[test]
    fn fast_polling_never_drops_below_a_second() {
        let base = Duration::from_secs(2);
        let near = next_timeout(&snapshot(10, true, false), 15, base);
        assert_eq!(near, Duration::from_secs(1));
    }
}
