//! The battery watcher: change notifications, the refresh protocol, and the
//! aggregate snapshot.

use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::attributes::{
    read_text, read_value, AttributeKind, CAPACITY_FULL_EQUIVALENT, STATUS_DISCHARGING,
    STATUS_FULL,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no battery devices to watch")]
    NoBatteries,

    #[error("failed to create change watcher: {0}")]
    Watch(#[from] notify::Error),

    #[error("could not read {}: {source}", .path.display())]
    RequiredRead { path: PathBuf, source: io::Error },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Aggregate view over all watched batteries, recomputed by each refresh
/// cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// True if any battery is currently discharging.
    pub discharging: bool,
    /// True only if every battery reports full.
    pub full: bool,
    /// Aggregate charge level, 0-100, rounded.
    pub level: u8,
    /// Sum of present charge-equivalent units for this cycle.
    pub energy_now: u64,
    /// Sum of full-capacity-equivalent units for this cycle.
    pub energy_full: u64,
    /// True when no device contributed a reading this cycle. `level` is 0
    /// then and means "unknown", not "empty".
    pub no_data: bool,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            discharging: false,
            full: false,
            level: 0,
            energy_now: 0,
            energy_full: 0,
            no_data: true,
        }
    }
}

/// A live set of watched batteries.
///
/// Construction registers a change notification on every device's `status`
/// attribute. All registrations share one endpoint whose events collapse
/// into a single pending wake, so a burst of changes costs one refresh. The
/// snapshot is written only by [`wait_and_refresh`](Self::wait_and_refresh)
/// on the caller's thread; the notification callback only signals.
pub struct BatterySet {
    root: PathBuf,
    names: Vec<String>,
    snapshot: Snapshot,
    watcher: Option<RecommendedWatcher>,
    wake: Receiver<()>,
    watched: usize,
}

impl BatterySet {
    /// Start watching `names` under `root`.
    ///
    /// Fails when `names` is empty or the notification endpoint cannot be
    /// created. A registration failure for an individual device is logged
    /// and leaves that device on timeout polling; it still participates in
    /// aggregation.
    pub fn open(root: impl Into<PathBuf>, names: Vec<String>) -> Result<Self> {
        let root = root.into();
        if names.is_empty() {
            return Err(Error::NoBatteries);
        }

        let (wake_tx, wake_rx) = mpsc::sync_channel(1);
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Modify(_) | EventKind::Access(_)) {
                        // Full means a wake is already pending.
                        let _ = wake_tx.try_send(());
                    }
                }
                Err(err) => warn!(error = %err, "change watcher error"),
            },
            Config::default(),
        )?;

        let mut watched = 0;
        for name in &names {
            let status = root.join(name).join("status");
            match watcher.watch(&status, RecursiveMode::NonRecursive) {
                Ok(()) => watched += 1,
                Err(err) => warn!(
                    device = %name,
                    error = %err,
                    "cannot watch status attribute; device falls back to timeout polling"
                ),
            }
        }
        debug!(total = names.len(), watched, "battery watcher ready");

        Ok(Self {
            root,
            names,
            snapshot: Snapshot::default(),
            watcher: Some(watcher),
            wake: wake_rx,
            watched,
        })
    }

    /// The device names this set aggregates, in refresh order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn count(&self) -> usize {
        self.names.len()
    }

    /// Number of devices with a live change registration. Less than
    /// [`count`](Self::count) means degraded wake latency, not incorrect
    /// aggregation.
    pub fn watched(&self) -> usize {
        self.watched
    }

    /// The aggregate computed by the most recent refresh cycle.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Block until any battery's status changes or `timeout` elapses, then
    /// re-read every battery and recompute the snapshot.
    ///
    /// The two wake paths are indistinguishable to the caller; both re-read
    /// full current state rather than diffing, so coalesced bursts lose
    /// nothing. With `required` set, any unreadable attribute aborts the
    /// refresh with [`Error::RequiredRead`]; otherwise the device is skipped
    /// for this cycle only.
    pub fn wait_and_refresh(&mut self, required: bool, timeout: Duration) -> Result<()> {
        match self.wake.recv_timeout(timeout) {
            Ok(()) => {
                // Collapse anything that arrived while we were waking.
                while self.wake.try_recv().is_ok() {}
            }
            Err(RecvTimeoutError::Timeout) => {}
            // Endpoint closed: pure timeout polling from here on.
            Err(RecvTimeoutError::Disconnected) => thread::sleep(timeout),
        }
        self.refresh(required)
    }

    fn refresh(&mut self, required: bool) -> Result<()> {
        self.snapshot.discharging = false;
        self.snapshot.full = true;
        self.snapshot.energy_now = 0;
        self.snapshot.energy_full = 0;

        // Reporting schemes are assumed homogeneous across the set; the
        // first device decides for everyone.
        let kind = AttributeKind::classify(&self.root.join(&self.names[0]));

        for name in &self.names {
            let device = self.root.join(name);

            let status_path = device.join("status");
            let status = match read_text(&status_path) {
                Ok(status) => status,
                Err(source) => {
                    if required {
                        return Err(Error::RequiredRead {
                            path: status_path,
                            source,
                        });
                    }
                    debug!(device = %name, "status unreadable, skipped this cycle");
                    continue;
                }
            };
            self.snapshot.discharging |= status == STATUS_DISCHARGING;
            self.snapshot.full &= status == STATUS_FULL;

            let now_path = device.join(kind.now_attr());
            let now = match read_value(&now_path) {
                Ok(now) => now,
                Err(source) => {
                    if required {
                        return Err(Error::RequiredRead {
                            path: now_path,
                            source,
                        });
                    }
                    debug!(device = %name, attr = kind.now_attr(), "unreadable, skipped this cycle");
                    continue;
                }
            };

            let full = match kind.full_attr() {
                Some(attr) => {
                    let full_path = device.join(attr);
                    match read_value(&full_path) {
                        Ok(full) => full,
                        Err(source) => {
                            if required {
                                return Err(Error::RequiredRead {
                                    path: full_path,
                                    source,
                                });
                            }
                            debug!(device = %name, attr, "unreadable, skipped this cycle");
                            continue;
                        }
                    }
                }
                None => CAPACITY_FULL_EQUIVALENT,
            };

            self.snapshot.energy_now += now;
            self.snapshot.energy_full += full;
        }

        if self.snapshot.energy_full == 0 {
            self.snapshot.level = 0;
            self.snapshot.no_data = true;
        } else {
            let percent =
                100.0 * self.snapshot.energy_now as f64 / self.snapshot.energy_full as f64;
            self.snapshot.level = percent.round().min(100.0) as u8;
            self.snapshot.no_data = false;
        }
        Ok(())
    }

    /// Stop watching and release every kernel registration.
    ///
    /// Idempotent, and terminates even when no registration ever succeeded.
    /// A refresh call made afterwards degrades to pure timeout polling.
    pub fn close(&mut self) {
        if self.watcher.take().is_some() {
            self.watched = 0;
            debug!("battery watcher closed");
        }
    }
}

impl Drop for BatterySet {
    fn drop(&mut self) {
        self.close();
    }
}
