//! Linux power-supply discovery and aggregate battery-state watching.
//!
//! The watcher registers a kernel change notification on every battery's
//! `status` attribute and coalesces them into a single wake, so a caller can
//! block in [`BatterySet::wait_and_refresh`] and read a consistent aggregate
//! [`Snapshot`] after every wake or timeout.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//!
//! use battwatch_power::{discover, BatterySet, POWER_SUPPLY_ROOT};
//!
//! # fn main() -> battwatch_power::Result<()> {
//! let root = Path::new(POWER_SUPPLY_ROOT);
//! let mut set = BatterySet::open(root, discover(root))?;
//! loop {
//!     set.wait_and_refresh(false, Duration::from_secs(60))?;
//!     println!("battery at {}%", set.snapshot().level);
//! }
//! # }
//! ```

mod attributes;
mod discovery;
mod watcher;

pub use attributes::{
    is_battery, AttributeKind, POWER_SUPPLY_ROOT, STATUS_DISCHARGING, STATUS_FULL,
};
pub use discovery::{discover, validate};
pub use watcher::{BatterySet, Error, Result, Snapshot};
