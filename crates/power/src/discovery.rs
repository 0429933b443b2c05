//! Enumeration and validation of battery devices.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::attributes::is_battery;

/// List every battery device under `root`, sorted by name.
///
/// Non-battery power supplies (AC adapters, USB ports) and devices without a
/// readable charge value are filtered out. An empty result means the host
/// has no batteries; that is not an error at this layer.
pub fn discover(root: &Path) -> Vec<String> {
    let mut batteries = Vec::new();
    if let Ok(entries) = fs::read_dir(root) {
        for entry in entries.flatten() {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if is_battery(&entry.path()) {
                batteries.push(name);
            } else {
                debug!(device = %name, "skipping non-battery power supply");
            }
        }
    }
    batteries.sort();
    batteries
}

/// Re-probe a caller-supplied device list.
///
/// Returns the index of the first entry that is not a usable battery, or
/// `None` when all are valid. Lets the caller fail fast on operator-provided
/// names before any watching starts.
pub fn validate(root: &Path, names: &[String]) -> Option<usize> {
    names.iter().position(|name| !is_battery(&root.join(name)))
}
