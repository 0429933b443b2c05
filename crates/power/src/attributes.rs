//! Sysfs attribute probing for power-supply devices.

use std::fs;
use std::io;
use std::path::Path;

/// Root of the kernel power-supply hierarchy.
pub const POWER_SUPPLY_ROOT: &str = "/sys/class/power_supply";

/// `status` value while a battery drains.
pub const STATUS_DISCHARGING: &str = "Discharging";

/// `status` value once charging has completed.
pub const STATUS_FULL: &str = "Full";

/// Full-capacity-equivalent unit for devices that only expose `capacity`.
pub(crate) const CAPACITY_FULL_EQUIVALENT: u64 = 100;

/// Which attribute pair a device reports its charge through.
///
/// Kernel drivers expose charge (µAh), energy (µWh), or only a precomputed
/// percentage. Probing prefers charge over energy over capacity, the most to
/// least granular scheme the driver provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Charge,
    Energy,
    CapacityOnly,
}

impl AttributeKind {
    /// Probe `device` for the attribute pair it exposes.
    pub fn classify(device: &Path) -> Self {
        if device.join("charge_now").exists() {
            AttributeKind::Charge
        } else if device.join("energy_now").exists() {
            AttributeKind::Energy
        } else {
            AttributeKind::CapacityOnly
        }
    }

    /// Attribute holding the present charge-equivalent value.
    pub fn now_attr(self) -> &'static str {
        match self {
            AttributeKind::Charge => "charge_now",
            AttributeKind::Energy => "energy_now",
            AttributeKind::CapacityOnly => "capacity",
        }
    }

    /// Attribute holding the full-capacity value. `None` for capacity-only
    /// devices, whose values are already a percentage of 100.
    pub fn full_attr(self) -> Option<&'static str> {
        match self {
            AttributeKind::Charge => Some("charge_full"),
            AttributeKind::Energy => Some("energy_full"),
            AttributeKind::CapacityOnly => None,
        }
    }
}

/// True iff `device` is a battery we can aggregate: its `type` attribute
/// reads exactly `"Battery"` and its chosen now-equivalent attribute parses
/// to a non-negative integer. Missing or unreadable files exclude the
/// device, they are not errors here.
pub fn is_battery(device: &Path) -> bool {
    if read_text(&device.join("type")).ok().as_deref() != Some("Battery") {
        return false;
    }
    read_value(&device.join(AttributeKind::classify(device).now_attr())).is_ok()
}

/// Read a sysfs text attribute. An empty file counts as unreadable.
pub(crate) fn read_text(path: &Path) -> io::Result<String> {
    let text = fs::read_to_string(path)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "empty attribute"));
    }
    Ok(text.to_owned())
}

/// Read a sysfs numeric attribute as a non-negative integer.
pub(crate) fn read_value(path: &Path) -> io::Result<u64> {
    read_text(path)?
        .parse()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn device(attrs: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (attr, value) in attrs {
            fs::write(dir.path().join(attr), format!("{value}\n")).unwrap();
        }
        dir
    }

    #[test]
    fn classify_prefers_charge_then_energy_then_capacity() {
        let charge = device(&[("charge_now", "1"), ("energy_now", "1"), ("capacity", "1")]);
        assert_eq!(AttributeKind::classify(charge.path()), AttributeKind::Charge);

        let energy = device(&[("energy_now", "1"), ("capacity", "1")]);
        assert_eq!(AttributeKind::classify(energy.path()), AttributeKind::Energy);

        let capacity = device(&[("capacity", "1")]);
        assert_eq!(
            AttributeKind::classify(capacity.path()),
            AttributeKind::CapacityOnly
        );
    }

    #[test]
    fn is_battery_requires_the_battery_type() {
        let mains = device(&[("type", "Mains"), ("capacity", "50")]);
        assert!(!is_battery(mains.path()));

        let battery = device(&[("type", "Battery"), ("capacity", "50")]);
        assert!(is_battery(battery.path()));
    }

    #[test]
    fn is_battery_requires_a_readable_now_value() {
        let missing = device(&[("type", "Battery")]);
        assert!(!is_battery(missing.path()));

        let negative = device(&[("type", "Battery"), ("capacity", "-5")]);
        assert!(!is_battery(negative.path()));

        let garbage = device(&[("type", "Battery"), ("capacity", "n/a")]);
        assert!(!is_battery(garbage.path()));
    }

    #[test]
    fn empty_attribute_files_are_unreadable() {
        let dir = device(&[("status", "")]);
        assert!(read_text(&dir.path().join("status")).is_err());
        assert!(read_text(&dir.path().join("missing")).is_err());
    }
}
