//! Discovery of network devices backed by physical hardware.

use std::path::Path;

use tracing::debug;

/// List the network devices under `net_class` (normally `/sys/class/net`)
/// that have a `device` link to the underlying hardware.
///
/// Virtual interfaces (loopback, bridges, veth, ...) have no such link and are
/// skipped. A missing or unreadable class directory yields an empty list.
pub fn physical_devices(net_class: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(net_class) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(path = %net_class.display(), error = %e, "Cannot list network devices");
            return Vec::new();
        }
    };

    let mut devices: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().join("device").exists())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();

    devices.sort();
    devices
}
