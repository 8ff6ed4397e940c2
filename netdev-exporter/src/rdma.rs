//! RDMA hardware counters from the InfiniBand sysfs class.

use std::path::{Path, PathBuf};

use tracing::trace;

use crate::catalogue::{CounterReading, RDMA_COUNTERS};
use crate::ibdev::IbPort;

/// Directory holding the hardware counters of one InfiniBand port.
pub fn hw_counters_dir(infiniband_class: &Path, port: &IbPort) -> PathBuf {
    infiniband_class
        .join(&port.ibdev)
        .join("ports")
        .join(port.port.to_string())
        .join("hw_counters")
}

/// Read every catalogue RDMA counter for an InfiniBand port.
///
/// Counters whose file is missing, unreadable or not a decimal integer are
/// left out of the result.
pub fn read_rdma(infiniband_class: &Path, port: &IbPort) -> Vec<CounterReading> {
    let base = hw_counters_dir(infiniband_class, port);

    RDMA_COUNTERS
        .iter()
        .filter_map(|def| {
            let path = base.join(def.key);
            let value = std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|content| content.trim().parse::<u64>().map_err(|e| e.to_string()));

            match value {
                Ok(value) => Some(CounterReading { def, value }),
                Err(error) => {
                    trace!(path = %path.display(), %error, "Skipping RDMA counter");
                    None
                }
            }
        })
        .collect()
}
