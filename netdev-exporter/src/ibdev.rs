//! Correlation of network devices with InfiniBand devices and ports.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::tool::{ToolError, ToolRunner};

/// An InfiniBand device and port behind a network device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IbPort {
    pub ibdev: String,
    pub port: u32,
}

impl IbPort {
    pub fn new(ibdev: impl Into<String>, port: u32) -> Self {
        Self {
            ibdev: ibdev.into(),
            port,
        }
    }
}

/// Network device name to InfiniBand port.
pub type IbMapping = HashMap<String, IbPort>;

/// Matches `mlx5_0 port 1 ==> ens1f0 (Up)`.
static MAPPING_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^ ]+) port (\d+) ==> ([^ ]+)").unwrap());

/// Parse `ibdev2netdev` output. Lines that do not match are ignored.
pub fn parse_mapping(output: &str) -> IbMapping {
    output
        .lines()
        .filter_map(|line| {
            let caps = MAPPING_LINE.captures(line)?;
            let port = caps[2].parse().ok()?;
            Some((caps[3].to_string(), IbPort::new(&caps[1], port)))
        })
        .collect()
}

/// Run the mapping tool and parse its output.
///
/// A missing tool or a nonzero exit means no mapping is available, and the
/// result is empty. That is a normal state on hosts without InfiniBand.
pub async fn ibdev_mapping<R: ToolRunner>(runner: &R, program: &Path) -> IbMapping {
    let output = match runner.run(program, &[]).await {
        Ok(output) => output,
        Err(ToolError::NotFound(_)) => {
            debug!(program = %program.display(), "InfiniBand mapping tool not installed");
            return IbMapping::new();
        }
        Err(e) => {
            warn!(error = %e, "InfiniBand mapping tool failed");
            return IbMapping::new();
        }
    };

    if !output.success() {
        debug!(
            program = %program.display(),
            code = ?output.code,
            stderr = %output.stderr.trim(),
            "InfiniBand mapping tool exited with an error"
        );
        return IbMapping::new();
    }

    parse_mapping(&output.stdout)
}
