//! Fixed catalogues of the counters this exporter publishes.
//!
//! Both tables are process-wide constants. A counter that is not listed here
//! never appears in a scrape, whatever the tools or sysfs report.

/// Which source a counter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterSource {
    /// `ethtool -S <device>` output.
    Ethtool,
    /// `/sys/class/infiniband/<ibdev>/ports/<port>/hw_counters/<key>`.
    Rdma,
}

impl CounterSource {
    /// Prefix of every metric name exported from this source.
    pub fn prefix(&self) -> &'static str {
        match self {
            CounterSource::Ethtool => "ethtool",
            CounterSource::Rdma => "rdma",
        }
    }

    fn help_prefix(&self) -> &'static str {
        match self {
            CounterSource::Ethtool => "ethtool counter",
            CounterSource::Rdma => "RDMA HW counter",
        }
    }
}

/// One exported counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterDef {
    pub source: CounterSource,
    /// Name of the counter in the source (ethtool stat name or sysfs file name).
    pub key: &'static str,
}

impl CounterDef {
    const fn ethtool(key: &'static str) -> Self {
        Self {
            source: CounterSource::Ethtool,
            key,
        }
    }

    const fn rdma(key: &'static str) -> Self {
        Self {
            source: CounterSource::Rdma,
            key,
        }
    }

    /// Metric name without the `_total` suffix, which the encoder adds for counters.
    pub fn metric_name(&self) -> String {
        format!("{}_{}", self.source.prefix(), self.key)
    }

    /// Exported sample name, as it appears in the rendered output.
    #[cfg(test)]
    pub fn exported_name(&self) -> String {
        format!("{}_total", self.metric_name())
    }

    pub fn help(&self) -> String {
        format!("{} {}", self.source.help_prefix(), self.key)
    }
}

/// A value read for one catalogue counter on one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterReading {
    pub def: &'static CounterDef,
    pub value: u64,
}

/// Counters taken from `ethtool -S`.
pub static ETHTOOL_COUNTERS: &[CounterDef] = &[
    CounterDef::ethtool("rx_buffer_passed_thres_phy"),
    CounterDef::ethtool("rx_bytes_phy"),
    CounterDef::ethtool("rx_corrected_bits_phy"),
    CounterDef::ethtool("rx_cqe_compress_blks"),
    CounterDef::ethtool("rx_cqe_compress_pkts"),
    CounterDef::ethtool("rx_crc_errors_phy"),
    CounterDef::ethtool("rx_discards_phy"),
    CounterDef::ethtool("rx_fifo_errors"),
    CounterDef::ethtool("rx_missed_errors"),
    CounterDef::ethtool("rx_mpwqe_filler"),
    CounterDef::ethtool("rx_multicast_phy"),
    CounterDef::ethtool("rx_out_of_buffer"),
    CounterDef::ethtool("rx_over_errors"),
    CounterDef::ethtool("rx_oversize_packets_phy"),
    CounterDef::ethtool("rx_pci_signal_integrity"),
    CounterDef::ethtool("rx_pcs_symbol_err_phy"),
    CounterDef::ethtool("rx_prio0_buf_discard"),
    CounterDef::ethtool("rx_prio0_cong_discard"),
    CounterDef::ethtool("rx_prio0_discards"),
    CounterDef::ethtool("rx_steer_missed_packets"),
    CounterDef::ethtool("rx_symbol_err_phy"),
    CounterDef::ethtool("rx_wqe_err"),
    CounterDef::ethtool("tx_bytes_phy"),
    CounterDef::ethtool("tx_cqe_err"),
    CounterDef::ethtool("tx_dropped"),
    CounterDef::ethtool("tx_fifo_errors"),
    CounterDef::ethtool("tx_multicast_phy"),
    CounterDef::ethtool("tx_pci_signal_integrity"),
    CounterDef::ethtool("tx_queue_stopped"),
];

/// Counters read from the InfiniBand `hw_counters` directory.
pub static RDMA_COUNTERS: &[CounterDef] = &[
    CounterDef::rdma("out_of_buffer"),
    CounterDef::rdma("req_cqe_error"),
    CounterDef::rdma("req_cqe_flush_error"),
    CounterDef::rdma("resp_cqe_error"),
    CounterDef::rdma("resp_cqe_flush_error"),
    CounterDef::rdma("resp_local_length_error"),
];

/// Look up an ethtool counter by its stat name.
pub fn ethtool_counter(key: &str) -> Option<&'static CounterDef> {
    ETHTOOL_COUNTERS.iter().find(|def| def.key == key)
}

/// Look up an RDMA counter by its sysfs file name.
#[cfg(test)]
pub fn rdma_counter(key: &str) -> Option<&'static CounterDef> {
    RDMA_COUNTERS.iter().find(|def| def.key == key)
}
