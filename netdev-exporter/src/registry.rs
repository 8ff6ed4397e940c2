//! Per-scrape metric registry.
//!
//! A [`ScrapeRegistry`] is built empty for every scrape, filled from the
//! readings of that scrape and dropped once rendered. Since each counter starts
//! at zero and receives the freshly read value, the exported value is the
//! absolute hardware counter, not a delta.

use std::collections::HashMap;

use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

use crate::catalogue::{CounterReading, CounterSource, ETHTOOL_COUNTERS, RDMA_COUNTERS};

/// Labels shared by every exported counter.
#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct DeviceLabels {
    pub device: String,
}

type CounterFamily = Family<DeviceLabels, Counter>;

/// Registry holding one counter family per catalogue entry.
#[derive(Debug)]
pub struct ScrapeRegistry {
    registry: Registry,
    counters: HashMap<(CounterSource, &'static str), CounterFamily>,
}

impl ScrapeRegistry {
    /// Create a registry with every catalogue counter registered and no samples.
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let mut counters = HashMap::with_capacity(ETHTOOL_COUNTERS.len() + RDMA_COUNTERS.len());

        for def in ETHTOOL_COUNTERS.iter().chain(RDMA_COUNTERS) {
            let family = CounterFamily::default();
            registry.register(def.metric_name(), def.help(), family.clone());
            counters.insert((def.source, def.key), family);
        }

        Self { registry, counters }
    }

    /// Add a reading to the counter of `device`.
    pub fn record(&self, device: &str, reading: &CounterReading) {
        // Readings only ever reference catalogue entries, all registered in new().
        if let Some(family) = self.counters.get(&(reading.def.source, reading.def.key)) {
            family
                .get_or_create(&DeviceLabels {
                    device: device.to_string(),
                })
                .inc_by(reading.value);
        }
    }

    pub fn record_all(&self, device: &str, readings: &[CounterReading]) {
        for reading in readings {
            self.record(device, reading);
        }
    }

    /// Render in the text exposition format.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for ScrapeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
