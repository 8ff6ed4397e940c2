//! Scrape orchestration: discover devices, read their counters, render.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::catalogue::CounterReading;
use crate::config::ExporterConfig;
use crate::devices::physical_devices;
use crate::ethtool::read_ethtool;
use crate::ibdev::{IbPort, ibdev_mapping};
use crate::rdma::read_rdma;
use crate::registry::ScrapeRegistry;
use crate::tool::{SystemRunner, ToolRunner};

/// Where the collector looks for tools and sysfs counters.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub ibdev2netdev: PathBuf,
    pub ethtool: PathBuf,
    pub ethtool_no_stats_code: i32,
    pub net_class: PathBuf,
    pub infiniband_class: PathBuf,
}

impl CollectorSettings {
    pub fn from_config(config: &ExporterConfig) -> Self {
        Self {
            ibdev2netdev: config.tools.ibdev2netdev.clone(),
            ethtool: config.tools.ethtool.clone(),
            ethtool_no_stats_code: config.tools.ethtool_no_stats_code,
            net_class: config.sysfs.net_class.clone(),
            infiniband_class: config.sysfs.infiniband_class.clone(),
        }
    }
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self::from_config(&ExporterConfig::default())
    }
}

/// Counters read for one device during a scrape.
#[derive(Debug, Clone, Default)]
pub struct DeviceSample {
    pub device: String,
    pub ethtool: Vec<CounterReading>,
    pub rdma: Vec<CounterReading>,
}

/// Read all counters of one device.
pub async fn sample_device<R: ToolRunner>(
    settings: &CollectorSettings,
    runner: &R,
    device: String,
    ib_port: Option<IbPort>,
) -> DeviceSample {
    let ethtool = read_ethtool(
        runner,
        &settings.ethtool,
        &device,
        settings.ethtool_no_stats_code,
    )
    .await;

    let rdma = match &ib_port {
        Some(port) => read_rdma(&settings.infiniband_class, port),
        None => Vec::new(),
    };

    DeviceSample {
        device,
        ethtool,
        rdma,
    }
}

/// Collects NIC counters on demand.
///
/// The collector keeps no counter state: every call to [`collect`] builds a
/// new registry, so concurrent scrapes never share values.
///
/// [`collect`]: NetdevCollector::collect
pub struct NetdevCollector<R = SystemRunner> {
    settings: Arc<CollectorSettings>,
    runner: Arc<R>,
}

/// Create a shareable collector handle.
pub type SharedCollector<R = SystemRunner> = Arc<NetdevCollector<R>>;

impl<R: ToolRunner + 'static> NetdevCollector<R> {
    pub fn new(settings: CollectorSettings, runner: R) -> Self {
        Self {
            settings: Arc::new(settings),
            runner: Arc::new(runner),
        }
    }

    /// Run one collection cycle and return its registry.
    ///
    /// Devices are sampled concurrently. A failing device only loses its own
    /// counters. Dropping the returned future aborts the device tasks, and with
    /// them any tool still running.
    pub async fn collect(&self) -> ScrapeRegistry {
        let started = Instant::now();
        let registry = ScrapeRegistry::new();

        let devices = physical_devices(&self.settings.net_class);
        let mapping = ibdev_mapping(&*self.runner, &self.settings.ibdev2netdev).await;

        let device_count = devices.len();
        let mut correlated = 0usize;
        let mut tasks = JoinSet::new();
        for device in devices {
            let ib_port = mapping.get(&device).cloned();
            if ib_port.is_some() {
                correlated += 1;
            }
            let settings = Arc::clone(&self.settings);
            let runner = Arc::clone(&self.runner);
            tasks.spawn(async move { sample_device(&settings, &*runner, device, ib_port).await });
        }

        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(sample) => {
                    registry.record_all(&sample.device, &sample.ethtool);
                    registry.record_all(&sample.device, &sample.rdma);
                }
                Err(e) => warn!(error = %e, "Device collection task failed"),
            }
        }

        debug!(
            devices = device_count,
            correlated,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scrape complete"
        );

        registry
    }

    /// Run one collection cycle and render it in the text exposition format.
    pub async fn render(&self) -> String {
        match self.collect().await.render() {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Failed to encode metrics");
                String::new()
            }
        }
    }
}
