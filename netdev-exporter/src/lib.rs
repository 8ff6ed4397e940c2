//! Prometheus exporter for NIC performance counters.
//!
//! On every scrape the exporter lists the network devices backed by physical
//! hardware, reads their `ethtool -S` statistics and, for devices that sit on
//! an InfiniBand port, the RDMA hardware counters from sysfs.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │ ethtool, sysfs, │────>│    Collector    │────>│   HTTP Server   │
//! │  ibdev2netdev   │     │  (per scrape)   │     │   (/metrics)    │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! Nothing is kept between scrapes: each request builds a fresh registry, so
//! every exported counter carries the absolute value read from the hardware.
//!
//! # Usage
//!
//! ```bash
//! netdev-exporter --port 9117 --log-level warning
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod catalogue;
pub mod collector;
pub mod config;
pub mod devices;
pub mod ethtool;
pub mod http;
pub mod ibdev;
pub mod rdma;
pub mod registry;
pub mod tool;

pub use collector::{CollectorSettings, NetdevCollector, SharedCollector};
pub use config::ExporterConfig;
pub use http::HttpServer;
pub use registry::ScrapeRegistry;
pub use tool::{SystemRunner, ToolRunner};
