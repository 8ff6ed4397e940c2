//! Driver statistics from `ethtool -S <device>`.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::catalogue::{CounterReading, ethtool_counter};
use crate::tool::ToolRunner;

/// Exit code of `ethtool -S` for a device whose driver exposes no statistics.
pub const NO_STATS_EXIT_CODE: i32 = 94;

/// Matches an indented `name: value` statistics line.
static STAT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ +([^ :]+): (\d+)").unwrap());

/// Parse `ethtool -S` output, keeping only catalogue counters.
///
/// Headers such as `NIC statistics:`, unknown counters and values that do not
/// fit in a `u64` are dropped.
pub fn parse_stats(output: &str) -> Vec<CounterReading> {
    output
        .lines()
        .filter_map(|line| {
            let caps = STAT_LINE.captures(line)?;
            let def = ethtool_counter(&caps[1])?;
            let value = caps[2].parse().ok()?;
            Some(CounterReading { def, value })
        })
        .collect()
}

/// Run `ethtool -S` for one device and parse the catalogue counters it reports.
///
/// Any failure leaves the device without ethtool counters. Failures other than
/// the "no statistics" exit code are logged.
pub async fn read_ethtool<R: ToolRunner>(
    runner: &R,
    program: &Path,
    device: &str,
    no_stats_code: i32,
) -> Vec<CounterReading> {
    let args = ["-S".to_string(), device.to_string()];
    let output = match runner.run(program, &args).await {
        Ok(output) => output,
        Err(e) => {
            warn!(device, error = %e, "ethtool failed");
            return Vec::new();
        }
    };

    if !output.success() {
        if output.code != Some(no_stats_code) {
            warn!(
                device,
                code = ?output.code,
                stderr = %output.stderr.trim(),
                "ethtool failed"
            );
        }
        return Vec::new();
    }

    parse_stats(&output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ToolError, ToolOutput};
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;

    /// Log sink shared between a test and its subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Run `read_ethtool` for `eth0` with a subscriber capturing its logs.
    async fn read_with_logs(runner: &RecordingRunner) -> (Vec<CounterReading>, String) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();

        // #[tokio::test] runs on the current thread, so the default applies to the read.
        let _guard = tracing::subscriber::set_default(subscriber);
        let readings =
            read_ethtool(runner, Path::new("/sbin/ethtool"), "eth0", NO_STATS_EXIT_CODE).await;
        (readings, logs.contents())
    }

    fn reading_of<'a>(readings: &'a [CounterReading], key: &str) -> Option<&'a CounterReading> {
        readings.iter().find(|r| r.def.key == key)
    }

    #[test]
    fn test_parse_catalogue_counter() {
        let readings = parse_stats("     rx_bytes_phy: 12345");

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].def.key, "rx_bytes_phy");
        assert_eq!(readings[0].value, 12345);
    }

    #[test]
    fn test_parse_ignores_unknown_and_malformed() {
        let output = "NIC statistics:\n\
                      \x20    rx_packets: 10\n\
                      unknown_counter: 9\n\
                      \x20    tx_dropped: 3\n\
                      \x20    rx_bytes_phy: -1\n\
                      \x20    tx_bytes_phy: 99999999999999999999999\n\
                      tx_cqe_err: 4\n";
        let readings = parse_stats(output);

        assert_eq!(readings.len(), 1);
        assert_eq!(reading_of(&readings, "tx_dropped").unwrap().value, 3);
    }

    /// Records the arguments of each call and replies with a fixed result.
    struct RecordingRunner {
        reply: fn() -> Result<ToolOutput, ToolError>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl RecordingRunner {
        fn new(reply: fn() -> Result<ToolOutput, ToolError>) -> Self {
            Self {
                reply,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl ToolRunner for RecordingRunner {
        async fn run(&self, _program: &Path, args: &[String]) -> Result<ToolOutput, ToolError> {
            self.calls.lock().push(args.to_vec());
            (self.reply)()
        }
    }

    #[tokio::test]
    async fn test_read_passes_device() {
        let runner = RecordingRunner::new(|| {
            Ok(ToolOutput {
                code: Some(0),
                stdout: "NIC statistics:\n  rx_bytes_phy: 100\n  tx_dropped: 3\n".to_string(),
                stderr: String::new(),
            })
        });

        let readings =
            read_ethtool(&runner, Path::new("/sbin/ethtool"), "eth0", NO_STATS_EXIT_CODE).await;

        assert_eq!(
            *runner.calls.lock(),
            vec![vec!["-S".to_string(), "eth0".to_string()]]
        );
        assert_eq!(reading_of(&readings, "rx_bytes_phy").unwrap().value, 100);
        assert_eq!(reading_of(&readings, "tx_dropped").unwrap().value, 3);
    }

    #[tokio::test]
    async fn test_read_no_stats_exit_code() {
        let runner = RecordingRunner::new(|| {
            Ok(ToolOutput {
                code: Some(NO_STATS_EXIT_CODE),
                stdout: String::new(),
                stderr: "no stats available\n".to_string(),
            })
        });

        let readings =
            read_ethtool(&runner, Path::new("/sbin/ethtool"), "lo", NO_STATS_EXIT_CODE).await;
        assert!(readings.is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_discards_output() {
        let runner = RecordingRunner::new(|| {
            Ok(ToolOutput {
                code: Some(1),
                stdout: "  tx_dropped: 3\n".to_string(),
                stderr: "Cannot get stats strings information\n".to_string(),
            })
        });

        let readings =
            read_ethtool(&runner, Path::new("/sbin/ethtool"), "eth0", NO_STATS_EXIT_CODE).await;
        assert!(readings.is_empty());
    }

    #[tokio::test]
    async fn test_read_timeout() {
        let runner = RecordingRunner::new(|| {
            Err(ToolError::Timeout {
                program: "/sbin/ethtool".into(),
                timeout: std::time::Duration::from_secs(10),
            })
        });

        let readings =
            read_ethtool(&runner, Path::new("/sbin/ethtool"), "eth0", NO_STATS_EXIT_CODE).await;
        assert!(readings.is_empty());
    }

    #[tokio::test]
    async fn test_no_stats_exit_code_is_silent() {
        let runner = RecordingRunner::new(|| {
            Ok(ToolOutput {
                code: Some(NO_STATS_EXIT_CODE),
                stdout: String::new(),
                stderr: "no stats available\n".to_string(),
            })
        });

        let (readings, logs) = read_with_logs(&runner).await;

        assert!(readings.is_empty());
        assert!(!logs.contains("ethtool failed"), "unexpected log: {}", logs);
    }

    #[tokio::test]
    async fn test_other_exit_code_logs_warning() {
        let runner = RecordingRunner::new(|| {
            Ok(ToolOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: "Cannot get stats strings information\n".to_string(),
            })
        });

        let (readings, logs) = read_with_logs(&runner).await;

        assert!(readings.is_empty());
        assert!(logs.contains("WARN"), "missing warning: {}", logs);
        assert!(logs.contains("ethtool failed"));
        assert!(logs.contains("eth0"));
        assert!(logs.contains("Cannot get stats strings information"));
    }

    #[tokio::test]
    async fn test_timeout_logs_warning() {
        let runner = RecordingRunner::new(|| {
            Err(ToolError::Timeout {
                program: "/sbin/ethtool".into(),
                timeout: std::time::Duration::from_secs(5),
            })
        });

        let (readings, logs) = read_with_logs(&runner).await;

        assert!(readings.is_empty());
        assert!(logs.contains("WARN"), "missing warning: {}", logs);
        assert!(logs.contains("ethtool failed"));
        assert!(logs.contains("eth0"));
        assert!(logs.contains("did not finish"));
    }
}
