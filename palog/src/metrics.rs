//! Host memory usage for the periodic status report.

use tokio::process::Command;
use tracing::error;

/// Host memory in bytes. Zeros mean "unknown".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemInfo {
    pub total: u64,
    pub used: u64,
}

impl MemInfo {
    /// Used memory as a percentage of total, or `None` when total is unknown.
    pub fn used_percent(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(self.used as f64 * 100.0 / self.total as f64)
    }
}

/// Source of host memory figures. Must not fail: report zeros instead.
#[allow(async_fn_in_trait)]
pub trait HostMetrics {
    async fn read(&self) -> MemInfo;
}

/// Reads memory usage from `free -b`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeCommand;

impl HostMetrics for FreeCommand {
    async fn read(&self) -> MemInfo {
        let output = match Command::new("free").arg("-b").output().await {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                error!(status = %output.status, "failed to run free");
                return MemInfo::default();
            }
            Err(e) => {
                error!(error = %e, "failed to run free");
                return MemInfo::default();
            }
        };

        parse_free(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse the `Mem:` row of `free -b` output.
///
/// A total that cannot be read yields zeros; a used value that cannot be read
/// keeps the total and reports zero used.
pub fn parse_free(output: &str) -> MemInfo {
    let Some(line) = output.lines().nth(1).filter(|l| !l.is_empty()) else {
        error!("free output has no memory row");
        return MemInfo::default();
    };

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 {
        error!(fields = fields.len(), "free output has too few fields");
        return MemInfo::default();
    }

    let total = match fields[1].parse() {
        Ok(total) => total,
        Err(e) => {
            error!(error = %e, "failed to parse total memory");
            return MemInfo::default();
        }
    };
    let used = match fields[2].parse() {
        Ok(used) => used,
        Err(e) => {
            error!(error = %e, "failed to parse used memory");
            0
        }
    };

    MemInfo { total, used }
}
