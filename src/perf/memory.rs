//! Memory samplers.

/// Reports the memory footprint of the running process.
pub trait MemorySampler: Send + Sync {
    /// Current footprint in MB, if it can be measured.
    fn current_mb(&self) -> Option<f64>;

    /// High-water mark in MB since the last [`reset_peak`], if the sampler
    /// tracks one.
    ///
    /// [`reset_peak`]: MemorySampler::reset_peak
    fn peak_mb(&self) -> Option<f64> {
        None
    }

    /// Start a new high-water mark. Called when a batch starts.
    fn reset_peak(&self) {}
}

/// Resident set size from `/proc/self/status`.
///
/// Returns `None` on platforms without procfs. The kernel's own
/// high-water mark (`VmHWM`) covers the whole process lifetime, so the
/// batch peak comes from periodic sampling only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessMemory;

impl MemorySampler for ProcessMemory {
    fn current_mb(&self) -> Option<f64> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        status_kb(&status, "VmRSS").map(|kb| kb as f64 / 1024.0)
    }
}

/// Value in kB of a `Key:   1234 kB` line.
fn status_kb(status: &str, key: &str) -> Option<u64> {
    status.lines().find_map(|line| {
        let rest = line.strip_prefix(key)?.strip_prefix(':')?;
        rest.split_whitespace().next()?.parse().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_kb() {
        let status = "Name:\tdocsift\nVmHWM:\t  20480 kB\nVmRSS:\t   10240 kB\n";
        assert_eq!(status_kb(status, "VmRSS"), Some(10240));
        assert_eq!(status_kb(status, "VmHWM"), Some(20480));
        assert_eq!(status_kb(status, "VmSwap"), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_process_memory_on_linux() {
        let mb = ProcessMemory.current_mb().unwrap();
        assert!(mb > 0.0);
    }

    #[test]
    fn test_process_memory_has_no_lifetime_peak() {
        // Earlier allocations in the process must not count as a batch peak.
        let spike = vec![1u8; 64 * 1024 * 1024];
        drop(spike);
        ProcessMemory.reset_peak();
        assert_eq!(ProcessMemory.peak_mb(), None);
    }
}
