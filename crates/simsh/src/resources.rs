//! Synthetic system metrics for `top`, `df` and `free`.
//!
//! Figures are generated, never read from the host, so the simulated
//! machine reveals nothing about the real one.

use rand::Rng;
use std::time::Duration;

/// Simulated physical memory in MiB.
pub const MEMORY_TOTAL_MB: u64 = 16_384;

/// Simulated swap in MiB.
pub const SWAP_TOTAL_MB: u64 = 2_048;

/// Simulated root filesystem size in GiB.
pub const DISK_TOTAL_GB: u64 = 256;

/// Simulated root filesystem usage in GiB.
pub const DISK_USED_GB: u64 = 87;

/// One set of metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSnapshot {
    /// 0.0 ..= 100.0
    pub cpu_percent: f64,
    pub memory_total_mb: u64,
    pub memory_used_mb: u64,
    pub swap_used_mb: u64,
    pub disk_total_gb: u64,
    pub disk_used_gb: u64,
    pub process_count: u32,
    pub uptime: Duration,
    pub load_average: [f64; 3],
}

impl ResourceSnapshot {
    /// Generate a fresh random snapshot.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let cpu_percent = rng.random_range(2.0..85.0_f64);
        let load = cpu_percent / 25.0;
        Self {
            cpu_percent: (cpu_percent * 10.0).round() / 10.0,
            memory_total_mb: MEMORY_TOTAL_MB,
            memory_used_mb: rng.random_range(MEMORY_TOTAL_MB / 5..MEMORY_TOTAL_MB * 4 / 5),
            swap_used_mb: rng.random_range(0..SWAP_TOTAL_MB / 8),
            disk_total_gb: DISK_TOTAL_GB,
            disk_used_gb: DISK_USED_GB,
            process_count: rng.random_range(120..260),
            uptime: Duration::from_secs(rng.random_range(600..30 * 86_400)),
            load_average: [
                round2(load * rng.random_range(0.8..1.2)),
                round2(load * rng.random_range(0.7..1.1)),
                round2(load * rng.random_range(0.6..1.0)),
            ],
        }
    }

    pub fn memory_free_mb(&self) -> u64 {
        self.memory_total_mb.saturating_sub(self.memory_used_mb)
    }

    pub fn memory_percent(&self) -> f64 {
        percent(self.memory_used_mb, self.memory_total_mb)
    }

    pub fn disk_free_gb(&self) -> u64 {
        self.disk_total_gb.saturating_sub(self.disk_used_gb)
    }

    pub fn disk_percent(&self) -> f64 {
        percent(self.disk_used_gb, self.disk_total_gb)
    }

    /// Uptime as `top` prints it: `3 days, 4:05` or `4:05`.
    pub fn uptime_display(&self) -> String {
        let secs = self.uptime.as_secs();
        let days = secs / 86_400;
        let hours = (secs % 86_400) / 3_600;
        let minutes = (secs % 3_600) / 60;
        match days {
            0 => format!("{}:{:02}", hours, minutes),
            1 => format!("1 day, {}:{:02}", hours, minutes),
            n => format!("{} days, {}:{:02}", n, hours, minutes),
        }
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(used as f64 * 100.0 / total as f64)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_ranges() {
        for _ in 0..50 {
            let snap = ResourceSnapshot::generate();
            assert!((0.0..=100.0).contains(&snap.cpu_percent));
            assert!(snap.memory_used_mb <= snap.memory_total_mb);
            assert!((0.0..=100.0).contains(&snap.memory_percent()));
            assert!(snap.disk_used_gb <= snap.disk_total_gb);
            assert!((120..260).contains(&snap.process_count));
            assert!(snap.uptime.as_secs() >= 600);
            assert!(snap.load_average.iter().all(|l| *l >= 0.0));
        }
    }

    #[test]
    fn test_derived_figures() {
        let snap = ResourceSnapshot {
            cpu_percent: 10.0,
            memory_total_mb: 1000,
            memory_used_mb: 250,
            swap_used_mb: 0,
            disk_total_gb: 100,
            disk_used_gb: 40,
            process_count: 150,
            uptime: Duration::from_secs(90_061),
            load_average: [0.1, 0.2, 0.3],
        };
        assert_eq!(snap.memory_free_mb(), 750);
        assert_eq!(snap.memory_percent(), 25.0);
        assert_eq!(snap.disk_free_gb(), 60);
        assert_eq!(snap.disk_percent(), 40.0);
        assert_eq!(snap.uptime_display(), "1 day, 1:01");
    }

    #[test]
    fn test_uptime_display_under_a_day() {
        let mut snap = ResourceSnapshot::generate();
        snap.uptime = Duration::from_secs(3_725);
        assert_eq!(snap.uptime_display(), "1:02");
        snap.uptime = Duration::from_secs(3 * 86_400);
        assert_eq!(snap.uptime_display(), "3 days, 0:00");
    }
}
