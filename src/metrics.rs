//! Live inputs for dynamic color entries: system load and randomness.
//!
//! Both are traits so the engine can be driven by fixed values in tests.

use std::time::{Duration, SystemTime, UNIX_EPOCH};
use sysinfo::System;

/// Source of system load percentages in `[0, 100]`.
///
/// Every call must take a fresh reading. Implementations return a safe
/// default (0) rather than failing, since a tick has no recovery path for
/// a failed read.
pub trait MetricProvider {
    fn cpu_percent(&mut self) -> f64;
    fn ram_percent(&mut self) -> f64;
}

/// Uniform integers over an inclusive range.
pub trait RandomSource {
    fn uniform_int(&mut self, min: i64, max: i64) -> i64;
}

// ── System metrics ───────────────────────────────────────────────────

/// Reads CPU and memory usage from the host via `sysinfo`.
///
/// CPU usage is measured as the difference between two refreshes, so each
/// `cpu_percent` call blocks for the sample window.
pub struct SystemMetrics {
    system: System,
    cpu_window: Duration,
}

impl SystemMetrics {
    pub fn new() -> Self {
        Self::with_cpu_window(Duration::from_secs(1))
    }

    /// The window is raised to `sysinfo`'s minimum if shorter.
    pub fn with_cpu_window(window: Duration) -> Self {
        Self {
            system: System::new(),
            cpu_window: window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }
}

impl Default for SystemMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricProvider for SystemMetrics {
    fn cpu_percent(&mut self) -> f64 {
        self.system.refresh_cpu_usage();
        std::thread::sleep(self.cpu_window);
        self.system.refresh_cpu_usage();

        let usage = f64::from(self.system.global_cpu_usage());
        if usage.is_finite() { usage } else { 0.0 }
    }

    fn ram_percent(&mut self) -> f64 {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return 0.0;
        }
        self.system.used_memory() as f64 * 100.0 / total as f64
    }
}

// ── Randomness ───────────────────────────────────────────────────────

/// Small non-cryptographic generator (SplitMix64).
#[derive(Clone, Copy, Debug)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seeded from the wall clock.
    pub fn from_time() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x5EED);
        Self::new(nanos)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

impl RandomSource for SplitMix64 {
    /// `min > max` collapses to `min`.
    fn uniform_int(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max.abs_diff(min).wrapping_add(1);
        if span == 0 {
            // full i64 range
            return self.next_u64() as i64;
        }
        min.wrapping_add((self.next_u64() % span) as i64)
    }
}
