use std::time::{Duration, Instant};

use sysinfo::System;

/// Minimum spacing between two real system refreshes; sysinfo needs a short
/// interval between CPU refreshes to produce a meaningful reading.
const REFRESH_INTERVAL: Duration = Duration::from_millis(200);

/// Cached CPU / memory utilisation reader.
pub struct ResourceSampler {
    sys: System,
    cpu_count: usize,
    last_refresh: Instant,
    cpu_percent: f32,
    memory_percent: f32,
}

impl ResourceSampler {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu();
        sys.refresh_memory();
        let cpu_count = sys.cpus().len().max(1);

        let mut sampler = Self {
            sys,
            cpu_count,
            last_refresh: Instant::now(),
            cpu_percent: 0.0,
            memory_percent: 0.0,
        };
        sampler.read();
        sampler
    }

    /// Returns `(cpu_percent, memory_percent)`.
    pub fn sample(&mut self) -> (f32, f32) {
        if self.last_refresh.elapsed() >= REFRESH_INTERVAL {
            self.sys.refresh_cpu();
            self.sys.refresh_memory();
            self.read();
            self.last_refresh = Instant::now();
        }
        (self.cpu_percent, self.memory_percent)
    }

    fn read(&mut self) {
        self.cpu_percent =
            self.sys.cpus().iter().map(|c| c.cpu_usage()).sum::<f32>() / self.cpu_count as f32;
        let total_memory = self.sys.total_memory().max(1);
        self.memory_percent = (self.sys.used_memory() as f32 / total_memory as f32) * 100.0;
    }
}

impl Default for ResourceSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_within_percent_range() {
        let mut sampler = ResourceSampler::new();
        let (cpu, mem) = sampler.sample();
        assert!((0.0..=100.0 * sampler.cpu_count as f32).contains(&cpu));
        assert!((0.0..=100.0).contains(&mem));
    }
}
