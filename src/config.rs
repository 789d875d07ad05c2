//! Configuration types for sequence combinators

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for bounded parallel transforms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Maximum number of transforms outstanding at once
    pub max_in_flight: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            max_in_flight: num_cpus::get(),
        }
    }
}

impl ParallelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the in-flight limit. Zero is treated as one.
    pub fn max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// In-flight limit for a pool running `pool_capacity` jobs at once
    pub(crate) fn effective_limit(&self, pool_capacity: usize) -> usize {
        self.max_in_flight.min(pool_capacity).max(1)
    }
}

/// Configuration for windowed buffering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Group capacity; a full group is flushed immediately
    pub max_items: usize,
    /// Optional flush timeout, reset after every flush
    pub timeout: Option<Duration>,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_items: 64,
            timeout: None,
        }
    }
}

impl BufferConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the group capacity
    pub fn max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Set the flush timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Configuration for the tokio-backed worker pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    /// Number of jobs allowed to run at the same time
    pub workers: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
        }
    }
}

impl WorkerPoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let buffer = BufferConfig::new()
            .max_items(8)
            .timeout(Duration::from_millis(250));
        assert_eq!(buffer.max_items, 8);
        assert_eq!(buffer.timeout, Some(Duration::from_millis(250)));

        let parallel = ParallelConfig::new().max_in_flight(0);
        assert_eq!(parallel.effective_limit(8), 1);
        assert_eq!(ParallelConfig::new().max_in_flight(16).effective_limit(4), 4);
        assert_eq!(ParallelConfig::new().max_in_flight(3).effective_limit(0), 1);
    }

    #[test]
    fn defaults_are_sized_by_cpu_count() {
        assert_eq!(ParallelConfig::default().max_in_flight, num_cpus::get());
        assert_eq!(WorkerPoolConfig::default().workers, num_cpus::get());
        assert_eq!(BufferConfig::default().timeout, None);
    }
}
