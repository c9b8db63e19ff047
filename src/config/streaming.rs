use super::ConfigError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Radius (in chunks) around the focus inside which chunks are generated
    /// and meshed.
    pub load_radius_chunks: i32,
    /// Radius beyond which chunks are destroyed. Must be >= the load radius;
    /// the band between the two is hysteresis against focus jitter.
    pub keep_radius_chunks: i32,
    /// Worker threads for generation and meshing. Zero means "all cores
    /// minus two".
    pub worker_threads: usize,
    /// Bound on queued stage jobs; requests past it are dropped and
    /// re-issued on a later tick.
    pub max_jobs_in_flight: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            load_radius_chunks: 8,
            keep_radius_chunks: 10,
            worker_threads: 0,
            max_jobs_in_flight: 256,
        }
    }
}

impl StreamingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.load_radius_chunks < 0 || self.keep_radius_chunks < 0 {
            return Err(ConfigError::Invalid(format!(
                "streaming radii must be non-negative, got load {} keep {}",
                self.load_radius_chunks, self.keep_radius_chunks
            )));
        }
        if self.max_jobs_in_flight == 0 {
            return Err(ConfigError::Invalid(
                "max_jobs_in_flight must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn effective_worker_threads(&self) -> usize {
        if self.worker_threads > 0 {
            return self.worker_threads;
        }
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        cores.saturating_sub(2).max(1)
    }
}
