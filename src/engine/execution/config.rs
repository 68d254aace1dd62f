//! Configuration for patch execution
//!
//! Controls how modules within one schedule stage are ticked and how the
//! worker pool for parallel stages is sized.

use crate::engine::error::PatchError;
use serde::{Deserialize, Serialize};

/// Enumeration of supported concurrency modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    /// Every module is ticked in order on the calling thread
    #[default]
    Sequential,
    /// Modules within a stage are ticked concurrently using Rayon
    Rayon,
}

/// Configuration for patch execution
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The concurrency mode to use for tick cycles
    #[serde(default)]
    pub concurrency_mode: ConcurrencyMode,
    /// The size of the thread pool for parallel stages
    /// Only relevant when concurrency_mode is Rayon; `None` uses the global pool
    #[serde(default)]
    pub thread_pool_size: Option<usize>,
}

impl EngineConfig {
    /// Create a new configuration with default values
    ///
    /// Default configuration uses Sequential mode with no dedicated pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency mode
    ///
    /// # Arguments
    /// * `mode` - How modules within one stage are ticked
    ///
    /// # Returns
    /// The configuration with the specified concurrency mode
    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Set the thread pool size for parallel stages
    ///
    /// # Arguments
    /// * `size` - Number of worker threads in the dedicated pool
    ///
    /// # Returns
    /// The configuration with the specified thread pool size
    ///
    /// # Note
    /// This setting only affects execution when concurrency_mode is Rayon
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }

    /// Reject settings that cannot be honoured
    pub fn validate(&self) -> Result<(), PatchError> {
        if self.thread_pool_size == Some(0) {
            return Err(PatchError::Config("thread_pool_size must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Build the dedicated worker pool, if one is configured
    pub(crate) fn build_pool(&self) -> Result<Option<rayon::ThreadPool>, PatchError> {
        self.validate()?;
        match (self.concurrency_mode, self.thread_pool_size) {
            (ConcurrencyMode::Rayon, Some(size)) => rayon::ThreadPoolBuilder::new()
                .num_threads(size)
                .thread_name(|index| format!("rpatch-tick-{}", index))
                .build()
                .map(Some)
                .map_err(|err| PatchError::Config(err.to_string())),
            _ => Ok(None),
        }
    }
}
