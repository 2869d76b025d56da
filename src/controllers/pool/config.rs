use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

pub const MAX_POOL_SIZE: usize = 32;
pub const FALLBACK_POOL_SIZE: usize = 4;
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub size: usize,
    pub init_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: default_pool_size(),
            init_timeout: DEFAULT_INIT_TIMEOUT,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn with_size(self, size: usize) -> Self {
        Self { size, ..self }
    }

    #[must_use]
    pub fn with_init_timeout(self, init_timeout: Duration) -> Self {
        Self {
            init_timeout,
            ..self
        }
    }
}

/// Hardware concurrency clamped to `[1, MAX_POOL_SIZE]`, or
/// `FALLBACK_POOL_SIZE` when the platform cannot say.
#[must_use]
pub fn default_pool_size() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(FALLBACK_POOL_SIZE)
        .clamp(1, MAX_POOL_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_size_is_bounded() {
        let size = PoolConfig::default().size;

        assert!((1..=MAX_POOL_SIZE).contains(&size));
    }

    #[test]
    fn test_builders() {
        let config = PoolConfig::default()
            .with_size(3)
            .with_init_timeout(Duration::from_millis(5));

        assert_eq!(config.size, 3);
        assert_eq!(config.init_timeout, Duration::from_millis(5));
    }
}
