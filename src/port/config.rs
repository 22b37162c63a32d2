//! Port configuration

use crate::queue::QueueCapacity;
use crate::stats::DEFAULT_STATS_WINDOW;

/// Default port name
pub const DEFAULT_PORT_NAME: &str = "dataIn";

/// Input port configuration options
#[derive(Debug, Clone)]
pub struct PortConfig {
    /// Port name, used in logs and statistics
    pub name: String,

    /// Queue depth past which the queue is collapsed
    pub max_queue_depth: QueueCapacity,

    /// Number of pushes kept for throughput statistics
    pub stats_window: usize,

    /// Record statistics on every push
    pub stats_enabled: bool,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PORT_NAME.to_string(),
            max_queue_depth: QueueCapacity::default(),
            stats_window: DEFAULT_STATS_WINDOW,
            stats_enabled: true,
        }
    }
}

impl PortConfig {
    /// Create a new config with a custom port name
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the port name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the maximum queue depth
    pub fn max_queue_depth(mut self, capacity: QueueCapacity) -> Self {
        self.max_queue_depth = capacity;
        self
    }

    /// Never collapse the queue
    pub fn unbounded(mut self) -> Self {
        self.max_queue_depth = QueueCapacity::Unbounded;
        self
    }

    /// Set the statistics window (at least one push)
    pub fn stats_window(mut self, pushes: usize) -> Self {
        self.stats_window = pushes.max(1);
        self
    }

    /// Disable statistics recording
    pub fn disable_stats(mut self) -> Self {
        self.stats_enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::DEFAULT_QUEUE_DEPTH;

    #[test]
    fn test_default_config() {
        let config = PortConfig::default();

        assert_eq!(config.name, DEFAULT_PORT_NAME);
        assert_eq!(
            config.max_queue_depth,
            QueueCapacity::Bounded(DEFAULT_QUEUE_DEPTH)
        );
        assert_eq!(config.stats_window, DEFAULT_STATS_WINDOW);
        assert!(config.stats_enabled);
    }

    #[test]
    fn test_with_name() {
        let config = PortConfig::with_name("dataFloat_in");
        assert_eq!(config.name, "dataFloat_in");
    }

    #[test]
    fn test_builder_stats_window_floor() {
        let config = PortConfig::default().stats_window(0);
        assert_eq!(config.stats_window, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = PortConfig::default()
            .name("dataShort_in")
            .max_queue_depth(QueueCapacity::Bounded(8))
            .stats_window(20)
            .disable_stats();

        assert_eq!(config.name, "dataShort_in");
        assert_eq!(config.max_queue_depth, QueueCapacity::Bounded(8));
        assert_eq!(config.stats_window, 20);
        assert!(!config.stats_enabled);

        let config = config.unbounded();
        assert_eq!(config.max_queue_depth, QueueCapacity::Unbounded);
    }
}
