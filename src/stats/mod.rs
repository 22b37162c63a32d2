//! Statistics and metrics for input ports

pub mod metrics;

pub use metrics::{LinkStatistics, PortStatistics, DEFAULT_STATS_WINDOW};
