//! Port usage state and consumer wait modes

use std::time::Duration;

use crate::queue::QueueCapacity;

/// Load indicator derived from queue depth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortUsageState {
    /// Nothing queued
    Idle,
    /// Packets queued, room left
    Active,
    /// Queue at or past its bounded capacity
    Busy,
}

impl PortUsageState {
    /// Derive the state for a queue of `depth` packets
    pub fn from_depth(depth: usize, capacity: QueueCapacity) -> Self {
        if depth == 0 {
            PortUsageState::Idle
        } else if capacity.is_full_at(depth) {
            PortUsageState::Busy
        } else {
            PortUsageState::Active
        }
    }
}

/// How long `get_packet` waits for data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetMode {
    /// Wait until a packet arrives or the port is stopped
    Blocking,
    /// Return immediately
    NonBlocking,
    /// Wait at most this long
    Timeout(Duration),
}
