//! Stream entry and state types
//!
//! This module defines the per-stream state stored in the registry.

use crate::sri::StreamSri;

/// State of a stream entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Stream is live: SRI announced or data seen, no EOS yet
    Active,
    /// End-of-stream recorded; the next push re-creates the stream
    Retired,
}

/// Entry for a single stream in the registry
#[derive(Debug, Clone)]
pub struct StreamEntry {
    /// Current descriptor
    pub sri: StreamSri,

    /// Set when the descriptor changed and no packet has reported it yet
    pub sri_changed: bool,

    /// Occurrence number, unique across the registry
    ///
    /// Every time a stream id becomes active it is assigned a fresh number,
    /// so packets from before and after an EOS can be told apart.
    pub occurrence: u64,

    /// Current stream state
    pub state: StreamState,
}

impl StreamEntry {
    /// Create a new active entry with the change flag raised
    pub(super) fn new(sri: StreamSri, occurrence: u64) -> Self {
        Self {
            sri,
            sri_changed: true,
            occurrence,
            state: StreamState::Active,
        }
    }

    /// Check if the stream is live
    pub fn is_alive(&self) -> bool {
        self.state == StreamState::Active
    }

    /// Read and clear the pending change flag
    pub(super) fn take_change(&mut self) -> bool {
        std::mem::take(&mut self.sri_changed)
    }
}

/// Result of registering a descriptor
#[derive(Debug, Clone)]
pub struct SriUpdate {
    /// Descriptor now stored for the stream
    pub sri: StreamSri,
    /// True if the stream is new or the descriptor differs from the stored one
    pub changed: bool,
    /// True if this call made the stream active (listener should fire)
    pub is_new: bool,
}

/// Pending-change state captured when a packet is created
#[derive(Debug, Clone)]
pub struct PendingChange {
    /// Prior value of the change flag (now cleared)
    pub sri_changed: bool,
    /// Descriptor snapshot for the packet
    pub sri: StreamSri,
    /// Occurrence the packet belongs to
    pub occurrence: u64,
}
