//! Stream registry implementation
//!
//! Tracks every stream id the port has seen, its current SRI and whether a
//! descriptor change is waiting to be reported on the next packet.
//!
//! The registry holds no lock of its own. The port keeps it behind the same
//! mutex as the packet queue so that change flags and queue contents are
//! always updated together.

use std::collections::HashMap;
use std::sync::Arc;

use super::entry::{PendingChange, SriUpdate, StreamEntry, StreamState};
use crate::sri::{default_comparator, SriComparator, StreamSri};

/// Registry of all streams known to a port
pub struct StreamRegistry {
    /// Map of stream id to entry (retired entries are kept until re-created)
    streams: HashMap<String, StreamEntry>,

    /// Descriptor equivalence test
    comparator: SriComparator,

    /// Last occurrence number handed out
    last_occurrence: u64,
}

impl StreamRegistry {
    /// Create an empty registry using field-wise SRI comparison
    pub fn new() -> Self {
        Self::with_comparator(Arc::new(default_comparator))
    }

    /// Create an empty registry with a custom comparator
    pub fn with_comparator(comparator: SriComparator) -> Self {
        Self {
            streams: HashMap::new(),
            comparator,
            last_occurrence: 0,
        }
    }

    /// Replace the descriptor comparator
    pub fn set_comparator(&mut self, comparator: SriComparator) {
        self.comparator = comparator;
    }

    /// Insert or update the descriptor for `sri.stream_id`
    ///
    /// A retired or unknown stream becomes active again and is always reported
    /// as changed and new. An active stream is changed only if the comparator
    /// says the descriptors differ.
    pub fn update(&mut self, sri: StreamSri) -> SriUpdate {
        if let Some(entry) = self
            .streams
            .get_mut(&sri.stream_id)
            .filter(|entry| entry.is_alive())
        {
            let changed = !(self.comparator)(&entry.sri, &sri);
            if changed {
                entry.sri = sri;
                entry.sri_changed = true;
                tracing::debug!(stream = %entry.sri.stream_id, "SRI changed");
            }
            return SriUpdate {
                sri: entry.sri.clone(),
                changed,
                is_new: false,
            };
        }

        self.activate(sri)
    }

    /// Make sure a stream is active before data is queued for it
    ///
    /// Data for a stream without an announced SRI is accepted with a default
    /// descriptor carrying only the stream id.
    pub fn touch(&mut self, stream_id: &str) -> SriUpdate {
        if let Some(entry) = self.streams.get(stream_id).filter(|entry| entry.is_alive()) {
            return SriUpdate {
                sri: entry.sri.clone(),
                changed: false,
                is_new: false,
            };
        }

        tracing::warn!(
            stream = %stream_id,
            "Received data for stream without SRI, using default SRI"
        );
        self.activate(StreamSri::new(stream_id))
    }

    /// Read and clear the change flag for an active stream
    ///
    /// Returns `None` if the stream is not active.
    pub fn consume_pending_change(&mut self, stream_id: &str) -> Option<PendingChange> {
        let entry = self
            .streams
            .get_mut(stream_id)
            .filter(|entry| entry.is_alive())?;

        Some(PendingChange {
            sri_changed: entry.take_change(),
            sri: entry.sri.clone(),
            occurrence: entry.occurrence,
        })
    }

    /// Mark a stream as retired
    ///
    /// Returns true if the stream was active.
    pub fn retire(&mut self, stream_id: &str) -> bool {
        match self.streams.get_mut(stream_id) {
            Some(entry) if entry.is_alive() => {
                entry.state = StreamState::Retired;
                tracing::debug!(stream = %stream_id, occurrence = entry.occurrence, "Stream retired");
                true
            }
            _ => false,
        }
    }

    /// Retire a stream only if it is still the given occurrence
    ///
    /// Used when an EOS packet is delivered: if the stream was re-announced
    /// after the EOS was queued, the new occurrence stays active.
    pub fn retire_occurrence(&mut self, stream_id: &str, occurrence: u64) -> bool {
        if self.occurrence(stream_id) != Some(occurrence) {
            return false;
        }
        self.retire(stream_id)
    }

    /// Current occurrence number of an active stream
    pub fn occurrence(&self, stream_id: &str) -> Option<u64> {
        self.get(stream_id).map(|entry| entry.occurrence)
    }

    /// Get the entry for an active stream
    pub fn get(&self, stream_id: &str) -> Option<&StreamEntry> {
        self.streams.get(stream_id).filter(|entry| entry.is_alive())
    }

    /// Check if a stream is active
    pub fn is_alive(&self, stream_id: &str) -> bool {
        self.get(stream_id).is_some()
    }

    /// Descriptors of all active streams, ordered by stream id
    pub fn snapshot(&self) -> Vec<StreamSri> {
        let mut sris: Vec<StreamSri> = self
            .streams
            .values()
            .filter(|entry| entry.is_alive())
            .map(|entry| entry.sri.clone())
            .collect();
        sris.sort_by(|a, b| a.stream_id.cmp(&b.stream_id));
        sris
    }

    /// Number of active streams
    pub fn active_count(&self) -> usize {
        self.streams.values().filter(|entry| entry.is_alive()).count()
    }

    fn activate(&mut self, sri: StreamSri) -> SriUpdate {
        self.last_occurrence += 1;
        let entry = StreamEntry::new(sri.clone(), self.last_occurrence);

        tracing::debug!(
            stream = %sri.stream_id,
            occurrence = entry.occurrence,
            "Stream activated"
        );
        self.streams.insert(sri.stream_id.clone(), entry);

        SriUpdate {
            sri,
            changed: true,
            is_new: true,
        }
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}
