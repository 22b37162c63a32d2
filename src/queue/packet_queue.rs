//! Bounded multi-stream packet queue
//!
//! Packets from every stream share one FIFO. When a push takes the queue past
//! its capacity, the queue is collapsed: the live occurrence of each stream
//! keeps only its newest packet, and so do all of its finished occurrences
//! together. Survivors inherit the flags of everything dropped before them.
//! Consumers learn about the loss through `input_queue_flushed`.

use std::collections::{HashMap, VecDeque};

use super::packet::{DataTransfer, QueuedPacket};
use crate::error::PortError;
use crate::payload::Payload;
use crate::registry::StreamRegistry;
use crate::sri::{PrecisionTime, StreamSri};

/// Default maximum queue depth
pub const DEFAULT_QUEUE_DEPTH: usize = 100;

/// Maximum number of packets the queue holds before collapsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueCapacity {
    /// Collapse once the depth exceeds this many packets
    Bounded(usize),
    /// Never collapse
    Unbounded,
}

impl QueueCapacity {
    /// Check if a queue of `depth` packets has gone past capacity
    pub fn is_exceeded_by(&self, depth: usize) -> bool {
        match self {
            QueueCapacity::Bounded(max) => depth > *max,
            QueueCapacity::Unbounded => false,
        }
    }

    /// Check if a queue of `depth` packets is at or past capacity
    pub fn is_full_at(&self, depth: usize) -> bool {
        match self {
            QueueCapacity::Bounded(max) => depth >= *max,
            QueueCapacity::Unbounded => false,
        }
    }

    /// Depth as reported over the wire (-1 for unbounded)
    pub fn as_depth(&self) -> i64 {
        match self {
            QueueCapacity::Bounded(max) => i64::try_from(*max).unwrap_or(i64::MAX),
            QueueCapacity::Unbounded => -1,
        }
    }
}

impl Default for QueueCapacity {
    fn default() -> Self {
        QueueCapacity::Bounded(DEFAULT_QUEUE_DEPTH)
    }
}

impl TryFrom<i64> for QueueCapacity {
    type Error = PortError;

    fn try_from(depth: i64) -> Result<Self, Self::Error> {
        match depth {
            -1 => Ok(QueueCapacity::Unbounded),
            d if d < -1 => Err(PortError::InvalidQueueDepth(d)),
            d => usize::try_from(d)
                .map(QueueCapacity::Bounded)
                .map_err(|_| PortError::InvalidQueueDepth(d)),
        }
    }
}

/// What happened to a pushed packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Empty, non-EOS data; nothing queued
    Discarded,
    /// Empty EOS folded into an already-queued packet of the same stream
    Merged,
    /// A new packet was appended
    Queued {
        /// The push overflowed the queue and triggered a collapse
        flushed: bool,
    },
}

impl EnqueueOutcome {
    /// Whether the push left something new for a consumer to pick up
    pub fn is_deliverable(&self) -> bool {
        !matches!(self, EnqueueOutcome::Discarded)
    }
}

/// Result of [`PacketQueue::enqueue`]
#[derive(Debug, Clone)]
pub struct EnqueueReport {
    pub outcome: EnqueueOutcome,
    /// Descriptor synthesized for a stream that had no SRI
    pub new_stream: Option<StreamSri>,
}

/// Packets that a collapse reduces to a single survivor
#[derive(Debug, PartialEq, Eq, Hash)]
enum CollapseGroup {
    /// Occurrence still accepting data
    Live(u64),
    /// All finished occurrences of one stream id
    Finished(String),
}

impl CollapseGroup {
    fn of<P>(registry: &StreamRegistry, queued: &QueuedPacket<P>) -> Self {
        let stream_id = &queued.packet.stream_id;
        if registry.occurrence(stream_id) == Some(queued.occurrence) {
            CollapseGroup::Live(queued.occurrence)
        } else {
            CollapseGroup::Finished(stream_id.clone())
        }
    }
}

/// FIFO of packets from all streams on a port
#[derive(Debug)]
pub struct PacketQueue<P> {
    /// Queued packets, oldest first
    packets: VecDeque<QueuedPacket<P>>,
    /// Collapse threshold
    capacity: QueueCapacity,
    /// Number of collapses performed
    flush_count: u64,
}

impl<P: Payload> PacketQueue<P> {
    /// Create an empty queue with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(QueueCapacity::default())
    }

    /// Create an empty queue with the given capacity
    pub fn with_capacity(capacity: QueueCapacity) -> Self {
        Self {
            packets: VecDeque::new(),
            capacity,
            flush_count: 0,
        }
    }

    /// Queue a pushed packet
    ///
    /// - Empty data without EOS is discarded.
    /// - Empty data with EOS sets the EOS flag on the newest queued packet of
    ///   the same stream occurrence if it has none yet, otherwise it is queued
    ///   as an empty terminator.
    /// - Anything else becomes a new packet carrying the registry's pending
    ///   SRI change.
    ///
    /// Queuing an EOS retires the stream immediately. If the queue ends up
    /// past capacity it is collapsed once.
    pub fn enqueue(
        &mut self,
        registry: &mut StreamRegistry,
        stream_id: &str,
        data: P,
        time: PrecisionTime,
        eos: bool,
    ) -> EnqueueReport {
        if data.is_empty() {
            if !eos {
                tracing::trace!(stream = %stream_id, "Discarding empty packet");
                return EnqueueReport {
                    outcome: EnqueueOutcome::Discarded,
                    new_stream: None,
                };
            }
            if self.merge_eos(registry, stream_id) {
                return EnqueueReport {
                    outcome: EnqueueOutcome::Merged,
                    new_stream: None,
                };
            }
        }

        let touched = registry.touch(stream_id);
        let new_stream = touched.is_new.then_some(touched.sri);

        // touch() always leaves the stream active
        let Some(pending) = registry.consume_pending_change(stream_id) else {
            return EnqueueReport {
                outcome: EnqueueOutcome::Discarded,
                new_stream,
            };
        };

        if eos {
            registry.retire(stream_id);
        }

        tracing::trace!(
            stream = %stream_id,
            elements = data.element_count(),
            eos = eos,
            sri_changed = pending.sri_changed,
            "Queueing packet"
        );

        self.packets.push_back(QueuedPacket {
            packet: DataTransfer {
                data,
                time,
                eos,
                stream_id: stream_id.to_string(),
                sri: pending.sri,
                sri_changed: pending.sri_changed,
                input_queue_flushed: false,
            },
            occurrence: pending.occurrence,
        });

        let flushed = self.capacity.is_exceeded_by(self.packets.len());
        if flushed {
            self.collapse(registry);
        }

        EnqueueReport {
            outcome: EnqueueOutcome::Queued { flushed },
            new_stream,
        }
    }

    /// Fold an empty EOS into the newest queued packet of the live stream
    fn merge_eos(&mut self, registry: &mut StreamRegistry, stream_id: &str) -> bool {
        let Some(occurrence) = registry.occurrence(stream_id) else {
            return false;
        };

        let newest = self
            .packets
            .iter_mut()
            .rev()
            .find(|queued| queued.packet.stream_id == stream_id);

        match newest {
            Some(queued) if queued.occurrence == occurrence && queued.is_open() => {
                queued.packet.eos = true;
                registry.retire(stream_id);
                tracing::debug!(stream = %stream_id, "EOS merged into queued packet");
                true
            }
            _ => false,
        }
    }

    /// Keep only the newest packet of each collapse group
    ///
    /// The live occurrence of a stream is one group; every finished
    /// occurrence of the same id still queued is folded into a second one,
    /// so no stream id holds more than two packets afterwards.
    fn collapse(&mut self, registry: &StreamRegistry) {
        let before = self.packets.len();
        let mut survivors: Vec<QueuedPacket<P>> = Vec::with_capacity(before);
        let mut slots: HashMap<CollapseGroup, usize> = HashMap::new();

        // Walk from the tail so the first packet seen per group is the newest
        while let Some(queued) = self.packets.pop_back() {
            let group = CollapseGroup::of(registry, &queued);
            match slots.get(&group) {
                Some(&slot) => survivors[slot].absorb(&queued),
                None => {
                    slots.insert(group, survivors.len());
                    survivors.push(queued);
                }
            }
        }

        survivors.reverse();
        self.packets = survivors.into();
        self.flush_count += 1;

        tracing::debug!(
            before = before,
            after = self.packets.len(),
            capacity = ?self.capacity,
            "Input queue flushed"
        );
    }

    /// Pop the oldest packet
    pub fn dequeue(&mut self, registry: &mut StreamRegistry) -> Option<DataTransfer<P>> {
        let queued = self.packets.pop_front()?;
        Some(Self::release(registry, queued))
    }

    /// Pop the oldest packet of one stream, leaving other streams in place
    pub fn dequeue_stream(
        &mut self,
        registry: &mut StreamRegistry,
        stream_id: &str,
    ) -> Option<DataTransfer<P>> {
        let index = self
            .packets
            .iter()
            .position(|queued| queued.packet.stream_id == stream_id)?;
        let queued = self.packets.remove(index)?;
        Some(Self::release(registry, queued))
    }

    fn release(registry: &mut StreamRegistry, queued: QueuedPacket<P>) -> DataTransfer<P> {
        if queued.packet.eos {
            registry.retire_occurrence(&queued.packet.stream_id, queued.occurrence);
            tracing::debug!(stream = %queued.packet.stream_id, "EOS delivered");
        }
        queued.packet
    }

    /// Current number of queued packets
    pub fn depth(&self) -> usize {
        self.packets.len()
    }

    /// Check if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Current capacity
    pub fn capacity(&self) -> QueueCapacity {
        self.capacity
    }

    /// Change the capacity; takes effect on the next enqueue
    pub fn set_capacity(&mut self, capacity: QueueCapacity) {
        self.capacity = capacity;
    }

    /// Number of collapses since creation
    pub fn flush_count(&self) -> u64 {
        self.flush_count
    }

    /// Queue fill as a percentage of capacity (0 when unbounded)
    pub fn fill_percent(&self) -> f64 {
        match self.capacity {
            QueueCapacity::Bounded(0) => 100.0,
            QueueCapacity::Bounded(max) => self.packets.len() as f64 * 100.0 / max as f64,
            QueueCapacity::Unbounded => 0.0,
        }
    }

    /// Stream ids with at least one queued packet, in queue order
    pub fn queued_streams(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for queued in &self.packets {
            if !ids.contains(&queued.packet.stream_id.as_str()) {
                ids.push(&queued.packet.stream_id);
            }
        }
        ids
    }
}

impl<P: Payload> Default for PacketQueue<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(
        queue: &mut PacketQueue<Vec<u8>>,
        registry: &mut StreamRegistry,
        stream_id: &str,
        size: usize,
        eos: bool,
    ) -> EnqueueReport {
        queue.enqueue(registry, stream_id, vec![0u8; size], PrecisionTime::now(), eos)
    }

    fn pop(queue: &mut PacketQueue<Vec<u8>>, registry: &mut StreamRegistry) -> DataTransfer<Vec<u8>> {
        queue.dequeue(registry).expect("queue should not be empty")
    }

    #[test]
    fn test_capacity_from_depth() {
        assert_eq!(QueueCapacity::try_from(-1), Ok(QueueCapacity::Unbounded));
        assert_eq!(QueueCapacity::try_from(0), Ok(QueueCapacity::Bounded(0)));
        assert_eq!(QueueCapacity::try_from(42), Ok(QueueCapacity::Bounded(42)));
        assert_eq!(
            QueueCapacity::try_from(-2),
            Err(PortError::InvalidQueueDepth(-2))
        );
        assert_eq!(QueueCapacity::Unbounded.as_depth(), -1);
        assert_eq!(QueueCapacity::Bounded(7).as_depth(), 7);
        assert_eq!(QueueCapacity::default(), QueueCapacity::Bounded(DEFAULT_QUEUE_DEPTH));
    }

    #[test]
    fn test_capacity_thresholds() {
        let cap = QueueCapacity::Bounded(3);
        assert!(!cap.is_exceeded_by(3));
        assert!(cap.is_exceeded_by(4));
        assert!(cap.is_full_at(3));
        assert!(!cap.is_full_at(2));
        assert!(!QueueCapacity::Unbounded.is_exceeded_by(usize::MAX));
        assert!(!QueueCapacity::Unbounded.is_full_at(usize::MAX));
    }

    #[test]
    fn test_empty_packet_discarded() {
        let mut registry = StreamRegistry::new();
        let mut queue = PacketQueue::new();

        let report = push(&mut queue, &mut registry, "s", 0, false);
        assert_eq!(report.outcome, EnqueueOutcome::Discarded);
        assert!(report.new_stream.is_none());
        assert!(queue.is_empty());
        // Discarded data never creates a stream
        assert!(!registry.is_alive("s"));
    }

    #[test]
    fn test_unknown_stream_synthesizes_sri() {
        let mut registry = StreamRegistry::new();
        let mut queue = PacketQueue::new();

        let report = push(&mut queue, &mut registry, "orphan", 4, false);
        assert_eq!(report.new_stream, Some(StreamSri::new("orphan")));

        let packet = pop(&mut queue, &mut registry);
        assert!(packet.sri_changed);
        assert_eq!(packet.sri.stream_id, "orphan");

        let report = push(&mut queue, &mut registry, "orphan", 4, false);
        assert!(report.new_stream.is_none());
        assert!(!pop(&mut queue, &mut registry).sri_changed);
    }

    #[test]
    fn test_eos_merges_into_newest_packet() {
        let mut registry = StreamRegistry::new();
        let mut queue = PacketQueue::new();
        registry.update(StreamSri::new("s"));

        push(&mut queue, &mut registry, "s", 3, false);
        push(&mut queue, &mut registry, "s", 5, false);
        let report = push(&mut queue, &mut registry, "s", 0, true);

        assert_eq!(report.outcome, EnqueueOutcome::Merged);
        assert_eq!(queue.depth(), 2);
        assert!(!registry.is_alive("s"));

        let first = pop(&mut queue, &mut registry);
        assert_eq!(first.len(), 3);
        assert!(!first.eos);
        let second = pop(&mut queue, &mut registry);
        assert_eq!(second.len(), 5);
        assert!(second.eos);
    }

    #[test]
    fn test_eos_without_queued_data_is_terminator() {
        let mut registry = StreamRegistry::new();
        let mut queue = PacketQueue::new();
        registry.update(StreamSri::new("s"));
        push(&mut queue, &mut registry, "s", 3, false);
        pop(&mut queue, &mut registry);

        let report = push(&mut queue, &mut registry, "s", 0, true);
        assert_eq!(report.outcome, EnqueueOutcome::Queued { flushed: false });
        assert!(!registry.is_alive("s"));

        let packet = pop(&mut queue, &mut registry);
        assert!(packet.eos);
        assert!(packet.is_empty());
        assert!(!packet.sri_changed);
    }

    #[test]
    fn test_eos_does_not_merge_across_occurrences() {
        let mut registry = StreamRegistry::new();
        let mut queue = PacketQueue::new();
        registry.update(StreamSri::new("s"));

        // Finished occurrence still queued
        push(&mut queue, &mut registry, "s", 3, true);
        registry.update(StreamSri::new("s"));

        // New occurrence has nothing queued, so this is a standalone terminator
        let report = push(&mut queue, &mut registry, "s", 0, true);
        assert_eq!(report.outcome, EnqueueOutcome::Queued { flushed: false });
        assert_eq!(queue.depth(), 2);

        let old = pop(&mut queue, &mut registry);
        assert_eq!(old.len(), 3);
        assert!(old.eos);
        let terminator = pop(&mut queue, &mut registry);
        assert!(terminator.is_empty());
        assert!(terminator.eos);
        assert!(terminator.sri_changed);
    }

    #[test]
    fn test_collapse_keeps_newest_per_stream() {
        let mut registry = StreamRegistry::new();
        let mut queue = PacketQueue::with_capacity(QueueCapacity::Bounded(4));
        for id in ["A", "B", "C"] {
            registry.update(StreamSri::new(id));
            push(&mut queue, &mut registry, id, 1, false);
        }
        for _ in 0..3 {
            pop(&mut queue, &mut registry);
        }

        push(&mut queue, &mut registry, "B", 4, false);
        push(&mut queue, &mut registry, "C", 5, false);
        push(&mut queue, &mut registry, "B", 6, false);
        push(&mut queue, &mut registry, "C", 7, false);
        assert_eq!(queue.depth(), 4);
        assert_eq!(queue.flush_count(), 0);

        let report = push(&mut queue, &mut registry, "A", 8, false);
        assert_eq!(report.outcome, EnqueueOutcome::Queued { flushed: true });
        assert_eq!(queue.depth(), 3);
        assert_eq!(queue.flush_count(), 1);
        assert_eq!(queue.queued_streams(), vec!["B", "C", "A"]);

        let b = pop(&mut queue, &mut registry);
        assert_eq!((b.stream_id.as_str(), b.len(), b.input_queue_flushed), ("B", 6, true));
        let c = pop(&mut queue, &mut registry);
        assert_eq!((c.stream_id.as_str(), c.len(), c.input_queue_flushed), ("C", 7, true));
        let a = pop(&mut queue, &mut registry);
        assert_eq!((a.stream_id.as_str(), a.len(), a.input_queue_flushed), ("A", 8, false));
    }

    #[test]
    fn test_collapse_carries_sri_change_forward() {
        let mut registry = StreamRegistry::new();
        let mut queue = PacketQueue::with_capacity(QueueCapacity::Bounded(2));
        registry.update(StreamSri::new("s"));
        push(&mut queue, &mut registry, "s", 1, false);
        registry.update(StreamSri::new("s").xdelta(0.5));
        push(&mut queue, &mut registry, "s", 2, false);
        push(&mut queue, &mut registry, "s", 3, false);

        assert_eq!(queue.depth(), 1);
        let packet = pop(&mut queue, &mut registry);
        assert_eq!(packet.len(), 3);
        assert!(packet.input_queue_flushed);
        assert!(packet.sri_changed);
        assert_eq!(packet.sri.xdelta, 0.5);
    }

    #[test]
    fn test_collapse_keeps_occurrences_apart() {
        let mut registry = StreamRegistry::new();
        let mut queue = PacketQueue::with_capacity(QueueCapacity::Bounded(3));
        registry.update(StreamSri::new("s"));
        push(&mut queue, &mut registry, "s", 1, false);
        push(&mut queue, &mut registry, "s", 2, true);
        registry.update(StreamSri::new("s"));
        push(&mut queue, &mut registry, "s", 3, false);
        push(&mut queue, &mut registry, "s", 4, false);

        assert_eq!(queue.depth(), 2);

        let ended = pop(&mut queue, &mut registry);
        assert_eq!(ended.len(), 2);
        assert!(ended.eos);
        assert!(ended.input_queue_flushed);
        // The re-announced occurrence survives delivery of the old EOS
        assert!(registry.is_alive("s"));

        let restarted = pop(&mut queue, &mut registry);
        assert_eq!(restarted.len(), 4);
        assert!(!restarted.eos);
        assert!(restarted.sri_changed);
        assert!(restarted.input_queue_flushed);
    }

    #[test]
    fn test_collapse_folds_finished_occurrences() {
        let mut registry = StreamRegistry::new();
        let mut queue = PacketQueue::with_capacity(QueueCapacity::Bounded(1));

        // Every push is a complete occurrence of its own
        for size in 1..=50 {
            push(&mut queue, &mut registry, "A", size, true);
            assert!(queue.depth() <= 1, "depth {} after {} pushes", queue.depth(), size);
        }
        assert!(!registry.is_alive("A"));

        let packet = pop(&mut queue, &mut registry);
        assert_eq!(packet.len(), 50);
        assert!(packet.eos);
        assert!(packet.sri_changed);
        assert!(packet.input_queue_flushed);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_collapse_keeps_live_occurrence_apart_from_finished() {
        let mut registry = StreamRegistry::new();
        let mut queue = PacketQueue::with_capacity(QueueCapacity::Bounded(2));
        for size in 1..=3 {
            push(&mut queue, &mut registry, "A", size, true);
        }
        push(&mut queue, &mut registry, "A", 4, false);
        push(&mut queue, &mut registry, "A", 5, false);

        assert_eq!(queue.depth(), 2);
        let finished = pop(&mut queue, &mut registry);
        assert_eq!(finished.len(), 3);
        assert!(finished.eos);
        assert!(finished.input_queue_flushed);
        assert!(registry.is_alive("A"));

        let live = pop(&mut queue, &mut registry);
        assert_eq!(live.len(), 5);
        assert!(!live.eos);
        assert!(live.sri_changed);
        assert!(live.input_queue_flushed);
    }

    #[test]
    fn test_set_capacity_does_not_collapse() {
        let mut registry = StreamRegistry::new();
        let mut queue = PacketQueue::with_capacity(QueueCapacity::Unbounded);
        for _ in 0..5 {
            push(&mut queue, &mut registry, "s", 1, false);
        }

        queue.set_capacity(QueueCapacity::Bounded(2));
        assert_eq!(queue.depth(), 5);
        assert_eq!(queue.flush_count(), 0);

        push(&mut queue, &mut registry, "s", 1, false);
        assert_eq!(queue.depth(), 1);
    }

    #[test]
    fn test_dequeue_stream() {
        let mut registry = StreamRegistry::new();
        let mut queue = PacketQueue::new();
        push(&mut queue, &mut registry, "a", 1, false);
        push(&mut queue, &mut registry, "b", 2, true);
        push(&mut queue, &mut registry, "a", 3, false);

        let b = queue.dequeue_stream(&mut registry, "b").unwrap();
        assert_eq!(b.len(), 2);
        assert!(!registry.is_alive("b"));
        assert!(queue.dequeue_stream(&mut registry, "b").is_none());

        assert_eq!(pop(&mut queue, &mut registry).len(), 1);
        assert_eq!(pop(&mut queue, &mut registry).len(), 3);
    }

    #[test]
    fn test_fill_percent() {
        let mut registry = StreamRegistry::new();
        let mut queue = PacketQueue::with_capacity(QueueCapacity::Bounded(4));
        assert_eq!(queue.fill_percent(), 0.0);
        push(&mut queue, &mut registry, "s", 1, false);
        assert_eq!(queue.fill_percent(), 25.0);

        queue.set_capacity(QueueCapacity::Unbounded);
        assert_eq!(queue.fill_percent(), 0.0);
    }
}
