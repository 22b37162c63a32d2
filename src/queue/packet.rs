//! Packet types
//!
//! A [`DataTransfer`] is what consumers receive. Inside the queue it is
//! wrapped with the stream occurrence it was created under.

use crate::payload::Payload;
use crate::sri::{PrecisionTime, StreamSri};

/// A packet delivered to the consumer
#[derive(Debug, Clone, PartialEq)]
pub struct DataTransfer<P> {
    /// Sample data
    pub data: P,
    /// Time of the first sample
    pub time: PrecisionTime,
    /// Last packet of the stream
    pub eos: bool,
    /// Stream this packet belongs to
    pub stream_id: String,
    /// SRI as of packet creation
    pub sri: StreamSri,
    /// SRI changed since the previous packet of this stream
    pub sri_changed: bool,
    /// Earlier packets of this stream were discarded to make room
    pub input_queue_flushed: bool,
}

impl<P: Payload> DataTransfer<P> {
    /// Number of elements in the payload
    pub fn len(&self) -> usize {
        self.data.element_count()
    }

    /// Check if the payload is empty (only valid for EOS terminators)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A packet waiting in the queue
#[derive(Debug)]
pub(crate) struct QueuedPacket<P> {
    pub packet: DataTransfer<P>,
    pub occurrence: u64,
}

impl<P> QueuedPacket<P> {
    /// Check if this packet can still take a merged EOS
    pub fn is_open(&self) -> bool {
        !self.packet.eos
    }

    /// Fold the flags of a discarded sibling into this packet
    pub fn absorb(&mut self, sibling: &QueuedPacket<P>) {
        self.packet.input_queue_flushed = true;
        self.packet.sri_changed |= sibling.packet.sri_changed;
        self.packet.eos |= sibling.packet.eos;
    }
}
