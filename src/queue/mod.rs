//! Packet queue and flush engine
//!
//! Every pushed packet is tagged with its stream, its SRI snapshot and the
//! stream's pending-change flag, then appended to a single FIFO shared by all
//! streams. Overflow is handled by collapsing the queue rather than blocking
//! the producer.
//!
//! # Collapse
//!
//! ```text
//!  capacity 4, push A8:
//!
//!   [B4] [C5] [B6] [C7] [A8]      depth 5 > 4
//!     x    x    │    │    │
//!               ▼    ▼    ▼
//!             [B6*][C7*][A8]       * input_queue_flushed
//! ```
//!
//! Survivors keep their relative order and inherit `sri_changed` and `eos`
//! from the packets dropped in front of them.
//!
//! Packets are grouped by stream occurrence: a stream re-announced after its
//! EOS keeps its new data apart from the finished occurrence. All finished
//! occurrences of one id share a group, so a stream id never holds more than
//! two packets after a collapse.

pub mod packet;
pub mod packet_queue;

pub use packet::DataTransfer;
pub use packet_queue::{
    EnqueueOutcome, EnqueueReport, PacketQueue, QueueCapacity, DEFAULT_QUEUE_DEPTH,
};
