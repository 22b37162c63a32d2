//! Multi-stream input ports for sample data planes
//!
//! An input port receives stream metadata (SRI) and sample packets from a
//! producer and queues them for one or more consumers. Many streams share a
//! port; each is tracked from its first push to its end-of-stream.
//!
//! # Features
//!
//! - One FIFO per port shared by all streams, ordered by arrival
//! - SRI change tracking: the first packet after an SRI change is flagged
//! - Overflow collapse: a full queue keeps the newest packet per stream and
//!   marks it `input_queue_flushed` instead of blocking the producer
//! - Blocking, non-blocking, timed and async consumers
//! - Rolling-window link statistics
//!
//! # Example
//!
//! ```
//! use bulkio_inport::{GetMode, InFloatPort, PrecisionTime, StreamSri};
//!
//! let port = InFloatPort::new("dataFloat_in");
//! port.push_sri(StreamSri::new("tone").xdelta(1.0 / 48_000.0));
//! port.push_packet(vec![0.0; 1024], PrecisionTime::now(), false, "tone");
//!
//! let packet = port.get_packet(GetMode::NonBlocking).unwrap();
//! assert_eq!(packet.len(), 1024);
//! assert!(packet.sri_changed);
//! ```

pub mod error;
pub mod payload;
pub mod port;
pub mod queue;
pub mod registry;
pub mod sri;
pub mod stats;

pub use error::PortError;
pub use payload::{BitBuffer, Payload, Sample};
pub use port::{
    GetMode, InBitPort, InCharPort, InDoublePort, InFilePort, InFloatPort, InLongLongPort,
    InLongPort, InOctetPort, InPort, InShortPort, InULongLongPort, InULongPort, InUShortPort,
    InXmlPort, NewStreamListener, PortConfig, PortUsageState,
};
pub use queue::{DataTransfer, QueueCapacity, DEFAULT_QUEUE_DEPTH};
pub use sri::{Keyword, KeywordValue, PrecisionTime, SriComparator, StreamSri};
pub use stats::PortStatistics;
