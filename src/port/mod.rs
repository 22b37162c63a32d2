//! Typed input ports
//!
//! An [`InPort`] accepts SRI and data pushes from the transport side and hands
//! packets to consumers in arrival order.
//!
//! ```text
//!  producer                         consumers
//!  ────────                         ─────────
//!  push_sri ───► StreamRegistry
//!                    │ pending change
//!                    ▼
//!  push_packet ─► PacketQueue ────► get_packet (Blocking/NonBlocking/Timeout)
//!                    │        └───► recv().await
//!                    ▼
//!              LinkStatistics ────► statistics()
//! ```
//!
//! One alias per element type is provided; all of them share the same
//! implementation and differ only in payload and element width.

pub mod config;
pub mod inport;
pub mod state;

use bytes::Bytes;

use crate::payload::BitBuffer;

pub use config::{PortConfig, DEFAULT_PORT_NAME};
pub use inport::{InPort, NewStreamListener};
pub use state::{GetMode, PortUsageState};

/// Packed single-bit samples
pub type InBitPort = InPort<BitBuffer>;
/// Signed 8-bit samples
pub type InCharPort = InPort<Vec<i8>>;
/// Raw octets
pub type InOctetPort = InPort<Bytes>;
/// Signed 16-bit samples
pub type InShortPort = InPort<Vec<i16>>;
/// Unsigned 16-bit samples
pub type InUShortPort = InPort<Vec<u16>>;
/// Signed 32-bit samples
pub type InLongPort = InPort<Vec<i32>>;
/// Unsigned 32-bit samples
pub type InULongPort = InPort<Vec<u32>>;
/// Signed 64-bit samples
pub type InLongLongPort = InPort<Vec<i64>>;
/// Unsigned 64-bit samples
pub type InULongLongPort = InPort<Vec<u64>>;
/// 32-bit float samples
pub type InFloatPort = InPort<Vec<f32>>;
/// 64-bit float samples
pub type InDoublePort = InPort<Vec<f64>>;
/// XML documents, one per packet
pub type InXmlPort = InPort<String>;
/// File URIs, one per packet
pub type InFilePort = InPort<String>;
