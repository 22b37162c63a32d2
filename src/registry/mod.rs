//! Stream registry for SRI tracking
//!
//! The registry maps each stream id to its current SRI and answers the two
//! questions the queue asks when a packet is created: "is this stream live?"
//! and "has its SRI changed since the last packet?".
//!
//! # Stream lifecycle
//!
//! ```text
//!   push_sri / push_packet           EOS queued or delivered
//!  (unknown) ──────────────► Active ──────────────────────► Retired
//!                             ▲                                │
//!                             └──── push_sri / push_packet ────┘
//!                                  (new occurrence, changed = true)
//! ```
//!
//! Each activation gets a fresh occurrence number. Queued packets remember
//! the occurrence they were created under, which keeps the EOS of an old
//! occurrence from retiring a stream that has already been re-announced.

pub mod entry;
pub mod store;

pub use entry::{PendingChange, SriUpdate, StreamEntry, StreamState};
pub use store::StreamRegistry;
