//! LED strip module.
//!
//! Provides the serial link to the strip and the wire protocol it speaks.

mod link;
pub mod protocol;
mod transport;

pub use link::{AlwaysOn, DisplayGate, DisplayOutcome, StripLink};
pub use transport::{MemoryTransport, SerialTransport, Transport};
