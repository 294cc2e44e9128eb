//! BlinkyStrip Hardware Library
//!
//! Drives BlinkyTape-style addressable LED strips over a serial link: pixel
//! buffering, framing into the show-byte protocol, and sentinel escaping.

pub mod error;
pub mod pixel;
pub mod strip;

pub use error::{Error, Result};
pub use pixel::Pixel;
pub use strip::{
    AlwaysOn, DisplayGate, DisplayOutcome, MemoryTransport, SerialTransport, StripLink, Transport,
};

/// Default number of LEDs on a strip.
pub const DEFAULT_LED_COUNT: usize = 60;
