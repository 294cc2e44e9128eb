//! Host probes consulted by effects.
//!
//! Provides the GPU temperature and whether a game is running.

mod gpu;
mod process;

pub use gpu::NvidiaSmiProbe;
pub use process::ProcessProbe;

use anyhow::Result;

/// Trait for temperature sources.
pub trait TemperatureProbe {
    /// Returns the probe name.
    fn name(&self) -> &str;

    /// Reads the current temperature in degrees Celsius.
    async fn read_celsius(&mut self) -> Result<u32>;
}
