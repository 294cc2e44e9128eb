//! Byte transports the strip link writes to.

use crate::{Error, Result};
use std::io::{self, Write};
use std::time::Duration;
use tokio_serial::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};
use tracing::debug;

/// How long a blocking write may wait on the serial driver.
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Byte-oriented channel to a strip controller.
pub trait Transport {
    /// Writes the whole buffer.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Flushes the transport's output buffer.
    fn flush(&mut self) -> io::Result<()>;

    /// Drops anything the device has sent back.
    fn discard_input(&mut self) -> io::Result<()>;

    /// Changes the line speed.
    fn set_baud_rate(&mut self, baud_rate: u32) -> io::Result<()>;
}

/// Serial port transport (USB CDC-ACM or USB-serial bridge).
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Opens a serial port with 8N1 framing.
    pub fn open(port_path: &str, baud_rate: u32) -> Result<Self> {
        let port = tokio_serial::new(port_path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(|e| {
                // Check if the error is due to device not existing
                if let tokio_serial::ErrorKind::Io(kind) = &e.kind {
                    if (*kind == io::ErrorKind::NotFound
                        || *kind == io::ErrorKind::PermissionDenied)
                        && !std::path::Path::new(port_path).exists()
                    {
                        return Error::StripNotFound(port_path.to_string());
                    }
                }
                if e.kind == tokio_serial::ErrorKind::NoDevice {
                    return Error::StripNotFound(port_path.to_string());
                }
                Error::Serial(e)
            })?;

        debug!("Opened serial port {} at {} baud", port_path, baud_rate);
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.port.clear(ClearBuffer::Input).map_err(io::Error::from)
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> io::Result<()> {
        self.port.set_baud_rate(baud_rate).map_err(io::Error::from)
    }
}

/// In-memory transport that records everything written to it.
///
/// Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    writes: Vec<Vec<u8>>,
    flushes: usize,
    input_discards: usize,
    baud_rates: Vec<u32>,
    fail_writes: bool,
}

impl MemoryTransport {
    /// Creates an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with a broken pipe.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Returns each write call's payload, in order.
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// Returns every byte written, concatenated.
    pub fn bytes(&self) -> Vec<u8> {
        self.writes.concat()
    }

    /// Returns the number of flushes.
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Returns the number of input discards.
    pub fn input_discards(&self) -> usize {
        self.input_discards
    }

    /// Returns every baud rate change, in order.
    pub fn baud_rates(&self) -> &[u32] {
        &self.baud_rates
    }

    /// Forgets everything recorded so far.
    pub fn clear(&mut self) {
        self.writes.clear();
        self.flushes = 0;
        self.input_discards = 0;
        self.baud_rates.clear();
    }
}

impl Transport for MemoryTransport {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "memory transport write failure",
            ));
        }
        self.writes.push(bytes.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.input_discards += 1;
        Ok(())
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> io::Result<()> {
        self.baud_rates.push(baud_rate);
        Ok(())
    }
}
