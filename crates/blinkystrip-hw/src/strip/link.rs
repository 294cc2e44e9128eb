//! Strip link: pixel buffering and framing over a serial channel.

use super::protocol::{
    self, BAUD_RATE, BOOTLOADER_BAUD_RATE, BYTES_PER_PIXEL, MAX_LED_COUNT, SHOW_COMMAND,
};
use super::transport::{SerialTransport, Transport};
use crate::{Error, Pixel, Result};
use tracing::{debug, trace};

/// Decides whether a requested color may be shown right now.
pub trait DisplayGate {
    /// Returns true if the requested color should be displayed.
    fn allows_display(&mut self) -> bool;
}

/// Gate that never suppresses anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOn;

impl DisplayGate for AlwaysOn {
    fn allows_display(&mut self) -> bool {
        true
    }
}

/// Result of a whole-strip color request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayOutcome {
    /// The requested color is on the strip.
    Applied,
    /// The gate refused and the strip was forced black.
    Suppressed,
}

impl DisplayOutcome {
    /// Returns the numeric status code (1 applied, -1 suppressed).
    pub fn code(&self) -> i8 {
        match self {
            DisplayOutcome::Applied => 1,
            DisplayOutcome::Suppressed => -1,
        }
    }
}

/// Connection to one LED strip.
///
/// Pixels are queued from position 0 up to `led_count` and latched with
/// [`StripLink::show`], which also resets the cursor for the next frame.
/// The link is not synchronized; callers sharing it must serialize access.
pub struct StripLink<T: Transport = SerialTransport> {
    port_path: String,
    transport: Option<T>,
    led_count: usize,
    position: usize,
    pending: Vec<u8>,
    buffered: bool,
}

impl StripLink<SerialTransport> {
    /// Opens the serial port and blanks the strip.
    pub fn open(port_path: &str, led_count: usize, buffered: bool) -> Result<Self> {
        check_led_count(led_count)?;
        let transport = SerialTransport::open(port_path, BAUD_RATE)?;
        Self::with_transport(port_path, transport, led_count, buffered)
    }
}

impl<T: Transport> StripLink<T> {
    /// Wraps an already open transport and blanks the strip.
    ///
    /// A show command is sent first so any partial frame left over from a
    /// previous session is flushed out of the controller.
    pub fn with_transport(
        port_path: &str,
        transport: T,
        led_count: usize,
        buffered: bool,
    ) -> Result<Self> {
        check_led_count(led_count)?;
        let mut link = Self {
            port_path: port_path.to_string(),
            transport: Some(transport),
            led_count,
            position: 0,
            pending: Vec::with_capacity(led_count * BYTES_PER_PIXEL + 1),
            buffered,
        };

        link.show()?;
        link.display_color(Pixel::BLACK)?;

        debug!(
            "Strip link ready on {} ({} LEDs, {})",
            link.port_path,
            led_count,
            if buffered { "buffered" } else { "unbuffered" }
        );
        Ok(link)
    }

    /// Queues the next pixel, clamping channels above 255.
    pub fn enqueue_pixel(&mut self, r: u32, g: u32, b: u32) -> Result<()> {
        self.enqueue(Pixel::clamped(r, g, b))
    }

    /// Queues the next pixel of the current frame.
    ///
    /// Buffered links hold the pixel until [`StripLink::show`]; unbuffered
    /// links write and flush it immediately.
    pub fn enqueue(&mut self, pixel: Pixel) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::Closed)?;

        if self.position >= self.led_count {
            return Err(Error::OutOfRange {
                requested: self.position + 1,
                capacity: self.led_count,
            });
        }

        let data = protocol::encode_pixel(pixel);
        if self.buffered {
            self.pending.extend_from_slice(&data);
        } else {
            transport.write_all(&data)?;
            transport.flush()?;
        }
        self.position += 1;
        Ok(())
    }

    /// Sends a whole frame in one write, then shows it.
    ///
    /// Ignores the buffering mode. Fails before any I/O if the sequence is
    /// longer than the strip.
    pub fn send_bulk(&mut self, pixels: &[Pixel]) -> Result<()> {
        if self.transport.is_none() {
            return Err(Error::Closed);
        }
        if pixels.len() > self.led_count {
            return Err(Error::OutOfRange {
                requested: pixels.len(),
                capacity: self.led_count,
            });
        }

        let data = protocol::encode_pixels(pixels);
        self.write_now(&data)?;
        self.show()
    }

    /// Sends pre-encoded channel bytes in one write, then shows them.
    ///
    /// Any 0xFF in the payload is escaped.
    pub fn send_raw(&mut self, data: &[u8]) -> Result<()> {
        if self.transport.is_none() {
            return Err(Error::Closed);
        }
        let capacity = self.led_count.saturating_mul(BYTES_PER_PIXEL);
        if data.len() > capacity {
            return Err(Error::OutOfRange {
                requested: data.len().div_ceil(BYTES_PER_PIXEL),
                capacity: self.led_count,
            });
        }

        let mut data = data.to_vec();
        protocol::escape_in_place(&mut data);
        self.write_now(&data)?;
        self.show()
    }

    /// Shows all pixel data sent since the previous show.
    ///
    /// Buffered frames go out in chunks of at most
    /// [`protocol::CHUNK_SIZE`] bytes, each followed by a flush. Device
    /// responses are discarded and the cursor always returns to 0.
    pub fn show(&mut self) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::Closed)?;

        if self.buffered {
            self.pending.push(SHOW_COMMAND);
            if let Err(e) = write_chunked(transport, &self.pending) {
                self.pending.pop();
                return Err(e);
            }
            trace!("Sent {} byte frame to {}", self.pending.len(), self.port_path);
            self.pending.clear();
        } else {
            transport.write_all(&[SHOW_COMMAND])?;
        }

        transport.flush()?;
        transport.discard_input()?;
        self.position = 0;
        Ok(())
    }

    /// Fills the strip with one color and shows it.
    pub fn display_color(&mut self, color: Pixel) -> Result<DisplayOutcome> {
        self.display_color_gated(color, &mut AlwaysOn)
    }

    /// Fills the strip with one color if the gate allows it, otherwise with
    /// black.
    pub fn display_color_gated(
        &mut self,
        color: Pixel,
        gate: &mut dyn DisplayGate,
    ) -> Result<DisplayOutcome> {
        let (fill, outcome) = if gate.allows_display() {
            (color, DisplayOutcome::Applied)
        } else {
            (Pixel::BLACK, DisplayOutcome::Suppressed)
        };

        for _ in 0..self.led_count {
            self.enqueue(fill)?;
        }
        self.show()?;
        Ok(outcome)
    }

    /// Reboots the controller into its bootloader and closes the link.
    ///
    /// The controller disconnects; the released transport is returned.
    pub fn reset_to_bootloader(&mut self) -> Result<T> {
        let transport = self.transport.as_mut().ok_or(Error::Closed)?;
        transport.set_baud_rate(BOOTLOADER_BAUD_RATE)?;
        debug!("Requested bootloader reset on {}", self.port_path);
        self.close().ok_or(Error::Closed)
    }

    /// Releases the serial channel and returns it. Later operations fail
    /// with [`Error::Closed`].
    pub fn close(&mut self) -> Option<T> {
        let transport = self.transport.take()?;
        self.pending.clear();
        self.position = 0;
        debug!("Closed strip link on {}", self.port_path);
        Some(transport)
    }

    /// Returns true until [`StripLink::close`] is called.
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Returns the number of LEDs on the strip.
    pub fn led_count(&self) -> usize {
        self.led_count
    }

    /// Returns the number of pixels queued in the current frame.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns true if pixels are held until show.
    pub fn is_buffered(&self) -> bool {
        self.buffered
    }

    /// Returns the port path.
    pub fn port_path(&self) -> &str {
        &self.port_path
    }

    /// Returns the underlying transport, if still open.
    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    /// Returns the underlying transport mutably, if still open.
    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.transport.as_mut()
    }

    fn write_now(&mut self, data: &[u8]) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::Closed)?;
        transport.write_all(data)?;
        Ok(())
    }
}

fn check_led_count(led_count: usize) -> Result<()> {
    if led_count > MAX_LED_COUNT {
        return Err(Error::InvalidLedCount {
            requested: led_count,
            max: MAX_LED_COUNT,
        });
    }
    Ok(())
}

fn write_chunked<T: Transport>(transport: &mut T, frame: &[u8]) -> Result<()> {
    for chunk in protocol::chunks(frame) {
        transport.write_all(chunk)?;
        transport.flush()?;
    }
    Ok(())
}
