//! Strip wire protocol definitions and encoding.
//!
//! Protocol structure:
//! - Pixel data: RGB triplets, one byte per channel, values 0x00-0xFE
//! - Show command: a single 0xFF byte latches everything received since the
//!   previous show and resets the device cursor
//! - No length prefix, checksum or acknowledgment

use crate::Pixel;

/// Strip baud rate.
pub const BAUD_RATE: u32 = 115_200;

/// Baud rate that reboots the controller into its bootloader.
pub const BOOTLOADER_BAUD_RATE: u32 = 1200;

/// Show command byte. Never valid as channel data.
pub const SHOW_COMMAND: u8 = 0xFF;

/// Highest channel value that can appear on the wire.
pub const MAX_CHANNEL: u8 = 0xFE;

/// Bytes per pixel on the wire.
pub const BYTES_PER_PIXEL: usize = 3;

/// Largest strip a link will drive. A single frame of this size is 30 kB.
pub const MAX_LED_COUNT: usize = 10_000;

/// Largest single write for a buffered frame. Some host/driver combinations
/// overrun the controller's receive buffer on longer bursts.
pub const CHUNK_SIZE: usize = 300;

/// Escapes a single channel byte so it cannot be read as a show command.
pub fn escape(byte: u8) -> u8 {
    if byte == SHOW_COMMAND {
        MAX_CHANNEL
    } else {
        byte
    }
}

/// Escapes every byte of a payload in place.
pub fn escape_in_place(data: &mut [u8]) {
    for byte in data.iter_mut() {
        *byte = escape(*byte);
    }
}

/// Encodes one pixel into its three wire bytes.
pub fn encode_pixel(pixel: Pixel) -> [u8; BYTES_PER_PIXEL] {
    pixel.channels().map(escape)
}

/// Encodes a sequence of pixels into wire bytes, without a show command.
pub fn encode_pixels(pixels: &[Pixel]) -> Vec<u8> {
    let mut data = Vec::with_capacity(pixels.len() * BYTES_PER_PIXEL);
    for &pixel in pixels {
        data.extend_from_slice(&encode_pixel(pixel));
    }
    data
}

/// Splits an outgoing frame into transmission chunks.
pub fn chunks(frame: &[u8]) -> std::slice::Chunks<'_, u8> {
    frame.chunks(CHUNK_SIZE)
}
