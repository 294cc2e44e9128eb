//! RGB pixel values.

use crate::{Error, Result};
use std::str::FromStr;

/// One RGB pixel with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Named colors accepted by [`Pixel::from_str`].
const NAMED_COLORS: &[(&str, Pixel)] = &[
    ("black", Pixel::new(0, 0, 0)),
    ("white", Pixel::new(255, 255, 255)),
    ("red", Pixel::new(255, 0, 0)),
    ("green", Pixel::new(0, 255, 0)),
    ("blue", Pixel::new(0, 0, 255)),
    ("yellow", Pixel::new(255, 255, 0)),
    ("cyan", Pixel::new(0, 255, 255)),
    ("magenta", Pixel::new(255, 0, 255)),
    ("orange", Pixel::new(255, 165, 0)),
    ("purple", Pixel::new(128, 0, 128)),
    ("pink", Pixel::new(255, 192, 203)),
    ("gold", Pixel::new(255, 215, 0)),
    ("teal", Pixel::new(0, 128, 128)),
    ("navy", Pixel::new(0, 0, 128)),
    ("warmwhite", Pixel::new(255, 180, 107)),
    ("lightgoldenrodyellow", Pixel::new(250, 250, 210)),
];

impl Pixel {
    /// All channels off.
    pub const BLACK: Pixel = Pixel::new(0, 0, 0);

    /// Creates a pixel from 8-bit channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Creates a pixel from wider channel values, clamping anything above 255.
    pub fn clamped(r: u32, g: u32, b: u32) -> Self {
        Self::new(clamp_channel(r), clamp_channel(g), clamp_channel(b))
    }

    /// Returns the channels as an array in wire order.
    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

fn clamp_channel(value: u32) -> u8 {
    value.min(u8::MAX as u32) as u8
}

impl FromStr for Pixel {
    type Err = Error;

    /// Parses `#RRGGBB`, `RRGGBB`, `r,g,b` or a color name.
    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        let invalid = || Error::InvalidColor(s.to_string());

        if text.contains(',') {
            let parts: Vec<&str> = text.split(',').map(str::trim).collect();
            if parts.len() != 3 {
                return Err(invalid());
            }
            let mut channels = [0u8; 3];
            for (channel, part) in channels.iter_mut().zip(&parts) {
                *channel = part.parse().map_err(|_| invalid())?;
            }
            return Ok(Self::new(channels[0], channels[1], channels[2]));
        }

        let lower = text.to_lowercase();
        if let Some((_, pixel)) = NAMED_COLORS.iter().find(|(name, _)| *name == lower) {
            return Ok(*pixel);
        }

        let hex = text.strip_prefix('#').unwrap_or(text);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl std::fmt::Display for Pixel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}
