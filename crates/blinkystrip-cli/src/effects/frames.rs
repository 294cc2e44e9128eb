//! Frame and color math for effects.

use blinkystrip_hw::Pixel;

/// Returns the intermediate colors of a fade, excluding `from` and
/// including `to`.
///
/// Each step moves every channel one unit toward its target, so the number
/// of steps equals the largest channel distance.
pub fn fade_steps(from: Pixel, to: Pixel) -> Vec<Pixel> {
    let mut current = [from.r as i16, from.g as i16, from.b as i16];
    let target = [to.r as i16, to.g as i16, to.b as i16];
    let steps = current
        .iter()
        .zip(&target)
        .map(|(c, t)| (t - c).unsigned_abs())
        .max()
        .unwrap_or(0);

    let mut colors = Vec::with_capacity(steps as usize);
    for _ in 0..steps {
        for (channel, goal) in current.iter_mut().zip(&target) {
            *channel += (goal - *channel).signum();
        }
        colors.push(Pixel::new(
            current[0] as u8,
            current[1] as u8,
            current[2] as u8,
        ));
    }
    colors
}

/// Maps a position 0-255 on the color wheel to a fully saturated color.
pub fn wheel(position: u8) -> Pixel {
    let p = position as u16;
    match position {
        0..=84 => Pixel::new((255 - p * 3) as u8, (p * 3) as u8, 0),
        85..=169 => {
            let p = p - 85;
            Pixel::new(0, (255 - p * 3) as u8, (p * 3) as u8)
        }
        _ => {
            let p = p - 170;
            Pixel::new((p * 3) as u8, 0, (255 - p * 3) as u8)
        }
    }
}

/// Spreads one turn of the color wheel across the strip, shifted by `phase`.
pub fn rainbow_frame(led_count: usize, phase: u8) -> Vec<Pixel> {
    (0..led_count)
        .map(|i| {
            let offset = (i * 256 / led_count.max(1)) as u8;
            wheel(offset.wrapping_add(phase))
        })
        .collect()
}

/// Draws a block of `size` pixels starting at `start` over a background,
/// wrapping around the end of the strip.
pub fn block_frame(
    led_count: usize,
    start: usize,
    size: usize,
    color: Pixel,
    background: Pixel,
) -> Vec<Pixel> {
    let mut frame = vec![background; led_count];
    if led_count == 0 {
        return frame;
    }
    for offset in 0..size.min(led_count) {
        frame[(start + offset) % led_count] = color;
    }
    frame
}

/// Maps a GPU temperature to a color: green when cool, red when hot.
pub fn temperature_color(celsius: u32) -> Pixel {
    let heat = 1.04 * celsius as f64;
    let red = heat.floor().clamp(0.0, 255.0) as u8;
    let green = (100.0 - heat).floor().clamp(0.0, 255.0) as u8;
    Pixel::new(red, green, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_steps() {
        let steps = fade_steps(Pixel::new(0, 10, 5), Pixel::new(3, 8, 5));
        assert_eq!(
            steps,
            vec![
                Pixel::new(1, 9, 5),
                Pixel::new(2, 8, 5),
                Pixel::new(3, 8, 5),
            ]
        );
    }

    #[test]
    fn test_fade_full_range() {
        let steps = fade_steps(Pixel::new(0, 0, 255), Pixel::new(250, 250, 210));
        assert_eq!(steps.len(), 250);
        assert_eq!(*steps.last().unwrap(), Pixel::new(250, 250, 210));
        assert!(fade_steps(Pixel::BLACK, Pixel::BLACK).is_empty());
    }

    #[test]
    fn test_wheel() {
        assert_eq!(wheel(0), Pixel::new(255, 0, 0));
        assert_eq!(wheel(85), Pixel::new(0, 255, 0));
        assert_eq!(wheel(170), Pixel::new(0, 0, 255));
        assert_eq!(wheel(255), Pixel::new(255, 0, 0));
    }

    #[test]
    fn test_rainbow_frame() {
        let frame = rainbow_frame(4, 0);
        assert_eq!(frame.len(), 4);
        assert_eq!(frame[0], wheel(0));
        assert_eq!(frame[2], wheel(128));
        assert_eq!(rainbow_frame(4, 10)[0], wheel(10));
        assert!(rainbow_frame(0, 0).is_empty());
    }

    #[test]
    fn test_block_frame_wraps() {
        let on = Pixel::new(9, 9, 9);
        let off = Pixel::BLACK;
        assert_eq!(block_frame(5, 1, 2, on, off), vec![off, on, on, off, off]);
        assert_eq!(block_frame(5, 4, 2, on, off), vec![on, off, off, off, on]);
        assert_eq!(block_frame(3, 0, 10, on, off), vec![on, on, on]);
        assert!(block_frame(0, 0, 2, on, off).is_empty());
    }

    #[test]
    fn test_temperature_color() {
        assert_eq!(temperature_color(50), Pixel::new(52, 48, 0));
        assert_eq!(temperature_color(0), Pixel::new(0, 100, 0));
        assert_eq!(temperature_color(1), Pixel::new(1, 98, 0));
        assert_eq!(temperature_color(51), Pixel::new(53, 46, 0));
        assert_eq!(temperature_color(61), Pixel::new(63, 36, 0));
        assert_eq!(temperature_color(96), Pixel::new(99, 0, 0));
        assert_eq!(temperature_color(120), Pixel::new(124, 0, 0));
        assert_eq!(temperature_color(300), Pixel::new(255, 0, 0));
    }
}
