//! Strip animations.
//!
//! Every effect drives the strip only through the link's public frame
//! operations and consults the display gate before showing colors.

mod frames;

use frames::{block_frame, fade_steps, rainbow_frame, temperature_color};

use anyhow::Result;
use blinkystrip_hw::{DisplayGate, DisplayOutcome, Pixel, StripLink, Transport};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::probes::{ProcessProbe, TemperatureProbe};

/// Colors cycled by [`Animator::demo`].
const DEMO_COLORS: [Pixel; 5] = [
    Pixel::new(255, 0, 0),
    Pixel::new(0, 255, 0),
    Pixel::new(0, 0, 255),
    Pixel::new(255, 255, 255),
    Pixel::BLACK,
];

/// Counts down a cycle budget; `None` runs forever.
fn next_cycle(remaining: &mut Option<u32>) -> bool {
    match remaining {
        Some(0) => false,
        Some(n) => {
            *n -= 1;
            true
        }
        None => true,
    }
}

/// Runs effects on one strip.
pub struct Animator<T: Transport, G: DisplayGate> {
    link: StripLink<T>,
    gate: G,
}

impl<T: Transport, G: DisplayGate> Animator<T, G> {
    /// Creates an animator for an open link.
    pub fn new(link: StripLink<T>, gate: G) -> Self {
        Self { link, gate }
    }

    /// Returns the strip link.
    pub fn link(&self) -> &StripLink<T> {
        &self.link
    }

    /// Fills the strip with one color, or black if the gate refuses.
    pub fn set_static_color(&mut self, color: Pixel) -> Result<DisplayOutcome> {
        let outcome = self.link.display_color_gated(color, &mut self.gate)?;
        match outcome {
            DisplayOutcome::Applied => debug!("Set color to {}", color),
            DisplayOutcome::Suppressed => debug!("Shutting off lights, off hours"),
        }
        Ok(outcome)
    }

    /// Turns every LED off regardless of the gate.
    pub fn blank(&mut self) -> Result<()> {
        self.link.display_color(Pixel::BLACK)?;
        Ok(())
    }

    /// Fades from one color to another over `duration`.
    pub async fn fade(&mut self, from: Pixel, to: Pixel, duration: Duration) -> Result<()> {
        self.set_static_color(from)?;
        let steps = fade_steps(from, to);
        if steps.is_empty() {
            return Ok(());
        }

        let wait = duration / steps.len() as u32;
        info!("Fading {} -> {} in {} steps", from, to, steps.len());
        for color in steps {
            tokio::time::sleep(wait).await;
            self.set_static_color(color)?;
        }
        Ok(())
    }

    /// Alternates between two colors.
    pub async fn swap(
        &mut self,
        first: Pixel,
        second: Pixel,
        interval: Duration,
        cycles: Option<u32>,
    ) -> Result<()> {
        let mut remaining = cycles;
        while next_cycle(&mut remaining) {
            for color in [first, second] {
                self.set_static_color(color)?;
                tokio::time::sleep(interval).await;
            }
        }
        Ok(())
    }

    /// Rotates a rainbow along the strip; one cycle is a full turn of the
    /// color wheel.
    pub async fn rainbow(&mut self, step: u8, delay: Duration, cycles: Option<u32>) -> Result<()> {
        let step = step.max(1) as usize;
        let led_count = self.link.led_count();
        let mut remaining = cycles;
        while next_cycle(&mut remaining) {
            for phase in (0..256).step_by(step) {
                let frame = rainbow_frame(led_count, phase as u8);
                self.show_bulk(&frame)?;
                tokio::time::sleep(delay).await;
            }
        }
        Ok(())
    }

    /// Moves a block of color along the strip; one cycle is a full trip.
    pub async fn traveling_block(
        &mut self,
        color: Pixel,
        background: Pixel,
        size: usize,
        delay: Duration,
        cycles: Option<u32>,
    ) -> Result<()> {
        let led_count = self.link.led_count();
        let mut remaining = cycles;
        while next_cycle(&mut remaining) {
            for start in 0..led_count.max(1) {
                let frame = block_frame(led_count, start, size, color, background);
                self.show_pixels(&frame)?;
                tokio::time::sleep(delay).await;
            }
        }
        Ok(())
    }

    /// Colors the strip by GPU temperature, polling every `interval`.
    ///
    /// With a non-empty game list the idle color is shown while none of the
    /// games is running. A failed probe is logged and retried next poll.
    pub async fn gpu_color<P: TemperatureProbe>(
        &mut self,
        probe: &mut P,
        games: &ProcessProbe,
        idle: Pixel,
        interval: Duration,
        cycles: Option<u32>,
    ) -> Result<()> {
        let mut remaining = cycles;
        while next_cycle(&mut remaining) {
            if !games.is_empty() && games.running().is_none() {
                debug!("No game running, showing idle color");
                self.set_static_color(idle)?;
            } else {
                match probe.read_celsius().await {
                    Ok(celsius) => {
                        let color = temperature_color(celsius);
                        debug!("{} reports {}C -> {}", probe.name(), celsius, color);
                        self.set_static_color(color)?;
                    }
                    Err(e) => warn!("Temperature probe error: {:#}", e),
                }
            }
            tokio::time::sleep(interval).await;
        }
        Ok(())
    }

    /// Steps through red, green, blue, white and black.
    pub async fn demo(&mut self, delay: Duration, cycles: Option<u32>) -> Result<()> {
        let mut remaining = cycles;
        while next_cycle(&mut remaining) {
            for color in DEMO_COLORS {
                self.set_static_color(color)?;
                tokio::time::sleep(delay).await;
            }
        }
        Ok(())
    }

    /// Releases the strip link.
    pub fn into_link(self) -> StripLink<T> {
        self.link
    }

    /// Sends a frame in one write, or black if the gate refuses.
    fn show_bulk(&mut self, frame: &[Pixel]) -> Result<DisplayOutcome> {
        if !self.gate.allows_display() {
            self.link.display_color(Pixel::BLACK)?;
            return Ok(DisplayOutcome::Suppressed);
        }
        self.link.send_bulk(frame)?;
        Ok(DisplayOutcome::Applied)
    }

    /// Queues a frame pixel by pixel, or black if the gate refuses.
    fn show_pixels(&mut self, frame: &[Pixel]) -> Result<DisplayOutcome> {
        if !self.gate.allows_display() {
            self.link.display_color(Pixel::BLACK)?;
            return Ok(DisplayOutcome::Suppressed);
        }
        for pixel in frame {
            self.link.enqueue(*pixel)?;
        }
        self.link.show()?;
        Ok(DisplayOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blinkystrip_hw::{AlwaysOn, MemoryTransport};

    struct Refuse;

    impl DisplayGate for Refuse {
        fn allows_display(&mut self) -> bool {
            false
        }
    }

    struct FixedProbe(u32);

    impl TemperatureProbe for FixedProbe {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn read_celsius(&mut self) -> Result<u32> {
            Ok(self.0)
        }
    }

    fn animator<G: DisplayGate>(led_count: usize, gate: G) -> Animator<MemoryTransport, G> {
        let mut link =
            StripLink::with_transport("mem", MemoryTransport::new(), led_count, true).unwrap();
        link.transport_mut().unwrap().clear();
        Animator::new(link, gate)
    }

    /// Splits everything written so far into shown frames.
    fn frames<G: DisplayGate>(animator: &Animator<MemoryTransport, G>) -> Vec<Vec<u8>> {
        let bytes = animator.link().transport().unwrap().bytes();
        let mut frames: Vec<Vec<u8>> = bytes.split(|&b| b == 0xFF).map(<[u8]>::to_vec).collect();
        // Whatever follows the last show byte is not a frame.
        frames.pop();
        frames
    }

    #[test]
    fn test_next_cycle() {
        let mut remaining = Some(2);
        assert!(next_cycle(&mut remaining));
        assert!(next_cycle(&mut remaining));
        assert!(!next_cycle(&mut remaining));

        let mut forever = None;
        assert!(next_cycle(&mut forever));
    }

    #[test]
    fn test_static_color_respects_gate() {
        let mut on = animator(2, AlwaysOn);
        assert_eq!(
            on.set_static_color(Pixel::new(255, 1, 2)).unwrap(),
            DisplayOutcome::Applied
        );
        assert_eq!(frames(&on), vec![vec![254, 1, 2, 254, 1, 2]]);

        let mut off = animator(2, Refuse);
        assert_eq!(
            off.set_static_color(Pixel::new(255, 1, 2)).unwrap(),
            DisplayOutcome::Suppressed
        );
        assert_eq!(frames(&off), vec![vec![0; 6]]);
    }

    #[tokio::test]
    async fn test_fade_ends_on_target() {
        let mut animator = animator(1, AlwaysOn);
        animator
            .fade(Pixel::new(0, 0, 0), Pixel::new(2, 0, 1), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(
            frames(&animator),
            vec![vec![0, 0, 0], vec![1, 0, 1], vec![2, 0, 1]]
        );
    }

    #[tokio::test]
    async fn test_swap_alternates() {
        let mut animator = animator(1, AlwaysOn);
        animator
            .swap(
                Pixel::new(1, 1, 1),
                Pixel::new(2, 2, 2),
                Duration::ZERO,
                Some(2),
            )
            .await
            .unwrap();
        assert_eq!(
            frames(&animator),
            vec![vec![1, 1, 1], vec![2, 2, 2], vec![1, 1, 1], vec![2, 2, 2]]
        );
    }

    #[tokio::test]
    async fn test_rainbow_sends_bulk_frames() {
        let mut animator = animator(3, AlwaysOn);
        animator.rainbow(64, Duration::ZERO, Some(1)).await.unwrap();

        let frames = frames(&animator);
        assert_eq!(frames.len(), 4);
        assert!(frames.iter().all(|f| f.len() == 9));
        // Each bulk frame is a single write followed by the show byte.
        let writes = animator.link().transport().unwrap().writes().len();
        assert_eq!(writes, 8);
    }

    #[tokio::test]
    async fn test_rainbow_suppressed_goes_black() {
        let mut animator = animator(2, Refuse);
        animator.rainbow(128, Duration::ZERO, Some(1)).await.unwrap();
        assert_eq!(frames(&animator), vec![vec![0; 6], vec![0; 6]]);
    }

    #[tokio::test]
    async fn test_traveling_block() {
        let mut animator = animator(3, AlwaysOn);
        animator
            .traveling_block(Pixel::new(7, 7, 7), Pixel::BLACK, 1, Duration::ZERO, Some(1))
            .await
            .unwrap();
        assert_eq!(
            frames(&animator),
            vec![
                vec![7, 7, 7, 0, 0, 0, 0, 0, 0],
                vec![0, 0, 0, 7, 7, 7, 0, 0, 0],
                vec![0, 0, 0, 0, 0, 0, 7, 7, 7],
            ]
        );
        assert_eq!(animator.link().position(), 0);
    }

    #[tokio::test]
    async fn test_gpu_color_from_temperature() {
        let mut animator = animator(1, AlwaysOn);
        let games = ProcessProbe::new(&[]);
        animator
            .gpu_color(
                &mut FixedProbe(50),
                &games,
                Pixel::BLACK,
                Duration::ZERO,
                Some(2),
            )
            .await
            .unwrap();
        assert_eq!(frames(&animator), vec![vec![52, 48, 0], vec![52, 48, 0]]);
    }

    #[tokio::test]
    async fn test_gpu_color_idle_without_game() {
        let mut animator = animator(1, AlwaysOn);
        let games = ProcessProbe::with_proc_root(
            "/nonexistent/blinkystrip-proc",
            &["factorio".to_string()],
        );
        animator
            .gpu_color(
                &mut FixedProbe(50),
                &games,
                Pixel::new(0, 0, 9),
                Duration::ZERO,
                Some(1),
            )
            .await
            .unwrap();
        assert_eq!(frames(&animator), vec![vec![0, 0, 9]]);
    }

    #[tokio::test]
    async fn test_demo_cycle() {
        let mut animator = animator(1, AlwaysOn);
        animator.demo(Duration::ZERO, Some(1)).await.unwrap();
        assert_eq!(
            frames(&animator),
            vec![
                vec![254, 0, 0],
                vec![0, 254, 0],
                vec![0, 0, 254],
                vec![254, 254, 254],
                vec![0, 0, 0],
            ]
        );
    }

    #[test]
    fn test_blank_ignores_gate() {
        let mut animator = animator(1, Refuse);
        animator.blank().unwrap();
        assert_eq!(frames(&animator), vec![vec![0, 0, 0]]);
        assert!(animator.into_link().is_open());
    }
}
