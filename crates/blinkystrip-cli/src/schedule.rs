//! Time-of-day display gate.
//!
//! The strip shows colors only inside a daily window of local hours. A timed
//! override lets it show colors outside the window until the override
//! expires.

use blinkystrip_hw::DisplayGate;
use chrono::{Duration, Local, NaiveDateTime, Timelike};
use tracing::info;

use crate::config::ScheduleConfig;

/// Longest override accepted, one week.
pub const MAX_OVERRIDE_MINUTES: i64 = 7 * 24 * 60;

/// Gate that allows colors during a daily window of hours.
#[derive(Debug, Clone)]
pub struct ScheduleGate {
    enabled: bool,
    start_hour: u32,
    end_hour: u32,
    override_until: Option<NaiveDateTime>,
}

impl ScheduleGate {
    /// Creates a gate allowing `[start_hour, end_hour)`; wraps past midnight
    /// when `start_hour > end_hour`.
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            enabled: true,
            start_hour,
            end_hour,
            override_until: None,
        }
    }

    /// Creates a gate from configuration.
    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self {
            enabled: config.enabled,
            ..Self::new(config.start_hour, config.end_hour)
        }
    }

    /// Creates a gate that allows everything.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(0, 24)
        }
    }

    /// Turns the override on for `minutes`, or off.
    ///
    /// `minutes` is clamped to `0..=MAX_OVERRIDE_MINUTES`.
    pub fn set_override(&mut self, on: bool, minutes: i64) {
        self.set_override_at(on, minutes, Local::now().naive_local());
    }

    /// Like [`ScheduleGate::set_override`] with an explicit current time.
    pub fn set_override_at(&mut self, on: bool, minutes: i64, now: NaiveDateTime) {
        let minutes = minutes.clamp(0, MAX_OVERRIDE_MINUTES);
        self.override_until = on.then(|| now + Duration::minutes(minutes));
        match self.override_until {
            Some(until) => info!("Display override active until {}", until.format("%H:%M")),
            None => info!("Display override cleared"),
        }
    }

    /// Returns true if `hour` falls inside the display window.
    pub fn in_window(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            (self.start_hour..self.end_hour).contains(&hour)
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    /// Decides whether colors may be shown at `now`, expiring the override
    /// if its time has passed.
    pub fn allows_at(&mut self, now: NaiveDateTime) -> bool {
        if !self.enabled {
            return true;
        }
        if let Some(until) = self.override_until {
            if until < now {
                self.override_until = None;
                info!("Display override expired");
            }
        }
        self.override_until.is_some() || self.in_window(now.hour())
    }
}

impl DisplayGate for ScheduleGate {
    fn allows_display(&mut self) -> bool {
        self.allows_at(Local::now().naive_local())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_default_window() {
        let mut gate = ScheduleGate::new(16, 23);
        assert!(!gate.allows_at(at(15, 59)));
        assert!(gate.allows_at(at(16, 0)));
        assert!(gate.allows_at(at(22, 59)));
        assert!(!gate.allows_at(at(23, 0)));
        assert!(!gate.allows_at(at(3, 0)));
    }

    #[test]
    fn test_window_wraps_midnight() {
        let gate = ScheduleGate::new(22, 2);
        assert!(gate.in_window(22));
        assert!(gate.in_window(0));
        assert!(gate.in_window(1));
        assert!(!gate.in_window(2));
        assert!(!gate.in_window(12));
    }

    #[test]
    fn test_override_until_expiry() {
        let mut gate = ScheduleGate::new(16, 23);
        gate.set_override_at(true, 30, at(9, 0));
        assert!(gate.allows_at(at(9, 15)));
        assert!(gate.allows_at(at(9, 30)));

        assert!(!gate.allows_at(at(9, 31)));
        // Expired overrides are cleared, not just ignored.
        assert!(gate.override_until.is_none());
        assert!(!gate.allows_at(at(9, 0)));
    }

    #[test]
    fn test_override_duration_clamped() {
        let mut gate = ScheduleGate::new(16, 23);
        gate.set_override_at(true, i64::MAX, at(9, 0));
        assert_eq!(
            gate.override_until,
            Some(at(9, 0) + Duration::minutes(MAX_OVERRIDE_MINUTES))
        );
    }

    #[test]
    fn test_override_cleared() {
        let mut gate = ScheduleGate::new(16, 23);
        gate.set_override_at(true, 30, at(9, 0));
        gate.set_override_at(false, 30, at(9, 5));
        assert!(!gate.allows_at(at(9, 10)));
    }

    #[test]
    fn test_disabled_allows_everything() {
        let mut gate = ScheduleGate::disabled();
        assert!(gate.allows_at(at(4, 0)));

        let config = ScheduleConfig {
            enabled: false,
            ..ScheduleConfig::default()
        };
        assert!(ScheduleGate::from_config(&config).allows_at(at(4, 0)));
    }
}
