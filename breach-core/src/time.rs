//! Game clock: converts real elapsed seconds into station time of day.
use serde::{Deserialize, Serialize};

use crate::constants::{HOURS_PER_DAY, LOG_TARGET_TIME, MINUTES_PER_HOUR};
use crate::numbers::{clamp_finite, floor_f64_to_u32};

/// Fixed clock parameters shared by every run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockSettings {
    /// Hour at which the working day begins (and night ends).
    pub day_start: u32,
    /// Hour at which night begins.
    pub night_start: u32,
    /// Real seconds that make up one game minute.
    pub seconds_per_game_minute: f64,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            day_start: 8,
            night_start: 20,
            seconds_per_game_minute: 0.5,
        }
    }
}

impl ClockSettings {
    /// Real seconds that make up one game hour.
    #[must_use]
    pub fn seconds_per_game_hour(&self) -> f64 {
        self.seconds_per_game_minute * MINUTES_PER_HOUR
    }

    fn day_start_hour(&self) -> f64 {
        f64::from(self.day_start)
    }

    fn night_start_hour(&self) -> f64 {
        f64::from(self.night_start)
    }
}

/// Time of day plus edge flags describing what the last `advance` crossed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeModel {
    hour: f64,
    minute: f64,
    day: u32,
    clock: ClockSettings,
    #[serde(default)]
    day_elapsed_seconds: f64,
    #[serde(default)]
    hours_crossed: u32,
    #[serde(default)]
    rollovers: u32,
}

impl Default for TimeModel {
    fn default() -> Self {
        Self::new(ClockSettings::default())
    }
}

impl TimeModel {
    #[must_use]
    pub fn new(clock: ClockSettings) -> Self {
        Self {
            hour: clock.day_start_hour(),
            minute: 0.0,
            day: 1,
            clock,
            day_elapsed_seconds: 0.0,
            hours_crossed: 0,
            rollovers: 0,
        }
    }

    /// Advance the clock by `dt_seconds` of real time.
    ///
    /// Non-positive or non-finite deltas are treated as a stalled frame: the
    /// clock does not move, but the edge flags from the previous call are
    /// still cleared so a rollover is never reported twice.
    pub fn advance(&mut self, dt_seconds: f64) {
        self.hours_crossed = 0;
        self.rollovers = 0;
        if !dt_seconds.is_finite() || dt_seconds <= 0.0 {
            return;
        }

        self.day_elapsed_seconds += dt_seconds;
        self.minute += dt_seconds / self.clock.seconds_per_game_minute;

        if self.minute >= MINUTES_PER_HOUR {
            let carried = (self.minute / MINUTES_PER_HOUR).floor();
            self.hour += carried;
            self.minute = self.minute.rem_euclid(MINUTES_PER_HOUR);
            self.hours_crossed = floor_f64_to_u32(carried);
        }

        if self.hour >= HOURS_PER_DAY {
            let wraps = (self.hour / HOURS_PER_DAY).floor();
            self.hour = self.hour.rem_euclid(HOURS_PER_DAY);
            self.rollovers = floor_f64_to_u32(wraps);
            log::trace!(
                target: LOG_TARGET_TIME,
                "clock wrapped {} time(s) to {}",
                self.rollovers,
                self.time_string()
            );
        }
    }

    #[must_use]
    pub fn is_night(&self) -> bool {
        self.hour >= self.clock.night_start_hour() || self.hour < self.clock.day_start_hour()
    }

    #[must_use]
    pub fn is_day(&self) -> bool {
        !self.is_night()
    }

    /// True only for the `advance` call in which the clock crossed midnight.
    #[must_use]
    pub const fn day_complete(&self) -> bool {
        self.rollovers > 0
    }

    /// Midnights crossed by the last `advance` call.
    #[must_use]
    pub const fn rollovers(&self) -> u32 {
        self.rollovers
    }

    /// Whole game-hour boundaries crossed by the last `advance` call.
    #[must_use]
    pub const fn hours_crossed(&self) -> u32 {
        self.hours_crossed
    }

    /// Rewind to the start of the working day.
    pub fn reset_day(&mut self) {
        self.hour = self.clock.day_start_hour();
        self.minute = 0.0;
        self.day_elapsed_seconds = 0.0;
    }

    /// Move to the next day and rewind the clock.
    pub fn advance_day(&mut self) {
        self.day = self.day.saturating_add(1);
        self.reset_day();
    }

    /// Formatted `HH:MM`.
    #[must_use]
    pub fn time_string(&self) -> String {
        format!("{:02}:{:02}", self.hour(), self.minute())
    }

    #[must_use]
    pub fn hour(&self) -> u32 {
        floor_f64_to_u32(self.hour)
    }

    #[must_use]
    pub fn minute(&self) -> u32 {
        floor_f64_to_u32(self.minute)
    }

    #[must_use]
    pub const fn day(&self) -> u32 {
        self.day
    }

    #[must_use]
    pub const fn clock(&self) -> &ClockSettings {
        &self.clock
    }

    /// Real seconds accumulated since the current day began.
    #[must_use]
    pub const fn day_elapsed_seconds(&self) -> f64 {
        self.day_elapsed_seconds
    }

    /// Percentage of the 24-hour cycle elapsed since the day started.
    #[must_use]
    pub fn day_progress(&self) -> f64 {
        let total = HOURS_PER_DAY * MINUTES_PER_HOUR;
        let mut current =
            (self.hour - self.clock.day_start_hour()) * MINUTES_PER_HOUR + self.minute;
        if current < 0.0 {
            current += total;
        }
        current / total * 100.0
    }

    /// Restore the range invariants after deserializing untrusted data.
    pub(crate) fn normalize(&mut self, clock: ClockSettings) {
        self.clock = clock;
        let (hour, minute) = if self.hour.is_finite() && self.minute.is_finite() {
            let carried = (self.minute / MINUTES_PER_HOUR).floor();
            (
                (self.hour.floor() + carried).rem_euclid(HOURS_PER_DAY),
                self.minute.rem_euclid(MINUTES_PER_HOUR),
            )
        } else if self.hour.is_finite() {
            (self.hour.floor().rem_euclid(HOURS_PER_DAY), 0.0)
        } else {
            (clock.day_start_hour(), 0.0)
        };
        self.hour = hour;
        self.minute = minute;
        self.day = self.day.max(1);
        self.day_elapsed_seconds = clamp_finite(self.day_elapsed_seconds, 0.0, f64::MAX);
        self.hours_crossed = 0;
        self.rollovers = 0;
    }
}
