//! Sanity meter and its four-state machine.
//!
//! The level is a single scalar in `[0, 100]`. The discrete state is always
//! derived from the level through [`SanityRanges`]; nothing stores a state
//! that could drift from the level. While the state is `Fractured` every tick
//! counts toward the fatal timeout, and any tick outside it resets the count.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{SANITY_MAX, SANITY_MIN};
use crate::error::ConfigError;
use crate::events::EventSeverity;
use crate::numbers::{clamp_finite, floor_f64_to_u32};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SanityState {
    #[default]
    Stable,
    Anxious,
    Panicked,
    Fractured,
}

impl SanityState {
    /// Presentation cues for the current state. Has no effect on the simulation.
    #[must_use]
    pub const fn visual_effects(self) -> &'static [VisualEffect] {
        match self {
            Self::Stable => &[],
            Self::Anxious => &[VisualEffect::AudioGlitch, VisualEffect::ScreenFlicker],
            Self::Panicked => &[
                VisualEffect::VisualHallucination,
                VisualEffect::FalseAlarm,
            ],
            Self::Fractured => &[
                VisualEffect::SevereDistortion,
                VisualEffect::ColorInversion,
            ],
        }
    }
}

impl fmt::Display for SanityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Stable => "stable",
            Self::Anxious => "anxious",
            Self::Panicked => "panicked",
            Self::Fractured => "fractured",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualEffect {
    AudioGlitch,
    ScreenFlicker,
    VisualHallucination,
    FalseAlarm,
    SevereDistortion,
    ColorInversion,
}

/// Emotional tone of a recovered director's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogTone {
    Sad,
    #[default]
    Neutral,
    Informative,
    Horrifying,
}

/// Inclusive upper bound of each state below `Fractured`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SanityRanges {
    pub stable_max: f64,
    pub anxious_max: f64,
    pub panicked_max: f64,
}

impl Default for SanityRanges {
    fn default() -> Self {
        Self {
            stable_max: 30.0,
            anxious_max: 60.0,
            panicked_max: 80.0,
        }
    }
}

impl SanityRanges {
    /// Map a level onto exactly one state. Values between two integer bands
    /// (30.5) belong to the higher band.
    #[must_use]
    pub fn classify(&self, level: f64) -> SanityState {
        if level <= self.stable_max {
            SanityState::Stable
        } else if level <= self.anxious_max {
            SanityState::Anxious
        } else if level <= self.panicked_max {
            SanityState::Panicked
        } else {
            SanityState::Fractured
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let ascending = SANITY_MIN <= self.stable_max
            && self.stable_max < self.anxious_max
            && self.anxious_max < self.panicked_max
            && self.panicked_max < SANITY_MAX;
        if ascending {
            Ok(())
        } else {
            Err(ConfigError::SanityRanges {
                stable: self.stable_max,
                anxious: self.anxious_max,
                panicked: self.panicked_max,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogFindingDeltas {
    pub sad: f64,
    pub neutral: f64,
    pub informative: f64,
    pub horrifying: f64,
}

impl LogFindingDeltas {
    #[must_use]
    pub const fn delta(&self, tone: LogTone) -> f64 {
        match tone {
            LogTone::Sad => self.sad,
            LogTone::Neutral => self.neutral,
            LogTone::Informative => self.informative,
            LogTone::Horrifying => self.horrifying,
        }
    }
}

/// Fixed deltas for named causes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SanityModifiers {
    /// Per tick without light.
    pub darkness: f64,
    /// Per tick at night.
    pub isolation: f64,
    pub event_routine: f64,
    pub event_anomalous: f64,
    pub event_critical: f64,
    pub log_finding: LogFindingDeltas,
    /// Per game minute spent reading logs.
    pub reading_logs: f64,
    pub sedative: f64,
}

impl SanityModifiers {
    #[must_use]
    pub const fn event(&self, severity: EventSeverity) -> f64 {
        match severity {
            EventSeverity::Routine => self.event_routine,
            EventSeverity::Anomalous => self.event_anomalous,
            EventSeverity::Critical => self.event_critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SanityConfig {
    pub ranges: SanityRanges,
    pub modifiers: SanityModifiers,
}

impl SanityConfig {
    /// Load sanity tuning from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or the ranges overlap.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::parse("sanity", e))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error when the state ranges do not ascend inside `[0, 100]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ranges.validate()
    }

    /// Embedded default tuning.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset has been corrupted.
    pub fn default_config() -> Result<Self, ConfigError> {
        Self::from_json(include_str!("../assets/data/sanity.json"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitySystem {
    level: f64,
    state: SanityState,
    fractured_timer: u32,
    penalty_multiplier: f64,
    fractured_timeout: u32,
    config: SanityConfig,
}

impl SanitySystem {
    #[must_use]
    pub fn new(
        config: SanityConfig,
        starting_level: f64,
        penalty_multiplier: f64,
        fractured_timeout: u32,
    ) -> Self {
        let level = clamp_finite(starting_level, SANITY_MIN, SANITY_MAX);
        Self {
            level,
            state: config.ranges.classify(level),
            fractured_timer: 0,
            penalty_multiplier,
            fractured_timeout,
            config,
        }
    }

    /// Single transition shared by ticks and instantaneous effects.
    fn transition(&mut self, delta: f64, counts_tick: bool) -> bool {
        if !delta.is_nan() {
            self.level = clamp_finite(
                self.level + delta * self.penalty_multiplier,
                SANITY_MIN,
                SANITY_MAX,
            );
        }
        self.state = self.config.ranges.classify(self.level);
        if self.state == SanityState::Fractured {
            if counts_tick {
                self.fractured_timer = self.fractured_timer.saturating_add(1);
            }
        } else {
            self.fractured_timer = 0;
        }
        counts_tick && self.timed_out()
    }

    /// Apply one tick of continuous change. Returns `true` once the fractured
    /// timeout has been reached.
    pub fn advance(&mut self, continuous_delta: f64) -> bool {
        self.transition(continuous_delta, true)
    }

    /// Apply an instantaneous change. Does not count as a fractured tick.
    pub fn modify(&mut self, amount: f64) {
        self.transition(amount, false);
    }

    pub fn apply_event(&mut self, severity: EventSeverity) {
        self.modify(self.config.modifiers.event(severity));
    }

    pub fn apply_environmental(&mut self, is_dark: bool, is_isolated: bool) {
        self.modify(self.environmental_delta(is_dark, is_isolated));
    }

    /// Per-tick delta for the current surroundings.
    #[must_use]
    pub fn environmental_delta(&self, is_dark: bool, is_isolated: bool) -> f64 {
        let modifiers = &self.config.modifiers;
        let mut delta = 0.0;
        if is_dark {
            delta += modifiers.darkness;
        }
        if is_isolated {
            delta += modifiers.isolation;
        }
        delta
    }

    pub fn recover_from_logs(&mut self, tone: LogTone) {
        self.modify(self.config.modifiers.log_finding.delta(tone));
    }

    pub fn read_logs(&mut self, game_minutes: f64) {
        if game_minutes.is_finite() && game_minutes > 0.0 {
            self.modify(self.config.modifiers.reading_logs * game_minutes);
        }
    }

    pub fn apply_sedative(&mut self) {
        self.modify(self.config.modifiers.sedative);
    }

    #[must_use]
    pub const fn level(&self) -> f64 {
        self.level
    }

    /// Truncated level for display.
    #[must_use]
    pub fn display_level(&self) -> u32 {
        floor_f64_to_u32(self.level)
    }

    #[must_use]
    pub const fn state(&self) -> SanityState {
        self.state
    }

    #[must_use]
    pub const fn fractured_timer(&self) -> u32 {
        self.fractured_timer
    }

    #[must_use]
    pub const fn timed_out(&self) -> bool {
        self.fractured_timer >= self.fractured_timeout
    }

    #[must_use]
    pub fn is_fractured(&self) -> bool {
        self.state == SanityState::Fractured
    }

    #[must_use]
    pub fn is_panicked(&self) -> bool {
        self.state == SanityState::Panicked
    }

    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.state == SanityState::Stable
    }

    #[must_use]
    pub const fn visual_effect_tags(&self) -> &'static [VisualEffect] {
        self.state.visual_effects()
    }

    /// Reload tuning and recompute derived fields after deserializing.
    pub(crate) fn rehydrate(
        &mut self,
        config: SanityConfig,
        penalty_multiplier: f64,
        fractured_timeout: u32,
    ) {
        self.config = config;
        self.penalty_multiplier = penalty_multiplier;
        self.fractured_timeout = fractured_timeout;
        self.level = clamp_finite(self.level, SANITY_MIN, SANITY_MAX);
        self.state = config.ranges.classify(self.level);
        if self.state != SanityState::Fractured {
            self.fractured_timer = 0;
        }
    }
}
