//! Static configuration loaded once at startup.
use serde::{Deserialize, Serialize};

use crate::difficulty::{Difficulty, DifficultyProfile, DifficultyTable, check_range};
use crate::error::ConfigError;
use crate::events::EventCatalog;
use crate::resources::ResourceTable;
use crate::sanity::SanityConfig;
use crate::time::ClockSettings;

/// Scenario length and clock tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub day_start: u32,
    pub night_start: u32,
    pub seconds_per_game_minute: f64,
    pub total_days: u32,
    /// Consecutive fractured ticks that end the run.
    pub fractured_timeout: u32,
}

impl ScenarioConfig {
    /// Load scenario tuning from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or the clock is inconsistent.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::parse("scenario", e))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error when the day/night window is inverted or a value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.day_start >= self.night_start || self.night_start >= 24 {
            return Err(ConfigError::ClockWindow {
                day_start: self.day_start,
                night_start: self.night_start,
            });
        }
        check_range(
            "seconds_per_game_minute",
            self.seconds_per_game_minute,
            f64::MIN_POSITIVE,
            3_600.0,
        )?;
        check_range("total_days", f64::from(self.total_days), 1.0, 10_000.0)?;
        check_range(
            "fractured_timeout",
            f64::from(self.fractured_timeout),
            1.0,
            f64::from(u32::MAX),
        )
    }

    #[must_use]
    pub const fn clock(&self) -> ClockSettings {
        ClockSettings {
            day_start: self.day_start,
            night_start: self.night_start,
            seconds_per_game_minute: self.seconds_per_game_minute,
        }
    }

    /// Embedded default scenario.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset has been corrupted.
    pub fn default_config() -> Result<Self, ConfigError> {
        Self::from_json(include_str!("../assets/data/scenario.json"))
    }
}

/// Every table the simulation reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    pub scenario: ScenarioConfig,
    pub resources: ResourceTable,
    pub difficulties: DifficultyTable,
    pub sanity: SanityConfig,
    pub events: EventCatalog,
}

impl StationConfig {
    /// Assemble and cross-validate individually loaded tables.
    ///
    /// # Errors
    ///
    /// Returns an error if any table is invalid or events reference unknown resources.
    pub fn from_parts(
        scenario: ScenarioConfig,
        resources: ResourceTable,
        difficulties: DifficultyTable,
        sanity: SanityConfig,
        events: EventCatalog,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            scenario,
            resources,
            difficulties,
            sanity,
            events,
        };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns the first validation failure across all tables.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scenario.validate()?;
        self.resources.validate()?;
        self.difficulties.validate()?;
        self.sanity.validate()?;
        self.events.validate()?;
        self.events.validate_resources(&self.resources)
    }

    #[must_use]
    pub const fn profile(&self, difficulty: Difficulty) -> &DifficultyProfile {
        self.difficulties.profile(difficulty)
    }

    /// Configuration built from the embedded JSON assets.
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded asset has been corrupted.
    pub fn default_config() -> Result<Self, ConfigError> {
        Self::from_parts(
            ScenarioConfig::default_config()?,
            ResourceTable::default_config()?,
            DifficultyTable::default_config()?,
            SanityConfig::default_config()?,
            EventCatalog::default_config()?,
        )
    }
}
