//! Difficulty selection and per-difficulty tuning profiles.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Difficulty chosen at scenario start. Immutable for the rest of the run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Normal,
    Hard,
    Insane,
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Normal, Self::Hard, Self::Insane];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Hard => "hard",
            Self::Insane => "insane",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "hard" => Ok(Self::Hard),
            "insane" => Ok(Self::Insane),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Station equipment that can be repaired with spare parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Equipment {
    Generator,
    Heating,
    Ventilation,
    Lighting,
}

impl Equipment {
    pub const ALL: [Self; 4] = [
        Self::Generator,
        Self::Heating,
        Self::Ventilation,
        Self::Lighting,
    ];
}

impl fmt::Display for Equipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Generator => "generator",
            Self::Heating => "heating",
            Self::Ventilation => "ventilation",
            Self::Lighting => "lighting",
        };
        f.write_str(label)
    }
}

/// Parts spent per repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairCosts {
    pub generator: u32,
    pub heating: u32,
    pub ventilation: u32,
    pub lighting: u32,
}

impl RepairCosts {
    #[must_use]
    pub const fn cost(&self, equipment: Equipment) -> u32 {
        match equipment {
            Equipment::Generator => self.generator,
            Equipment::Heating => self.heating,
            Equipment::Ventilation => self.ventilation,
            Equipment::Lighting => self.lighting,
        }
    }
}

/// Tuning applied across every subsystem for one difficulty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Scales every resource consumption rate.
    pub resource_multiplier: f64,
    /// Expected events per 24-hour day.
    pub event_frequency: f64,
    #[serde(rename = "anomaly_event_chance")]
    pub anomaly_chance: f64,
    #[serde(rename = "sanity_penalty_mult")]
    pub sanity_penalty_multiplier: f64,
    pub starting_sanity: f64,
    pub repair_costs: RepairCosts,
}

impl DifficultyProfile {
    /// Hourly trigger probability derived from the daily frequency.
    #[must_use]
    pub fn hourly_event_chance(&self) -> f64 {
        self.event_frequency / 24.0
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_range("resource_multiplier", self.resource_multiplier, 0.0, 10.0)?;
        check_range("event_frequency", self.event_frequency, 0.0, 24.0)?;
        check_range(
            "anomaly_event_chance",
            self.anomaly_chance,
            0.0,
            1.0 - crate::constants::CRITICAL_EVENT_CHANCE,
        )?;
        check_range(
            "sanity_penalty_mult",
            self.sanity_penalty_multiplier,
            0.0,
            10.0,
        )?;
        check_range("starting_sanity", self.starting_sanity, 0.0, 100.0)
    }
}

pub(crate) fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        })
    }
}

/// All three difficulty profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyTable {
    pub normal: DifficultyProfile,
    pub hard: DifficultyProfile,
    pub insane: DifficultyProfile,
}

impl DifficultyTable {
    /// Load difficulty profiles from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or a profile is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let table: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::parse("difficulties", e))?;
        table.validate()?;
        Ok(table)
    }

    /// Validate every profile.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Difficulty::ALL
            .iter()
            .try_for_each(|difficulty| self.profile(*difficulty).validate())
    }

    #[must_use]
    pub const fn profile(&self, difficulty: Difficulty) -> &DifficultyProfile {
        match difficulty {
            Difficulty::Normal => &self.normal,
            Difficulty::Hard => &self.hard,
            Difficulty::Insane => &self.insane,
        }
    }

    /// Embedded default profiles.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset has been corrupted.
    pub fn default_config() -> Result<Self, ConfigError> {
        Self::from_json(include_str!("../assets/data/difficulties.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_difficulty_names() {
        assert_eq!("Hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!(" insane ".parse::<Difficulty>(), Ok(Difficulty::Insane));
        assert!("nightmare".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::Normal.to_string(), "normal");
    }

    #[test]
    fn default_table_matches_balance_sheet() {
        let table = DifficultyTable::default_config().unwrap();
        let normal = table.profile(Difficulty::Normal);
        assert!((normal.resource_multiplier - 1.0).abs() < f64::EPSILON);
        assert!((normal.anomaly_chance - 0.30).abs() < f64::EPSILON);
        assert!((normal.starting_sanity - 50.0).abs() < f64::EPSILON);
        assert!((normal.hourly_event_chance() - 5.5 / 24.0).abs() < 1e-12);

        let insane = table.profile(Difficulty::Insane);
        assert!((insane.sanity_penalty_multiplier - 1.5).abs() < f64::EPSILON);
        assert_eq!(insane.repair_costs.cost(Equipment::Generator), 8);
        assert_eq!(
            table.profile(Difficulty::Hard).repair_costs.cost(Equipment::Lighting),
            3
        );
    }

    #[test]
    fn rejects_out_of_range_anomaly_chance() {
        let mut table = DifficultyTable::default_config().unwrap();
        table.hard.anomaly_chance = 0.95;
        let err = table.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::RangeViolation {
                field: "anomaly_event_chance",
                ..
            }
        ));
    }
}
