//! Hourly event rolls and the catalogs they draw from.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{CRITICAL_EVENT_CHANCE, LOG_TARGET_EVENTS};
use crate::difficulty::DifficultyProfile;
use crate::error::ConfigError;
use crate::resources::{ResourceId, ResourceTable};

/// Severity tier of an event; each tier has its own catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Routine,
    Anomalous,
    Critical,
}

impl EventSeverity {
    pub const ALL: [Self; 3] = [Self::Routine, Self::Anomalous, Self::Critical];
}

impl fmt::Display for EventSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Routine => "routine",
            Self::Anomalous => "anomalous",
            Self::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// Immutable event template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDefinition {
    pub name: String,
    pub severity: EventSeverity,
    #[serde(default)]
    pub sanity_delta: f64,
    #[serde(default)]
    pub resource_deltas: BTreeMap<ResourceId, f64>,
    #[serde(default)]
    pub night_only: bool,
}

impl EventDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, severity: EventSeverity, sanity_delta: f64) -> Self {
        Self {
            name: name.into(),
            severity,
            sanity_delta,
            resource_deltas: BTreeMap::new(),
            night_only: matches!(severity, EventSeverity::Anomalous),
        }
    }

    #[must_use]
    pub fn with_resource(mut self, id: impl Into<String>, delta: f64) -> Self {
        self.resource_deltas.insert(ResourceId::new(id), delta);
        self
    }

    fn allowed_at(&self, is_night: bool) -> bool {
        is_night || !(self.night_only || self.severity == EventSeverity::Anomalous)
    }
}

/// Three severity catalogs, loaded from data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventCatalog {
    pub routine: Vec<EventDefinition>,
    pub anomalous: Vec<EventDefinition>,
    pub critical: Vec<EventDefinition>,
}

impl EventCatalog {
    /// Load catalogs from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or a catalog is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let catalog: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::parse("events", e))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check that every tier has entries filed under the right severity.
    ///
    /// # Errors
    ///
    /// Returns the first empty or mismatched tier.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for severity in EventSeverity::ALL {
            let tier = self.tier(severity);
            if tier.is_empty() {
                return Err(ConfigError::EmptyCatalog(severity));
            }
            if let Some(stray) = tier.iter().find(|event| event.severity != severity) {
                return Err(ConfigError::CatalogMismatch {
                    name: stray.name.clone(),
                    catalog: severity,
                    declared: stray.severity,
                });
            }
        }
        Ok(())
    }

    /// Check that every referenced resource exists in `table`.
    ///
    /// # Errors
    ///
    /// Returns the first event naming an unknown resource.
    pub fn validate_resources(&self, table: &ResourceTable) -> Result<(), ConfigError> {
        self.iter()
            .flat_map(|event| {
                event
                    .resource_deltas
                    .keys()
                    .map(move |resource| (event, resource))
            })
            .find(|(_, resource)| !table.contains(resource.as_str()))
            .map_or(Ok(()), |(event, resource)| {
                Err(ConfigError::EventResource {
                    name: event.name.clone(),
                    resource: resource.clone(),
                })
            })
    }

    #[must_use]
    pub fn tier(&self, severity: EventSeverity) -> &[EventDefinition] {
        match severity {
            EventSeverity::Routine => &self.routine,
            EventSeverity::Anomalous => &self.anomalous,
            EventSeverity::Critical => &self.critical,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventDefinition> {
        self.routine
            .iter()
            .chain(self.anomalous.iter())
            .chain(self.critical.iter())
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&EventDefinition> {
        self.iter().find(|event| event.name == name)
    }

    /// Embedded default catalogs.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset has been corrupted.
    pub fn default_config() -> Result<Self, ConfigError> {
        Self::from_json(include_str!("../assets/data/events.json"))
    }
}

/// Tier selected by a uniform `roll` in `[0, 1)`.
#[must_use]
pub fn tier_for_roll(roll: f64, anomaly_chance: f64) -> EventSeverity {
    if roll < CRITICAL_EVENT_CHANCE {
        EventSeverity::Critical
    } else if roll < CRITICAL_EVENT_CHANCE + anomaly_chance {
        EventSeverity::Anomalous
    } else {
        EventSeverity::Routine
    }
}

/// Result of one hourly roll.
#[derive(Debug, Clone, PartialEq)]
pub enum HourlyRoll {
    /// The trigger roll failed.
    Quiet,
    /// An event was drawn but may only happen at night.
    Suppressed(EventDefinition),
    Fired(EventDefinition),
}

impl HourlyRoll {
    #[must_use]
    pub fn into_event(self) -> Option<EventDefinition> {
        match self {
            Self::Fired(event) => Some(event),
            Self::Quiet | Self::Suppressed(_) => None,
        }
    }
}

/// Per-day statistics. Not used by gameplay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventStats {
    pub events_today: u32,
    pub expected_daily: f64,
    pub anomaly_chance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventGenerator {
    #[serde(skip)]
    catalog: EventCatalog,
    event_frequency: f64,
    anomaly_chance: f64,
    events_this_day: u32,
}

impl EventGenerator {
    #[must_use]
    pub fn new(catalog: EventCatalog, profile: &DifficultyProfile) -> Self {
        Self {
            catalog,
            event_frequency: profile.event_frequency,
            anomaly_chance: profile.anomaly_chance,
            events_this_day: 0,
        }
    }

    /// Hourly trigger probability.
    #[must_use]
    pub fn hourly_chance(&self) -> f64 {
        self.event_frequency / 24.0
    }

    /// Roll once for the current game hour.
    ///
    /// Anomalous draws outside the night still consume the hour and are
    /// reported as [`HourlyRoll::Suppressed`].
    pub fn roll_hour<R: Rng + ?Sized>(&mut self, rng: &mut R, is_night: bool) -> HourlyRoll {
        let trigger: f64 = rng.r#gen();
        if trigger >= self.hourly_chance() {
            return HourlyRoll::Quiet;
        }
        self.events_this_day = self.events_this_day.saturating_add(1);

        let severity = tier_for_roll(rng.r#gen(), self.anomaly_chance);
        let Some(event) = self.catalog.tier(severity).choose(rng).cloned() else {
            log::warn!(target: LOG_TARGET_EVENTS, "{severity} catalog is empty; skipping roll");
            return HourlyRoll::Quiet;
        };
        if event.allowed_at(is_night) {
            log::debug!(target: LOG_TARGET_EVENTS, "{severity} event drawn: {}", event.name);
            HourlyRoll::Fired(event)
        } else {
            log::debug!(target: LOG_TARGET_EVENTS, "daylight suppressed {}", event.name);
            HourlyRoll::Suppressed(event)
        }
    }

    /// Roll once and keep only events that actually fire.
    pub fn generate<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        is_night: bool,
    ) -> Option<EventDefinition> {
        self.roll_hour(rng, is_night).into_event()
    }

    pub fn reset_day(&mut self) {
        self.events_this_day = 0;
    }

    #[must_use]
    pub const fn stats(&self) -> EventStats {
        EventStats {
            events_today: self.events_this_day,
            expected_daily: self.event_frequency,
            anomaly_chance: self.anomaly_chance,
        }
    }

    #[must_use]
    pub const fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    pub(crate) fn rehydrate(&mut self, catalog: EventCatalog, profile: &DifficultyProfile) {
        self.catalog = catalog;
        self.event_frequency = profile.event_frequency;
        self.anomaly_chance = profile.anomaly_chance;
    }
}
