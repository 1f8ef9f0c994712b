//! Depletable station supplies and their consumption model.
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{LOG_TARGET_STATE, RESOURCE_BATTERIES, RESOURCE_FUEL, SECONDS_PER_HOUR};
use crate::difficulty::Difficulty;
use crate::error::{ConfigError, StationError};
use crate::numbers::clamp_finite;

/// Identifier for a tracked resource (`fuel`, `food`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn fuel() -> Self {
        Self::new(RESOURCE_FUEL)
    }

    #[must_use]
    pub fn batteries() -> Self {
        Self::new(RESOURCE_BATTERIES)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ResourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Hourly consumption for one difficulty. Negative values drain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PeriodRates {
    pub day: f64,
    pub night: f64,
}

impl PeriodRates {
    #[must_use]
    pub const fn for_period(&self, is_night: bool) -> f64 {
        if is_night { self.night } else { self.day }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DifficultyRates {
    #[serde(default)]
    pub normal: PeriodRates,
    #[serde(default)]
    pub hard: PeriodRates,
    #[serde(default)]
    pub insane: PeriodRates,
}

impl DifficultyRates {
    #[must_use]
    pub const fn for_difficulty(&self, difficulty: Difficulty) -> PeriodRates {
        match difficulty {
            Difficulty::Normal => self.normal,
            Difficulty::Hard => self.hard,
            Difficulty::Insane => self.insane,
        }
    }
}

/// Static definition of one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub max: f64,
    #[serde(default)]
    pub critical: f64,
    #[serde(default)]
    pub rates: DifficultyRates,
}

/// Resource definitions keyed by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ResourceTable(pub BTreeMap<ResourceId, ResourceSpec>);

impl ResourceTable {
    /// Load resource definitions from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or validation fails.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let table: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::parse("resources", e))?;
        table.validate()?;
        Ok(table)
    }

    /// Validate bounds for every resource.
    ///
    /// # Errors
    ///
    /// Returns an error when fuel is missing or a resource has invalid bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.0.contains_key(RESOURCE_FUEL) {
            return Err(ConfigError::MissingResource(ResourceId::fuel()));
        }
        for (id, spec) in &self.0 {
            crate::difficulty::check_range("resource max", spec.max, f64::MIN_POSITIVE, 1.0e9)?;
            if !spec.critical.is_finite() || spec.critical < 0.0 || spec.critical > spec.max {
                return Err(ConfigError::CriticalAboveMax {
                    resource: id.clone(),
                    critical: spec.critical,
                    max: spec.max,
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ResourceSpec> {
        self.0.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    /// Embedded default table.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset has been corrupted.
    pub fn default_config() -> Result<Self, ConfigError> {
        Self::from_json(include_str!("../assets/data/resources.json"))
    }
}

/// Current stock of one resource.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub amount: f64,
    pub max: f64,
    pub critical_threshold: f64,
}

impl Resource {
    fn clamp(&mut self) {
        self.amount = clamp_finite(self.amount, 0.0, self.max);
    }

    fn add(&mut self, delta: f64) {
        if delta.is_nan() {
            return;
        }
        self.amount += delta;
        self.clamp();
    }
}

/// Read-only view of a resource for status panels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceStatus {
    pub amount: f64,
    pub max: f64,
    pub percent: f64,
    pub critical: bool,
    pub depleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ResourceEntry {
    stock: Resource,
    rates: PeriodRates,
}

/// Holds every tracked resource for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceModel {
    difficulty: Difficulty,
    multiplier: f64,
    entries: BTreeMap<ResourceId, ResourceEntry>,
}

impl ResourceModel {
    /// Stock every resource at its maximum.
    #[must_use]
    pub fn new(table: &ResourceTable, difficulty: Difficulty, multiplier: f64) -> Self {
        let entries = table
            .0
            .iter()
            .map(|(id, spec)| {
                let entry = ResourceEntry {
                    stock: Resource {
                        amount: spec.max,
                        max: spec.max,
                        critical_threshold: spec.critical,
                    },
                    rates: spec.rates.for_difficulty(difficulty),
                };
                (id.clone(), entry)
            })
            .collect();
        Self {
            difficulty,
            multiplier,
            entries,
        }
    }

    /// Apply rate-based consumption for `dt_seconds` of real time.
    pub fn advance(&mut self, is_night: bool, dt_seconds: f64) {
        if !dt_seconds.is_finite() || dt_seconds <= 0.0 {
            return;
        }
        let scale = dt_seconds / SECONDS_PER_HOUR * self.multiplier;
        for entry in self.entries.values_mut() {
            let rate = entry.rates.for_period(is_night);
            entry.stock.add(rate * scale);
        }
    }

    fn entry(&self, id: &str) -> Result<&ResourceEntry, StationError> {
        self.entries
            .get(id)
            .ok_or_else(|| StationError::UnknownResource(ResourceId::new(id)))
    }

    fn entry_mut(&mut self, id: &str) -> Result<&mut ResourceEntry, StationError> {
        self.entries
            .get_mut(id)
            .ok_or_else(|| StationError::UnknownResource(ResourceId::new(id)))
    }

    /// Current amount of a resource.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::UnknownResource`] for an untracked id.
    pub fn get(&self, id: &str) -> Result<f64, StationError> {
        self.entry(id).map(|entry| entry.stock.amount)
    }

    /// Add `delta` (clamped), returning the new amount.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::UnknownResource`] for an untracked id.
    pub fn modify(&mut self, id: &str, delta: f64) -> Result<f64, StationError> {
        let entry = self.entry_mut(id)?;
        entry.stock.add(delta);
        Ok(entry.stock.amount)
    }

    /// Set an absolute amount (clamped), returning the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::UnknownResource`] for an untracked id.
    pub fn set(&mut self, id: &str, value: f64) -> Result<f64, StationError> {
        let entry = self.entry_mut(id)?;
        entry.stock.amount = value;
        entry.stock.clamp();
        Ok(entry.stock.amount)
    }

    /// # Errors
    ///
    /// Returns [`StationError::UnknownResource`] for an untracked id.
    pub fn is_critical(&self, id: &str) -> Result<bool, StationError> {
        self.entry(id)
            .map(|entry| entry.stock.amount <= entry.stock.critical_threshold)
    }

    /// # Errors
    ///
    /// Returns [`StationError::UnknownResource`] for an untracked id.
    pub fn is_depleted(&self, id: &str) -> Result<bool, StationError> {
        self.entry(id).map(|entry| entry.stock.amount <= 0.0)
    }

    /// Either fuel or batteries can still power the lights.
    #[must_use]
    pub fn has_light(&self) -> bool {
        [RESOURCE_FUEL, RESOURCE_BATTERIES]
            .iter()
            .any(|id| self.get(id).is_ok_and(|amount| amount > 0.0))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.entries.get(id).map(|entry| &entry.stock)
    }

    #[must_use]
    pub fn amounts(&self) -> BTreeMap<ResourceId, f64> {
        self.entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.stock.amount))
            .collect()
    }

    #[must_use]
    pub fn status(&self) -> BTreeMap<ResourceId, ResourceStatus> {
        self.entries
            .iter()
            .map(|(id, entry)| {
                let stock = entry.stock;
                let status = ResourceStatus {
                    amount: stock.amount,
                    max: stock.max,
                    percent: stock.amount / stock.max * 100.0,
                    critical: stock.amount <= stock.critical_threshold,
                    depleted: stock.amount <= 0.0,
                };
                (id.clone(), status)
            })
            .collect()
    }

    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Re-apply configured bounds and rates to loaded stock.
    ///
    /// Resources unknown to the table are dropped; resources missing from the
    /// save start full.
    pub(crate) fn rehydrate(&mut self, table: &ResourceTable, multiplier: f64) {
        let mut fresh = Self::new(table, self.difficulty, multiplier);
        for (id, entry) in &mut fresh.entries {
            if let Some(saved) = self.entries.get(id) {
                entry.stock.amount = saved.stock.amount;
                entry.stock.clamp();
            } else {
                log::warn!(target: LOG_TARGET_STATE, "saved state lacks resource {id}; restocking");
            }
        }
        *self = fresh;
    }
}
