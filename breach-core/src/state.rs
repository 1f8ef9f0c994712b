//! Top-level station state: composes the clock, supplies, sanity and events.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::StationConfig;
use crate::constants::{LOG_TARGET_STATE, RESOURCE_FUEL, RESOURCE_PARTS};
use crate::difficulty::{Difficulty, Equipment, RepairCosts};
use crate::error::StationError;
use crate::events::{EventDefinition, EventGenerator, EventSeverity, HourlyRoll};
use crate::resources::{ResourceId, ResourceModel};
use crate::sanity::{LogTone, SanityState, SanitySystem};
use crate::time::TimeModel;

/// Why a run ended in failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// Fuel fell to its critical level.
    FuelCritical,
    /// Sanity stayed fractured for the full timeout.
    SanityFractured,
}

/// Terminal result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Survival,
    Failure(FailureCause),
}

impl Outcome {
    #[must_use]
    pub const fn is_survival(self) -> bool {
        matches!(self, Self::Survival)
    }

    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Survival => write!(f, "survival"),
            Self::Failure(FailureCause::FuelCritical) => write!(f, "failure (fuel critical)"),
            Self::Failure(FailureCause::SanityFractured) => {
                write!(f, "failure (sanity fractured)")
            }
        }
    }
}

/// An event applied to the station, stamped with when it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub day: u32,
    pub time: String,
    pub event: EventDefinition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRecord {
    pub day: u32,
    pub time: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFinding {
    pub day: u32,
    pub time: String,
    pub tone: LogTone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairRecord {
    pub day: u32,
    pub time: String,
    pub equipment: Equipment,
    pub parts_spent: u32,
}

/// What a single `advance` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// Game-hour boundaries crossed, one event roll each.
    pub hours_crossed: u32,
    pub days_completed: u32,
    pub ended: bool,
}

/// Read-only view for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub day: u32,
    pub total_days: u32,
    pub time: String,
    pub is_night: bool,
    pub resources: BTreeMap<ResourceId, f64>,
    pub sanity_level: f64,
    pub sanity_state: SanityState,
    pub is_over: bool,
    pub outcome: Option<Outcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    difficulty: Difficulty,
    current_day: u32,
    total_days: u32,
    is_over: bool,
    outcome: Option<Outcome>,
    repair_costs: RepairCosts,
    ticks: u64,
    time: TimeModel,
    resources: ResourceModel,
    sanity: SanitySystem,
    events: EventGenerator,
    #[serde(default)]
    event_log: Vec<EventLogEntry>,
    #[serde(default)]
    choices: Vec<ChoiceRecord>,
    #[serde(default)]
    log_findings: Vec<LogFinding>,
    #[serde(default)]
    anomalies_observed: Vec<String>,
    #[serde(default)]
    repairs: Vec<RepairRecord>,
}

impl SimulationState {
    /// Start a run on day 1 at the start of the working day with full supplies.
    #[must_use]
    pub fn new(config: &StationConfig, difficulty: Difficulty) -> Self {
        let profile = config.profile(difficulty);
        let scenario = &config.scenario;
        Self {
            difficulty,
            current_day: 1,
            total_days: scenario.total_days,
            is_over: false,
            outcome: None,
            repair_costs: profile.repair_costs,
            ticks: 0,
            time: TimeModel::new(scenario.clock()),
            resources: ResourceModel::new(
                &config.resources,
                difficulty,
                profile.resource_multiplier,
            ),
            sanity: SanitySystem::new(
                config.sanity,
                profile.starting_sanity,
                profile.sanity_penalty_multiplier,
                scenario.fractured_timeout,
            ),
            events: EventGenerator::new(config.events.clone(), profile),
            event_log: Vec::new(),
            choices: Vec::new(),
            log_findings: Vec::new(),
            anomalies_observed: Vec::new(),
            repairs: Vec::new(),
        }
    }

    /// Advance the simulation by one frame of `dt_seconds` real time.
    ///
    /// Order within a tick: clock, resources (using the post-advance
    /// day/night), sanity, termination, day rollover.
    pub fn advance(&mut self, dt_seconds: f64) -> TickOutcome {
        self.advance_inner(dt_seconds, |_, _| {})
    }

    /// Advance like [`Self::advance`] and roll the generator once per game
    /// hour crossed.
    ///
    /// Rolls happen before any day rollover, so they see the clock and day
    /// the hours were crossed on.
    pub fn advance_with_events<R: Rng + ?Sized>(
        &mut self,
        dt_seconds: f64,
        rng: &mut R,
    ) -> (TickOutcome, Vec<Result<HourlyRoll, StationError>>) {
        let mut rolls = Vec::new();
        let outcome = self.advance_inner(dt_seconds, |state, hours| {
            for _ in 0..hours {
                if state.is_over {
                    break;
                }
                rolls.push(state.roll_event(&mut *rng));
            }
        });
        (outcome, rolls)
    }

    fn advance_inner(
        &mut self,
        dt_seconds: f64,
        on_hours: impl FnOnce(&mut Self, u32),
    ) -> TickOutcome {
        if self.is_over {
            return TickOutcome {
                ended: true,
                ..TickOutcome::default()
            };
        }
        if !dt_seconds.is_finite() || dt_seconds <= 0.0 {
            // stalled frame: still clear the clock's edge flags
            self.time.advance(dt_seconds);
            return TickOutcome::default();
        }
        self.ticks = self.ticks.saturating_add(1);

        self.time.advance(dt_seconds);
        let is_night = self.time.is_night();
        self.resources.advance(is_night, dt_seconds);

        let is_dark = !self.resources.has_light();
        let delta = self.sanity.environmental_delta(is_dark, is_night);
        let timed_out = self.sanity.advance(delta);

        if self.resources.is_critical(RESOURCE_FUEL).unwrap_or(false) {
            self.finish(Outcome::Failure(FailureCause::FuelCritical));
        } else if timed_out {
            self.finish(Outcome::Failure(FailureCause::SanityFractured));
        }

        let hours_crossed = self.time.hours_crossed();
        let rollovers = self.time.rollovers();
        on_hours(self, hours_crossed);

        let mut days_completed = 0;
        for _ in 0..rollovers {
            if self.is_over {
                break;
            }
            self.complete_day();
            days_completed += 1;
        }

        TickOutcome {
            hours_crossed,
            days_completed,
            ended: self.is_over,
        }
    }

    /// Close out the current day. The run is won once the last day is done.
    pub fn complete_day(&mut self) {
        if self.is_over {
            return;
        }
        self.current_day = self.current_day.saturating_add(1);
        log::debug!(
            target: LOG_TARGET_STATE,
            "day {} of {} begins",
            self.current_day,
            self.total_days
        );
        if self.current_day > self.total_days {
            self.finish(Outcome::Survival);
        } else {
            self.time.advance_day();
            self.events.reset_day();
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.is_over = true;
        self.outcome = Some(outcome);
        log::info!(
            target: LOG_TARGET_STATE,
            "run ended on day {} at {}: {outcome}",
            self.current_day,
            self.time.time_string()
        );
    }

    /// Record and apply an event.
    ///
    /// Resource ids are checked before anything changes, so a bad event
    /// leaves the state untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::UnknownResource`] if the event names an untracked resource.
    pub fn apply_event(&mut self, event: &EventDefinition) -> Result<(), StationError> {
        if self.is_over {
            return Ok(());
        }
        if let Some(unknown) = event
            .resource_deltas
            .keys()
            .find(|id| !self.resources.contains(id.as_str()))
        {
            log::warn!(
                target: LOG_TARGET_STATE,
                "rejecting event '{}': unknown resource {unknown}",
                event.name
            );
            return Err(StationError::UnknownResource(unknown.clone()));
        }

        self.event_log.push(EventLogEntry {
            day: self.current_day,
            time: self.time.time_string(),
            event: event.clone(),
        });
        if event.severity == EventSeverity::Anomalous {
            self.anomalies_observed.push(event.name.clone());
        }

        self.sanity.modify(event.sanity_delta);
        for (id, delta) in &event.resource_deltas {
            self.resources.modify(id.as_str(), *delta)?;
        }
        log::debug!(
            target: LOG_TARGET_STATE,
            "applied '{}' on day {}; sanity now {:.1}",
            event.name,
            self.current_day,
            self.sanity.level()
        );
        Ok(())
    }

    /// Roll the generator for the current hour and apply whatever fires.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::UnknownResource`] if a fired event names an untracked resource.
    pub fn roll_event<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<HourlyRoll, StationError> {
        if self.is_over {
            return Ok(HourlyRoll::Quiet);
        }
        let roll = self.events.roll_hour(rng, self.time.is_night());
        if let HourlyRoll::Fired(event) = &roll {
            self.apply_event(event)?;
        }
        Ok(roll)
    }

    /// Discrete resource change forwarded from mini-games.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::UnknownResource`] for an untracked id.
    pub fn modify_resource(&mut self, id: &str, delta: f64) -> Result<f64, StationError> {
        if self.is_over {
            return self.resources.get(id);
        }
        self.resources.modify(id, delta)
    }

    /// Spend parts to repair a piece of equipment.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::InsufficientParts`] when the stock cannot cover the cost.
    pub fn repair(&mut self, equipment: Equipment) -> Result<(), StationError> {
        if self.is_over {
            return Ok(());
        }
        let needed = self.repair_costs.cost(equipment);
        let available = self.resources.get(RESOURCE_PARTS)?;
        if available < f64::from(needed) {
            return Err(StationError::InsufficientParts {
                equipment,
                needed,
                available,
            });
        }
        self.resources.modify(RESOURCE_PARTS, -f64::from(needed))?;
        self.repairs.push(RepairRecord {
            day: self.current_day,
            time: self.time.time_string(),
            equipment,
            parts_spent: needed,
        });
        Ok(())
    }

    pub fn record_choice(&mut self, label: impl Into<String>) {
        if self.is_over {
            return;
        }
        self.choices.push(ChoiceRecord {
            day: self.current_day,
            time: self.time.time_string(),
            label: label.into(),
        });
    }

    /// Log a recovered director's log and apply its tone.
    pub fn record_log_finding(&mut self, tone: LogTone) {
        if self.is_over {
            return;
        }
        self.log_findings.push(LogFinding {
            day: self.current_day,
            time: self.time.time_string(),
            tone,
        });
        self.sanity.recover_from_logs(tone);
    }

    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            day: self.current_day,
            total_days: self.total_days,
            time: self.time.time_string(),
            is_night: self.time.is_night(),
            resources: self.resources.amounts(),
            sanity_level: self.sanity.level(),
            sanity_state: self.sanity.state(),
            is_over: self.is_over,
            outcome: self.outcome,
        }
    }

    /// Reattach configuration to a loaded save and restore every invariant.
    #[must_use]
    pub fn rehydrate(mut self, config: &StationConfig) -> Self {
        let profile = config.profile(self.difficulty);
        self.total_days = config.scenario.total_days;
        self.repair_costs = profile.repair_costs;
        self.current_day = self.current_day.max(1);
        self.time.normalize(config.scenario.clock());
        self.resources
            .rehydrate(&config.resources, profile.resource_multiplier);
        self.sanity.rehydrate(
            config.sanity,
            profile.sanity_penalty_multiplier,
            config.scenario.fractured_timeout,
        );
        self.events.rehydrate(config.events.clone(), profile);
        if self.outcome.is_some() {
            self.is_over = true;
        }
        self
    }

    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub const fn current_day(&self) -> u32 {
        self.current_day
    }

    #[must_use]
    pub const fn total_days(&self) -> u32 {
        self.total_days
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.is_over
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Ticks processed so far, excluding stalled frames.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub const fn time(&self) -> &TimeModel {
        &self.time
    }

    #[must_use]
    pub const fn resources(&self) -> &ResourceModel {
        &self.resources
    }

    pub const fn resources_mut(&mut self) -> &mut ResourceModel {
        &mut self.resources
    }

    #[must_use]
    pub const fn sanity(&self) -> &SanitySystem {
        &self.sanity
    }

    /// Item use and other discrete sanity effects.
    pub const fn sanity_mut(&mut self) -> &mut SanitySystem {
        &mut self.sanity
    }

    #[must_use]
    pub const fn event_generator(&self) -> &EventGenerator {
        &self.events
    }

    #[must_use]
    pub fn event_log(&self) -> &[EventLogEntry] {
        &self.event_log
    }

    #[must_use]
    pub fn choices(&self) -> &[ChoiceRecord] {
        &self.choices
    }

    #[must_use]
    pub fn log_findings(&self) -> &[LogFinding] {
        &self.log_findings
    }

    #[must_use]
    pub fn anomalies_observed(&self) -> &[String] {
        &self.anomalies_observed
    }

    #[must_use]
    pub fn repairs(&self) -> &[RepairRecord] {
        &self.repairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn config() -> StationConfig {
        StationConfig::default_config().unwrap()
    }

    fn normal() -> SimulationState {
        SimulationState::new(&config(), Difficulty::Normal)
    }

    /// Real seconds in one full working day (08:00 to midnight).
    const DAY_SECONDS: f64 = 16.0 * 30.0;

    #[test]
    fn new_run_starts_on_day_one() {
        let state = normal();
        let status = state.status();
        assert_eq!(status.day, 1);
        assert_eq!(status.total_days, 20);
        assert_eq!(status.time, "08:00");
        assert!(!status.is_night);
        assert!((status.sanity_level - 50.0).abs() < f64::EPSILON);
        assert_eq!(status.sanity_state, SanityState::Anxious);
        assert!(!status.is_over);
        assert_eq!(status.outcome, None);
    }

    #[test]
    fn routine_event_applies_sanity_and_resources() {
        let mut state = normal();
        let event =
            EventDefinition::new("Generator Fluctuation", EventSeverity::Routine, -5.0)
                .with_resource("fuel", -5.0);
        state.apply_event(&event).unwrap();
        assert!((state.sanity().level() - 45.0).abs() < f64::EPSILON);
        assert!((state.resources().get("fuel").unwrap() - 95.0).abs() < f64::EPSILON);
        assert_eq!(state.event_log().len(), 1);
        assert_eq!(state.event_log()[0].day, 1);
        assert_eq!(state.event_log()[0].time, "08:00");
    }

    #[test]
    fn unknown_resource_leaves_state_untouched() {
        let mut state = normal();
        let event = EventDefinition::new("Leak", EventSeverity::Routine, -5.0)
            .with_resource("fuel", -5.0)
            .with_resource("oxygen", -1.0);
        let err = state.apply_event(&event).unwrap_err();
        assert_eq!(err, StationError::UnknownResource("oxygen".into()));
        assert!(state.event_log().is_empty());
        assert!((state.sanity().level() - 50.0).abs() < f64::EPSILON);
        assert!((state.resources().get("fuel").unwrap() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn anomalous_events_are_tracked() {
        let mut state = normal();
        let event = EventDefinition::new("Sensor Anomaly", EventSeverity::Anomalous, -15.0);
        state.apply_event(&event).unwrap();
        assert_eq!(state.anomalies_observed(), ["Sensor Anomaly".to_string()]);
    }

    #[test]
    fn fuel_critical_ends_in_failure() {
        let mut state = normal();
        state.modify_resource("fuel", -85.0).unwrap();
        let outcome = state.advance(0.1);
        assert!(outcome.ended);
        assert_eq!(
            state.outcome(),
            Some(Outcome::Failure(FailureCause::FuelCritical))
        );
    }

    #[test]
    fn fractured_timeout_ends_on_exact_tick() {
        let mut state = normal();
        state.sanity_mut().modify(50.0);
        assert!(state.sanity().is_fractured());
        // daytime with light: no environmental drift keeps sanity at 100
        for tick in 1..600 {
            let outcome = state.advance(0.01);
            assert!(!outcome.ended, "ended early at tick {tick}");
        }
        let outcome = state.advance(0.01);
        assert!(outcome.ended);
        assert_eq!(
            state.outcome(),
            Some(Outcome::Failure(FailureCause::SanityFractured))
        );
    }

    #[test]
    fn terminal_state_ignores_further_input() {
        let mut state = normal();
        state.modify_resource("fuel", -100.0).unwrap();
        state.advance(1.0);
        assert!(state.is_over());
        let snapshot = state.clone();

        state.advance(100.0);
        let event = EventDefinition::new("Late", EventSeverity::Critical, -50.0);
        state.apply_event(&event).unwrap();
        state.modify_resource("food", -10.0).unwrap();
        state.complete_day();
        state.repair(Equipment::Generator).unwrap();
        state.record_choice("too late");
        state.record_log_finding(LogTone::Informative);
        assert_eq!(state, snapshot);
    }

    #[test]
    fn hourly_rolls_happen_before_the_day_rolls_over() {
        let mut state = SimulationState::new(&config(), Difficulty::Insane);
        let mut rng = SmallRng::seed_from_u64(5);
        state.advance(15.0 * 30.0);
        assert_eq!(state.status().time, "23:00");

        let (outcome, rolls) = state.advance_with_events(30.0, &mut rng);
        assert_eq!(outcome.hours_crossed, 1);
        assert_eq!(outcome.days_completed, 1);
        assert_eq!(rolls.len(), 1);
        assert_eq!(state.current_day(), 2);
        for entry in state.event_log() {
            assert_eq!(entry.day, 1);
            assert_eq!(entry.time, "00:00");
        }
    }

    #[test]
    fn stalled_frames_are_no_ops() {
        let mut state = normal();
        let before = state.status();
        assert_eq!(state.advance(0.0), TickOutcome::default());
        state.advance(-1.0);
        state.advance(f64::NAN);
        assert_eq!(state.status(), before);
        assert_eq!(state.ticks(), 0);
    }

    #[test]
    fn midnight_completes_a_day() {
        let mut state = normal();
        let outcome = state.advance(DAY_SECONDS);
        assert_eq!(outcome.days_completed, 1);
        assert_eq!(outcome.hours_crossed, 16);
        assert_eq!(state.current_day(), 2);
        assert_eq!(state.time().day(), 2);
        assert_eq!(state.status().time, "08:00");
    }

    #[test]
    fn last_day_ends_in_survival() {
        let mut state = normal();
        for _ in 0..19 {
            state.advance(DAY_SECONDS);
        }
        assert_eq!(state.current_day(), 20);
        assert!(!state.is_over());
        state.advance(DAY_SECONDS);
        assert_eq!(state.outcome(), Some(Outcome::Survival));
        assert_eq!(state.current_day(), 21);
    }

    #[test]
    fn repair_spends_parts() {
        let mut state = SimulationState::new(&config(), Difficulty::Insane);
        state.repair(Equipment::Generator).unwrap();
        assert!((state.resources().get("parts").unwrap() - 22.0).abs() < f64::EPSILON);
        assert_eq!(state.repairs().len(), 1);

        state.resources_mut().set("parts", 3.0).unwrap();
        let err = state.repair(Equipment::Heating).unwrap_err();
        assert!(matches!(
            err,
            StationError::InsufficientParts { needed: 6, .. }
        ));
        assert!((state.resources().get("parts").unwrap() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn choices_and_logs_are_append_only() {
        let mut state = normal();
        state.record_choice("sealed the lower hatch");
        state.record_log_finding(LogTone::Horrifying);
        state.record_log_finding(LogTone::Informative);
        assert_eq!(state.choices().len(), 1);
        assert_eq!(state.log_findings().len(), 2);
        assert!((state.sanity().level() - 45.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rolled_events_are_applied() {
        let mut state = SimulationState::new(&config(), Difficulty::Insane);
        let mut rng = SmallRng::seed_from_u64(99);
        let mut fired = 0;
        for _ in 0..200 {
            if let HourlyRoll::Fired(_) = state.roll_event(&mut rng).unwrap() {
                fired += 1;
            }
            if state.is_over() {
                break;
            }
        }
        assert!(fired > 0);
        assert_eq!(state.event_log().len(), fired);
    }

    #[test]
    fn save_round_trip_rehydrates() {
        let config = config();
        let mut state = normal();
        state.advance(100.0);
        state.record_choice("vented coolant");

        let saved = serde_json::to_string(&state).unwrap();
        let restored: SimulationState = serde_json::from_str(&saved).unwrap();
        let restored = restored.rehydrate(&config);
        let (before, after) = (state.status(), restored.status());
        assert_eq!(after.time, before.time);
        assert_eq!(after.day, before.day);
        assert_eq!(after.sanity_state, before.sanity_state);
        for (id, amount) in &before.resources {
            assert!((after.resources[id] - amount).abs() < 1e-9, "{id}");
        }
        assert_eq!(restored.choices(), state.choices());
        assert_eq!(restored.event_generator().catalog(), &config.events);
    }

    #[test]
    fn rehydrate_repairs_tampered_saves() {
        let config = config();
        let state = normal();
        let mut raw = serde_json::to_value(&state).unwrap();
        raw["sanity"]["level"] = serde_json::json!(250.0);
        raw["sanity"]["state"] = serde_json::json!("stable");
        raw["resources"]["entries"]["water"]["stock"]["amount"] = serde_json::json!(-30.0);
        raw["time"]["hour"] = serde_json::json!(31.0);

        let loaded: SimulationState = serde_json::from_value(raw).unwrap();
        let loaded = loaded.rehydrate(&config);
        assert!(loaded.sanity().is_fractured());
        assert!((loaded.sanity().level() - 100.0).abs() < f64::EPSILON);
        assert!(loaded.resources().get("water").unwrap().abs() < f64::EPSILON);
        assert_eq!(loaded.status().time, "07:00");
    }
}
