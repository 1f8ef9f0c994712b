use anyhow::{Result, bail};
use breach_core::{FailureCause, Outcome, SimulationState};

use crate::logic::tester::RunSummary;

/// How a scenario feeds events into the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventMode {
    /// Plain `advance` calls; nothing fires.
    Silent,
    /// Hourly rolls from the seeded session.
    Scheduled,
}

type Hook = fn(&mut SimulationState);
type Expectation = fn(&RunSummary) -> Result<()>;

/// Named run plan with the outcome it must produce.
#[derive(Clone)]
pub struct TestScenario {
    pub name: &'static str,
    pub description: &'static str,
    pub events: EventMode,
    /// Runs once before the first tick.
    pub setup: Option<Hook>,
    /// Runs before every tick.
    pub per_tick: Option<Hook>,
    pub expectation: Expectation,
}

impl std::fmt::Debug for TestScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestScenario")
            .field("name", &self.name)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

const SCENARIOS: &[TestScenario] = &[
    TestScenario {
        name: "quiet",
        description: "No events; the station must survive every day",
        events: EventMode::Silent,
        setup: None,
        per_tick: None,
        expectation: expect_survival,
    },
    TestScenario {
        name: "events",
        description: "Self-scheduled hourly events; any terminal outcome is accepted",
        events: EventMode::Scheduled,
        setup: None,
        per_tick: None,
        expectation: expect_terminal,
    },
    TestScenario {
        name: "blackout",
        description: "Fuel starts just above critical; the run must fail on fuel",
        events: EventMode::Silent,
        setup: Some(drain_fuel),
        per_tick: None,
        expectation: expect_fuel_failure,
    },
    TestScenario {
        name: "breakdown",
        description: "Sanity pinned at the maximum; the run must fail on the fractured timeout",
        events: EventMode::Silent,
        setup: None,
        per_tick: Some(pin_sanity),
        expectation: expect_fractured_failure,
    },
];

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    SCENARIOS.iter().map(|s| (s.name, s.description))
}

pub fn get_scenario(name: &str) -> Option<&'static TestScenario> {
    SCENARIOS.iter().find(|s| s.name.eq_ignore_ascii_case(name))
}

/// Expand `all` into every registered scenario, keeping the caller's order otherwise.
pub fn expand_scenarios(names: &[String]) -> Vec<String> {
    let mut expanded: Vec<String> = names
        .iter()
        .filter(|name| !name.eq_ignore_ascii_case("all"))
        .cloned()
        .collect();
    if names.iter().any(|name| name.eq_ignore_ascii_case("all")) {
        for scenario in SCENARIOS {
            if !expanded.iter().any(|name| name == scenario.name) {
                expanded.push(scenario.name.to_string());
            }
        }
    }
    expanded
}

fn drain_fuel(state: &mut SimulationState) {
    let critical = state
        .resources()
        .resource("fuel")
        .map_or(0.0, |fuel| fuel.critical_threshold);
    // a hundredth above critical drains away within the first game hour
    if let Err(err) = state.resources_mut().set("fuel", critical + 0.01) {
        log::warn!("blackout setup could not drain fuel: {err}");
    }
}

fn pin_sanity(state: &mut SimulationState) {
    state.sanity_mut().modify(100.0);
}

fn expect_survival(summary: &RunSummary) -> Result<()> {
    match summary.outcome {
        Some(Outcome::Survival) => Ok(()),
        other => bail!("expected survival, got {}", describe(other)),
    }
}

fn expect_terminal(summary: &RunSummary) -> Result<()> {
    if summary.outcome.is_none() {
        bail!("run did not finish within {} ticks", summary.ticks);
    }
    Ok(())
}

fn expect_fuel_failure(summary: &RunSummary) -> Result<()> {
    match summary.outcome {
        Some(Outcome::Failure(FailureCause::FuelCritical)) => Ok(()),
        other => bail!("expected fuel failure, got {}", describe(other)),
    }
}

fn expect_fractured_failure(summary: &RunSummary) -> Result<()> {
    match summary.outcome {
        Some(Outcome::Failure(FailureCause::SanityFractured)) => Ok(()),
        other => bail!("expected fractured failure, got {}", describe(other)),
    }
}

fn describe(outcome: Option<Outcome>) -> String {
    outcome.map_or_else(|| "no outcome".to_string(), |o| o.to_string())
}
