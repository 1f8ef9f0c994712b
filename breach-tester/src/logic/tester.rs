use anyhow::{Result, bail};
use breach_core::numbers::{floor_f64_to_u32, u64_to_f64};
use breach_core::{Difficulty, Outcome, StationConfig, StationSession, StatusSnapshot};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::logic::scenarios::{EventMode, TestScenario};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub difficulty: Difficulty,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    /// Mean game days completed per iteration.
    pub mean_days: f64,
    pub mean_events: f64,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
}

/// What one iteration of a scenario produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub seed: u64,
    pub difficulty: Difficulty,
    pub ticks: u64,
    pub days_completed: u32,
    pub events_fired: usize,
    pub suppressed: u32,
    pub outcome: Option<Outcome>,
    pub final_status: StatusSnapshot,
}

pub struct LogicTester {
    config: StationConfig,
    frame_dt: f64,
    verbose: bool,
}

impl LogicTester {
    /// # Errors
    ///
    /// Returns an error when `frame_dt` is not a positive finite number of seconds.
    pub fn new(config: StationConfig, frame_dt: f64, verbose: bool) -> Result<Self> {
        if !frame_dt.is_finite() || frame_dt <= 0.0 {
            bail!("frame dt must be a positive number of seconds (got {frame_dt})");
        }
        Ok(Self {
            config,
            frame_dt,
            verbose,
        })
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        difficulty: Difficulty,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    println!(
                        "🧪 Testing scenario: {} (difficulty: {difficulty} seed: {seed})",
                        scenario.name.bright_white()
                    );
                }
                self.run_single_scenario(scenario, difficulty, seed, iterations)
            })
            .collect()
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        difficulty: Difficulty,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut durations = Vec::with_capacity(iterations);
        let mut total_days = 0_u64;
        let mut total_events = 0_usize;

        for i in 0..iterations {
            let start = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let summary = self.run_once(scenario, difficulty, iteration_seed);
            durations.push(start.elapsed());
            total_days += u64::from(summary.days_completed);
            total_events += summary.events_fired;

            match (scenario.expectation)(&summary) {
                Ok(()) => {
                    successes += 1;
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed: {} after {} days, {} events ({} suppressed)",
                            i + 1,
                            iterations,
                            describe(summary.outcome),
                            summary.days_completed,
                            summary.events_fired,
                            summary.suppressed
                        );
                    }
                }
                Err(err) => {
                    let status = &summary.final_status;
                    let failure = format!(
                        "Iteration {} ({}, seed {}, ticks {}, day {} {}): {err} | sanity {:.1} ({}) fuel {:.1}",
                        i + 1,
                        summary.difficulty,
                        summary.seed,
                        summary.ticks,
                        status.day,
                        status.time,
                        status.sanity_level,
                        status.sanity_state,
                        status.resources.get("fuel").copied().unwrap_or_default()
                    );
                    if self.verbose {
                        println!("  ❌ {}", failure.clone().red());
                    }
                    failures.push(failure);
                }
            }
        }

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            difficulty,
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            mean_days: mean(total_days, iterations),
            mean_events: mean(u64::try_from(total_events).unwrap_or(u64::MAX), iterations),
            average_duration: average(&durations),
        }
    }

    /// Tick budget: twice the frames a full run needs.
    fn max_ticks(&self) -> u64 {
        let scenario = &self.config.scenario;
        let day_hours = 24 - scenario.day_start.min(24);
        let day_seconds = f64::from(day_hours) * scenario.clock().seconds_per_game_hour();
        let run_seconds = day_seconds * f64::from(scenario.total_days);
        u64::from(floor_f64_to_u32(run_seconds / self.frame_dt)) * 2 + 10
    }

    pub fn run_once(
        &self,
        scenario: &TestScenario,
        difficulty: Difficulty,
        seed: u64,
    ) -> RunSummary {
        let mut session = StationSession::new(&self.config, difficulty, seed);
        if let Some(setup) = scenario.setup {
            session.with_state_mut(setup);
        }

        let max_ticks = self.max_ticks();
        let mut ticks = 0_u64;
        let mut days_completed = 0_u32;
        let mut events_fired = 0_usize;
        let mut suppressed = 0_u32;

        while !session.state().is_over() && ticks < max_ticks {
            if let Some(hook) = scenario.per_tick {
                session.with_state_mut(hook);
            }
            match scenario.events {
                EventMode::Silent => {
                    let outcome = session.state_mut().advance(self.frame_dt);
                    days_completed += outcome.days_completed;
                }
                EventMode::Scheduled => {
                    let tick = session.tick(self.frame_dt);
                    days_completed += tick.outcome.days_completed;
                    events_fired += tick.fired.len();
                    suppressed += tick.suppressed;
                }
            }
            ticks += 1;
        }

        RunSummary {
            seed,
            difficulty,
            ticks,
            days_completed,
            events_fired,
            suppressed,
            outcome: session.state().outcome(),
            final_status: session.status(),
        }
    }
}

fn describe(outcome: Option<Outcome>) -> String {
    outcome.map_or_else(|| "unfinished".to_string(), |o| o.to_string())
}

fn mean(total: u64, count: usize) -> f64 {
    match u64::try_from(count) {
        Ok(0) | Err(_) => 0.0,
        Ok(count) => u64_to_f64(total) / u64_to_f64(count),
    }
}

fn average(durations: &[Duration]) -> Duration {
    if durations.is_empty() {
        Duration::ZERO
    } else {
        durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(u32::MAX)
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}
