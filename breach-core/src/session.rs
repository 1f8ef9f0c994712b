use crate::config::StationConfig;
use crate::constants::LOG_TARGET_EVENTS;
use crate::difficulty::Difficulty;
use crate::events::{EventDefinition, HourlyRoll};
use crate::rng::RngBundle;
use crate::state::{SimulationState, StatusSnapshot, TickOutcome};

/// What one session tick did, including self-scheduled events.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionTick {
    pub outcome: TickOutcome,
    /// Events that fired and were applied during this tick.
    pub fired: Vec<EventDefinition>,
    /// Anomalous draws rejected because it was daytime.
    pub suppressed: u32,
}

/// High-level session wrapper binding a seeded RNG bundle to a station run.
#[derive(Debug, Clone)]
pub struct StationSession {
    state: SimulationState,
    rng: RngBundle,
}

impl StationSession {
    /// Construct a fresh run from a seed and difficulty.
    #[must_use]
    pub fn new(config: &StationConfig, difficulty: Difficulty, seed: u64) -> Self {
        Self::from_state(SimulationState::new(config, difficulty), seed)
    }

    /// Resume an existing (already rehydrated) state.
    #[must_use]
    pub fn from_state(state: SimulationState, seed: u64) -> Self {
        Self {
            state,
            rng: RngBundle::from_user_seed(seed),
        }
    }

    /// Advance one frame and roll the event generator once per game hour crossed.
    ///
    /// Rolls see the clock after the advance but before the day rolls over.
    pub fn tick(&mut self, dt_seconds: f64) -> SessionTick {
        let (outcome, rolls) = self
            .state
            .advance_with_events(dt_seconds, &mut *self.rng.events());
        let mut tick = SessionTick {
            outcome,
            ..SessionTick::default()
        };
        for roll in rolls {
            match roll {
                Ok(HourlyRoll::Fired(event)) => tick.fired.push(event),
                Ok(HourlyRoll::Suppressed(_)) => tick.suppressed += 1,
                Ok(HourlyRoll::Quiet) => {}
                Err(err) => {
                    log::warn!(target: LOG_TARGET_EVENTS, "scheduled event rejected: {err}");
                }
            }
        }
        tick.outcome.ended = self.state.is_over();
        tick
    }

    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        self.state.status()
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Borrow the underlying immutable state.
    #[must_use]
    pub const fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Borrow the underlying mutable state.
    pub const fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    /// Apply a closure to the mutable state.
    pub fn with_state_mut<R>(&mut self, f: impl FnOnce(&mut SimulationState) -> R) -> R {
        f(&mut self.state)
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    /// Deterministically reseed the session.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = RngBundle::from_user_seed(seed);
    }

    /// Consume the session, returning the underlying state.
    #[must_use]
    pub fn into_state(self) -> SimulationState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(difficulty: Difficulty, seed: u64) -> StationSession {
        StationSession::new(&StationConfig::default_config().unwrap(), difficulty, seed)
    }

    fn run(session: &mut StationSession, ticks: usize) -> Vec<String> {
        let mut names = Vec::new();
        for _ in 0..ticks {
            let tick = session.tick(0.5);
            names.extend(tick.fired.into_iter().map(|event| event.name));
            if tick.outcome.ended {
                break;
            }
        }
        names
    }

    #[test]
    fn same_seed_replays_identically() {
        let mut a = session(Difficulty::Hard, 4242);
        let mut b = session(Difficulty::Hard, 4242);
        assert_eq!(run(&mut a, 2_000), run(&mut b, 2_000));
        assert_eq!(a.status(), b.status());
        assert_eq!(a.rng().draws(), b.rng().draws());
    }

    #[test]
    fn one_roll_per_hour_crossed() {
        let mut session = session(Difficulty::Normal, 9);
        // 59 game minutes: no hour boundary yet
        let tick = session.tick(29.5);
        assert_eq!(tick.outcome.hours_crossed, 0);
        assert_eq!(session.rng().draws().0, 0);

        let tick = session.tick(0.5);
        assert_eq!(tick.outcome.hours_crossed, 1);
        assert!(session.rng().draws().0 >= 1);
    }

    #[test]
    fn fired_events_reach_the_log() {
        let mut session = session(Difficulty::Insane, 77);
        let mut fired = 0;
        for _ in 0..400 {
            let tick = session.tick(30.0);
            fired += tick.fired.len();
            if tick.outcome.ended {
                break;
            }
        }
        assert_eq!(session.state().event_log().len(), fired);
    }

    #[test]
    fn midnight_roll_is_never_suppressed() {
        let mut suppressed_at_midnight = 0;
        let mut midnight_rolls = 0;
        for seed in 0..400 {
            let mut session = session(Difficulty::Insane, seed);
            // 08:00 -> 20:00
            session.tick(12.0 * 30.0);
            for _ in 0..4 {
                let tick = session.tick(30.0);
                if tick.outcome.ended {
                    break;
                }
                if tick.outcome.days_completed > 0 {
                    midnight_rolls += 1;
                    suppressed_at_midnight += tick.suppressed;
                }
            }
        }
        assert!(midnight_rolls > 0);
        assert_eq!(suppressed_at_midnight, 0);
    }

    #[test]
    fn reseed_changes_the_stream() {
        let mut session = session(Difficulty::Normal, 1);
        session.reseed(2);
        assert_eq!(session.seed(), 2);
        session.with_state_mut(|state| state.record_choice("reseeded"));
        assert_eq!(session.into_state().choices().len(), 1);
    }
}
