use breach_core::{
    Difficulty, EventDefinition, EventSeverity, FailureCause, Outcome, SanityState,
    SimulationState, StationConfig, StationSession,
};

fn config() -> StationConfig {
    StationConfig::default_config().unwrap()
}

fn run_to_end(state: &mut SimulationState, dt: f64, max_ticks: usize) -> usize {
    let mut ticks = 0;
    while !state.is_over() && ticks < max_ticks {
        state.advance(dt);
        ticks += 1;
    }
    ticks
}

#[test]
fn normal_run_routine_event_then_survival() {
    let config = config();
    let mut state = SimulationState::new(&config, Difficulty::Normal);

    let routine = config
        .events
        .find("Generator Fluctuation")
        .cloned()
        .unwrap();
    state.apply_event(&routine).unwrap();

    let status = state.status();
    assert!((status.sanity_level - 45.0).abs() < f64::EPSILON);
    // 45 sits inside the 31..=60 band
    assert_eq!(status.sanity_state, SanityState::Anxious);
    let fuel_max = config.resources.get("fuel").unwrap().max;
    assert!((status.resources["fuel"] - (fuel_max - 5.0)).abs() < f64::EPSILON);

    // 20 days at 480 real seconds each, one-second frames
    let ticks = run_to_end(&mut state, 1.0, 20 * 480 + 10);
    assert_eq!(state.outcome(), Some(Outcome::Survival));
    assert_eq!(ticks, 20 * 480);
    assert!(state.current_day() > state.total_days());
}

#[test]
fn every_difficulty_survives_without_events() {
    let config = config();
    for difficulty in Difficulty::ALL {
        let mut state = SimulationState::new(&config, difficulty);
        run_to_end(&mut state, 2.0, 20 * 240 + 10);
        assert_eq!(state.outcome(), Some(Outcome::Survival), "{difficulty}");
        let fuel = state.resources().get("fuel").unwrap();
        assert!(fuel > 15.0, "{difficulty}: fuel {fuel}");
    }
}

#[test]
fn pinned_fracture_times_out() {
    let config = config();
    let mut state = SimulationState::new(&config, Difficulty::Hard);
    state.sanity_mut().modify(100.0);
    assert!(state.sanity().is_fractured());

    // 600 ticks of 0.01 s stay well inside the first morning
    let ticks = run_to_end(&mut state, 0.01, 1_000);
    assert_eq!(ticks, 600);
    assert_eq!(
        state.outcome(),
        Some(Outcome::Failure(FailureCause::SanityFractured))
    );
}

#[test]
fn drained_fuel_ends_the_run() {
    let config = config();
    let mut state = SimulationState::new(&config, Difficulty::Insane);
    let event = EventDefinition::new("Fuel Line Rupture", EventSeverity::Critical, -30.0)
        .with_resource("fuel", -90.0);
    state.apply_event(&event).unwrap();
    assert!(!state.is_over());

    let outcome = state.advance(0.5);
    assert!(outcome.ended);
    assert_eq!(
        state.outcome(),
        Some(Outcome::Failure(FailureCause::FuelCritical))
    );
    let final_status = state.status();
    assert!(final_status.is_over);

    state.advance(500.0);
    assert_eq!(state.status(), final_status);
}

#[test]
fn day_boundary_is_independent_of_frame_size() {
    let config = config();
    // (frame size, frames) pairs covering a little over one 480 s day
    for (dt, frames) in [(0.016, 30_625), (0.5, 980), (7.0, 70), (480.0, 1)] {
        let mut state = SimulationState::new(&config, Difficulty::Normal);
        let mut completed = 0;
        for _ in 0..frames {
            completed += state.advance(dt).days_completed;
        }
        assert_eq!(state.current_day(), 2, "dt {dt}");
        assert_eq!(completed, 1, "dt {dt}");
    }
}

#[test]
fn seeded_sessions_reach_an_outcome() {
    let config = config();
    for seed in [1_u64, 2, 3] {
        let mut session = StationSession::new(&config, Difficulty::Normal, seed);
        for _ in 0..20_000 {
            if session.tick(1.0).outcome.ended {
                break;
            }
        }
        assert!(session.state().is_over(), "seed {seed}");
        assert!(session.state().outcome().is_some());
    }
}
