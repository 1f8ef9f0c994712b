use breach_core::{
    Difficulty, ResourceModel, ResourceTable, SanityState, SimulationState, StationConfig,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Input {
    Advance(f64),
    Resource(usize, f64),
    Sanity(f64),
}

const IDS: [&str; 5] = ["fuel", "food", "water", "parts", "batteries"];

fn expected_state(level: f64) -> SanityState {
    if level <= 30.0 {
        SanityState::Stable
    } else if level <= 60.0 {
        SanityState::Anxious
    } else if level <= 80.0 {
        SanityState::Panicked
    } else {
        SanityState::Fractured
    }
}

fn dt_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => 0.0..120.0_f64,
        1 => Just(0.0),
        1 => -50.0..0.0_f64,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
    ]
}

fn input_strategy() -> impl Strategy<Value = Input> {
    prop_oneof![
        4 => dt_strategy().prop_map(Input::Advance),
        2 => (0..IDS.len(), -500.0..500.0_f64).prop_map(|(i, d)| Input::Resource(i, d)),
        2 => (-200.0..200.0_f64).prop_map(Input::Sanity),
    ]
}

fn difficulty_strategy() -> impl Strategy<Value = Difficulty> {
    prop_oneof![
        Just(Difficulty::Normal),
        Just(Difficulty::Hard),
        Just(Difficulty::Insane),
    ]
}

proptest! {
    #[test]
    fn state_stays_within_bounds(
        difficulty in difficulty_strategy(),
        inputs in prop::collection::vec(input_strategy(), 1..200),
    ) {
        let config = StationConfig::default_config().unwrap();
        let mut state = SimulationState::new(&config, difficulty);
        for input in inputs {
            match input {
                Input::Advance(dt) => {
                    state.advance(dt);
                }
                Input::Resource(i, delta) => {
                    state.modify_resource(IDS[i], delta).unwrap();
                }
                Input::Sanity(delta) => state.sanity_mut().modify(delta),
            }

            for (id, amount) in state.resources().amounts() {
                let max = config.resources.get(id.as_str()).unwrap().max;
                prop_assert!((0.0..=max).contains(&amount), "{id} = {amount}");
            }
            let level = state.sanity().level();
            prop_assert!((0.0..=100.0).contains(&level));
            prop_assert_eq!(state.sanity().state(), expected_state(level));
            prop_assert!(state.time().hour() < 24);
            prop_assert!(state.time().minute() < 60);
            prop_assert_eq!(state.is_over(), state.outcome().is_some());
        }
    }

    #[test]
    fn night_depletion_is_split_independent(splits in 1_u32..400) {
        let table = ResourceTable::default_config().unwrap();
        let mut whole = ResourceModel::new(&table, Difficulty::Normal, 1.0);
        let mut split = whole.clone();
        whole.advance(true, 3_600.0);
        let step = 3_600.0 / f64::from(splits);
        for _ in 0..splits {
            split.advance(true, step);
        }
        let night_rate = table.get("fuel").unwrap().rates.normal.night;
        prop_assert!((whole.get("fuel").unwrap() - (100.0 + night_rate)).abs() < 1e-9);
        for (id, amount) in whole.amounts() {
            prop_assert!((split.get(id.as_str()).unwrap() - amount).abs() < 1e-9);
        }
    }

    #[test]
    fn classification_covers_every_level(level in 0.0..=100.0_f64, dt in 0.1..60.0_f64) {
        let config = StationConfig::default_config().unwrap();
        let mut state = SimulationState::new(&config, Difficulty::Normal);
        let delta = level - state.sanity().level();
        state.sanity_mut().modify(delta);
        prop_assert_eq!(state.status().sanity_state, expected_state(state.sanity().level()));

        state.advance(dt);
        prop_assert_eq!(state.sanity().state(), expected_state(state.sanity().level()));
        prop_assert_eq!(state.status().sanity_state, state.sanity().state());
    }
}
