pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod tester;

pub use scenarios::{TestScenario, expand_scenarios, get_scenario, list_scenarios};
pub use seeds::{resolve_difficulties, resolve_seed_inputs};
pub use tester::*;
