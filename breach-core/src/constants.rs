//! Centralized tuning constants for the Breach station simulation.
//!
//! Values that are balance data (rates, catalogs, thresholds) live in the
//! JSON assets under `assets/data`. What remains here is fixed arithmetic that
//! the simulation relies on regardless of configuration.

// Logging targets ----------------------------------------------------------
pub(crate) const LOG_TARGET_TIME: &str = "breach::time";
pub(crate) const LOG_TARGET_EVENTS: &str = "breach::events";
pub(crate) const LOG_TARGET_STATE: &str = "breach::state";

// Clock arithmetic ---------------------------------------------------------
pub(crate) const HOURS_PER_DAY: f64 = 24.0;
pub(crate) const MINUTES_PER_HOUR: f64 = 60.0;
pub(crate) const SECONDS_PER_HOUR: f64 = 3_600.0;

// Sanity bounds ------------------------------------------------------------
pub(crate) const SANITY_MIN: f64 = 0.0;
pub(crate) const SANITY_MAX: f64 = 100.0;

// Event tiers --------------------------------------------------------------
/// Probability that a fired event is drawn from the critical catalog.
pub const CRITICAL_EVENT_CHANCE: f64 = 0.10;

// Well-known resources -----------------------------------------------------
pub const RESOURCE_FUEL: &str = "fuel";
pub const RESOURCE_FOOD: &str = "food";
pub const RESOURCE_WATER: &str = "water";
pub const RESOURCE_PARTS: &str = "parts";
pub const RESOURCE_BATTERIES: &str = "batteries";
