//! Error types surfaced by the station core.
use thiserror::Error;

use crate::difficulty::Equipment;
use crate::events::EventSeverity;
use crate::resources::ResourceId;

/// Runtime lookup and bookkeeping failures. None of these interrupt a tick.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StationError {
    #[error("unknown resource: {0}")]
    UnknownResource(ResourceId),
    #[error("repairing {equipment} needs {needed} parts (have {available:.1})")]
    InsufficientParts {
        equipment: Equipment,
        needed: u32,
        available: f64,
    },
}

/// Errors raised while loading or validating static configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON parse error in {source_name}: {error}")]
    Parse {
        source_name: &'static str,
        #[source]
        error: serde_json::Error,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("night start {night_start} must be after day start {day_start}")]
    ClockWindow { day_start: u32, night_start: u32 },
    #[error("sanity ranges must ascend (stable {stable}, anxious {anxious}, panicked {panicked})")]
    SanityRanges {
        stable: f64,
        anxious: f64,
        panicked: f64,
    },
    #[error("resource {resource} critical level {critical:.2} exceeds max {max:.2}")]
    CriticalAboveMax {
        resource: ResourceId,
        critical: f64,
        max: f64,
    },
    #[error("required resource missing from table: {0}")]
    MissingResource(ResourceId),
    #[error("{0} event catalog is empty")]
    EmptyCatalog(EventSeverity),
    #[error("event '{name}' is listed under {catalog} but declares {declared}")]
    CatalogMismatch {
        name: String,
        catalog: EventSeverity,
        declared: EventSeverity,
    },
    #[error("event '{name}' references unknown resource {resource}")]
    EventResource { name: String, resource: ResourceId },
}

impl ConfigError {
    pub(crate) const fn parse(source_name: &'static str, error: serde_json::Error) -> Self {
        Self::Parse { source_name, error }
    }
}
