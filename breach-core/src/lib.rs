//! Breach Station Engine
//!
//! Platform-agnostic core simulation for the Breach survival game: a lone
//! operator keeps a remote station running for a fixed number of game days.
//! This crate provides the clock, resource, sanity and event models without UI
//! or platform-specific dependencies.

pub mod config;
pub mod constants;
pub mod difficulty;
pub mod error;
pub mod events;
pub mod numbers;
pub mod resources;
pub mod rng;
pub mod sanity;
pub mod session;
pub mod state;
pub mod time;

// Re-export commonly used types
pub use config::{ScenarioConfig, StationConfig};
pub use difficulty::{Difficulty, DifficultyProfile, DifficultyTable, Equipment, RepairCosts};
pub use error::{ConfigError, StationError};
pub use events::{
    EventCatalog, EventDefinition, EventGenerator, EventSeverity, EventStats, HourlyRoll,
    tier_for_roll,
};
pub use resources::{Resource, ResourceId, ResourceModel, ResourceStatus, ResourceTable};
pub use rng::{CountingRng, RngBundle};
pub use sanity::{LogTone, SanityConfig, SanityState, SanitySystem, VisualEffect};
pub use session::{SessionTick, StationSession};
pub use state::{
    ChoiceRecord, EventLogEntry, FailureCause, LogFinding, Outcome, RepairRecord,
    SimulationState, StatusSnapshot, TickOutcome,
};
pub use time::{ClockSettings, TimeModel};

/// Trait for abstracting configuration loading
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load and validate the full station configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or fails validation.
    fn load_config(&self) -> Result<StationConfig, Self::Error>;
}

/// Loader backed by the JSON assets compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedLoader;

impl DataLoader for EmbeddedLoader {
    type Error = ConfigError;

    fn load_config(&self) -> Result<StationConfig, Self::Error> {
        StationConfig::default_config()
    }
}

/// Trait for abstracting save/load operations
/// Platform-specific implementations should provide this
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save station state
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be saved.
    fn save_game(&self, save_name: &str, state: &SimulationState) -> Result<(), Self::Error>;

    /// Load station state
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be loaded.
    fn load_game(&self, save_name: &str) -> Result<Option<SimulationState>, Self::Error>;

    /// Delete saved game
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Main engine for managing station runs
pub struct StationEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    data_loader: L,
    storage: S,
}

impl<L, S> StationEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    /// Create a new engine with the provided data loader and storage
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    /// Create a new run at the given difficulty
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn create_game(&self, difficulty: Difficulty) -> Result<SimulationState, L::Error> {
        let config = self.data_loader.load_config()?;
        Ok(SimulationState::new(&config, difficulty))
    }

    /// Construct a new self-scheduling session
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn create_session(
        &self,
        seed: u64,
        difficulty: Difficulty,
    ) -> Result<StationSession, L::Error> {
        let config = self.data_loader.load_config()?;
        Ok(StationSession::new(&config, difficulty, seed))
    }

    /// Save a station state
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be saved.
    pub fn save_game(&self, save_name: &str, state: &SimulationState) -> Result<(), S::Error> {
        self.storage.save_game(save_name, state)
    }

    /// Load a station state
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be loaded or the configuration is unavailable.
    pub fn load_game(&self, save_name: &str) -> Result<Option<SimulationState>, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        if let Some(state) = self.storage.load_game(save_name).map_err(Into::into)? {
            // Rehydrate with fresh configuration
            let config = self.data_loader.load_config().map_err(Into::into)?;
            Ok(Some(state.rehydrate(&config)))
        } else {
            Ok(None)
        }
    }

    /// Load a save and wrap it in a session seeded with `seed`
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be loaded or rehydrated.
    pub fn resume_session(
        &self,
        save_name: &str,
        seed: u64,
    ) -> Result<Option<StationSession>, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        Ok(self
            .load_game(save_name)?
            .map(|state| StationSession::from_state(state, seed)))
    }

    /// Delete a saved game
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_game(&self, save_name: &str) -> Result<(), S::Error> {
        self.storage.delete_save(save_name)
    }
}
