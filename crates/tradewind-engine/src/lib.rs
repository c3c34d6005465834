//! Tradewind Engine -- the frame scheduler of a turn-based trading game.
//!
//! This crate builds on [`tradewind_core`] to turn irregular display
//! callbacks into deterministic simulation ticks:
//!
//! 1. [`TimeAccumulator`](time::TimeAccumulator) converts wall-clock time
//!    into a whole number of fixed-length ticks plus leftover lag.
//! 2. [`EngineLoop::frame`](engine::EngineLoop::frame) runs every owed
//!    simulation tick, then exactly one presentation pass with the lag, then
//!    re-projects the overlay if the menu stack changed.
//! 3. [`start`](startup::start) seeds the world from a fresh game or a named
//!    save before the loop runs.
//!
//! # Quick Start
//!
//! ```
//! use tradewind_engine::prelude::*;
//!
//! let world = World::new(WorldConfig::default());
//! let config = EngineConfig { speed: Speed::Normal, ..Default::default() };
//! let mut engine = EngineLoop::new(world, config, Box::new(NullProjector::default()), 0.0).unwrap();
//!
//! let report = engine.frame(4500.0).unwrap();
//! assert_eq!(report.ticks_run, 2);
//! assert_eq!(report.lag_ms, 500.0);
//! assert_eq!(engine.world().context().tick_count(), 2);
//! ```

#![deny(unsafe_code)]

pub mod collaborators;
pub mod diagnostics;
pub mod engine;
pub mod persistence;
pub mod startup;
pub mod time;

use tradewind_core::CoreError;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the core crate for convenience.
pub use tradewind_core;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while starting or running the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid setup, such as a non-positive tick length.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Registry error: undeclared category, or a component failure under the
    /// halting policy.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A save or asset needed during startup does not exist.
    #[error("missing resource '{key}': {details}")]
    MissingResource { key: String, details: String },

    /// A save file exists but its content hash does not match.
    #[error("save '{key}' failed its integrity check (expected {expected}, found {actual})")]
    CorruptSave {
        key: String,
        expected: String,
        actual: String,
    },

    /// The renderer could not be initialized.
    #[error("renderer failed to initialize: {0}")]
    Renderer(String),

    /// Filesystem failure in a persistence store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A save could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Setup-time configuration errors, fatal before the loop runs.
    pub fn is_configuration(&self) -> bool {
        match self {
            EngineError::Configuration(_) => true,
            EngineError::Core(e) => e.is_configuration(),
            _ => false,
        }
    }

    /// Missing saves or assets during startup.
    pub fn is_missing_resource(&self) -> bool {
        matches!(self, EngineError::MissingResource { .. })
    }

    /// A component update failed and halted the frame.
    pub fn is_component_failure(&self) -> bool {
        matches!(self, EngineError::Core(CoreError::ComponentFailed { .. }))
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use tradewind_core::prelude::*;

    pub use crate::collaborators::{
        EntityFactory, HeadlessRenderer, NullProjector, OverlayProjector, PersistenceStore,
        Renderer, Viewport,
    };
    pub use crate::diagnostics::FrameStats;
    pub use crate::engine::{EngineConfig, EngineLoop, FrameReport};
    pub use crate::persistence::{
        EntitySpec, JsonFileStore, MemoryStore, Position, SavedState, Terrain,
    };
    pub use crate::startup::{start, StartupConfig, StartupServices};
    pub use crate::time::{Speed, TickOutcome, TimeAccumulator};
    pub use crate::EngineError;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
