//! Startup sequencing: everything that must finish before the first frame.
//!
//! [`start`] initializes the renderer, picks the initial game state (a named
//! save in debug mode, a fresh world otherwise), builds the map and every
//! entity through the factory, and hands back a ready [`EngineLoop`]. Any
//! failure aborts startup; the loop never runs on a half-built world.
//!
//! # Example
//!
//! ```
//! use tradewind_engine::prelude::*;
//! use tradewind_engine::tradewind_core::context::EngineContext;
//!
//! struct EmptyFactory;
//!
//! impl EntityFactory for EmptyFactory {
//!     fn fresh_world(&mut self) -> SavedState {
//!         SavedState { terrain: Terrain::flat(8, 8, 0), entities: Vec::new() }
//!     }
//!
//!     fn create_map(&mut self, _ctx: &mut EngineContext, _terrain: &Terrain)
//!         -> Result<GameObject, EngineError>
//!     {
//!         Ok(GameObject::new(Some("map")))
//!     }
//!
//!     fn create_entity(&mut self, _ctx: &mut EngineContext, kind: &str, _position: Position,
//!         _details: &serde_json::Value) -> Result<GameObject, EngineError>
//!     {
//!         Ok(GameObject::new(Some(kind)))
//!     }
//! }
//!
//! let mut renderer = HeadlessRenderer::default();
//! let store = MemoryStore::new();
//! let mut factory = EmptyFactory;
//! let services = StartupServices { renderer: &mut renderer, store: &store, factory: &mut factory };
//!
//! let engine = start(
//!     &StartupConfig::default(),
//!     WorldConfig::default(),
//!     services,
//!     Box::new(NullProjector::default()),
//!     0.0,
//! ).unwrap();
//! assert_eq!(engine.world().entity_count(), 1);
//! ```

use serde::{Deserialize, Serialize};
use tradewind_core::component::FailurePolicy;
use tradewind_core::world::{World, WorldConfig};

use crate::collaborators::{EntityFactory, OverlayProjector, PersistenceStore, Renderer, Viewport};
use crate::engine::{EngineConfig, EngineLoop};
use crate::time::Speed;
use crate::EngineError;

/// Save loaded in debug mode unless configured otherwise.
pub const DEFAULT_SAVE_KEY: &str = "debug";

// ---------------------------------------------------------------------------
// StartupConfig
// ---------------------------------------------------------------------------

/// Options read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    /// Load `save_key` instead of a fresh world, and count frames.
    pub debug: bool,
    /// Save to load in debug mode.
    pub save_key: String,
    pub speed: Speed,
    pub viewport: Viewport,
    /// Overrides [`WorldConfig::failure_policy`].
    pub failure_policy: FailurePolicy,
    /// Overrides [`WorldConfig::allow_despawn`].
    pub allow_despawn: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            debug: false,
            save_key: DEFAULT_SAVE_KEY.to_owned(),
            speed: Speed::default(),
            viewport: Viewport::default(),
            failure_policy: FailurePolicy::default(),
            allow_despawn: false,
        }
    }
}

impl StartupConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    fn validate(&self) -> Result<(), EngineError> {
        self.speed.validate()?;
        if self.debug && self.save_key.is_empty() {
            return Err(EngineError::Configuration(
                "debug startup needs a non-empty save_key".to_owned(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StartupServices
// ---------------------------------------------------------------------------

/// Collaborators borrowed for the duration of startup.
pub struct StartupServices<'a> {
    pub renderer: &'a mut dyn Renderer,
    pub store: &'a dyn PersistenceStore,
    pub factory: &'a mut dyn EntityFactory,
}

// ---------------------------------------------------------------------------
// start
// ---------------------------------------------------------------------------

/// Build a world and a ready-to-run loop whose clock starts at `now_ms`.
///
/// # Errors
///
/// - [`EngineError::Configuration`] for an invalid config, or an entity
///   component in an undeclared category.
/// - [`EngineError::MissingResource`] in debug mode when `save_key` does not
///   exist in the store.
/// - Any error from the renderer, the store or the factory.
pub fn start(
    config: &StartupConfig,
    world_config: WorldConfig,
    services: StartupServices<'_>,
    projector: Box<dyn OverlayProjector>,
    now_ms: f64,
) -> Result<EngineLoop, EngineError> {
    config.validate()?;
    let StartupServices {
        renderer,
        store,
        factory,
    } = services;

    renderer.init(config.viewport)?;
    tracing::info!(
        width = config.viewport.width,
        height = config.viewport.height,
        "renderer initialized"
    );

    let state = if config.debug {
        if !store.has(&config.save_key) {
            return Err(EngineError::MissingResource {
                key: config.save_key.clone(),
                details: "debug startup requires this save".to_owned(),
            });
        }
        let state = store.load(&config.save_key)?;
        tracing::info!(key = %config.save_key, entities = state.entities.len(), "loaded save");
        state
    } else {
        let state = factory.fresh_world();
        tracing::info!(entities = state.entities.len(), "created fresh world");
        state
    };

    let mut world = World::new(WorldConfig {
        failure_policy: config.failure_policy,
        allow_despawn: config.allow_despawn,
        ..world_config
    });
    // Attach hooks run during population and must see the configured clock.
    let ctx = world.context_mut();
    ctx.set_tick_length(config.speed.tick_length_ms());
    ctx.set_debug(config.debug);

    let map = factory.create_map(world.context_mut(), &state.terrain)?;
    world.add_entity(map)?;

    for spec in &state.entities {
        let object =
            factory.create_entity(world.context_mut(), &spec.kind, spec.position, &spec.details)?;
        world.add_entity(object)?;
    }
    tracing::info!(
        entities = world.entity_count(),
        components = world.components().total_registered(),
        "world populated"
    );

    EngineLoop::new(
        world,
        EngineConfig {
            speed: config.speed,
            debug: config.debug,
        },
        projector,
        now_ms,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
