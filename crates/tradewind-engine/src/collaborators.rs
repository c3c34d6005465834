//! Interfaces of the systems the engine talks to but does not implement.
//!
//! The renderer, the overlay projection, the entity factory and the save
//! store are supplied by the host. Headless stand-ins are provided for tests
//! and servers.

use serde::{Deserialize, Serialize};
use tradewind_core::component::{ComponentId, ComponentRegistry};
use tradewind_core::context::EngineContext;
use tradewind_core::entity::GameObject;

use crate::persistence::{Position, SavedState, Terrain};
use crate::EngineError;

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// Size of the drawing surface in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Graphics backend. Initialized once before the loop starts.
///
/// The engine issues no drawing calls. Presentation components write what
/// should be shown into the [`EngineContext`] and the renderer reflects it.
pub trait Renderer {
    /// Prepare the drawing surface.
    fn init(&mut self, viewport: Viewport) -> Result<(), EngineError>;
}

/// Renderer that draws nothing.
#[derive(Debug, Clone, Default)]
pub struct HeadlessRenderer {
    viewport: Option<Viewport>,
}

impl HeadlessRenderer {
    /// Viewport passed to [`Renderer::init`], if it was called.
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }
}

impl Renderer for HeadlessRenderer {
    fn init(&mut self, viewport: Viewport) -> Result<(), EngineError> {
        if viewport.width == 0 || viewport.height == 0 {
            return Err(EngineError::Renderer(format!(
                "viewport must be non-empty, got {}x{}",
                viewport.width, viewport.height
            )));
        }
        self.viewport = Some(viewport);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// OverlayProjector
// ---------------------------------------------------------------------------

/// Builds the displayable overlay tree from the open menus.
///
/// Called only on frames where the menu stack changed.
pub trait OverlayProjector {
    /// Rebuild the overlay for `open` menus, bottom first.
    fn project(&mut self, open: &[ComponentId], components: &ComponentRegistry);
}

/// Projector that only remembers what it was asked to show.
#[derive(Debug, Clone, Default)]
pub struct NullProjector {
    projections: u64,
    last: Vec<ComponentId>,
}

impl NullProjector {
    /// Number of projections requested.
    pub fn projections(&self) -> u64 {
        self.projections
    }

    /// Menus of the most recent projection.
    pub fn last(&self) -> &[ComponentId] {
        &self.last
    }
}

impl OverlayProjector for NullProjector {
    fn project(&mut self, open: &[ComponentId], _components: &ComponentRegistry) {
        self.projections += 1;
        self.last = open.to_vec();
    }
}

// ---------------------------------------------------------------------------
// EntityFactory
// ---------------------------------------------------------------------------

/// Builds concrete game objects. The engine does not care how.
pub trait EntityFactory {
    /// Initial state of a brand-new game.
    fn fresh_world(&mut self) -> SavedState;

    /// Build the map entity from terrain data.
    fn create_map(
        &mut self,
        ctx: &mut EngineContext,
        terrain: &Terrain,
    ) -> Result<GameObject, EngineError>;

    /// Build one entity of `kind` at `position`.
    fn create_entity(
        &mut self,
        ctx: &mut EngineContext,
        kind: &str,
        position: Position,
        details: &serde_json::Value,
    ) -> Result<GameObject, EngineError>;
}

// ---------------------------------------------------------------------------
// PersistenceStore
// ---------------------------------------------------------------------------

/// Named game states.
pub trait PersistenceStore {
    /// Whether a save named `key` exists.
    fn has(&self, key: &str) -> bool;

    /// Load the save named `key`.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingResource`] if it does not exist.
    fn load(&self, key: &str) -> Result<SavedState, EngineError>;

    /// Store `state` under `key`, replacing any previous save.
    fn save(&mut self, key: &str, state: &SavedState) -> Result<(), EngineError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tradewind_core::category::CategorySet;
    use tradewind_core::component::FailurePolicy;

    #[test]
    fn headless_renderer_records_viewport() {
        let mut renderer = HeadlessRenderer::default();
        assert!(renderer.viewport().is_none());
        renderer.init(Viewport::default()).unwrap();
        assert_eq!(renderer.viewport(), Some(Viewport { width: 1280, height: 720 }));
    }

    #[test]
    fn headless_renderer_rejects_empty_viewport() {
        let mut renderer = HeadlessRenderer::default();
        let err = renderer
            .init(Viewport { width: 0, height: 600 })
            .unwrap_err();
        assert!(matches!(err, EngineError::Renderer(_)));
    }

    #[test]
    fn null_projector_remembers_last_projection() {
        let registry = ComponentRegistry::new(CategorySet::standard(), FailurePolicy::Halt);
        let mut projector = NullProjector::default();
        let open = [ComponentId::from_raw(4), ComponentId::from_raw(9)];

        projector.project(&open, &registry);
        projector.project(&open[1..], &registry);

        assert_eq!(projector.projections(), 2);
        assert_eq!(projector.last(), &[ComponentId::from_raw(9)]);
    }
}
