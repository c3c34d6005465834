//! Tradewind Core -- categorized component storage for a turn-based trading game.
//!
//! This crate owns the behavior units ("components") attached to game
//! entities and the bookkeeping around them:
//!
//! - [`ComponentRegistry`](component::ComponentRegistry) keeps every live
//!   component in the active list of its declared [`Category`](category::Category),
//!   or in the shared inactive list once the component has asked to stop.
//! - [`GameObjectRegistry`](entity::GameObjectRegistry) indexes entities by
//!   their kind with an `unnamed` fallback bucket.
//! - [`MenuStack`](menu::MenuStack) tracks open overlay components and a
//!   dirty flag for re-projection.
//! - [`World`](world::World) composes all of the above with the explicit
//!   [`EngineContext`](context::EngineContext) handed to every component.
//!
//! The fixed-step loop that drives a [`World`](world::World) lives in the
//! `tradewind-engine` crate.
//!
//! # Quick Start
//!
//! ```
//! use tradewind_core::prelude::*;
//!
//! struct Granary { stock: u32 }
//!
//! impl Component for Granary {
//!     fn category(&self) -> Category { Category::CITIES }
//!     fn update(&mut self, _ctx: &mut EngineContext, _delta: f64) -> Result<bool, ComponentError> {
//!         self.stock += 1;
//!         Ok(true)
//!     }
//! }
//!
//! let mut world = World::new(WorldConfig::default());
//! let city = GameObject::new(Some("city")).with("granary", Granary { stock: 0 });
//! let id = world.add_entity(city).unwrap();
//!
//! world.update_kind(CategoryKind::Simulation, 2000.0).unwrap();
//! assert_eq!(world.entities().bucket_of(id), Some(Bucket::Kind("city".to_owned())));
//! assert_eq!(world.components().active_count(Category::CITIES), Some(1));
//! ```

#![deny(unsafe_code)]

pub mod category;
pub mod component;
pub mod context;
pub mod entity;
pub mod menu;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failure reported by a component's own update logic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ComponentError {
    message: String,
}

impl ComponentError {
    /// Create an error with a human-readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors produced by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A component is tagged with a category that was never declared.
    #[error("category '{category}' ({context}) is not declared. Declared categories: [{declared}]")]
    UndeclaredCategory {
        category: String,
        context: String,
        declared: String,
    },

    /// The same category was declared twice.
    #[error("category '{0}' is declared more than once")]
    DuplicateCategory(String),

    /// The entity does not exist (stale generation or never allocated).
    #[error("entity {entity} does not exist (stale or never allocated)")]
    UnknownEntity { entity: entity::EntityId },

    /// Despawn was requested but the world was built without allowing it.
    #[error("despawn is disabled for this world; enable WorldConfig::allow_despawn")]
    DespawnDisabled,

    /// A component update failed and the failure policy is `Halt`.
    #[error("component {component} in category '{category}' failed: {source}")]
    ComponentFailed {
        component: component::ComponentId,
        category: String,
        #[source]
        source: ComponentError,
    },
}

impl CoreError {
    /// Whether this error is a setup/registration-time configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CoreError::UndeclaredCategory { .. }
                | CoreError::DuplicateCategory(_)
                | CoreError::DespawnDisabled
        )
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::category::{Category, CategoryKind, CategorySet};
    pub use crate::component::{
        Component, ComponentId, ComponentRegistry, ComponentView, FailurePolicy, UpdateOutcome,
    };
    pub use crate::context::EngineContext;
    pub use crate::entity::{
        Bucket, EntityId, EntityRecord, GameObject, GameObjectRegistry, UNNAMED,
    };
    pub use crate::menu::MenuStack;
    pub use crate::world::{World, WorldConfig};
    pub use crate::{ComponentError, CoreError};
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    struct Ledger;

    impl Component for Ledger {
        fn category(&self) -> Category {
            Category::new("ledgers")
        }

        fn update(&mut self, _ctx: &mut EngineContext, _delta: f64) -> Result<bool, ComponentError> {
            Ok(true)
        }
    }

    #[test]
    fn configuration_errors_are_classified() {
        let mut world = World::new(WorldConfig::default());
        let err = world
            .add_entity(GameObject::new(None).with("ledger", Ledger))
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("ledgers"));
        assert!(err.to_string().contains("field 'ledger'"));
    }

    #[test]
    fn component_failure_is_not_configuration() {
        let err = CoreError::ComponentFailed {
            component: ComponentId::from_raw(3),
            category: "cities".to_owned(),
            source: ComponentError::new("granary overflow"),
        };
        assert!(!err.is_configuration());
        assert_eq!(
            err.to_string(),
            "component c3 in category 'cities' failed: granary overflow"
        );
    }
}
