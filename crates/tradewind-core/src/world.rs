//! The world: component registry, entity registry and engine context.
//!
//! [`World::add_entity`] binds a freshly built [`GameObject`] into the
//! registries as one all-or-nothing step: every component category is
//! validated before any list is touched.

use crate::category::{CategoryKind, CategorySet};
use crate::component::{Component, ComponentId, ComponentRegistry, FailurePolicy, UpdateOutcome};
use crate::context::EngineContext;
use crate::entity::{Bucket, EntityAllocator, EntityId, EntityRecord, GameObject, GameObjectRegistry};
use crate::CoreError;

/// Tick length the context starts with until the engine sets its own.
const DEFAULT_TICK_LENGTH_MS: f64 = 2000.0;

// ---------------------------------------------------------------------------
// WorldConfig
// ---------------------------------------------------------------------------

/// Construction parameters of a [`World`].
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Declared component categories.
    pub categories: CategorySet,
    /// Entity kinds that get their own bucket.
    pub entity_kinds: Vec<String>,
    /// What happens when a component update fails.
    pub failure_policy: FailurePolicy,
    /// Whether [`World::despawn`] is permitted.
    pub allow_despawn: bool,
}

impl Default for WorldConfig {
    /// Standard categories, `city`/`merchant`/`market` buckets, halting on
    /// component failure, despawn disabled.
    fn default() -> Self {
        Self {
            categories: CategorySet::standard(),
            entity_kinds: vec!["city".to_owned(), "merchant".to_owned(), "market".to_owned()],
            failure_policy: FailurePolicy::Halt,
            allow_despawn: false,
        }
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// One independent engine instance's state.
#[derive(Debug)]
pub struct World {
    components: ComponentRegistry,
    entities: GameObjectRegistry,
    allocator: EntityAllocator,
    context: EngineContext,
    allow_despawn: bool,
}

impl World {
    /// Create an empty world.
    pub fn new(config: WorldConfig) -> Self {
        Self {
            components: ComponentRegistry::new(config.categories, config.failure_policy),
            entities: GameObjectRegistry::new(&config.entity_kinds),
            allocator: EntityAllocator::new(),
            context: EngineContext::new(DEFAULT_TICK_LENGTH_MS),
            allow_despawn: config.allow_despawn,
        }
    }

    /// Register every component of `object`, then bucket the entity.
    ///
    /// Components are registered in field order, each receiving its attach
    /// hook. An unset or undeclared kind is not an error: the entity goes to
    /// the `unnamed` bucket.
    ///
    /// # Errors
    ///
    /// [`CoreError::UndeclaredCategory`] if any component's category is not
    /// declared. In that case nothing is registered and no id is consumed.
    pub fn add_entity(&mut self, object: GameObject) -> Result<EntityId, CoreError> {
        let categories = self.components.categories();
        for (name, component) in object.components() {
            let category = component.category();
            if !categories.contains(category) {
                return Err(CoreError::UndeclaredCategory {
                    category: category.name().to_owned(),
                    context: format!("field '{name}'"),
                    declared: categories.names(),
                });
            }
        }

        let (kind, parts) = object.into_parts();
        let id = self.allocator.allocate();
        let mut registered = Vec::with_capacity(parts.len());
        for (name, component) in parts {
            let component_id = self.components.register(component, &mut self.context)?;
            registered.push((name, component_id));
        }

        let bucket = self.entities.insert(EntityRecord {
            id,
            kind,
            components: registered,
        });
        tracing::debug!(entity = %id, bucket = %bucket, "entity added");
        Ok(id)
    }

    /// Register a component that belongs to no entity, such as a menu.
    pub fn register_component(
        &mut self,
        component: impl Component,
    ) -> Result<ComponentId, CoreError> {
        self.components
            .register(Box::new(component), &mut self.context)
    }

    /// Remove an entity and deactivate its still-active components.
    ///
    /// Only available when the world was built with
    /// [`WorldConfig::allow_despawn`]. Components are moved to the inactive
    /// list like any other deactivation; nothing is reactivated.
    ///
    /// # Errors
    ///
    /// - [`CoreError::DespawnDisabled`] when despawn is not allowed.
    /// - [`CoreError::UnknownEntity`] for a stale or unknown id.
    pub fn despawn(&mut self, id: EntityId) -> Result<EntityRecord, CoreError> {
        if !self.allow_despawn {
            return Err(CoreError::DespawnDisabled);
        }
        let record = self
            .entities
            .remove(id)
            .ok_or(CoreError::UnknownEntity { entity: id })?;
        self.allocator.deallocate(id);
        for (_, component) in &record.components {
            self.components.deactivate(*component);
        }
        tracing::debug!(entity = %id, components = record.components.len(), "entity despawned");
        Ok(record)
    }

    /// Update every category of `kind` with `delta`.
    pub fn update_kind(&mut self, kind: CategoryKind, delta: f64) -> Result<UpdateOutcome, CoreError> {
        self.components.update_kind(kind, &mut self.context, delta)
    }

    /// Run one simulation tick: all simulation categories, then count the
    /// tick. A failed tick is not counted.
    pub fn run_simulation_tick(&mut self, tick_length_ms: f64) -> Result<UpdateOutcome, CoreError> {
        let outcome = self.update_kind(CategoryKind::Simulation, tick_length_ms)?;
        self.context.advance_tick();
        Ok(outcome)
    }

    /// Run the presentation pass with the frame's leftover lag.
    pub fn run_presentation(&mut self, lag_ms: f64) -> Result<UpdateOutcome, CoreError> {
        self.context.set_lag(lag_ms);
        self.update_kind(CategoryKind::Presentation, lag_ms)
    }

    // -- accessors ----------------------------------------------------------

    /// The component registry.
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// Mutable component registry, for host-side input handling.
    pub fn components_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.components
    }

    /// The entity registry.
    pub fn entities(&self) -> &GameObjectRegistry {
        &self.entities
    }

    /// The engine context.
    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    /// Mutable engine context.
    pub fn context_mut(&mut self) -> &mut EngineContext {
        &mut self.context
    }

    /// Whether `id` is a live entity.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.allocator.is_alive(id)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Where an entity was bucketed.
    pub fn bucket_of(&self, id: EntityId) -> Option<Bucket> {
        self.entities.bucket_of(id)
    }

    /// Whether despawn is permitted.
    pub fn despawn_allowed(&self) -> bool {
        self.allow_despawn
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
