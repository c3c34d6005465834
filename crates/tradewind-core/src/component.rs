//! Components and the categorized component registry.
//!
//! A [`Component`] is a boxed unit of behavior. Once registered it lives in
//! exactly one list of the [`ComponentRegistry`]: the active list of its
//! category, or the shared inactive list. A component leaves its active list
//! when its update returns `Ok(false)`; deactivation is terminal.
//!
//! Updates visit an active list in insertion order. Deactivation during a
//! scan behaves as an in-place filter: every original element is visited
//! exactly once and survivors keep their relative order.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::category::{Category, CategoryKind, CategorySet};
use crate::context::EngineContext;
use crate::{ComponentError, CoreError};

// ---------------------------------------------------------------------------
// ComponentId
// ---------------------------------------------------------------------------

/// Identifier assigned to a component at registration. Never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Component trait
// ---------------------------------------------------------------------------

/// Type-erased access to a component's concrete type.
///
/// Implemented for every `'static` type, so component authors never write it.
pub trait AsAny {
    /// Borrow as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;
    /// Mutably borrow as [`Any`] for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A categorized unit of behavior attached to a game entity.
pub trait Component: AsAny + 'static {
    /// The category this component is stored and updated under.
    fn category(&self) -> Category;

    /// Called once, right after the component is appended to its active list.
    fn on_attach(&mut self, _ctx: &mut EngineContext) {}

    /// Advance the component by `delta` milliseconds.
    ///
    /// Simulation components receive the fixed tick length; presentation
    /// components receive the leftover lag of the frame. Returning
    /// `Ok(false)` moves the component to the inactive list for good.
    fn update(&mut self, ctx: &mut EngineContext, delta: f64) -> Result<bool, ComponentError>;

    /// Short human-readable name for logs.
    fn label(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

// ---------------------------------------------------------------------------
// FailurePolicy
// ---------------------------------------------------------------------------

/// What the registry does when a component update returns `Err`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Stop the scan and propagate [`CoreError::ComponentFailed`]. The failing
    /// component and every component after it stay active, in order.
    #[default]
    Halt,
    /// Log the failure, deactivate the component and continue the scan.
    Deactivate,
}

// ---------------------------------------------------------------------------
// UpdateOutcome
// ---------------------------------------------------------------------------

/// Counters from one or more category updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Components whose `update` was called.
    pub visited: usize,
    /// Components moved to the inactive list (by `Ok(false)` or by a
    /// failure under [`FailurePolicy::Deactivate`]).
    pub deactivated: usize,
    /// Failures absorbed by [`FailurePolicy::Deactivate`].
    pub failed: usize,
}

impl UpdateOutcome {
    fn merge(&mut self, other: UpdateOutcome) {
        self.visited += other.visited;
        self.deactivated += other.deactivated;
        self.failed += other.failed;
    }
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

struct Slot {
    id: ComponentId,
    component: Box<dyn Component>,
}

/// Owner of every registered component.
///
/// One active list per declared category (indexed by declaration position)
/// plus one shared inactive list.
pub struct ComponentRegistry {
    categories: CategorySet,
    active: Vec<Vec<Slot>>,
    inactive: Vec<Slot>,
    next_id: u64,
    failure_policy: FailurePolicy,
}

impl ComponentRegistry {
    /// Create a registry for the given categories.
    pub fn new(categories: CategorySet, failure_policy: FailurePolicy) -> Self {
        let active = (0..categories.len()).map(|_| Vec::new()).collect();
        Self {
            categories,
            active,
            inactive: Vec::new(),
            next_id: 0,
            failure_policy,
        }
    }

    fn index_of(&self, category: Category) -> Result<usize, CoreError> {
        self.categories
            .position(category)
            .ok_or_else(|| CoreError::UndeclaredCategory {
                category: category.name().to_owned(),
                context: String::from("registry lookup"),
                declared: self.categories.names(),
            })
    }

    /// Register a component under its own category and run its attach hook.
    ///
    /// # Errors
    ///
    /// [`CoreError::UndeclaredCategory`] if the component's category was not
    /// declared. Nothing is stored in that case.
    pub fn register(
        &mut self,
        component: Box<dyn Component>,
        ctx: &mut EngineContext,
    ) -> Result<ComponentId, CoreError> {
        let category = component.category();
        let idx = self.index_of(category)?;

        let id = ComponentId(self.next_id);
        self.next_id += 1;

        tracing::debug!(
            component = %id,
            category = %category,
            label = component.label(),
            "registering component"
        );

        self.active[idx].push(Slot { id, component });
        if let Some(slot) = self.active[idx].last_mut() {
            slot.component.on_attach(ctx);
        }
        Ok(id)
    }

    /// Update every active component of `category` in insertion order.
    ///
    /// # Errors
    ///
    /// - [`CoreError::UndeclaredCategory`] for an unknown category.
    /// - [`CoreError::ComponentFailed`] when an update fails under
    ///   [`FailurePolicy::Halt`].
    pub fn update_category(
        &mut self,
        category: Category,
        ctx: &mut EngineContext,
        delta: f64,
    ) -> Result<UpdateOutcome, CoreError> {
        let idx = self.index_of(category)?;
        self.update_index(idx, ctx, delta)
    }

    /// Update all categories of one kind, in declaration order.
    ///
    /// Stops at the first category that returns an error.
    pub fn update_kind(
        &mut self,
        kind: CategoryKind,
        ctx: &mut EngineContext,
        delta: f64,
    ) -> Result<UpdateOutcome, CoreError> {
        let mut total = UpdateOutcome::default();
        for idx in 0..self.active.len() {
            if self.categories.get(idx).is_some_and(|(_, k)| k == kind) {
                total.merge(self.update_index(idx, ctx, delta)?);
            }
        }
        Ok(total)
    }

    fn update_index(
        &mut self,
        idx: usize,
        ctx: &mut EngineContext,
        delta: f64,
    ) -> Result<UpdateOutcome, CoreError> {
        let mut outcome = UpdateOutcome::default();
        let scanned = std::mem::take(&mut self.active[idx]);
        let mut survivors = Vec::with_capacity(scanned.len());
        let mut remaining = scanned.into_iter();
        let mut failure = None;

        while let Some(mut slot) = remaining.next() {
            outcome.visited += 1;
            match slot.component.update(ctx, delta) {
                Ok(true) => survivors.push(slot),
                Ok(false) => {
                    tracing::debug!(component = %slot.id, label = slot.component.label(), "component deactivated");
                    outcome.deactivated += 1;
                    self.inactive.push(slot);
                }
                Err(source) => match self.failure_policy {
                    FailurePolicy::Halt => {
                        failure = Some(CoreError::ComponentFailed {
                            component: slot.id,
                            category: self.category_name(idx),
                            source,
                        });
                        survivors.push(slot);
                        survivors.extend(remaining.by_ref());
                        break;
                    }
                    FailurePolicy::Deactivate => {
                        tracing::error!(
                            component = %slot.id,
                            label = slot.component.label(),
                            error = %source,
                            "component update failed -- deactivating"
                        );
                        outcome.deactivated += 1;
                        outcome.failed += 1;
                        self.inactive.push(slot);
                    }
                },
            }
        }

        self.active[idx] = survivors;
        match failure {
            Some(err) => Err(err),
            None => Ok(outcome),
        }
    }

    fn category_name(&self, idx: usize) -> String {
        self.categories
            .get(idx)
            .map(|(c, _)| c.name().to_owned())
            .unwrap_or_default()
    }

    /// Move one active component to the inactive list.
    ///
    /// Survivors keep their order. Returns `false` if the component is not
    /// currently active.
    pub fn deactivate(&mut self, id: ComponentId) -> bool {
        for list in &mut self.active {
            if let Some(pos) = list.iter().position(|s| s.id == id) {
                let slot = list.remove(pos);
                tracing::debug!(component = %id, "component deactivated explicitly");
                self.inactive.push(slot);
                return true;
            }
        }
        false
    }

    // -- accessors ----------------------------------------------------------

    /// Read-only view of the active components of a category.
    pub fn components(&self, category: Category) -> Result<ComponentView<'_>, CoreError> {
        let idx = self.index_of(category)?;
        Ok(ComponentView {
            slots: &self.active[idx],
        })
    }

    /// Read-only view of the inactive components, in deactivation order.
    pub fn inactive(&self) -> ComponentView<'_> {
        ComponentView {
            slots: &self.inactive,
        }
    }

    /// Look a component up by id, active or inactive.
    pub fn get(&self, id: ComponentId) -> Option<&dyn Component> {
        self.active
            .iter()
            .flatten()
            .chain(self.inactive.iter())
            .find(|s| s.id == id)
            .map(|s| s.component.as_ref())
    }

    /// Look a component up by id and downcast it to its concrete type.
    pub fn get_as<T: Component>(&self, id: ComponentId) -> Option<&T> {
        self.get(id).and_then(|c| c.as_any().downcast_ref::<T>())
    }

    /// Mutable lookup by id, active or inactive.
    pub fn get_mut(&mut self, id: ComponentId) -> Option<&mut (dyn Component + 'static)> {
        self.active
            .iter_mut()
            .flatten()
            .chain(self.inactive.iter_mut())
            .find(|s| s.id == id)
            .map(|s| s.component.as_mut())
    }

    /// Mutable lookup by id and downcast, e.g. for host input handling.
    pub fn get_mut_as<T: Component>(&mut self, id: ComponentId) -> Option<&mut T> {
        self.get_mut(id)
            .and_then(|c| c.as_any_mut().downcast_mut::<T>())
    }

    /// Whether the component is in an active list.
    pub fn is_active(&self, id: ComponentId) -> bool {
        self.active.iter().flatten().any(|s| s.id == id)
    }

    /// Number of active components in a category, or `None` if undeclared.
    pub fn active_count(&self, category: Category) -> Option<usize> {
        self.categories.position(category).map(|i| self.active[i].len())
    }

    /// Number of active components across every category.
    pub fn total_active(&self) -> usize {
        self.active.iter().map(Vec::len).sum()
    }

    /// Number of inactive components.
    pub fn inactive_count(&self) -> usize {
        self.inactive.len()
    }

    /// Number of components ever registered.
    pub fn total_registered(&self) -> u64 {
        self.next_id
    }

    /// The declared categories.
    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    /// The failure policy applied to component errors.
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("categories", &self.categories.names())
            .field("active", &self.total_active())
            .field("inactive", &self.inactive.len())
            .field("failure_policy", &self.failure_policy)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ComponentView
// ---------------------------------------------------------------------------

/// Borrowed, read-only view of one component list.
#[derive(Clone, Copy)]
pub struct ComponentView<'a> {
    slots: &'a [Slot],
}

impl<'a> ComponentView<'a> {
    /// Number of components in the view.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Component ids, in list order.
    pub fn ids(&self) -> Vec<ComponentId> {
        self.slots.iter().map(|s| s.id).collect()
    }

    /// Iterate `(id, component)` pairs in list order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, &'a dyn Component)> + 'a {
        self.slots.iter().map(|s| (s.id, s.component.as_ref()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
