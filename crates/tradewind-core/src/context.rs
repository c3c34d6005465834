//! The engine context handed to every component hook.
//!
//! There is no global state: each [`World`](crate::world::World) owns one
//! [`EngineContext`] and passes it by `&mut` into every `on_attach` and
//! `update` call. Two worlds never share a context.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::menu::MenuStack;

/// Shared mutable state of one engine instance.
///
/// Holds typed resources (one value per Rust type), the overlay
/// [`MenuStack`], and the simulation clock as seen by components.
pub struct EngineContext {
    resources: HashMap<TypeId, Box<dyn Any>>,
    menus: MenuStack,
    tick_count: u64,
    tick_length_ms: f64,
    /// Sim time at `base_tick`; rebased whenever the tick length changes.
    base_time_ms: f64,
    base_tick: u64,
    lag_ms: f64,
    debug: bool,
}

impl EngineContext {
    /// Create a context for a simulation that ticks every `tick_length_ms`.
    pub fn new(tick_length_ms: f64) -> Self {
        Self {
            resources: HashMap::new(),
            menus: MenuStack::new(),
            tick_count: 0,
            tick_length_ms,
            base_time_ms: 0.0,
            base_tick: 0,
            lag_ms: 0.0,
            debug: false,
        }
    }

    // -- resources ----------------------------------------------------------

    /// Insert a resource, returning the previous value of the same type.
    pub fn insert_resource<T: Any>(&mut self, value: T) -> Option<T> {
        self.resources
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Borrow a resource.
    pub fn resource<T: Any>(&self) -> Option<&T> {
        self.resources
            .get(&TypeId::of::<T>())
            .and_then(|r| r.downcast_ref::<T>())
    }

    /// Mutably borrow a resource.
    pub fn resource_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.resources
            .get_mut(&TypeId::of::<T>())
            .and_then(|r| r.downcast_mut::<T>())
    }

    /// Remove a resource.
    pub fn remove_resource<T: Any>(&mut self) -> Option<T> {
        self.resources
            .remove(&TypeId::of::<T>())
            .and_then(|r| r.downcast::<T>().ok())
            .map(|r| *r)
    }

    /// Whether a resource of type `T` is present.
    pub fn has_resource<T: Any>(&self) -> bool {
        self.resources.contains_key(&TypeId::of::<T>())
    }

    // -- overlays -----------------------------------------------------------

    /// The overlay stack.
    pub fn menus(&self) -> &MenuStack {
        &self.menus
    }

    /// Mutable overlay stack, so components can open and close menus.
    pub fn menus_mut(&mut self) -> &mut MenuStack {
        &mut self.menus
    }

    // -- clock --------------------------------------------------------------

    /// Number of completed simulation ticks.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Current tick length in milliseconds.
    pub fn tick_length_ms(&self) -> f64 {
        self.tick_length_ms
    }

    /// Simulated time in milliseconds.
    ///
    /// Computed from the tick count since the last tick-length change, not
    /// accumulated per tick.
    pub fn sim_time_ms(&self) -> f64 {
        self.base_time_ms + (self.tick_count - self.base_tick) as f64 * self.tick_length_ms
    }

    /// Lag left over after the last frame's simulation ticks.
    pub fn lag_ms(&self) -> f64 {
        self.lag_ms
    }

    /// How far the frame is between the last tick and the next, in `[0, 1)`.
    ///
    /// For presentation interpolation only.
    pub fn interpolation(&self) -> f64 {
        if self.tick_length_ms > 0.0 {
            (self.lag_ms / self.tick_length_ms).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Whether the engine runs with debug diagnostics.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Enable or disable debug diagnostics.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Record a completed simulation tick. Called by the world after the
    /// simulation categories have run.
    pub fn advance_tick(&mut self) {
        self.tick_count += 1;
    }

    /// Change the tick length, rebasing simulated time at the current tick.
    pub fn set_tick_length(&mut self, tick_length_ms: f64) {
        self.base_time_ms = self.sim_time_ms();
        self.base_tick = self.tick_count;
        self.tick_length_ms = tick_length_ms;
    }

    /// Record the leftover lag for the presentation pass.
    pub fn set_lag(&mut self, lag_ms: f64) {
        self.lag_ms = lag_ms;
    }
}

impl fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineContext")
            .field("resources", &self.resources.len())
            .field("menus", &self.menus)
            .field("tick_count", &self.tick_count)
            .field("tick_length_ms", &self.tick_length_ms)
            .field("lag_ms", &self.lag_ms)
            .field("debug", &self.debug)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
