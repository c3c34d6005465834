//! Frame scheduling through the public engine API.
//!
//! Covers catch-up ticks, the ordering of simulation before presentation,
//! both component failure policies, and independent engine instances.

use std::cell::RefCell;
use std::rc::Rc;

use tradewind_engine::prelude::*;

// ---------------------------------------------------------------------------
// Test components
// ---------------------------------------------------------------------------

type Trail = Rc<RefCell<Vec<String>>>;

/// Logs `name@tick` on every update.
struct Ledger {
    name: &'static str,
    category: Category,
    trail: Trail,
}

impl Ledger {
    fn new(name: &'static str, category: Category, trail: &Trail) -> Self {
        Self {
            name,
            category,
            trail: Rc::clone(trail),
        }
    }
}

impl Component for Ledger {
    fn category(&self) -> Category {
        self.category
    }

    fn update(&mut self, ctx: &mut EngineContext, _delta: f64) -> Result<bool, ComponentError> {
        self.trail
            .borrow_mut()
            .push(format!("{}@{}", self.name, ctx.tick_count()));
        Ok(true)
    }

    fn label(&self) -> &str {
        self.name
    }
}

/// Fails on its `fail_on`-th update, succeeds otherwise.
struct Shipwreck {
    calls: u32,
    fail_on: u32,
    trail: Trail,
}

impl Component for Shipwreck {
    fn category(&self) -> Category {
        Category::MERCHANTS
    }

    fn update(&mut self, _ctx: &mut EngineContext, _delta: f64) -> Result<bool, ComponentError> {
        self.calls += 1;
        if self.calls == self.fail_on {
            return Err(ComponentError::new("ran aground"));
        }
        self.trail.borrow_mut().push(format!("wreck#{}", self.calls));
        Ok(true)
    }
}

/// Records the interpolation factor seen during presentation.
#[derive(Default)]
struct Tween {
    seen: Vec<f64>,
}

impl Component for Tween {
    fn category(&self) -> Category {
        Category::SPRITES
    }

    fn update(&mut self, ctx: &mut EngineContext, _delta: f64) -> Result<bool, ComponentError> {
        self.seen.push(ctx.interpolation());
        Ok(true)
    }
}

fn engine_with(world: World, speed: Speed) -> EngineLoop {
    EngineLoop::new(
        world,
        EngineConfig {
            speed,
            debug: false,
        },
        Box::new(NullProjector::default()),
        0.0,
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// 1. Catch-up
// ---------------------------------------------------------------------------

#[test]
fn stalled_frame_runs_every_owed_tick_before_presentation() {
    let trail = Trail::default();
    let mut world = World::new(WorldConfig::default());
    world
        .register_component(Ledger::new("label", Category::LABELS, &trail))
        .unwrap();
    world
        .register_component(Ledger::new("city", Category::CITIES, &trail))
        .unwrap();
    world
        .register_component(Ledger::new("caravan", Category::MERCHANTS, &trail))
        .unwrap();

    let mut engine = engine_with(world, Speed::Fast);
    let report = engine.frame(3250.0).unwrap();

    assert_eq!(report.ticks_run, 3);
    assert_eq!(report.lag_ms, 250.0);
    assert_eq!(
        *trail.borrow(),
        vec![
            "city@0", "caravan@0", "city@1", "caravan@1", "city@2", "caravan@2", "label@3",
        ]
    );
}

#[test]
fn jittery_frames_total_the_same_ticks_as_one_long_frame() {
    let mut steady = engine_with(World::new(WorldConfig::default()), Speed::Normal);
    let mut jittery = engine_with(World::new(WorldConfig::default()), Speed::Normal);

    steady.frame(20_000.0).unwrap();
    let stamps = [16.0, 33.0, 900.0, 2500.0, 2501.0, 9999.0, 14_000.0, 20_000.0];
    let total: u64 = jittery
        .run_frames(stamps)
        .unwrap()
        .iter()
        .map(|r| r.ticks_run)
        .sum();

    assert_eq!(total, 10);
    assert_eq!(steady.world().context().tick_count(), 10);
    assert_eq!(jittery.world().context().tick_count(), 10);
    assert_eq!(jittery.world().context().sim_time_ms(), 20_000.0);
}

#[test]
fn presentation_sees_interpolation_factor() {
    let mut world = World::new(WorldConfig::default());
    let tween = world.register_component(Tween::default()).unwrap();
    let mut engine = engine_with(world, Speed::Normal);

    engine.run_frames([500.0, 2500.0, 3500.0]).unwrap();

    let seen = &engine.world().components().get_as::<Tween>(tween).unwrap().seen;
    assert_eq!(seen, &[0.25, 0.25, 0.75]);
}

// ---------------------------------------------------------------------------
// 2. Component failure
// ---------------------------------------------------------------------------

#[test]
fn halt_policy_propagates_and_keeps_order() {
    let trail = Trail::default();
    let mut world = World::new(WorldConfig::default());
    let first = world
        .register_component(Ledger::new("first", Category::MERCHANTS, &trail))
        .unwrap();
    let wreck = world
        .register_component(Shipwreck {
            calls: 0,
            fail_on: 2,
            trail: Rc::clone(&trail),
        })
        .unwrap();
    let last = world
        .register_component(Ledger::new("last", Category::MERCHANTS, &trail))
        .unwrap();
    let mut engine = engine_with(world, Speed::Fast);

    let err = engine.frame(3000.0).unwrap_err();
    assert!(err.is_component_failure());
    assert!(err.to_string().contains("ran aground"));

    // One full tick, then the failing one stopped before "last".
    assert_eq!(
        *trail.borrow(),
        vec!["first@0", "wreck#1", "last@0", "first@1"]
    );
    assert_eq!(engine.world().context().tick_count(), 1);
    assert_eq!(
        engine
            .world()
            .components()
            .components(Category::MERCHANTS)
            .unwrap()
            .ids(),
        vec![first, wreck, last]
    );

    // Owed ticks were consumed by the clock; the next frame resumes normally.
    let report = engine.frame(4000.0).unwrap();
    assert_eq!(report.ticks_run, 1);
    assert_eq!(engine.world().context().tick_count(), 2);
}

#[test]
fn deactivate_policy_isolates_the_failure() {
    let trail = Trail::default();
    let mut world = World::new(WorldConfig {
        failure_policy: FailurePolicy::Deactivate,
        ..Default::default()
    });
    let wreck = world
        .register_component(Shipwreck {
            calls: 0,
            fail_on: 1,
            trail: Rc::clone(&trail),
        })
        .unwrap();
    world
        .register_component(Ledger::new("after", Category::MERCHANTS, &trail))
        .unwrap();
    let mut engine = engine_with(world, Speed::Fast);

    let report = engine.frame(2000.0).unwrap();

    assert_eq!(report.ticks_run, 2);
    assert_eq!(report.deactivated, 1);
    assert_eq!(*trail.borrow(), vec!["after@0", "after@1"]);
    assert!(!engine.world().components().is_active(wreck));
    assert_eq!(engine.world().components().inactive().ids(), vec![wreck]);
}

// ---------------------------------------------------------------------------
// 3. Isolation
// ---------------------------------------------------------------------------

#[test]
fn engines_do_not_share_state() {
    let mut a = engine_with(World::new(WorldConfig::default()), Speed::Fast);
    let mut b = engine_with(World::new(WorldConfig::default()), Speed::Slow);

    a.world_mut().context_mut().insert_resource(7_u32);
    a.frame(5000.0).unwrap();
    b.frame(5000.0).unwrap();

    assert_eq!(a.world().context().tick_count(), 5);
    assert_eq!(b.world().context().tick_count(), 1);
    assert!(!b.world().context().has_resource::<u32>());
}
