//! Registry throughput: ordered update of large categories with deactivation
//! churn.
//!
//! Run with: `cargo bench --bench registry_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tradewind_core::prelude::*;

struct Trader {
    gold: u64,
    trips_left: u32,
}

impl Component for Trader {
    fn category(&self) -> Category {
        Category::MERCHANTS
    }

    fn update(&mut self, _ctx: &mut EngineContext, delta: f64) -> Result<bool, ComponentError> {
        self.gold = self.gold.wrapping_add(delta as u64);
        self.trips_left = self.trips_left.saturating_sub(1);
        Ok(self.trips_left > 0)
    }
}

fn populated_world(count: u32, churn: bool) -> World {
    let mut world = World::new(WorldConfig::default());
    for i in 0..count {
        let trips_left = if churn { 1 + i % 64 } else { u32::MAX };
        world
            .register_component(Trader { gold: 0, trips_left })
            .expect("merchants is a standard category");
    }
    world
}

fn bench_update_steady(c: &mut Criterion) {
    let mut world = populated_world(10_000, false);
    c.bench_function("update_10k_merchants_steady", |b| {
        b.iter(|| {
            let outcome = world.run_simulation_tick(2000.0).expect("tick");
            black_box(outcome.visited);
        });
    });
}

fn bench_update_with_churn(c: &mut Criterion) {
    c.bench_function("update_10k_merchants_churn_64_ticks", |b| {
        b.iter_with_setup(
            || populated_world(10_000, true),
            |mut world| {
                for _ in 0..64 {
                    world.run_simulation_tick(2000.0).expect("tick");
                }
                black_box(world.components().inactive_count());
            },
        );
    });
}

criterion_group!(benches, bench_update_steady, bench_update_with_churn);
criterion_main!(benches);
