//! Property tests for the component registry.
//!
//! Random sequences of registrations, updates, entity additions and
//! despawns must never lose or duplicate a component, and must never reorder
//! the survivors of a category.

use proptest::prelude::*;
use tradewind_core::prelude::*;

/// Deactivates itself after `lifetime` updates.
struct Mortal {
    category: Category,
    lifetime: u32,
}

impl Component for Mortal {
    fn category(&self) -> Category {
        self.category
    }

    fn update(&mut self, _ctx: &mut EngineContext, _delta: f64) -> Result<bool, ComponentError> {
        self.lifetime = self.lifetime.saturating_sub(1);
        Ok(self.lifetime > 0)
    }
}

const CATEGORIES: [Category; 4] = [
    Category::CITIES,
    Category::MERCHANTS,
    Category::SPRITES,
    Category::MENUS,
];

#[derive(Debug, Clone)]
enum RegistryOp {
    Register(usize, u32),
    AddEntity(Option<&'static str>, Vec<(usize, u32)>),
    Simulate,
    Present,
    Despawn(usize),
}

fn op_strategy() -> impl Strategy<Value = RegistryOp> {
    let kind = prop_oneof![
        Just(None),
        Just(Some("city")),
        Just(Some("merchant")),
        Just(Some("pirate")),
    ];
    prop_oneof![
        (0..4usize, 1..5u32).prop_map(|(c, l)| RegistryOp::Register(c, l)),
        (kind, prop::collection::vec((0..4usize, 1..5u32), 0..4))
            .prop_map(|(k, parts)| RegistryOp::AddEntity(k, parts)),
        Just(RegistryOp::Simulate),
        Just(RegistryOp::Present),
        (0..50usize).prop_map(RegistryOp::Despawn),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn every_component_lives_in_exactly_one_list(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut world = World::new(WorldConfig { allow_despawn: true, ..Default::default() });
        let mut alive: Vec<EntityId> = Vec::new();

        for op in ops {
            // Snapshot of each category's order before the op.
            let before: Vec<Vec<ComponentId>> = CATEGORIES
                .iter()
                .map(|c| world.components().components(*c).unwrap().ids())
                .collect();

            match op {
                RegistryOp::Register(c, lifetime) => {
                    world.register_component(Mortal { category: CATEGORIES[c], lifetime }).unwrap();
                }
                RegistryOp::AddEntity(kind, parts) => {
                    let mut obj = GameObject::new(kind);
                    for (i, (c, lifetime)) in parts.into_iter().enumerate() {
                        obj.insert(&format!("part{i}"), Box::new(Mortal { category: CATEGORIES[c], lifetime }));
                    }
                    alive.push(world.add_entity(obj).unwrap());
                }
                RegistryOp::Simulate => {
                    world.run_simulation_tick(2000.0).unwrap();
                }
                RegistryOp::Present => {
                    world.run_presentation(250.0).unwrap();
                }
                RegistryOp::Despawn(idx) => {
                    if !alive.is_empty() {
                        let id = alive.remove(idx % alive.len());
                        world.despawn(id).unwrap();
                    }
                }
            }

            // Conservation: active + inactive == ever registered.
            let reg = world.components();
            prop_assert_eq!(
                (reg.total_active() + reg.inactive_count()) as u64,
                reg.total_registered()
            );

            // No component is both active and inactive.
            for id in reg.inactive().ids() {
                prop_assert!(!reg.is_active(id));
            }

            // Survivors keep their relative order.
            for (i, c) in CATEGORIES.iter().enumerate() {
                let now = reg.components(*c).unwrap().ids();
                let survivors: Vec<_> = before[i].iter().copied().filter(|id| now.contains(id)).collect();
                prop_assert_eq!(&now[..survivors.len()], &survivors[..]);
            }

            prop_assert_eq!(world.entity_count(), alive.len());
        }
    }
}
