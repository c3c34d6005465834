//! Headless trading session driven by jittery frame timestamps.
//!
//! Run with:
//!   cargo run --example headless_trade -p tradewind-engine
//!
//! Set `RUST_LOG=tradewind_engine=debug,tradewind_core=debug` to watch
//! registrations, deactivations and frame-rate windows.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use tradewind_engine::prelude::*;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Goods and gold across the whole map.
#[derive(Debug, Default)]
struct Economy {
    grain: u64,
    gold: u64,
    deliveries: u64,
}

/// What the presentation layer would draw this frame.
#[derive(Debug, Default)]
struct Hud {
    price_text: String,
    caravans_drawn: u32,
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Produces grain every tick.
struct Granary {
    yield_per_tick: u64,
}

impl Component for Granary {
    fn category(&self) -> Category {
        Category::CITIES
    }

    fn update(&mut self, ctx: &mut EngineContext, _delta: f64) -> Result<bool, ComponentError> {
        let economy = ctx
            .resource_mut::<Economy>()
            .ok_or_else(|| ComponentError::new("economy missing"))?;
        economy.grain += self.yield_per_tick;
        Ok(true)
    }

    fn label(&self) -> &str {
        "granary"
    }
}

/// Carries grain to market; retires after `trips` deliveries.
struct Caravan {
    progress_ms: f64,
    trip_ms: f64,
    trips: u32,
}

impl Component for Caravan {
    fn category(&self) -> Category {
        Category::MERCHANTS
    }

    fn update(&mut self, ctx: &mut EngineContext, delta: f64) -> Result<bool, ComponentError> {
        self.progress_ms += delta;
        if self.progress_ms < self.trip_ms {
            return Ok(true);
        }
        self.progress_ms -= self.trip_ms;

        let economy = ctx
            .resource_mut::<Economy>()
            .ok_or_else(|| ComponentError::new("economy missing"))?;
        let load = economy.grain.min(20);
        economy.grain -= load;
        economy.gold += load * 3;
        economy.deliveries += 1;

        self.trips = self.trips.saturating_sub(1);
        Ok(self.trips > 0)
    }

    fn label(&self) -> &str {
        "caravan"
    }
}

/// Market price board, redrawn every frame with interpolation.
struct PriceBoard;

impl Component for PriceBoard {
    fn category(&self) -> Category {
        Category::LABELS
    }

    fn update(&mut self, ctx: &mut EngineContext, _delta: f64) -> Result<bool, ComponentError> {
        let gold = ctx.resource::<Economy>().map_or(0, |e| e.gold);
        let t = ctx.interpolation();
        if let Some(hud) = ctx.resource_mut::<Hud>() {
            hud.price_text = format!("gold {gold} ({:.0}% to next tick)", t * 100.0);
        }
        Ok(true)
    }
}

/// Caravan marker on the map.
struct CaravanSprite;

impl Component for CaravanSprite {
    fn category(&self) -> Category {
        Category::SPRITES
    }

    fn update(&mut self, ctx: &mut EngineContext, _delta: f64) -> Result<bool, ComponentError> {
        if let Some(hud) = ctx.resource_mut::<Hud>() {
            hud.caravans_drawn += 1;
        }
        Ok(true)
    }
}

/// Trade dialog that closes itself after a number of frames.
struct TradeMenu {
    id: Option<ComponentId>,
    frames_left: u32,
}

impl Component for TradeMenu {
    fn category(&self) -> Category {
        Category::MENUS
    }

    fn update(&mut self, ctx: &mut EngineContext, _delta: f64) -> Result<bool, ComponentError> {
        self.frames_left = self.frames_left.saturating_sub(1);
        if self.frames_left > 0 {
            return Ok(true);
        }
        if let Some(id) = self.id {
            ctx.menus_mut().close(id);
        }
        Ok(false)
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

struct TradeFactory;

impl EntityFactory for TradeFactory {
    fn fresh_world(&mut self) -> SavedState {
        let city = |x: f64, y: f64, name: &str| EntitySpec {
            kind: "city".to_owned(),
            position: Position { x, y },
            details: serde_json::json!({ "name": name, "yield": 4 }),
        };
        let merchant = |x: f64, y: f64| EntitySpec {
            kind: "merchant".to_owned(),
            position: Position { x, y },
            details: serde_json::json!({ "trip_ms": 6000.0, "trips": 5 }),
        };
        SavedState {
            terrain: Terrain::flat(32, 24, 1),
            entities: vec![
                city(4.0, 4.0, "Lisbon"),
                city(20.0, 10.0, "Genoa"),
                merchant(5.0, 4.0),
                merchant(19.0, 11.0),
                EntitySpec {
                    kind: "market".to_owned(),
                    position: Position { x: 12.0, y: 8.0 },
                    details: serde_json::Value::Null,
                },
            ],
        }
    }

    fn create_map(
        &mut self,
        ctx: &mut EngineContext,
        terrain: &Terrain,
    ) -> Result<GameObject, EngineError> {
        ctx.insert_resource(Economy::default());
        ctx.insert_resource(Hud::default());
        tracing::info!(width = terrain.width, height = terrain.height, "map created");
        Ok(GameObject::new(Some("map")))
    }

    fn create_entity(
        &mut self,
        _ctx: &mut EngineContext,
        kind: &str,
        _position: Position,
        details: &serde_json::Value,
    ) -> Result<GameObject, EngineError> {
        let object = match kind {
            "city" => GameObject::new(Some("city")).with(
                "granary",
                Granary {
                    yield_per_tick: details["yield"].as_u64().unwrap_or(1),
                },
            ),
            "merchant" => GameObject::new(Some("merchant"))
                .with(
                    "caravan",
                    Caravan {
                        progress_ms: 0.0,
                        trip_ms: details["trip_ms"].as_f64().unwrap_or(4000.0),
                        trips: details["trips"].as_u64().unwrap_or(1) as u32,
                    },
                )
                .with("sprite", CaravanSprite),
            "market" => GameObject::new(Some("market")).with("board", PriceBoard),
            other => {
                return Err(EngineError::Configuration(format!(
                    "unknown entity kind '{other}'"
                )))
            }
        };
        Ok(object)
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config = StartupConfig {
        debug: false,
        speed: Speed::Fast,
        ..Default::default()
    };
    let mut renderer = HeadlessRenderer::default();
    let store = MemoryStore::new();
    let mut factory = TradeFactory;

    let mut engine = start(
        &config,
        WorldConfig::default(),
        StartupServices {
            renderer: &mut renderer,
            store: &store,
            factory: &mut factory,
        },
        Box::new(NullProjector::default()),
        0.0,
    )?;

    // Open a trade dialog for the first 120 frames.
    let menu = engine.world_mut().register_component(TradeMenu {
        id: None,
        frames_left: 120,
    })?;
    if let Some(dialog) = engine
        .world_mut()
        .components_mut()
        .get_mut_as::<TradeMenu>(menu)
    {
        dialog.id = Some(menu);
    }
    engine.world_mut().context_mut().menus_mut().open(menu);

    let mut rng = Pcg64::seed_from_u64(0x7ade);
    let mut now = 0.0;
    let mut overlay_rebuilds = 0;
    for frame in 0..2400 {
        now += rng.gen_range(12.0..22.0);
        // An occasional long stall forces catch-up ticks.
        if rng.gen_bool(0.005) {
            now += 3500.0;
        }
        if frame == 1200 {
            engine.set_speed(Speed::Normal)?;
        }
        let report = engine.frame(now)?;
        if report.overlay_rebuilt {
            overlay_rebuilds += 1;
        }
    }

    let world = engine.world();
    let ctx = world.context();
    let economy = ctx
        .resource::<Economy>()
        .ok_or_else(|| anyhow::anyhow!("economy resource missing"))?;
    let hud = ctx
        .resource::<Hud>()
        .ok_or_else(|| anyhow::anyhow!("hud resource missing"))?;

    println!("=== Tradewind headless session ===");
    println!("  frames:            {}", engine.frame_count());
    println!("  simulated ticks:   {}", ctx.tick_count());
    println!("  simulated time:    {:.1} s", ctx.sim_time_ms() / 1000.0);
    println!("  wall time:         {:.1} s", now / 1000.0);
    println!("  grain in stock:    {}", economy.grain);
    println!("  gold earned:       {}", economy.gold);
    println!("  deliveries:        {}", economy.deliveries);
    println!("  active components: {}", world.components().total_active());
    println!("  retired:           {}", world.components().inactive_count());
    println!("  overlay rebuilds:  {overlay_rebuilds}");
    println!("  price board:       {}", hud.price_text);
    println!("  caravans drawn:    {}", hud.caravans_drawn);

    Ok(())
}
