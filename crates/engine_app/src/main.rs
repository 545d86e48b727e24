//! # engine_app
//!
//! Demo driver for the ECS runtime. Spawns a field of moving entities, some
//! carrying abilities, registers the demo systems, and runs the tick loop.
//!
//! Worker count and queue capacity come from `ENGINE_WORKERS` and
//! `ENGINE_QUEUE_CAPACITY`; `ENGINE_TICKS` bounds the run (default 300).

mod components;
mod systems;

use std::sync::Arc;

use anyhow::{Context, Result};
use engine_component::Bundle;
use engine_math::{Position, Velocity};
use engine_system::{FrameScheduler, SchedulerConfig, TickConfig, TickLoop};
use engine_world::EntityStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use components::{Ability, Fire, Frost};
use systems::{AbilityCensus, Arena, Cooldown, Motion};

const TICK_RATE: f64 = 60.0;
const DEFAULT_TICKS: u64 = 300;
const ENTITY_COUNT: usize = 2_000;
const ARENA_RADIUS: f32 = 100.0;
/// Upper bound on the demo systems matching a single entity.
const SYSTEMS_PER_ENTITY: usize = 5;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_app=info".parse()?))
        .init();

    info!("engine demo starting");

    let max_ticks = match std::env::var("ENGINE_TICKS") {
        Ok(value) => value
            .parse()
            .with_context(|| format!("invalid ENGINE_TICKS value {value:?}"))?,
        Err(_) => DEFAULT_TICKS,
    };

    let store = Arc::new(EntityStore::new());
    spawn(&store)?;
    info!(entities = store.count(), "world populated");

    let config = sized_for_demo(SchedulerConfig::from_env());
    info!(
        workers = config.worker_count,
        queue_capacity = config.queue_capacity,
        "scheduler configured"
    );
    let mut scheduler = FrameScheduler::new(Arc::clone(&store), config)?;
    register_systems(&mut scheduler, &store)?;

    let mut tick_loop = TickLoop::new(TickConfig {
        tick_rate: TICK_RATE,
        max_ticks,
    });
    let ticks = tick_loop.run(&mut scheduler)?;

    info!(ticks, remaining = store.count(), "engine demo shut down");
    Ok(())
}

/// Raise the queue capacity so a full frame of work fits without blocking
/// the producer. A larger configured capacity is kept.
fn sized_for_demo(config: SchedulerConfig) -> SchedulerConfig {
    let needed = ENTITY_COUNT * SYSTEMS_PER_ENTITY;
    let capacity = config.queue_capacity.max(needed);
    config.with_queue_capacity(capacity)
}

fn register_systems(scheduler: &mut FrameScheduler, store: &Arc<EntityStore>) -> Result<()> {
    let dt = (1.0 / TICK_RATE) as f32;
    scheduler.register(Arc::new(Motion::new(Arc::clone(store), dt)))?;
    scheduler.register(Arc::new(Arena::new(Arc::clone(store), ARENA_RADIUS)))?;
    scheduler.register(Arc::new(Cooldown::<Fire>::new(Arc::clone(store), dt)))?;
    scheduler.register(Arc::new(Cooldown::<Frost>::new(Arc::clone(store), dt)))?;
    scheduler.register(Arc::new(AbilityCensus::default()))?;
    Ok(())
}

/// Spawn entities on a spiral, moving outward at varying speeds.
fn spawn(store: &EntityStore) -> Result<()> {
    for i in 0..ENTITY_COUNT {
        let angle = i as f32 * 0.618;
        let radius = (i % 50) as f32;
        let direction = Velocity::new(angle.cos(), angle.sin());
        let speed = 1.0 + (i % 7) as f32;

        let mut bundle = Bundle::new()
            .with(Position::new(radius * angle.cos(), radius * angle.sin()))
            .with(Velocity(direction.0 * speed));
        if i % 3 == 0 {
            bundle = bundle.with(Ability::<Fire>::ready(1.5));
        }
        if i % 5 == 0 {
            bundle = bundle.with(Ability::<Frost>::ready(4.0));
        }
        store.create(bundle)?;
    }
    Ok(())
}
