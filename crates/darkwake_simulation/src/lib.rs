//! DARKWAKE Simulation Core
//!
//! Headless ECS-симуляция sound-driven перцепции на Bevy 0.16:
//! footstep bus → synchronized RPC → propagation → perception FSM.
//! Rendering, анимация, pathfinding и session transport — внешние
//! collaborators (хост подключает их поверх тех же контрактов).

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub mod ai;
pub mod audio;
pub mod components;
pub mod error;
pub mod logger;
pub mod navigation;
pub mod net;
pub mod spatial;

// Re-export базовых типов для удобства
pub use ai::{AnimationKind, AnimationSignal, PerceptionPlugin, SoundHeard};
pub use audio::{AudioPlugin, FootstepEmitter, SoundClip, SoundLibrary, SoundPlayed};
pub use components::*;
pub use error::{AudioError, SimulationError};
pub use navigation::{NavSurface, NavigationPlugin};
pub use net::{InboundRpc, NetPlugin, RpcCall, RpcOutbox};

/// Порядок подсистем внутри одного fixed тика
///
/// Emit → Net → Dispatch → Perception → Navigation: эмиссия локального
/// участника доставляется и исполняется в том же тике, perception реагирует
/// на стимулы до интеграции движения.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    Emit,
    Net,
    Dispatch,
    Perception,
    Navigation,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            // Детерминистичный RNG (seed по умолчанию)
            .insert_resource(DeterministicRng::new(42))
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::Emit,
                    SimulationSet::Net,
                    SimulationSet::Dispatch,
                    SimulationSet::Perception,
                    SimulationSet::Navigation,
                )
                    .chain(),
            )
            .add_plugins((NetPlugin, AudioPlugin, PerceptionPlugin, NavigationPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
///
/// Wander sampling и выбор footstep клипов идут через него: при одном seed
/// локальная симуляция воспроизводима от прогона к прогону.
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}

/// Продвигает симуляцию ровно на один fixed тик
///
/// Headless прогоны не зависят от wall-clock: Time<Fixed> продвигается
/// вручную на timestep, затем исполняется FixedUpdate schedule.
pub fn step_simulation(app: &mut App) {
    let timestep = app.world().resource::<Time<Fixed>>().timestep();
    let generic = {
        let mut fixed = app.world_mut().resource_mut::<Time<Fixed>>();
        fixed.advance_by(timestep);
        fixed.as_generic()
    };
    *app.world_mut().resource_mut::<Time>() = generic;
    app.world_mut().run_schedule(FixedUpdate);
}

/// Snapshot мира для сравнения детерминизма
///
/// Собирает компоненты в детерминированный байтовый формат (сортировка по
/// Entity index, сериализация через Debug).
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
