//! Audio module: sound library, event bus, propagation engine
//!
//! Поток данных: движение → footstep_emission считает параметры →
//! synchronized вызов → dispatch у каждого участника → propagation
//! определяет слушателей в радиусе → SoundHeard стимул в perception.

use bevy::prelude::*;

pub mod bus;
pub mod library;
pub mod propagation;

pub use bus::{play_jump_scare, play_oneshot, FootstepEmitter, SoundPlayed};
pub use library::{SoundClip, SoundLibrary};
pub use propagation::{ContinuousSound, SoundPositions};

/// Audio Plugin
///
/// Порядок в FixedUpdate (через SimulationSet):
/// 1. Emit: footstep_emission — локальная авторитетная эмиссия
/// 2. Net: loopback_delivery доставляет outbox
/// 3. Dispatch: dispatch_inbound_rpc → continuous_emission
pub struct AudioPlugin;

impl Plugin for AudioPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SoundLibrary>()
            .init_resource::<SoundPositions>()
            .add_event::<SoundPlayed>()
            .add_systems(
                FixedUpdate,
                bus::footstep_emission.in_set(crate::SimulationSet::Emit),
            )
            .add_systems(
                FixedUpdate,
                (
                    propagation::dispatch_inbound_rpc,
                    propagation::continuous_emission,
                )
                    .chain()
                    .in_set(crate::SimulationSet::Dispatch),
            );
    }
}
