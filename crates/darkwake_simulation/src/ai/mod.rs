//! Perception AI монстра
//!
//! FSM над {Patrol, Idle, Chase, Attack} + sound-driven стимулы.
//! Все системы в FixedUpdate, последовательное выполнение для детерминизма.

use bevy::prelude::*;

pub mod events;
pub mod perception;

#[cfg(test)]
mod perception_tests;

pub use events::{AnimationKind, AnimationSignal, SoundHeard};
pub use perception::{validate_agent, GROWL_CLIP};

use crate::SimulationSet;

/// Perception Plugin
///
/// Порядок выполнения (один тик):
/// 1. on_monster_spawned — начальная watch пауза
/// 2. sound_reactions — стимулы propagation → chase
/// 3. chase_reaffirmation — cadence loop + arrival
/// 4. detect_players — occlusion-aware visual detection
/// 5. approach_detected — сближение + attack gate
/// 6. attack_recovery_tick / watch_tick / cooldown_tick — таймеры
/// 7. wander_tick — patrol sub-behavior
/// 8. walk_animation_sync — animation sink
pub struct PerceptionPlugin;

impl Plugin for PerceptionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SoundHeard>()
            .add_event::<AnimationSignal>()
            .add_systems(
                FixedUpdate,
                (
                    perception::on_monster_spawned,
                    perception::sound_reactions,
                    perception::chase_reaffirmation,
                    perception::detect_players,
                    perception::approach_detected,
                    perception::attack_recovery_tick,
                    perception::watch_tick,
                    perception::cooldown_tick,
                    perception::wander_tick,
                    perception::walk_animation_sync,
                )
                    .chain()
                    .in_set(SimulationSet::Perception),
            );
    }
}
