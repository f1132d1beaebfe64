//! Perception события: sound стимулы и animation signals

use bevy::prelude::*;

/// Стимул "звук услышан в позиции P" (выход propagation engine)
///
/// Доставка at-least-once: повторный стимул пока агент уже chasing ту же
/// (или более свежую) позицию не регрессит state — контракт "chase к
/// последней услышанной позиции", не аккумуляция.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SoundHeard {
    pub listener: Entity,
    pub position: Vec3,
}

/// Сигнал animation sink'у (внешний рендерер/аниматор)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AnimationSignal {
    pub entity: Entity,
    pub kind: AnimationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationKind {
    /// Discrete trigger: watch/alert пауза
    Watching,
    /// Discrete trigger: attack
    Attack,
    /// Persistent state: Patrol(0) / Chase(1)
    Walking(i32),
}
