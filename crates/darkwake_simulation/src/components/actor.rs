//! Базовые компоненты акторов: Player, Monster, Wall, Locomotion

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::navigation::NavAgent;
use crate::components::perception::{Perception, PerceptionState};

/// Игрок — цель detection и источник footstep звуков
///
/// Автоматически добавляет Locomotion через Required Components.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Locomotion, Transform)]
pub struct Player;

/// Монстр — агент с sound-driven perception
///
/// Required Components гарантируют что у агента всегда есть nav agent и
/// perception state: отсутствие любой из зависимостей — fatal init ошибка
/// (MissingDependency), агент без них не функционирует.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(NavAgent, Perception, PerceptionState, Transform)]
pub struct Monster;

/// Стена — occlusion geometry (axis-aligned box вокруг Transform)
///
/// Visual detection считает сколько стен пересекает ray agent→candidate;
/// sound propagation стены игнорирует (монстр слышит сквозь стены).
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Wall {
    pub half_extents: Vec3,
}

impl Default for Wall {
    fn default() -> Self {
        Self {
            half_extents: Vec3::new(0.5, 2.0, 2.0), // Тонкая стена 1x4x4
        }
    }
}

/// Текущая скорость движения актора (m/s, выставляется движением хоста)
///
/// Footstep bus читает её для расчёта интервала шагов: стоим — шагов нет.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Locomotion {
    pub speed: f32,
}

impl Locomotion {
    pub fn is_moving(&self) -> bool {
        self.speed > 0.0
    }
}

/// Marker локальной авторитетности
///
/// Только локально контролируемый участник решает эмитить ли footstep event —
/// иначе каждый клиент сессии broadcast'ил бы один и тот же физический шаг.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct LocalAuthority;

/// Профиль скоростей агента (immutable после спавна)
///
/// NavAgent.speed пишется из профиля только на переходах в/из Chase.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct SpeedProfile {
    pub normal: f32,
    pub chase: f32,
}

impl Default for SpeedProfile {
    fn default() -> Self {
        Self {
            normal: 2.0, // базовая скорость ходьбы
            chase: 6.0,
        }
    }
}

/// Session-stable ID для ссылок на entity в RPC payloads
///
/// Entity id не переживает границу сессии — registry NetId → Entity
/// резолвится локально один раз за dispatch (никаких string lookups).
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize,
)]
#[reflect(Component)]
pub struct NetId(pub u64);
