//! Perception компоненты: state machine, chase tracking, sub-behavior таймеры
//!
//! Sub-behaviors (wander, chase, watch, attack-recovery, cooldown) в оригинале
//! были корутинами; здесь каждая категория — компонент, presence которого и
//! есть "запущенный loop". Insert заменяет предыдущий instance той же
//! категории, так что дублирующих loops (гонки destination-setting) не бывает,
//! а cancellation всегда явная — по handle категории.

use bevy::prelude::*;

/// Состояния perception FSM
///
/// Инвариант: ровно одно значение на агента; Attack и Chase взаимоисключающи
/// с Idle в любой момент; повторный вход в Idle отклоняется (идемпотентный
/// re-entry запрещён контрактом trigger_watch).
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub enum PerceptionState {
    /// Patrol — wander в поисках активности
    Patrol,
    /// Idle — watch/alert пауза, агент остановлен
    Idle,
    /// Chase — преследование последней услышанной позиции
    Chase,
    /// Attack — engaged с напрямую обнаруженным игроком, агент остановлен
    Attack,
}

impl Default for PerceptionState {
    fn default() -> Self {
        Self::Patrol
    }
}

/// Perception state агента: chase target, detected player, флаги
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Perception {
    /// Последняя услышанная позиция (присутствует только пока Chase;
    /// tagged optional вместо sentinel позиции)
    pub chase_target: Option<Vec3>,
    /// Lookup handle на engaged игрока (не ownership);
    /// non-None только во время/на входе в Attack
    pub detected_player: Option<Entity>,
    pub is_chasing: bool,
    pub is_attacking: bool,
    /// Радиус прямого visual detection (метры)
    pub detection_radius: f32,
}

impl Default for Perception {
    fn default() -> Self {
        Self {
            chase_target: None,
            detected_player: None,
            is_chasing: false,
            is_attacking: false,
            detection_radius: 20.0,
        }
    }
}

/// Параметры perception (радиусы, таймауты)
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct PerceptionConfig {
    /// Occlusion штраф к detection радиусу за каждую стену (метры)
    pub wall_penalty: f32,
    /// Радиус интереса к ближайшему игроку (wander vs drift-to-activity)
    pub interest_radius: f32,
    /// Радиус сферы случайного wander destination
    pub wander_radius: f32,
    /// Радиус поиска surface snap для wander точки
    pub surface_search_radius: f32,
    /// Длительность watch паузы (секунды, unscaled)
    pub watch_duration: f32,
    /// Длительность attack resolution (секунды)
    pub attack_duration: f32,
    /// Подавление re-detection после атаки (секунды)
    pub detection_cooldown: f32,
    /// Cadence chase reaffirmation loop (секунды)
    pub chase_cadence: f32,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            wall_penalty: 5.0,
            interest_radius: 50.0,
            wander_radius: 50.0,
            surface_search_radius: 10.0,
            watch_duration: 3.11,
            attack_duration: 2.1,
            detection_cooldown: 10.0,
            chase_cadence: 0.2,
        }
    }
}

/// Loop: wander sub-behavior (активен пока Patrol и не chasing)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct WanderLoop;

/// Loop: chase reaffirmation (re-set destination каждые cadence секунд)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct ChaseLoop {
    /// Время до следующего reaffirm тика
    pub next_tick: f32,
}

/// Таймер watch паузы; на истечении агент снова может двигаться
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct WatchTimer {
    pub remaining: f32,
}

/// Таймер attack resolution; на истечении — cleanup и cooldown
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct AttackRecovery {
    pub remaining: f32,
}

/// Detection cooldown: пока присутствует, DetectPlayer подавлен
///
/// Owned perception controller'ом: вставляется только attack-recovery
/// системой, тикается только cooldown системой.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct DetectionCooldown {
    pub remaining: f32,
}
