//! Error kinds симуляции
//!
//! Все ошибки local-recoverable: симуляция никогда не паникует из-за них.
//! Remedy везде одинаковый — скипаем действие текущего тика, остаёмся
//! в безопасном состоянии.

use thiserror::Error;

/// Ошибки sound library / event bus
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// Клип с таким именем уже зарегистрирован (ключи уникальны,
    /// last-write-wins НЕ поддерживается — выбор задокументирован в DESIGN.md)
    #[error("sound clip '{0}' is already registered")]
    DuplicateKey(String),

    /// Lookup незарегистрированного имени — playback скипается, не крашится
    #[error("sound clip '{0}' is not registered")]
    UnknownClipKey(String),

    /// Footstep фильтр по префиксу не нашёл ни одного клипа —
    /// эмиссия подавляется, retry на следующем qualifying тике
    #[error("no registered clips match prefix '{0}'")]
    NoMatchingClips(String),
}

/// Ошибки инициализации агентов
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    /// Обязательная зависимость агента отсутствует при спавне
    /// (nav agent, perception) — fatal для агента, он не активируется
    #[error("agent {entity:?} is missing required dependency: {component}")]
    MissingDependency {
        entity: bevy::ecs::entity::Entity,
        component: &'static str,
    },
}
