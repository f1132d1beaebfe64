//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: маркеры и базовые характеристики (Player, Monster, Wall, NetId)
//! - perception: state machine, chase tracking, sub-behavior таймеры
//! - navigation: path-following agent абстракция (NavAgent)

pub mod actor;
pub mod navigation;
pub mod perception;

// Re-exports для удобного импорта
pub use actor::*;
pub use navigation::*;
pub use perception::*;
