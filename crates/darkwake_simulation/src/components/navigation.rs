//! Path-following агент (абстракция внешнего navigation stack)
//!
//! Симуляция потребляет только контракт set-destination / remaining-distance /
//! path-pending; в headless режиме destination интегрируется простым
//! перемещением к цели (navigation/mod.rs), в production хост заменяет
//! интегратор реальным pathfinding'ом.

use bevy::prelude::*;

/// Path-following agent state
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct NavAgent {
    /// Текущая цель (None = стоим)
    pub destination: Option<Vec3>,
    /// Скорость движения (m/s)
    pub speed: f32,
    /// Halt: движение заморожено, destination сохраняется
    pub halted: bool,
    /// Путь ещё строится (true один тик после set_destination)
    pub path_pending: bool,
    /// Оставшаяся дистанция до destination (обновляется интегратором)
    pub remaining_distance: f32,
    /// Радиус "прибыли" вокруг destination
    pub stopping_distance: f32,
}

impl Default for NavAgent {
    fn default() -> Self {
        Self {
            destination: None,
            speed: 2.0,
            halted: false,
            path_pending: false,
            remaining_distance: f32::INFINITY,
            stopping_distance: 1.5,
        }
    }
}

impl NavAgent {
    pub fn set_destination(&mut self, target: Vec3) {
        self.destination = Some(target);
        self.path_pending = true;
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn halt(&mut self, halted: bool) {
        self.halted = halted;
    }

    /// Прибыли: путь готов и остаток в пределах stopping distance
    pub fn has_arrived(&self) -> bool {
        !self.path_pending && self.remaining_distance <= self.stopping_distance
    }
}
