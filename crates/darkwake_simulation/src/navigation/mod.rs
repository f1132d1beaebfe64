//! Headless navigation: walkable surface sampling + NavAgent интегратор
//!
//! Заменяет внешний navigation stack в headless симуляции: NavSurface —
//! набор walkable прямоугольников (аналог navmesh), интегратор двигает
//! Transform к destination со скоростью агента каждый fixed тик.

use bevy::prelude::*;

use crate::components::NavAgent;

/// Walkable surface: набор axis-aligned прямоугольников на плоскости Y
///
/// sample_position — аналог NavMesh.SamplePosition: ближайшая точка
/// на любом walkable прямоугольнике в пределах search радиуса, либо None.
/// None — не ошибка, а policy сигнал (perception уходит в Idle/Watch).
#[derive(Resource, Debug, Clone, Default)]
pub struct NavSurface {
    pub regions: Vec<SurfaceRegion>,
}

#[derive(Debug, Clone, Copy)]
pub struct SurfaceRegion {
    pub min: Vec2,
    pub max: Vec2,
    pub height: f32,
}

impl NavSurface {
    /// Одна большая плоскость — дефолт для тестов и headless прогонов
    pub fn single_plane(half_size: f32) -> Self {
        Self {
            regions: vec![SurfaceRegion {
                min: Vec2::splat(-half_size),
                max: Vec2::splat(half_size),
                height: 0.0,
            }],
        }
    }

    /// Ближайшая walkable точка к point в пределах max_search_radius
    pub fn sample_position(&self, point: Vec3, max_search_radius: f32) -> Option<Vec3> {
        let mut best: Option<(Vec3, f32)> = None;

        for region in &self.regions {
            let clamped = Vec3::new(
                point.x.clamp(region.min.x, region.max.x),
                region.height,
                point.z.clamp(region.min.y, region.max.y),
            );
            let distance = point.distance(clamped);
            if distance > max_search_radius {
                continue;
            }
            match best {
                Some((_, best_distance)) if best_distance <= distance => {}
                _ => best = Some((clamped, distance)),
            }
        }

        best.map(|(pos, _)| pos)
    }
}

/// Система: headless интегратор NavAgent
///
/// Двигает Transform к destination, обновляет remaining_distance,
/// сбрасывает path_pending (путь "готов" на следующий тик после запроса).
pub fn nav_agent_integrator(
    mut agents: Query<(&mut NavAgent, &mut Transform)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (mut agent, mut transform) in agents.iter_mut() {
        let Some(destination) = agent.destination else {
            agent.remaining_distance = f32::INFINITY;
            continue;
        };

        agent.path_pending = false;
        agent.remaining_distance = transform.translation.distance(destination);

        if agent.halted {
            continue;
        }

        let step = agent.speed * delta;
        if agent.remaining_distance <= step {
            transform.translation = destination;
            agent.remaining_distance = 0.0;
        } else {
            let direction = (destination - transform.translation).normalize_or_zero();
            transform.translation += direction * step;
            agent.remaining_distance -= step;
        }
    }
}

pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NavSurface>()
            .add_systems(
                FixedUpdate,
                nav_agent_integrator.in_set(crate::SimulationSet::Navigation),
            );
    }
}
