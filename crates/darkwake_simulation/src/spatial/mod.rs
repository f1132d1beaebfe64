//! Spatial queries — headless замена физическому движку
//!
//! Sphere overlap и wall-count raycast поверх ECS компонентов, как
//! simple_collision_resolution заменяет коллайдеры в headless режиме.
//! Production хост может подменить их реальным physics backend'ом —
//! контракт тот же: set of entities / число пересечённых стен.

use bevy::prelude::*;

use crate::components::Wall;

/// Sphere overlap: entities в радиусе от центра
///
/// Возвращает (entity, distance), отсортированные nearest-first с tie-break
/// по entity index — детерминированный порядок кандидатов (выбранная policy
/// вместо query-order accident, см. DESIGN.md).
pub fn sphere_overlap(
    center: Vec3,
    radius: f32,
    candidates: impl IntoIterator<Item = (Entity, Vec3)>,
) -> Vec<(Entity, f32)> {
    let mut hits: Vec<(Entity, f32)> = candidates
        .into_iter()
        .filter_map(|(entity, pos)| {
            let distance = center.distance(pos);
            (distance <= radius).then_some((entity, distance))
        })
        .collect();

    hits.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.index().cmp(&b.0.index()))
    });
    hits
}

/// Число distinct стен, пересечённых отрезком start→end
///
/// Каждая стена — axis-aligned box вокруг её Transform; считается максимум
/// один раз независимо от числа входов/выходов луча.
pub fn count_walls_between<'a>(
    start: Vec3,
    end: Vec3,
    walls: impl IntoIterator<Item = (&'a Wall, &'a Transform)>,
) -> u32 {
    walls
        .into_iter()
        .filter(|(wall, transform)| {
            segment_intersects_aabb(
                start,
                end,
                transform.translation - wall.half_extents,
                transform.translation + wall.half_extents,
            )
        })
        .count() as u32
}

/// Slab test: пересекает ли отрезок [p0, p1] AABB [min, max]
fn segment_intersects_aabb(p0: Vec3, p1: Vec3, min: Vec3, max: Vec3) -> bool {
    let dir = p1 - p0;
    let mut t_min = 0.0_f32;
    let mut t_max = 1.0_f32;

    for axis in 0..3 {
        let d = dir[axis];
        let origin = p0[axis];

        if d.abs() < 1e-8 {
            // Параллельно slab'у: мимо если origin вне
            if origin < min[axis] || origin > max[axis] {
                return false;
            }
        } else {
            let inv = 1.0 / d;
            let mut t0 = (min[axis] - origin) * inv;
            let mut t1 = (max[axis] - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return false;
            }
        }
    }
    true
}
