//! Tests for perception FSM components and detection logic.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::super::perception::{run_detection, validate_agent, wander_offset};
    use crate::components::{
        Monster, NavAgent, Perception, PerceptionConfig, PerceptionState, Wall,
    };

    #[test]
    fn test_perception_state_default_is_patrol() {
        let state = PerceptionState::default();
        assert_eq!(state, PerceptionState::Patrol);
    }

    #[test]
    fn test_perception_defaults() {
        let perception = Perception::default();
        assert_eq!(perception.detection_radius, 20.0);
        assert!(perception.chase_target.is_none());
        assert!(perception.detected_player.is_none());
        assert!(!perception.is_chasing);
        assert!(!perception.is_attacking);
    }

    #[test]
    fn test_perception_config_defaults() {
        let config = PerceptionConfig::default();
        assert_eq!(config.wall_penalty, 5.0);
        assert_eq!(config.interest_radius, 50.0);
        assert_eq!(config.wander_radius, 50.0);
        assert_eq!(config.watch_duration, 3.11);
        assert_eq!(config.attack_duration, 2.1);
        assert_eq!(config.detection_cooldown, 10.0);
        assert_eq!(config.chase_cadence, 0.2);
    }

    #[test]
    fn test_detection_without_walls() {
        // Игрок на 18м при радиусе 20 и 0 стен → detected
        let perception = Perception::default();
        let config = PerceptionConfig::default();
        let player = Entity::from_raw(1);
        let players = vec![(player, Vec3::new(18.0, 0.0, 0.0))];

        let detected = run_detection(Vec3::ZERO, &perception, &config, &players, &[]);
        assert_eq!(detected.map(|(e, _)| e), Some(player));
    }

    #[test]
    fn test_detection_blocked_by_one_wall() {
        // Тот же игрок за 1 стеной: adjusted radius 15 < 18 → не detected
        let perception = Perception::default();
        let config = PerceptionConfig::default();
        let player = Entity::from_raw(1);
        let players = vec![(player, Vec3::new(18.0, 0.0, 0.0))];

        let wall = Wall {
            half_extents: Vec3::new(0.5, 2.0, 2.0),
        };
        let wall_transform = Transform::from_translation(Vec3::new(9.0, 0.0, 0.0));
        let walls = vec![(&wall, &wall_transform)];

        let detected = run_detection(Vec3::ZERO, &perception, &config, &players, &walls);
        assert!(detected.is_none());
    }

    #[test]
    fn test_detection_adjusted_radius_monotonic_in_walls() {
        // При фиксированной дистанции 12м: 0 стен detected, 1 стена detected
        // (15 ≥ 12), 2 стены не detected (10 < 12)
        let perception = Perception::default();
        let config = PerceptionConfig::default();
        let player = Entity::from_raw(1);
        let players = vec![(player, Vec3::new(12.0, 0.0, 0.0))];

        let wall = Wall {
            half_extents: Vec3::new(0.5, 2.0, 2.0),
        };
        let t1 = Transform::from_translation(Vec3::new(4.0, 0.0, 0.0));
        let t2 = Transform::from_translation(Vec3::new(8.0, 0.0, 0.0));

        let no_walls = run_detection(Vec3::ZERO, &perception, &config, &players, &[]);
        assert!(no_walls.is_some());

        let one_wall = run_detection(
            Vec3::ZERO,
            &perception,
            &config,
            &players,
            &[(&wall, &t1)],
        );
        assert!(one_wall.is_some());

        let two_walls = run_detection(
            Vec3::ZERO,
            &perception,
            &config,
            &players,
            &[(&wall, &t1), (&wall, &t2)],
        );
        assert!(two_walls.is_none());
    }

    #[test]
    fn test_detection_nearest_first_policy() {
        // Оба кандидата qualifying — выбирается ближайший
        let perception = Perception::default();
        let config = PerceptionConfig::default();
        let far = Entity::from_raw(1);
        let near = Entity::from_raw(2);
        let players = vec![
            (far, Vec3::new(15.0, 0.0, 0.0)),
            (near, Vec3::new(5.0, 0.0, 0.0)),
        ];

        let detected = run_detection(Vec3::ZERO, &perception, &config, &players, &[]);
        assert_eq!(detected.map(|(e, _)| e), Some(near));
    }

    #[test]
    fn test_detection_outside_radius() {
        let perception = Perception::default();
        let config = PerceptionConfig::default();
        let player = Entity::from_raw(1);
        let players = vec![(player, Vec3::new(25.0, 0.0, 0.0))];

        let detected = run_detection(Vec3::ZERO, &perception, &config, &players, &[]);
        assert!(detected.is_none());
    }

    #[test]
    fn test_wander_offset_inside_radius() {
        // Углы описанного квадрата (до radius·√2) не должны попадать в выборку
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let radius = 50.0;

        for _ in 0..500 {
            let offset = wander_offset(&mut rng, radius);
            assert!(
                offset.length() <= radius + 1e-3,
                "offset {:.1} за пределами радиуса {}",
                offset.length(),
                radius
            );
            assert_eq!(offset.y, 0.0);
        }
    }

    #[test]
    fn test_validate_agent_missing_dependencies() {
        let mut world = World::new();
        // Entity без nav agent / perception — fatal init
        let bare = world.spawn_empty().id();
        assert!(validate_agent(&world, bare).is_err());

        // Monster spawn через Required Components — всё на месте
        let monster = world.spawn(Monster).id();
        assert!(validate_agent(&world, monster).is_ok());
        assert!(world.get::<NavAgent>(monster).is_some());
        assert!(world.get::<Perception>(monster).is_some());
    }
}
