//! Perception FSM integration tests
//!
//! Headless сценарии: spawn watch, chase → arrival → patrol fallback,
//! attack staging + detection cooldown, wander surface-snap failure,
//! детерминизм прогонов с одинаковым seed.

use bevy::prelude::*;
use darkwake_simulation::*;

fn create_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app.insert_resource(NavSurface::single_plane(500.0));
    app
}

fn spawn_monster(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            Monster,
            SpeedProfile::default(),
            PerceptionConfig::default(),
            Transform::from_translation(position),
        ))
        .id()
}

fn spawn_player(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((Player, Transform::from_translation(position)))
        .id()
}

fn emit_sound(app: &mut App, position: Vec3, range: f32) {
    app.world_mut()
        .resource_mut::<RpcOutbox>()
        .send(RpcCall::EmitSound {
            position: position.to_array(),
            range,
        });
}

fn step(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        step_simulation(app);
    }
}

fn perception(app: &App, entity: Entity) -> Perception {
    app.world().get::<Perception>(entity).unwrap().clone()
}

fn state(app: &App, entity: Entity) -> PerceptionState {
    *app.world().get::<PerceptionState>(entity).unwrap()
}

fn nav(app: &App, entity: Entity) -> NavAgent {
    app.world().get::<NavAgent>(entity).unwrap().clone()
}

/// Тиков в секунде симуляции (60 Hz fixed)
const TPS: usize = 60;

#[test]
fn test_spawn_starts_with_watch_pause() {
    let mut app = create_app(42);
    let monster = spawn_monster(&mut app, Vec3::ZERO);
    spawn_player(&mut app, Vec3::new(40.0, 0.0, 0.0));

    step(&mut app, 1);

    assert_eq!(state(&app, monster), PerceptionState::Idle);
    assert!(nav(&app, monster).halted);
    assert!(app.world().get::<WatchTimer>(monster).is_some());

    // После dwell 3.11 s движение размораживается и wander стартует
    step(&mut app, 3 * TPS + 20);
    assert!(
        nav(&app, monster).destination.is_some(),
        "wander должен выбрать destination после watch паузы"
    );
}

#[test]
fn test_watch_dwell_not_restarted_by_reentry() {
    let mut app = create_app(42);
    let monster = spawn_monster(&mut app, Vec3::ZERO);
    // Игрок вне detection радиуса: detect каждый тик пытается watch,
    // guard обязан отклонять re-entry пока Idle
    spawn_player(&mut app, Vec3::new(40.0, 0.0, 0.0));

    step(&mut app, 10);
    let first = app.world().get::<WatchTimer>(monster).unwrap().remaining;

    step(&mut app, 10);
    let second = app.world().get::<WatchTimer>(monster).unwrap().remaining;

    assert!(
        second < first,
        "таймер должен монотонно убывать, не сбрасываться re-entry"
    );
    let expected = first - 10.0 / TPS as f32;
    assert!((second - expected).abs() < 1e-3);
}

#[test]
fn test_sound_starts_chase_with_chase_speed() {
    let mut app = create_app(42);
    let monster = spawn_monster(&mut app, Vec3::ZERO);
    step(&mut app, 1);

    let origin = Vec3::new(50.0, 0.0, 0.0);
    emit_sound(&mut app, origin, 100.0);
    step(&mut app, 1);

    let p = perception(&app, monster);
    assert!(p.is_chasing);
    assert_eq!(p.chase_target, Some(origin));
    assert_eq!(state(&app, monster), PerceptionState::Chase);

    let agent = nav(&app, monster);
    assert_eq!(agent.speed, SpeedProfile::default().chase);
    assert_eq!(agent.destination, Some(origin));

    // Wander loop отменён, chase loop единственный активный
    step(&mut app, 1);
    assert!(app.world().get::<WanderLoop>(monster).is_none());
    assert!(app.world().get::<ChaseLoop>(monster).is_some());

    // Animation sink получил walking=1
    let signals = app.world().resource::<Events<AnimationSignal>>();
    let mut cursor = signals.get_cursor();
    assert!(cursor
        .read(signals)
        .any(|s| s.kind == AnimationKind::Walking(1)));
}

#[test]
fn test_chase_arrival_without_player_falls_back_to_patrol() {
    let mut app = create_app(42);
    let monster = spawn_monster(&mut app, Vec3::ZERO);
    // Игрок далеко: на месте прибытия detection ничего не найдёт
    spawn_player(&mut app, Vec3::new(300.0, 0.0, 0.0));
    step(&mut app, 1);

    let origin = Vec3::new(12.0, 0.0, 0.0);
    emit_sound(&mut app, origin, 40.0);

    // Watch пауза (3.11 s) + путь 12 m на 6 m/s + cadence запас
    step(&mut app, 6 * TPS);

    let p = perception(&app, monster);
    assert!(!p.is_chasing, "chase должен завершиться прибытием");
    assert!(p.chase_target.is_none());
    assert!(p.detected_player.is_none());
    assert_ne!(state(&app, monster), PerceptionState::Chase);
    assert_ne!(state(&app, monster), PerceptionState::Attack);

    let agent = nav(&app, monster);
    assert_eq!(
        agent.speed,
        SpeedProfile::default().normal,
        "скорость должна вернуться к normal после chase"
    );

    // Монстр реально дошёл до источника звука
    let position = app.world().get::<Transform>(monster).unwrap().translation;
    assert!(position.distance(origin) <= agent.stopping_distance + 0.5);
}

#[test]
fn test_detection_and_attack_cycle_with_cooldown() {
    let mut app = create_app(42);
    // Маленькая walkable плоскость: wander не уводит монстра от игрока
    app.insert_resource(NavSurface::single_plane(4.0));

    let monster = spawn_monster(&mut app, Vec3::new(3.0, 0.0, 0.0));
    let player = spawn_player(&mut app, Vec3::ZERO);
    step(&mut app, 1);

    // Игрок в detection радиусе без стен → detected сразу
    assert_eq!(perception(&app, monster).detected_player, Some(player));

    // Атака невозможна пока дистанция > stopping distance; watch пауза
    // держит агента на месте первые 3.11 s
    assert!(!perception(&app, monster).is_attacking);

    // После паузы монстр сближается и атакует
    step(&mut app, 4 * TPS);
    assert!(perception(&app, monster).is_attacking);
    assert_eq!(state(&app, monster), PerceptionState::Attack);
    assert!(nav(&app, monster).halted);

    // Attack resolution 2.1 s → cleanup + detection cooldown 10 s
    step(&mut app, 3 * TPS);
    let p = perception(&app, monster);
    assert!(!p.is_attacking);
    assert!(p.detected_player.is_none());
    assert!(app.world().get::<DetectionCooldown>(monster).is_some());

    // Пока cooldown активен — никакого re-detection, игрок рядом всё время
    step(&mut app, 5 * TPS);
    let p = perception(&app, monster);
    assert!(!p.is_attacking, "re-detection подавлен на cooldown");
    assert!(p.detected_player.is_none());

    // Cooldown истёк (10 s с конца атаки) → цикл повторяется
    step(&mut app, 7 * TPS);
    assert!(app.world().get::<DetectionCooldown>(monster).is_none());
    step(&mut app, 5 * TPS);
    assert!(
        perception(&app, monster).is_attacking
            || app.world().get::<DetectionCooldown>(monster).is_some(),
        "после cooldown монстр должен снова атаковать"
    );
}

#[test]
fn test_attack_unreachable_without_detected_player() {
    let mut app = create_app(42);
    let monster = spawn_monster(&mut app, Vec3::ZERO);
    // Мир без игроков вообще
    for _ in 0..(8 * TPS) {
        step_simulation(&mut app);
        assert_ne!(state(&app, monster), PerceptionState::Attack);
        assert!(!perception(&app, monster).is_attacking);
    }
}

#[test]
fn test_wall_blocks_detection_but_not_approach_radius() {
    let mut app = create_app(42);
    let monster = spawn_monster(&mut app, Vec3::ZERO);
    // Игрок на 18 м за одной стеной: adjusted radius 15 < 18 → не detected
    spawn_player(&mut app, Vec3::new(18.0, 0.0, 0.0));
    app.world_mut().spawn((
        Wall::default(),
        Transform::from_translation(Vec3::new(9.0, 0.0, 0.0)),
    ));

    step(&mut app, 2);
    assert!(perception(&app, monster).detected_player.is_none());
}

#[test]
fn test_wander_surface_failure_pauses_agent() {
    let mut app = create_app(42);
    // Пустая walkable поверхность: каждый surface snap обязан фейлиться
    app.insert_resource(NavSurface::default());

    let monster = spawn_monster(&mut app, Vec3::ZERO);
    // Игрок в радиусе интереса, вне detection
    spawn_player(&mut app, Vec3::new(30.0, 0.0, 0.0));

    step(&mut app, 8 * TPS);

    // Snap failure — policy сигнал паузы: destination никогда не ставится,
    // агент остаётся в Idle/Watch
    let agent = nav(&app, monster);
    assert!(agent.destination.is_none());
    assert_eq!(state(&app, monster), PerceptionState::Idle);
    assert!(agent.halted);
}

#[test]
fn test_drift_toward_distant_player() {
    let mut app = create_app(42);
    let monster = spawn_monster(&mut app, Vec3::ZERO);
    // Игрок за радиусом интереса (50) → drift к его позиции вместо wander
    let player_pos = Vec3::new(120.0, 0.0, 0.0);
    spawn_player(&mut app, player_pos);

    // Watch пауза + первый wander тик
    step(&mut app, 4 * TPS);

    let agent = nav(&app, monster);
    assert_eq!(
        agent.destination,
        Some(player_pos),
        "drift-to-activity: destination — позиция игрока"
    );
}

#[test]
fn test_wander_destinations_stay_inside_wander_sphere() {
    let mut app = create_app(7);
    // Высокая базовая скорость — частые arrival → новый pick циклы
    let monster = app
        .world_mut()
        .spawn((
            Monster,
            SpeedProfile {
                normal: 20.0,
                chase: 6.0,
            },
            PerceptionConfig::default(),
            Transform::from_translation(Vec3::ZERO),
        ))
        .id();
    // Долгий cooldown подавляет detection: wander идёт без watch пауз
    app.world_mut().entity_mut(monster).insert(DetectionCooldown {
        remaining: f32::INFINITY,
    });

    let player_pos = Vec3::new(30.0, 0.0, 0.0);
    spawn_player(&mut app, player_pos);

    let radius = PerceptionConfig::default().wander_radius;
    let mut last_destination = None;
    let mut picks = 0;

    for _ in 0..(90 * TPS) {
        let position = app.world().get::<Transform>(monster).unwrap().translation;
        step_simulation(&mut app);

        let destination = nav(&app, monster).destination;
        if destination != last_destination {
            // Drift на позицию игрока — не случайный wander pick
            if let Some(dest) = destination.filter(|d| *d != player_pos) {
                picks += 1;
                let reach = position.distance(dest);
                assert!(
                    reach <= radius + 1.0,
                    "wander destination в {:.1} от агента при радиусе {}",
                    reach,
                    radius
                );
            }
            last_destination = destination;
        }
    }

    assert!(picks >= 5, "ожидалось несколько wander picks, получено {}", picks);
}

#[test]
fn test_determinism_same_seed() {
    const SEED: u64 = 12345;
    const TICKS: usize = 600;

    let snapshot1 = run_scenario(SEED, TICKS);
    let snapshot2 = run_scenario(SEED, TICKS);

    assert_eq!(
        snapshot1, snapshot2,
        "Симуляция с одинаковым seed ({}) дала разные результаты!",
        SEED
    );
}

/// Полный сценарий: footstep bus + chase + wander, snapshot perception
fn run_scenario(seed: u64, ticks: usize) -> Vec<u8> {
    let mut app = create_app(seed);
    {
        let mut library = app.world_mut().resource_mut::<SoundLibrary>();
        library
            .register(SoundClip::new("Footstep_01", vec![1]))
            .unwrap();
        library
            .register(SoundClip::new("Footstep_02", vec![2]))
            .unwrap();
    }

    spawn_monster(&mut app, Vec3::new(40.0, 0.0, 0.0));
    spawn_monster(&mut app, Vec3::new(-25.0, 0.0, 10.0));
    app.world_mut().spawn((
        Player,
        LocalAuthority,
        FootstepEmitter::default(),
        Locomotion { speed: 3.0 },
        Transform::from_translation(Vec3::ZERO),
    ));

    for _ in 0..ticks {
        step_simulation(&mut app);
    }

    let mut snapshot = world_snapshot::<Perception>(app.world_mut());
    snapshot.extend(world_snapshot::<PerceptionState>(app.world_mut()));
    snapshot.extend(world_snapshot::<Transform>(app.world_mut()));
    snapshot
}
