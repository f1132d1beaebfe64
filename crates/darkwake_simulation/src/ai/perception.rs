//! Perception controller — FSM системы монстра
//!
//! Состояния: Patrol (wander), Idle (watch, агент остановлен), Chase
//! (преследование последней услышанной позиции), Attack (engaged, агент
//! остановлен). Каждый участник сессии симулирует perception каждого агента
//! локально: одинаковые sound стимулы → одинаковые состояния без шаринга
//! perception state между клиентами.

use bevy::prelude::*;
use rand::Rng;

use crate::audio::bus::play_oneshot;
use crate::audio::{SoundLibrary, SoundPlayed};
use crate::components::{
    AttackRecovery, ChaseLoop, DetectionCooldown, Monster, NavAgent, Perception,
    PerceptionConfig, PerceptionState, Player, SpeedProfile, Wall, WanderLoop, WatchTimer,
};
use crate::error::SimulationError;
use crate::logger;
use crate::navigation::NavSurface;
use crate::spatial::{count_walls_between, sphere_overlap};
use crate::DeterministicRng;

use super::{AnimationKind, AnimationSignal, SoundHeard};

/// Клип wander рыка (регистрируется хостом; unknown key логируется и скипается)
pub const GROWL_CLIP: &str = "Monster_Growl";
/// Falloff рыка — шире footstep профиля, рык слышен издалека
pub const GROWL_MIN_DISTANCE: f32 = 5.0;
pub const GROWL_MAX_DISTANCE: f32 = 50.0;

/// Вход в watch: агент останавливается, Idle на watch_duration
///
/// Guard: вход отклоняется если агент атакует или уже Idle (идемпотентный
/// re-entry запрещён). Возвращает true если переход состоялся.
pub fn trigger_watch(
    commands: &mut Commands,
    entity: Entity,
    perception: &Perception,
    state: &mut PerceptionState,
    agent: &mut NavAgent,
    config: &PerceptionConfig,
    anim: &mut EventWriter<AnimationSignal>,
) -> bool {
    if perception.is_attacking || *state == PerceptionState::Idle {
        return false;
    }

    agent.halt(true);
    *state = PerceptionState::Idle;
    anim.write(AnimationSignal {
        entity,
        kind: AnimationKind::Watching,
    });
    commands.entity(entity).insert(WatchTimer {
        remaining: config.watch_duration,
    });
    true
}

/// Попытка входа в attack
///
/// Gates: не атакуем уже, detected player существует, дистанция в пределах
/// stopping distance. Агент останавливается и ориентируется на игрока
/// (только yaw, горизонтальная плоскость).
pub fn try_trigger_attack(
    commands: &mut Commands,
    entity: Entity,
    perception: &mut Perception,
    state: &mut PerceptionState,
    agent: &mut NavAgent,
    transform: &mut Transform,
    player_position: Vec3,
    config: &PerceptionConfig,
    anim: &mut EventWriter<AnimationSignal>,
) -> bool {
    if perception.is_attacking || perception.detected_player.is_none() {
        return false;
    }

    let distance = transform.translation.distance(player_position);
    if distance > agent.stopping_distance {
        return false;
    }

    perception.is_attacking = true;

    // Yaw-only ориентация на игрока
    let mut direction = player_position - transform.translation;
    direction.y = 0.0;
    if direction.length_squared() > 1e-6 {
        transform.look_to(direction.normalize(), Vec3::Y);
    }

    agent.halt(true);
    anim.write(AnimationSignal {
        entity,
        kind: AnimationKind::Attack,
    });
    *state = PerceptionState::Attack;
    commands.entity(entity).insert(AttackRecovery {
        remaining: config.attack_duration,
    });

    logger::log(&format!("{:?} attack triggered", entity));
    true
}

/// Выход из chase обратно в patrol: нормальная скорость, wander возобновлён
fn stop_chasing(
    commands: &mut Commands,
    entity: Entity,
    perception: &mut Perception,
    state: &mut PerceptionState,
    agent: &mut NavAgent,
    profile: &SpeedProfile,
) {
    perception.is_chasing = false;
    perception.chase_target = None;
    agent.set_speed(profile.normal);
    *state = PerceptionState::Patrol;
    commands
        .entity(entity)
        .remove::<ChaseLoop>()
        .insert(WanderLoop);
}

/// Равномерная точка внутри диска радиуса radius на плоскости XZ
///
/// Rejection sampling по описанному квадрату: offset.length() <= radius
/// всегда — углы квадрата никогда не попадают в выборку.
pub(crate) fn wander_offset(rng: &mut impl Rng, radius: f32) -> Vec3 {
    loop {
        let x = rng.gen_range(-1.0_f32..1.0);
        let z = rng.gen_range(-1.0_f32..1.0);
        if x * x + z * z <= 1.0 {
            return Vec3::new(x, 0.0, z) * radius;
        }
    }
}

/// Occlusion-aware прямой detection: первый qualifying кандидат nearest-first
///
/// adjusted_radius = detection_radius − wall_penalty × wallCount; кандидат
/// detected iff distance ≤ adjusted_radius. Nearest-first — выбранная
/// детерминированная policy вместо порядка физического query.
pub(crate) fn run_detection(
    origin: Vec3,
    perception: &Perception,
    config: &PerceptionConfig,
    players: &[(Entity, Vec3)],
    walls: &[(&Wall, &Transform)],
) -> Option<(Entity, Vec3)> {
    let candidates = sphere_overlap(origin, perception.detection_radius, players.iter().copied());

    for (candidate, distance) in candidates {
        let position = players
            .iter()
            .find(|(entity, _)| *entity == candidate)
            .map(|(_, pos)| *pos)?;

        let wall_count = count_walls_between(origin, position, walls.iter().copied());
        let adjusted_radius =
            perception.detection_radius - config.wall_penalty * wall_count as f32;

        if distance <= adjusted_radius {
            logger::log(&format!(
                "player detected: walls={}, adjusted_radius={:.1}",
                wall_count, adjusted_radius
            ));
            return Some((candidate, position));
        }
    }
    None
}

/// Система: инициализация заспавненных монстров
///
/// Спавн начинается с watch паузы; wander стартует на её истечении.
pub fn on_monster_spawned(
    mut commands: Commands,
    mut monsters: Query<
        (
            Entity,
            &Perception,
            &mut PerceptionState,
            &mut NavAgent,
            &SpeedProfile,
            &PerceptionConfig,
        ),
        Added<Monster>,
    >,
    mut anim: EventWriter<AnimationSignal>,
) {
    for (entity, perception, mut state, mut agent, profile, config) in monsters.iter_mut() {
        agent.set_speed(profile.normal);
        trigger_watch(
            &mut commands,
            entity,
            perception,
            &mut state,
            &mut agent,
            config,
            &mut anim,
        );
    }
}

/// Система: реакция на sound стимулы
///
/// Каждый стимул обновляет chase target на последнюю услышанную позицию;
/// chase стартует только если ещё не идёт — повторный стимул не
/// перезапускает reaffirmation loop (идемпотентность).
pub fn sound_reactions(
    mut commands: Commands,
    mut heard: EventReader<SoundHeard>,
    mut monsters: Query<
        (
            &mut Perception,
            &mut PerceptionState,
            &mut NavAgent,
            &SpeedProfile,
        ),
        With<Monster>,
    >,
) {
    for stimulus in heard.read() {
        let Ok((mut perception, mut state, mut agent, profile)) =
            monsters.get_mut(stimulus.listener)
        else {
            continue;
        };

        perception.chase_target = Some(stimulus.position);

        if !perception.is_chasing {
            agent.set_destination(stimulus.position);
            agent.set_speed(profile.chase);
            perception.is_chasing = true;
            *state = PerceptionState::Chase;
            // Wander отменяется явно; единственный chase loop на агента
            commands
                .entity(stimulus.listener)
                .remove::<WanderLoop>()
                .insert(ChaseLoop { next_tick: 0.0 });
        }
    }
}

/// Система: chase reaffirmation loop (cadence 0.2 s)
///
/// Переподтверждает destination на самую свежую услышанную позицию; на
/// прибытии — однократный прямой detection: найден игрок → attack staging
/// мимо Patrol, иначе откат в Patrol wander.
pub fn chase_reaffirmation(
    mut commands: Commands,
    mut monsters: Query<
        (
            Entity,
            &mut Transform,
            &mut Perception,
            &mut PerceptionState,
            &mut NavAgent,
            &mut ChaseLoop,
            &SpeedProfile,
            &PerceptionConfig,
            Option<&DetectionCooldown>,
        ),
        With<Monster>,
    >,
    players: Query<(Entity, &Transform), (With<Player>, Without<Monster>)>,
    walls: Query<(&Wall, &Transform), Without<Monster>>,
    mut anim: EventWriter<AnimationSignal>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    let player_positions: Vec<(Entity, Vec3)> =
        players.iter().map(|(e, t)| (e, t.translation)).collect();
    let wall_list: Vec<(&Wall, &Transform)> = walls.iter().collect();

    for (
        entity,
        mut transform,
        mut perception,
        mut state,
        mut agent,
        mut chase,
        profile,
        config,
        cooldown,
    ) in monsters.iter_mut()
    {
        if !perception.is_chasing {
            // Loop superseded (attack начался) — снимаем явно
            commands.entity(entity).remove::<ChaseLoop>();
            continue;
        }

        chase.next_tick -= delta;
        if chase.next_tick > 0.0 {
            continue;
        }
        chase.next_tick = config.chase_cadence;

        let Some(target) = perception.chase_target else {
            continue;
        };

        // Bias к самому свежему стимулу: destination переподтверждается
        agent.set_destination(target);

        if !agent.has_arrived() {
            continue;
        }

        // Прибыли на источник звука
        perception.chase_target = None;
        perception.is_chasing = false;
        commands.entity(entity).remove::<ChaseLoop>();

        let detected = if cooldown.is_none() && !perception.is_attacking {
            run_detection(
                transform.translation,
                &perception,
                config,
                &player_positions,
                &wall_list,
            )
        } else {
            None
        };

        if let Some((player, position)) = detected {
            // Attack staging напрямую, минуя Patrol
            perception.detected_player = Some(player);
            try_trigger_attack(
                &mut commands,
                entity,
                &mut perception,
                &mut state,
                &mut agent,
                &mut transform,
                position,
                config,
                &mut anim,
            );
        } else {
            stop_chasing(
                &mut commands,
                entity,
                &mut perception,
                &mut state,
                &mut agent,
                profile,
            );
        }
    }
}

/// Система: прямой visual detection (каждый тик)
///
/// Скипается на detection cooldown и во время атаки. Нет qualifying
/// кандидата и не chasing → Idle/Watch.
pub fn detect_players(
    mut commands: Commands,
    mut monsters: Query<
        (
            Entity,
            &mut Transform,
            &mut Perception,
            &mut PerceptionState,
            &mut NavAgent,
            &PerceptionConfig,
        ),
        (With<Monster>, Without<DetectionCooldown>),
    >,
    players: Query<(Entity, &Transform), (With<Player>, Without<Monster>)>,
    walls: Query<(&Wall, &Transform), Without<Monster>>,
    mut anim: EventWriter<AnimationSignal>,
) {
    let player_positions: Vec<(Entity, Vec3)> =
        players.iter().map(|(e, t)| (e, t.translation)).collect();
    let wall_list: Vec<(&Wall, &Transform)> = walls.iter().collect();

    for (entity, mut transform, mut perception, mut state, mut agent, config) in
        monsters.iter_mut()
    {
        if perception.is_attacking {
            continue;
        }

        let detected = run_detection(
            transform.translation,
            &perception,
            config,
            &player_positions,
            &wall_list,
        );

        match detected {
            Some((player, position)) => {
                perception.detected_player = Some(player);
                try_trigger_attack(
                    &mut commands,
                    entity,
                    &mut perception,
                    &mut state,
                    &mut agent,
                    &mut transform,
                    position,
                    config,
                    &mut anim,
                );
            }
            None => {
                perception.detected_player = None;
                if !perception.is_chasing {
                    trigger_watch(
                        &mut commands,
                        entity,
                        &perception,
                        &mut state,
                        &mut agent,
                        config,
                        &mut anim,
                    );
                }
            }
        }
    }
}

/// Система: сближение с detected игроком
///
/// Пока игрок detected и атака ещё не идёт — destination на его текущую
/// позицию; на прибытии — attack gate.
pub fn approach_detected(
    mut commands: Commands,
    mut monsters: Query<
        (
            Entity,
            &mut Transform,
            &mut Perception,
            &mut PerceptionState,
            &mut NavAgent,
            &PerceptionConfig,
        ),
        With<Monster>,
    >,
    players: Query<&Transform, (With<Player>, Without<Monster>)>,
    mut anim: EventWriter<AnimationSignal>,
) {
    for (entity, mut transform, mut perception, mut state, mut agent, config) in
        monsters.iter_mut()
    {
        if perception.is_attacking {
            continue;
        }
        let Some(player) = perception.detected_player else {
            continue;
        };

        // Игрок мог исчезнуть из мира — weak handle, не ownership
        let Ok(player_transform) = players.get(player) else {
            perception.detected_player = None;
            continue;
        };
        let player_position = player_transform.translation;

        agent.set_destination(player_position);

        if agent.has_arrived() {
            try_trigger_attack(
                &mut commands,
                entity,
                &mut perception,
                &mut state,
                &mut agent,
                &mut transform,
                player_position,
                config,
                &mut anim,
            );
        }
    }
}

/// Система: attack resolution таймер
///
/// На завершении: detected player очищен, движение разморожено, re-вход
/// в watch, старт detection cooldown; wander возобновляется если не chasing.
pub fn attack_recovery_tick(
    mut commands: Commands,
    mut monsters: Query<(
        Entity,
        &mut AttackRecovery,
        &mut Perception,
        &mut PerceptionState,
        &mut NavAgent,
        &PerceptionConfig,
    )>,
    mut anim: EventWriter<AnimationSignal>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut recovery, mut perception, mut state, mut agent, config) in
        monsters.iter_mut()
    {
        recovery.remaining -= delta;
        if recovery.remaining > 0.0 {
            continue;
        }

        commands.entity(entity).remove::<AttackRecovery>();

        perception.detected_player = None;
        perception.is_attacking = false;
        agent.halt(false);

        trigger_watch(
            &mut commands,
            entity,
            &perception,
            &mut state,
            &mut agent,
            config,
            &mut anim,
        );

        // Подавление re-detection после завершённого attack цикла
        commands.entity(entity).insert(DetectionCooldown {
            remaining: config.detection_cooldown,
        });

        if !perception.is_chasing {
            commands.entity(entity).insert(WanderLoop);
        }
    }
}

/// Система: watch dwell таймер
///
/// На истечении движение размораживается; wander возобновляется только если
/// за время паузы не начались chase или attack.
pub fn watch_tick(
    mut commands: Commands,
    mut monsters: Query<(Entity, &mut WatchTimer, &Perception, &mut NavAgent)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut watch, perception, mut agent) in monsters.iter_mut() {
        watch.remaining -= delta;
        if watch.remaining > 0.0 {
            continue;
        }

        commands.entity(entity).remove::<WatchTimer>();
        agent.halt(false);

        if !perception.is_chasing && !perception.is_attacking {
            commands.entity(entity).insert(WanderLoop);
        }
    }
}

/// Система: detection cooldown таймер
pub fn cooldown_tick(
    mut commands: Commands,
    mut monsters: Query<(Entity, &mut DetectionCooldown)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut cooldown) in monsters.iter_mut() {
        cooldown.remaining -= delta;
        if cooldown.remaining <= 0.0 {
            commands.entity(entity).remove::<DetectionCooldown>();
        }
    }
}

/// Система: wander sub-behavior (Patrol, не chasing)
///
/// Ближайший игрок в радиусе интереса → случайная точка в wander сфере,
/// snap на walkable surface; неудачный snap — не ошибка, а policy сигнал
/// паузы (Idle/Watch в том же тике). Игрок дальше радиуса — drift к его
/// последней позиции вместо случайного блуждания.
pub fn wander_tick(
    mut commands: Commands,
    mut monsters: Query<
        (
            Entity,
            &Transform,
            &Perception,
            &mut PerceptionState,
            &mut NavAgent,
            &PerceptionConfig,
        ),
        (With<Monster>, With<WanderLoop>),
    >,
    players: Query<&Transform, (With<Player>, Without<Monster>)>,
    surface: Res<NavSurface>,
    library: Res<SoundLibrary>,
    mut rng: ResMut<DeterministicRng>,
    mut played: EventWriter<SoundPlayed>,
    mut anim: EventWriter<AnimationSignal>,
) {
    for (entity, transform, perception, mut state, mut agent, config) in monsters.iter_mut() {
        if perception.is_chasing {
            commands.entity(entity).remove::<WanderLoop>();
            continue;
        }
        if agent.halted {
            // Watch пауза: loop жив, но не двигает агента
            continue;
        }

        // Ближайший игрок (drift-to-activity bias)
        let Some(nearest) = players
            .iter()
            .map(|t| t.translation)
            .min_by(|a, b| {
                let da = transform.translation.distance(*a);
                let db = transform.translation.distance(*b);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
        else {
            continue;
        };

        let distance_to_player = transform.translation.distance(nearest);

        if distance_to_player <= config.interest_radius {
            if !agent.has_arrived() && agent.destination.is_some() {
                continue;
            }

            // Случайная точка внутри wander сферы вокруг агента
            let offset = wander_offset(&mut rng.rng, config.wander_radius);
            let candidate = transform.translation + offset;

            match surface.sample_position(candidate, config.surface_search_radius) {
                Some(destination) => {
                    agent.set_destination(destination);
                    play_oneshot(
                        &library,
                        &mut played,
                        GROWL_CLIP,
                        transform.translation,
                        GROWL_MIN_DISTANCE,
                        GROWL_MAX_DISTANCE,
                        1.0,
                    );
                    *state = PerceptionState::Patrol;
                }
                None => {
                    // Невалидная позиция — пауза вместо движения в неё
                    trigger_watch(
                        &mut commands,
                        entity,
                        perception,
                        &mut state,
                        &mut agent,
                        config,
                        &mut anim,
                    );
                }
            }
        } else {
            // Игрок далеко: идём к его последней известной позиции
            match surface.sample_position(nearest, config.surface_search_radius) {
                Some(destination) => {
                    agent.set_destination(destination);
                    *state = PerceptionState::Patrol;
                }
                None => {
                    logger::log("wander: surface sample failed for drift target");
                }
            }
        }
    }
}

/// Проверка зависимостей агента при внешней сборке entity
///
/// Required Components покрывают обычный спавн; собранные вручную или
/// десериализованные entity валидируются явно — отсутствие nav agent или
/// perception fatal для агента.
pub fn validate_agent(world: &World, entity: Entity) -> Result<(), SimulationError> {
    if world.get::<NavAgent>(entity).is_none() {
        return Err(SimulationError::MissingDependency {
            entity,
            component: "NavAgent",
        });
    }
    if world.get::<Perception>(entity).is_none() {
        return Err(SimulationError::MissingDependency {
            entity,
            component: "Perception",
        });
    }
    if world.get::<PerceptionState>(entity).is_none() {
        return Err(SimulationError::MissingDependency {
            entity,
            component: "PerceptionState",
        });
    }
    Ok(())
}

/// Система: синхронизация walking сигнала с animation sink
///
/// Persistent integer state: Patrol → 0, Chase → 1 (по contract animation
/// sink'а); Idle/Attack walking состояние не трогают.
pub fn walk_animation_sync(
    monsters: Query<(Entity, &PerceptionState), (With<Monster>, Changed<PerceptionState>)>,
    mut anim: EventWriter<AnimationSignal>,
) {
    for (entity, state) in monsters.iter() {
        let walking = match state {
            PerceptionState::Patrol => Some(0),
            PerceptionState::Chase => Some(1),
            PerceptionState::Idle | PerceptionState::Attack => None,
        };
        if let Some(value) = walking {
            anim.write(AnimationSignal {
                entity,
                kind: AnimationKind::Walking(value),
            });
        }
    }
}
