//! Sound Propagation Engine
//!
//! Каждый участник независимо исполняет одни и те же synchronized вызовы →
//! одинаковые SoundHeard стимулы у каждого монстра на каждом клиенте.
//! Hearing path range-only: occlusion НЕ применяется (слышно сквозь стены),
//! стены режут только visual detection — асимметрия intentional.

use bevy::prelude::*;

use crate::ai::SoundHeard;
use crate::components::{Monster, NetId};
use crate::logger;
use crate::net::{to_vec3, InboundRpc};
use crate::spatial::sphere_overlap;

use super::bus::SoundPlayed;
use super::SoundLibrary;

/// Cadence непрерывной эмиссии (секунды simulated time)
pub const CONTINUOUS_EMIT_CADENCE: f32 = 0.2;
/// Таймаут непрерывного источника
pub const CONTINUOUS_EMIT_TIMEOUT: f32 = 10.0;

/// Зарегистрированные позиции звуков (debug/visualization поверхность
/// для внешнего рендерера)
#[derive(Resource, Debug, Clone, Default)]
pub struct SoundPositions {
    pub positions: Vec<Vec3>,
}

/// Непрерывный источник звука (сирена и т.п.)
///
/// Пока присутствует — пропагация повторяется каждые cadence секунд от
/// текущей позиции source entity; снимается по таймауту или stop_sound.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct ContinuousSound {
    pub range: f32,
    /// Время до следующей эмиссии
    pub next_emit: f32,
    /// Время до авто-остановки
    pub remaining: f32,
}

impl ContinuousSound {
    pub fn new(range: f32) -> Self {
        Self {
            range,
            next_emit: 0.0,
            remaining: CONTINUOUS_EMIT_TIMEOUT,
        }
    }
}

/// Явная остановка непрерывного источника
pub fn stop_sound(commands: &mut Commands, source: Entity) {
    commands.entity(source).remove::<ContinuousSound>();
}

/// Пропагация one-shot звука: слушатели в радиусе → SoundHeard
///
/// Идемпотентно при повторной доставке: perception реагирует "chase к
/// последней услышанной позиции", а не аккумулирует стимулы.
pub fn propagate(
    origin: Vec3,
    range: f32,
    listeners: impl IntoIterator<Item = (Entity, Vec3)>,
    heard: &mut EventWriter<SoundHeard>,
) {
    for (listener, _distance) in sphere_overlap(origin, range, listeners) {
        heard.write(SoundHeard {
            listener,
            position: origin,
        });
    }
}

/// Система: исполнение входящих synchronized вызовов
///
/// Исполняется у каждого участника с идентичными аргументами — единственный
/// synchronized кусок state всей системы (perception каждый симулирует сам).
pub fn dispatch_inbound_rpc(
    mut commands: Commands,
    mut inbound: EventReader<InboundRpc>,
    library: Res<SoundLibrary>,
    mut positions: ResMut<SoundPositions>,
    mut played: EventWriter<SoundPlayed>,
    mut heard: EventWriter<SoundHeard>,
    listeners: Query<(Entity, &Transform), With<Monster>>,
    sources: Query<(Entity, &NetId, &Transform)>,
) {
    for InboundRpc(call) in inbound.read() {
        match call {
            crate::net::RpcCall::PlayFootstep { position, clip } => {
                let position = to_vec3(*position);
                match library.get(clip) {
                    Ok(found) => {
                        played.write(SoundPlayed {
                            clip: found.name.clone(),
                            position,
                            min_distance: super::bus::FOOTSTEP_MIN_DISTANCE,
                            max_distance: super::bus::FOOTSTEP_MAX_DISTANCE,
                            volume: super::bus::FOOTSTEP_VOLUME,
                        });
                    }
                    Err(err) => {
                        // Рассинхрон registry между участниками — скипаем playback
                        logger::log_error(&format!("footstep playback skipped: {}", err));
                    }
                }
            }

            crate::net::RpcCall::PlaySound {
                source,
                range,
                clip_key,
            } => {
                let Some((entity, _, transform)) =
                    sources.iter().find(|&(_, id, _)| *id == *source)
                else {
                    logger::log_warning(&format!(
                        "PlaySound: source {:?} не найден в registry",
                        source
                    ));
                    continue;
                };

                match library.get(clip_key) {
                    Ok(found) => {
                        played.write(SoundPlayed {
                            clip: found.name.clone(),
                            position: transform.translation,
                            min_distance: *range,
                            max_distance: range * 2.0,
                            volume: 1.0,
                        });
                        positions.positions.push(transform.translation);
                        // Источник начинает "шуметь": пропагация на cadence
                        // до явного stop или таймаута
                        commands.entity(entity).insert(ContinuousSound::new(*range));
                    }
                    Err(err) => {
                        logger::log_error(&format!("PlaySound skipped: {}", err));
                    }
                }
            }

            crate::net::RpcCall::RegisterSoundPosition { position } => {
                positions.positions.push(to_vec3(*position));
            }

            crate::net::RpcCall::EmitSound { position, range } => {
                let origin = to_vec3(*position);
                propagate(
                    origin,
                    *range,
                    listeners.iter().map(|(e, t)| (e, t.translation)),
                    &mut heard,
                );
            }
        }
    }
}

/// Система: непрерывная эмиссия от активных источников
///
/// Каждый участник тикает её локально — PlaySound уже исполнился у всех,
/// поэтому ContinuousSound присутствует на каждом клиенте одинаково.
pub fn continuous_emission(
    mut commands: Commands,
    mut emitters: Query<(Entity, &Transform, &mut ContinuousSound)>,
    listeners: Query<(Entity, &Transform), (With<Monster>, Without<ContinuousSound>)>,
    mut heard: EventWriter<SoundHeard>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, transform, mut sound) in emitters.iter_mut() {
        sound.remaining -= delta;
        if sound.remaining <= 0.0 {
            commands.entity(entity).remove::<ContinuousSound>();
            continue;
        }

        sound.next_emit -= delta;
        if sound.next_emit <= 0.0 {
            propagate(
                transform.translation,
                sound.range,
                listeners.iter().map(|(e, t)| (e, t.translation)),
                &mut heard,
            );
            sound.next_emit = CONTINUOUS_EMIT_CADENCE;
        }
    }
}
