//! Sound Event Bus: footstep эмиссия + playback side effects
//!
//! Rate-limit контракт: таймер декрементится только пока idle (> 0);
//! на нуле и при движении источника — один synchronized вызов на логический
//! шаг, таймер сбрасывается на вычисленный интервал. Эмитит только локально
//! авторитетный участник — иначе каждый клиент описал бы тот же физический
//! шаг своим broadcast'ом.

use bevy::prelude::*;

use crate::components::{LocalAuthority, Locomotion};
use crate::logger;
use crate::net::{from_vec3, RpcCall, RpcOutbox};
use crate::DeterministicRng;

use super::SoundLibrary;

/// Falloff параметры footstep playback (идентичны у всех участников)
pub const FOOTSTEP_MIN_DISTANCE: f32 = 5.0;
pub const FOOTSTEP_MAX_DISTANCE: f32 = 20.0;
pub const FOOTSTEP_VOLUME: f32 = 0.4;

/// Footstep эмиттер (на локально контролируемых игроках)
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct FootstepEmitter {
    /// Rate-limit countdown; эмиссия возможна только на нуле
    pub timer: f32,
    /// Префикс имён клипов (например "Footstep")
    pub clip_prefix: String,
}

impl Default for FootstepEmitter {
    fn default() -> Self {
        Self {
            timer: 0.0,
            clip_prefix: "Footstep".to_string(),
        }
    }
}

/// Детерминированный perceptual side effect: каждый участник рендерит
/// тот же клип в той же позиции с теми же falloff параметрами.
/// Потребляется внешним audio рендерером, возврата нет.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct SoundPlayed {
    pub clip: String,
    pub position: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    pub volume: f32,
}

/// Система: footstep эмиссия локального участника
///
/// NoMatchingClips — подавляем эмиссию, но таймер всё равно сбрасываем
/// (retry на следующем qualifying тике, не в этом же).
pub fn footstep_emission(
    mut emitters: Query<(&Transform, &Locomotion, &mut FootstepEmitter), With<LocalAuthority>>,
    library: Res<SoundLibrary>,
    mut rng: ResMut<DeterministicRng>,
    mut outbox: ResMut<RpcOutbox>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (transform, locomotion, mut emitter) in emitters.iter_mut() {
        if emitter.timer > 0.0 {
            emitter.timer -= delta;
            continue;
        }

        if !locomotion.is_moving() {
            continue;
        }

        let interval = SoundLibrary::footstep_interval(locomotion.speed);

        match library.pick_prefixed(&emitter.clip_prefix, &mut rng.rng) {
            Ok(clip) => {
                outbox.send(RpcCall::PlayFootstep {
                    position: from_vec3(transform.translation),
                    clip: clip.to_string(),
                });
            }
            Err(err) => {
                // Нет подходящих клипов — шаг не эмитится
                logger::log_warning(&format!("footstep suppressed: {}", err));
            }
        }

        emitter.timer = interval;
    }
}

/// Falloff параметры jump scare playback (близкий sting, слышен везде)
pub const JUMP_SCARE_MIN_DISTANCE: f32 = 1.0;
pub const JUMP_SCARE_MAX_DISTANCE: f32 = 100.0;

/// One-shot playback по имени: unknown key логируется и скипается,
/// playback никогда не крашится. Falloff задаёт вызывающий — у growl,
/// jump scare и footstep разные профили.
pub fn play_oneshot(
    library: &SoundLibrary,
    events: &mut EventWriter<SoundPlayed>,
    name: &str,
    position: Vec3,
    min_distance: f32,
    max_distance: f32,
    volume: f32,
) {
    match library.get(name) {
        Ok(clip) => {
            events.write(SoundPlayed {
                clip: clip.name.clone(),
                position,
                min_distance,
                max_distance,
                volume: volume.clamp(0.0, 1.0),
            });
        }
        Err(err) => {
            logger::log_warning(&format!("oneshot playback skipped: {}", err));
        }
    }
}

/// Jump scare playback: всегда полная громкость
pub fn play_jump_scare(
    library: &SoundLibrary,
    events: &mut EventWriter<SoundPlayed>,
    name: &str,
    position: Vec3,
) {
    play_oneshot(
        library,
        events,
        name,
        position,
        JUMP_SCARE_MIN_DISTANCE,
        JUMP_SCARE_MAX_DISTANCE,
        1.0,
    );
}
