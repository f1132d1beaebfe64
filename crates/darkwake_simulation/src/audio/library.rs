//! Sound library: name → clip registry + footstep interval расчёт

use bevy::prelude::*;
use rand::Rng;
use std::collections::BTreeMap;

use crate::error::AudioError;

/// Аудио клип: identity = имя, payload = opaque буфер
///
/// Декодирование/микширование — забота внешнего рендерера, симуляция
/// оперирует только ключами и falloff параметрами.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundClip {
    pub name: String,
    pub data: Vec<u8>,
}

impl SoundClip {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Footstep interval домен: скорость [1, 4] m/s → интервал [0.6, 0.2] s
const FOOTSTEP_MIN_SPEED: f32 = 1.0;
const FOOTSTEP_MAX_SPEED: f32 = 4.0;
const FOOTSTEP_MIN_INTERVAL: f32 = 0.2;
const FOOTSTEP_MAX_INTERVAL: f32 = 0.6;

/// Registry клипов сессии
///
/// BTreeMap — итерация по именам в стабильном порядке, чтобы выбор клипа
/// по префиксу был детерминированным при фиксированном seed.
#[derive(Resource, Debug, Clone, Default)]
pub struct SoundLibrary {
    clips: BTreeMap<String, SoundClip>,
}

impl SoundLibrary {
    /// Регистрация клипа (один раз на старте)
    ///
    /// Ключи уникальны: повторная регистрация — DuplicateKey, тихая
    /// перезапись не поддерживается.
    pub fn register(&mut self, clip: SoundClip) -> Result<(), AudioError> {
        if self.clips.contains_key(&clip.name) {
            return Err(AudioError::DuplicateKey(clip.name));
        }
        self.clips.insert(clip.name.clone(), clip);
        Ok(())
    }

    /// Lookup клипа: fail explicitly, никогда не возвращаем чужой клип
    pub fn get(&self, name: &str) -> Result<&SoundClip, AudioError> {
        self.clips
            .get(name)
            .ok_or_else(|| AudioError::UnknownClipKey(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    /// Интервал между шагами из сэмпла скорости
    ///
    /// Inverse-lerp скорости по [1, 4] в интервал [0.6, 0.2]: быстрее
    /// движение — короче интервал, монотонно невозрастающий, clamp за
    /// пределами домена.
    pub fn footstep_interval(speed_sample: f32) -> f32 {
        let ratio = ((speed_sample - FOOTSTEP_MIN_SPEED)
            / (FOOTSTEP_MAX_SPEED - FOOTSTEP_MIN_SPEED))
            .clamp(0.0, 1.0);
        FOOTSTEP_MAX_INTERVAL + (FOOTSTEP_MIN_INTERVAL - FOOTSTEP_MAX_INTERVAL) * ratio
    }

    /// Равномерный случайный выбор клипа среди имён с данным префиксом
    ///
    /// Пустой набор — NoMatchingClips: вызывающий подавляет эмиссию,
    /// не ретраит.
    pub fn pick_prefixed(
        &self,
        prefix: &str,
        rng: &mut impl Rng,
    ) -> Result<&str, AudioError> {
        let matching: Vec<&str> = self
            .clips
            .keys()
            .filter(|name| name.starts_with(prefix))
            .map(String::as_str)
            .collect();

        if matching.is_empty() {
            return Err(AudioError::NoMatchingClips(prefix.to_string()));
        }

        let index = rng.gen_range(0..matching.len());
        Ok(matching[index])
    }
}
