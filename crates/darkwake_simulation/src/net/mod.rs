//! Synchronized RPC channel сессии
//!
//! Контракт: вызов одного участника исполняется у ВСЕХ участников (включая
//! вызывающего) с идентичными аргументами. Канал at-least-once: дубликаты
//! доставок допустимы, propagation path к ним идемпотентен.
//!
//! Транспорт внешний: он забирает RpcOutbox и инжектит чужие вызовы как
//! InboundRpc events. loopback_delivery моделирует локальную сессию
//! (single participant) и используется headless тестами.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::NetId;

/// Synchronized call — исполняется на каждом участнике сессии
///
/// Позиции как [f32; 3] (world coordinates): payload сериализуется
/// транспортом между участниками.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RpcCall {
    /// Footstep playback: каждый участник рендерит клип в той же позиции
    PlayFootstep { position: [f32; 3], clip: String },
    /// Generic sound playback привязанный к source entity (NetId),
    /// с continuous эмиссией пока source "шумит"
    PlaySound {
        source: NetId,
        range: f32,
        clip_key: String,
    },
    /// Регистрация позиции звука (debug/visualization поверхность)
    RegisterSoundPosition { position: [f32; 3] },
    /// One-shot пропагация: слушатели в радиусе получают OnSoundHeard
    EmitSound { position: [f32; 3], range: f32 },
}

pub fn to_vec3(v: [f32; 3]) -> Vec3 {
    Vec3::from_array(v)
}

pub fn from_vec3(v: Vec3) -> [f32; 3] {
    v.to_array()
}

/// Исходящие вызовы локального участника (забирает транспорт + loopback)
#[derive(Resource, Debug, Default)]
pub struct RpcOutbox {
    pub calls: Vec<RpcCall>,
}

impl RpcOutbox {
    pub fn send(&mut self, call: RpcCall) {
        self.calls.push(call);
    }
}

/// Входящий вызов (свой через loopback или чужой через транспорт)
#[derive(Event, Debug, Clone)]
pub struct InboundRpc(pub RpcCall);

/// Система: loopback доставка — caller включён в delivery сессии
pub fn loopback_delivery(
    mut outbox: ResMut<RpcOutbox>,
    mut inbound: EventWriter<InboundRpc>,
) {
    for call in outbox.calls.drain(..) {
        inbound.write(InboundRpc(call));
    }
}

pub struct NetPlugin;

impl Plugin for NetPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RpcOutbox>()
            .add_event::<InboundRpc>()
            .add_systems(
                FixedUpdate,
                loopback_delivery.in_set(crate::SimulationSet::Net),
            );
    }
}
