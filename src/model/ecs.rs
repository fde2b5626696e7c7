//! ECS 集成
//!
//! 每个带 `DeformModel` 组件的实体每帧由 `deform_model_system` 推进一次。

use bevy_ecs::prelude::*;

use super::instance::Model;
use crate::skinning::SkinningStats;

/// 可变形模型组件
#[derive(Component)]
pub struct DeformModel {
    pub model: Model,
    /// 暂停时保持上一帧的结果
    pub paused: bool,
    pub last_stats: Option<SkinningStats>,
}

impl DeformModel {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            paused: false,
            last_stats: None,
        }
    }
}

/// 变形时钟资源
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct DeformClock {
    /// 本帧经过时间（秒）
    pub delta_seconds: f32,
    pub elapsed_seconds: f64,
    pub frame: u64,
}

impl DeformClock {
    /// 推进一帧
    pub fn advance(&mut self, delta_seconds: f32) {
        self.delta_seconds = delta_seconds;
        self.elapsed_seconds += f64::from(delta_seconds);
        self.frame += 1;
    }
}

/// 变形系统
pub fn deform_model_system(clock: Res<DeformClock>, mut query: Query<(Entity, &mut DeformModel)>) {
    for (entity, mut deform) in query.iter_mut() {
        if deform.paused {
            continue;
        }
        match deform.model.update(clock.delta_seconds) {
            Ok(stats) => deform.last_stats = Some(stats),
            Err(e) => tracing::error!(
                target: "model",
                "Deforming entity {:?} failed at frame {}: {}",
                entity, clock.frame, e
            ),
        }
    }
}
