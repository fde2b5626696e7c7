use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};

/// 渲染参数
///
/// 每帧显式传给渲染器的光照参数，不作为引擎内部状态保存。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderParams {
    /// 光源颜色
    pub light_color: [f32; 3],

    /// 阴影颜色（含透明度）
    pub shadow_color: [f32; 4],

    /// 光源方向
    pub light_dir: [f32; 3],
}

impl_default!(RenderParams {
    light_color: [0.6, 0.6, 0.6],
    shadow_color: [0.0, 0.0, 0.0, 0.5],
    light_dir: [-0.5, -1.0, -0.5],
});

impl RenderParams {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        let [x, y, z] = self.light_dir;
        if x == 0.0 && y == 0.0 && z == 0.0 {
            return Err(ConfigError::ValidationError(
                "Light direction must not be zero".to_string(),
            ));
        }
        let colors = self.light_color.iter().chain(self.shadow_color.iter());
        for c in colors {
            if !(0.0..=1.0).contains(c) {
                return Err(ConfigError::ValidationError(format!(
                    "Color component {} is outside [0, 1]",
                    c
                )));
            }
        }
        Ok(())
    }

    /// 归一化的光源方向
    pub fn light_direction(&self) -> glam::Vec3 {
        glam::Vec3::from_array(self.light_dir).normalize_or_zero()
    }
}
