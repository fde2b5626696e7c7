use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};

/// IK 求解配置
///
/// 模型数据中的迭代次数和角度限制优先；这里的值用于数据缺省时的回退。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IkConfig {
    /// 是否启用 IK
    pub enabled: bool,

    /// 默认迭代次数
    pub default_iterate_count: u32,

    /// 单次迭代的默认角度限制（弧度）
    pub default_limit_angle: f32,

    /// 迭代次数上限，防止异常数据拖慢整帧
    pub max_iterate_count: u32,
}

impl_default!(IkConfig {
    enabled: true,
    default_iterate_count: 1,
    default_limit_angle: std::f32::consts::TAU,
    max_iterate_count: 256,
});

impl IkConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_iterate_count == 0 {
            return Err(ConfigError::ValidationError(
                "IK iterate count must be at least 1".to_string(),
            ));
        }
        if self.max_iterate_count < self.default_iterate_count {
            return Err(ConfigError::ValidationError(
                "IK max iterate count is below the default iterate count".to_string(),
            ));
        }
        if !(self.default_limit_angle > 0.0) || !self.default_limit_angle.is_finite() {
            return Err(ConfigError::ValidationError(
                "IK limit angle must be a positive finite number".to_string(),
            ));
        }
        Ok(())
    }

    /// 将模型数据中的迭代次数限制在配置范围内
    pub fn clamp_iterate_count(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_iterate_count)
            .min(self.max_iterate_count)
    }
}
