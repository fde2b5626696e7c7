//! 测试辅助函数

use glam::Quat;

/// 两个四元数表示同一旋转（允许符号相反）
pub fn quat_near(a: Quat, b: Quat, eps: f32) -> bool {
    a.abs_diff_eq(b, eps) || a.abs_diff_eq(-b, eps)
}
