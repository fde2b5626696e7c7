//! XYZ 欧拉角分解

use std::f32::consts::{PI, TAU};

use glam::{EulerRot, Quat, Vec3};

/// 把四元数分解为 XYZ 欧拉角（`q = Rx · Ry · Rz`），选择与 `before` 最接近的一组解
///
/// 同一旋转有两组欧拉解 `(x, y, z)` 和 `(x + π, π - y, z + π)`，
/// 每个分量还可以相差 2π 的整数倍。IK 迭代中用上一次的角度作为参考，避免角度跳变。
pub fn decompose_xyz_closest(q: Quat, before: Vec3) -> Vec3 {
    let (x, y, z) = q.to_euler(EulerRot::XYZ);
    let primary = wrap_near(Vec3::new(x, y, z), before);
    let alternate = wrap_near(Vec3::new(x + PI, PI - y, z + PI), before);

    let primary_err = (primary - before).abs().dot(Vec3::ONE);
    let alternate_err = (alternate - before).abs().dot(Vec3::ONE);
    if primary_err <= alternate_err {
        primary
    } else {
        alternate
    }
}

/// 由 XYZ 欧拉角重建四元数
pub fn compose_xyz(angles: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, angles.x, angles.y, angles.z)
}

fn wrap_near(angles: Vec3, reference: Vec3) -> Vec3 {
    let turns = ((reference - angles) / TAU).round();
    angles + turns * TAU
}
