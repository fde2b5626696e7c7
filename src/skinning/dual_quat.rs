//! 双四元数
//!
//! 刚体变换（旋转 + 平移）的双四元数表示，用于避免线性混合蒙皮的“糖果包装”效果。

use glam::{Mat4, Quat, Vec3};

/// 单位双四元数 `real + ε·dual`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DualQuat {
    pub real: Quat,
    pub dual: Quat,
}

impl Default for DualQuat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl DualQuat {
    pub const IDENTITY: Self = Self {
        real: Quat::IDENTITY,
        dual: Quat::from_xyzw(0.0, 0.0, 0.0, 0.0),
    };

    pub fn from_rotation_translation(rotation: Quat, translation: Vec3) -> Self {
        let t = Quat::from_xyzw(translation.x, translation.y, translation.z, 0.0);
        Self {
            real: rotation,
            dual: (t * rotation) * 0.5,
        }
    }

    /// 从刚体矩阵创建（忽略缩放）
    pub fn from_mat4(matrix: &Mat4) -> Self {
        let (_, rotation, translation) = matrix.to_scale_rotation_translation();
        Self::from_rotation_translation(rotation.normalize(), translation)
    }

    pub fn translation(&self) -> Vec3 {
        let t = (self.dual * self.real.conjugate()) * 2.0;
        Vec3::new(t.x, t.y, t.z)
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.real * point + self.translation()
    }

    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.real * vector
    }

    /// 加权混合
    ///
    /// 与第一个影响方向相反的四元数取反后再累加，结果按实部长度归一化。
    pub fn blend(influences: impl IntoIterator<Item = (DualQuat, f32)>) -> Self {
        let mut real = Quat::from_xyzw(0.0, 0.0, 0.0, 0.0);
        let mut dual = Quat::from_xyzw(0.0, 0.0, 0.0, 0.0);
        let mut pivot: Option<Quat> = None;

        for (dq, weight) in influences {
            if weight <= 0.0 {
                continue;
            }
            let reference = *pivot.get_or_insert(dq.real);
            let sign = if reference.dot(dq.real) < 0.0 { -1.0 } else { 1.0 };
            real = real + dq.real * (weight * sign);
            dual = dual + dq.dual * (weight * sign);
        }

        let length = real.length();
        if length < 1e-6 {
            return Self::IDENTITY;
        }
        Self {
            real: real * (1.0 / length),
            dual: dual * (1.0 / length),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_matrix() {
        let rotation = Quat::from_rotation_y(0.7);
        let translation = Vec3::new(1.0, -2.0, 0.5);
        let m = Mat4::from_rotation_translation(rotation, translation);
        let dq = DualQuat::from_mat4(&m);
        let p = Vec3::new(0.3, 0.4, -1.0);
        assert!((dq.transform_point(p) - m.transform_point3(p)).length() < 1e-5);
        assert!((dq.translation() - translation).length() < 1e-5);
    }

    #[test]
    fn test_blend_antipodal_quaternions() {
        let a = DualQuat::from_rotation_translation(Quat::IDENTITY, Vec3::X);
        let mut b = a;
        b.real = -b.real;
        b.dual = -b.dual;
        // 同一变换的两种符号表示混合后不会抵消
        let blended = DualQuat::blend([(a, 0.5), (b, 0.5)]);
        assert!((blended.transform_point(Vec3::ZERO) - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_blend_translations() {
        let a = DualQuat::from_rotation_translation(Quat::IDENTITY, Vec3::ZERO);
        let b = DualQuat::from_rotation_translation(Quat::IDENTITY, Vec3::new(0.0, 0.0, 1.0));
        let blended = DualQuat::blend([(a, 0.3), (b, 0.7)]);
        assert!((blended.transform_point(Vec3::ZERO) - Vec3::new(0.0, 0.0, 0.7)).length() < 1e-5);
    }
}
