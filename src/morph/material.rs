//! 材质与材质变形系数

use std::path::PathBuf;

use glam::{Vec3, Vec4};

use crate::model::desc::{MaterialDesc, MaterialMorphDesc, SphereMode};

// ============================================================================
// 材质
// ============================================================================

/// 渲染器使用的材质（变形后的结果）
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub diffuse: Vec3,
    pub alpha: f32,
    pub specular: Vec3,
    pub specular_power: f32,
    pub ambient: Vec3,
    pub edge_color: Vec4,
    pub edge_size: f32,
    pub draw_edge: bool,
    pub both_face: bool,

    /// 纹理路径（已解析为完整路径）
    pub texture: Option<PathBuf>,
    pub sphere_texture: Option<PathBuf>,
    pub sphere_mode: SphereMode,
    pub toon_texture: Option<PathBuf>,

    pub texture_mul_factor: Vec4,
    pub texture_add_factor: Vec4,
    pub sphere_mul_factor: Vec4,
    pub sphere_add_factor: Vec4,
    pub toon_mul_factor: Vec4,
    pub toon_add_factor: Vec4,
}

impl Material {
    /// 从描述创建，纹理路径由调用方解析
    pub fn from_desc(desc: &MaterialDesc) -> Self {
        Self {
            name: desc.name.clone(),
            diffuse: desc.diffuse.truncate(),
            alpha: desc.diffuse.w,
            specular: desc.specular,
            specular_power: desc.specular_power,
            ambient: desc.ambient,
            edge_color: desc.edge_color,
            edge_size: desc.edge_size,
            draw_edge: desc.draw_edge,
            both_face: desc.both_face,
            texture: None,
            sphere_texture: None,
            sphere_mode: desc.sphere_mode,
            toon_texture: None,
            texture_mul_factor: Vec4::ONE,
            texture_add_factor: Vec4::ZERO,
            sphere_mul_factor: Vec4::ONE,
            sphere_add_factor: Vec4::ZERO,
            toon_mul_factor: Vec4::ONE,
            toon_add_factor: Vec4::ZERO,
        }
    }
}

/// 子网格：连续的一段三角形索引共享同一材质
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubMesh {
    /// 起始索引
    pub begin_index: usize,
    /// 索引数量
    pub vertex_count: usize,
    /// 材质索引
    pub material: usize,
}

// ============================================================================
// 材质变形系数
// ============================================================================

/// 材质变形系数
///
/// 乘算系数初始为 1，加算系数初始为 0。最终材质为 `base * mul + add`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialFactor {
    pub diffuse: Vec3,
    pub alpha: f32,
    pub specular: Vec3,
    pub specular_power: f32,
    pub ambient: Vec3,
    pub edge_color: Vec4,
    pub edge_size: f32,
    pub texture: Vec4,
    pub sphere_texture: Vec4,
    pub toon_texture: Vec4,
}

impl MaterialFactor {
    pub fn init_mul() -> Self {
        Self {
            diffuse: Vec3::ONE,
            alpha: 1.0,
            specular: Vec3::ONE,
            specular_power: 1.0,
            ambient: Vec3::ONE,
            edge_color: Vec4::ONE,
            edge_size: 1.0,
            texture: Vec4::ONE,
            sphere_texture: Vec4::ONE,
            toon_texture: Vec4::ONE,
        }
    }

    pub fn init_add() -> Self {
        Self {
            diffuse: Vec3::ZERO,
            alpha: 0.0,
            specular: Vec3::ZERO,
            specular_power: 0.0,
            ambient: Vec3::ZERO,
            edge_color: Vec4::ZERO,
            edge_size: 0.0,
            texture: Vec4::ZERO,
            sphere_texture: Vec4::ZERO,
            toon_texture: Vec4::ZERO,
        }
    }

    pub fn from_morph(desc: &MaterialMorphDesc) -> Self {
        Self {
            diffuse: desc.diffuse.truncate(),
            alpha: desc.diffuse.w,
            specular: desc.specular,
            specular_power: desc.specular_power,
            ambient: desc.ambient,
            edge_color: desc.edge_color,
            edge_size: desc.edge_size,
            texture: desc.texture_factor,
            sphere_texture: desc.sphere_texture_factor,
            toon_texture: desc.toon_texture_factor,
        }
    }

    /// `f = lerp(f, f * delta, weight)`
    pub fn mul(&mut self, delta: &Self, weight: f32) {
        self.diffuse = self.diffuse.lerp(self.diffuse * delta.diffuse, weight);
        self.alpha = lerp(self.alpha, self.alpha * delta.alpha, weight);
        self.specular = self.specular.lerp(self.specular * delta.specular, weight);
        self.specular_power = lerp(
            self.specular_power,
            self.specular_power * delta.specular_power,
            weight,
        );
        self.ambient = self.ambient.lerp(self.ambient * delta.ambient, weight);
        self.edge_color = self.edge_color.lerp(self.edge_color * delta.edge_color, weight);
        self.edge_size = lerp(self.edge_size, self.edge_size * delta.edge_size, weight);
        self.texture = self.texture.lerp(self.texture * delta.texture, weight);
        self.sphere_texture = self
            .sphere_texture
            .lerp(self.sphere_texture * delta.sphere_texture, weight);
        self.toon_texture = self
            .toon_texture
            .lerp(self.toon_texture * delta.toon_texture, weight);
    }

    /// `f += delta * weight`
    pub fn add(&mut self, delta: &Self, weight: f32) {
        self.diffuse += delta.diffuse * weight;
        self.alpha += delta.alpha * weight;
        self.specular += delta.specular * weight;
        self.specular_power += delta.specular_power * weight;
        self.ambient += delta.ambient * weight;
        self.edge_color += delta.edge_color * weight;
        self.edge_size += delta.edge_size * weight;
        self.texture += delta.texture * weight;
        self.sphere_texture += delta.sphere_texture * weight;
        self.toon_texture += delta.toon_texture * weight;
    }

    /// 将乘算和加算系数作用于基础材质
    pub fn resolve(base: &Material, mul: &Self, add: &Self, out: &mut Material) {
        out.diffuse = base.diffuse * mul.diffuse + add.diffuse;
        out.alpha = base.alpha * mul.alpha + add.alpha;
        out.specular = base.specular * mul.specular + add.specular;
        out.specular_power = base.specular_power * mul.specular_power + add.specular_power;
        out.ambient = base.ambient * mul.ambient + add.ambient;
        out.edge_color = base.edge_color * mul.edge_color + add.edge_color;
        out.edge_size = base.edge_size * mul.edge_size + add.edge_size;
        out.texture_mul_factor = mul.texture;
        out.texture_add_factor = add.texture;
        out.sphere_mul_factor = mul.sphere_texture;
        out.sphere_add_factor = add.sphere_texture;
        out.toon_mul_factor = mul.toon_texture;
        out.toon_add_factor = add.toon_texture;
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(value: f32) -> MaterialFactor {
        MaterialFactor {
            diffuse: Vec3::splat(value),
            alpha: value,
            specular: Vec3::splat(value),
            specular_power: value,
            ambient: Vec3::splat(value),
            edge_color: Vec4::splat(value),
            edge_size: value,
            texture: Vec4::splat(value),
            sphere_texture: Vec4::splat(value),
            toon_texture: Vec4::splat(value),
        }
    }

    #[test]
    fn test_mul_half_weight() {
        let mut f = MaterialFactor::init_mul();
        f.mul(&delta(0.0), 0.5);
        // lerp(1, 0, 0.5)
        assert!((f.alpha - 0.5).abs() < 1e-6);
        assert!((f.texture - Vec4::splat(0.5)).length() < 1e-6);
    }

    #[test]
    fn test_add_accumulates() {
        let mut f = MaterialFactor::init_add();
        f.add(&delta(0.2), 0.5);
        f.add(&delta(0.2), 0.5);
        assert!((f.diffuse - Vec3::splat(0.2)).length() < 1e-6);
    }

    #[test]
    fn test_resolve_identity_factors() {
        let base = Material::from_desc(&MaterialDesc::plain("body", 3));
        let mut out = base.clone();
        out.diffuse = Vec3::ZERO;
        MaterialFactor::resolve(
            &base,
            &MaterialFactor::init_mul(),
            &MaterialFactor::init_add(),
            &mut out,
        );
        assert_eq!(out, base);
    }
}
