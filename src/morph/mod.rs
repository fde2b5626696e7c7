//! 变形（Morph）模块
//!
//! 顶点位置、UV、材质、骨骼和组合变形。顶点和材质结果写入累加缓冲区，
//! 骨骼变形直接修改节点的局部 TRS。

pub mod blender;
pub mod material;

pub use blender::{Morph, MorphBlender, MorphKind};
pub use material::{Material, MaterialFactor, SubMesh};
