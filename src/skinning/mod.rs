//! 蒙皮模块
//!
//! - `vertex` - 顶点骨骼影响（BDEF / SDEF / 双四元数）
//! - `dual_quat` - 双四元数
//! - `engine` - 分块并行的蒙皮引擎

pub mod dual_quat;
pub mod engine;
pub mod vertex;

pub use dual_quat::DualQuat;
pub use engine::{DeformedVertex, SkinningEngine, SkinningStats};
pub use vertex::{SdefParams, VertexBoneInfo};
