//! 骨骼模块
//!
//! 负责骨骼层级的局部/全局变换传播和付与（继承）变换。
//!
//! ## 处理顺序
//!
//! 节点按 `(deform_depth, index)` 稳定排序后处理，保证父节点的全局变换先于子节点计算。
//! 每帧分为物理前和物理后两个阶段，由节点的 `deform_after_physics` 标志区分。

pub mod hierarchy;
pub mod node;

pub use hierarchy::NodeHierarchy;
pub use node::{AppendFlags, AppendLink, BoneTransform, Node};
