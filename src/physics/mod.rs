//! 物理桥接
//!
//! 刚体模拟本身由外部物理引擎完成，这里只定义每帧回写骨骼全局姿态的接口。

use glam::Mat4;

use crate::skeleton::NodeHierarchy;

/// 物理驱动节点的模拟后全局姿态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsPose {
    /// 节点索引
    pub node: usize,
    /// 模型空间全局变换
    pub global: Mat4,
}

/// 物理引擎桥接
///
/// 实现者在 `simulate` 中读取当前（物理前）骨骼姿态推进模拟，
/// 并把物理驱动节点的结果写入 `poses`。
pub trait PhysicsBridge: Send + Sync {
    /// 重置模拟状态（例如动画跳转时）
    fn reset(&mut self, hierarchy: &NodeHierarchy);

    /// 推进一步模拟
    fn simulate(&mut self, elapsed: f32, hierarchy: &NodeHierarchy, poses: &mut Vec<PhysicsPose>);
}

/// 不做任何模拟的桥接
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPhysics;

impl PhysicsBridge for NoPhysics {
    fn reset(&mut self, _hierarchy: &NodeHierarchy) {}

    fn simulate(&mut self, _elapsed: f32, _hierarchy: &NodeHierarchy, _poses: &mut Vec<PhysicsPose>) {}
}
