//! CCD IK 求解器
//!
//! IK 骨骼是目标（goal），`effector` 是需要靠近目标的末端骨骼。
//! 链接按从末端到根部的顺序逐个旋转，每次迭代后检查距离，没有改善时回退到最佳结果。

use glam::{Quat, Vec3};

use super::euler::{compose_xyz, decompose_xyz_closest};
use crate::config::IkConfig;
use crate::model::desc::{AxisLimitDesc, BoneDesc, IkDesc};
use crate::skeleton::NodeHierarchy;

/// 小于该角度（度）的修正直接跳过
const MIN_ANGLE_DEG: f32 = 0.001;
const EPSILON: f32 = 1e-6;
const AXIS_EPSILON: f32 = 1e-12;

// ============================================================================
// 链接
// ============================================================================

/// 欧拉角限制（弧度，XYZ）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisLimit {
    pub min: Vec3,
    pub max: Vec3,
}

impl From<AxisLimitDesc> for AxisLimit {
    fn from(desc: AxisLimitDesc) -> Self {
        Self {
            min: desc.min,
            max: desc.max,
        }
    }
}

impl AxisLimit {
    /// 只在一个轴上有限制（另外两个轴上下限都为 0）时返回该轴
    pub fn plane_axis(&self) -> Option<usize> {
        let active: Vec<usize> = (0..3)
            .filter(|&a| self.min[a] != 0.0 || self.max[a] != 0.0)
            .collect();
        match active.as_slice() {
            [axis] => Some(*axis),
            _ => None,
        }
    }

    fn clamp(&self, angles: Vec3) -> Vec3 {
        angles.max(self.min).min(self.max)
    }
}

/// IK 链接
#[derive(Debug, Clone)]
pub struct IkChainLink {
    /// 节点索引
    pub node: usize,
    pub limit: Option<AxisLimit>,
    saved_ik_rotate: Quat,
    prev_angle: Vec3,
    plane_angle: f32,
}

impl IkChainLink {
    pub fn new(node: usize, limit: Option<AxisLimit>) -> Self {
        Self {
            node,
            limit,
            saved_ik_rotate: Quat::IDENTITY,
            prev_angle: Vec3::ZERO,
            plane_angle: 0.0,
        }
    }

    /// 上一次迭代的欧拉角
    pub fn prev_angle(&self) -> Vec3 {
        self.prev_angle
    }

    /// 单轴模式下累计的旋转角
    pub fn plane_angle(&self) -> f32 {
        self.plane_angle
    }
}

// ============================================================================
// 求解器
// ============================================================================

/// 单次求解统计
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IkSolveStats {
    /// 执行的迭代次数
    pub iterations: u32,
    /// 目标与末端的最佳距离
    pub best_distance: f32,
    /// 最后一次迭代没有改善而回退
    pub rolled_back: bool,
}

/// CCD IK 求解器
#[derive(Debug, Clone)]
pub struct IkSolver {
    /// IK 骨骼（目标）名称
    pub name: String,
    ik_node: usize,
    effector: Option<usize>,
    links: Vec<IkChainLink>,
    pub iterate_count: u32,
    /// 单次修正的角度上限（弧度）
    pub limit_angle: f32,
    enabled: bool,
}

impl IkSolver {
    pub fn new(name: impl Into<String>, ik_node: usize, effector: Option<usize>) -> Self {
        Self {
            name: name.into(),
            ik_node,
            effector,
            links: Vec::new(),
            iterate_count: 1,
            limit_angle: std::f32::consts::TAU,
            enabled: true,
        }
    }

    /// 从 IK 描述构建，并把链接节点标记为受 IK 影响
    ///
    /// 末端骨骼缺失或越界时求解器保留但禁用；越界的链接被丢弃。
    pub fn from_desc(
        ik_node: usize,
        desc: &IkDesc,
        hierarchy: &mut NodeHierarchy,
        config: &IkConfig,
    ) -> Self {
        let name = hierarchy
            .get(ik_node)
            .map(|n| n.name.clone())
            .unwrap_or_default();
        let effector = desc.target.filter(|&t| t < hierarchy.len());

        let mut solver = Self::new(name, ik_node, effector);
        solver.iterate_count = config.clamp_iterate_count(desc.iterate_count);
        solver.limit_angle = desc.limit_angle.unwrap_or(config.default_limit_angle);

        if effector.is_none() {
            tracing::warn!(
                target: "ik",
                "IK bone {} ({}) has no valid effector ({:?}), solver disabled",
                ik_node, solver.name, desc.target
            );
            solver.enabled = false;
        }

        for link in &desc.links {
            let Some(node) = hierarchy.get_mut(link.bone) else {
                tracing::warn!(
                    target: "ik",
                    "IK bone {} link {} is out of range, dropped",
                    ik_node, link.bone
                );
                continue;
            };
            node.enable_ik = true;
            solver
                .links
                .push(IkChainLink::new(link.bone, link.limit.map(AxisLimit::from)));
        }

        solver
    }

    pub fn ik_node(&self) -> usize {
        self.ik_node
    }

    pub fn effector(&self) -> Option<usize> {
        self.effector
    }

    pub fn links(&self) -> &[IkChainLink] {
        &self.links
    }

    pub fn add_link(&mut self, link: IkChainLink) {
        self.links.push(link);
    }

    /// 没有末端骨骼的求解器无法启用
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled && self.effector.is_some();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 求解；禁用或缺少末端骨骼时返回 None
    pub fn solve(&mut self, hierarchy: &mut NodeHierarchy) -> Option<IkSolveStats> {
        if !self.enabled {
            return None;
        }
        let effector = self.effector?;
        if self.ik_node >= hierarchy.len() || effector >= hierarchy.len() {
            return None;
        }

        for link in &mut self.links {
            link.prev_angle = Vec3::ZERO;
            link.plane_angle = 0.0;
            link.saved_ik_rotate = Quat::IDENTITY;
            if let Some(node) = hierarchy.get_mut(link.node) {
                node.ik_rotate = Quat::IDENTITY;
            }
            hierarchy.update_local(link.node);
            hierarchy.update_global_subtree(link.node);
        }

        let mut stats = IkSolveStats {
            iterations: 0,
            best_distance: self.distance(hierarchy, effector),
            rolled_back: false,
        };
        let mut best = f32::MAX;

        for iteration in 0..self.iterate_count {
            self.solve_core(hierarchy, effector, iteration);
            stats.iterations += 1;

            let distance = self.distance(hierarchy, effector);
            if distance < best {
                best = distance;
                stats.best_distance = distance;
                for link in &mut self.links {
                    if let Some(node) = hierarchy.get(link.node) {
                        link.saved_ik_rotate = node.ik_rotate;
                    }
                }
            } else {
                for link in &self.links {
                    if let Some(node) = hierarchy.get_mut(link.node) {
                        node.ik_rotate = link.saved_ik_rotate;
                    }
                    hierarchy.update_local(link.node);
                    hierarchy.update_global_subtree(link.node);
                }
                stats.rolled_back = true;
                break;
            }
        }

        tracing::trace!(
            target: "ik",
            "Solved {} in {} iterations, distance {:.6}",
            self.name, stats.iterations, stats.best_distance
        );
        Some(stats)
    }

    fn distance(&self, hierarchy: &NodeHierarchy, effector: usize) -> f32 {
        let goal = hierarchy.nodes()[self.ik_node].global_position();
        let end = hierarchy.nodes()[effector].global_position();
        goal.distance(end)
    }

    fn solve_core(&mut self, hierarchy: &mut NodeHierarchy, effector: usize, iteration: u32) {
        let goal = hierarchy.nodes()[self.ik_node].global_position();

        for i in 0..self.links.len() {
            let node_index = self.links[i].node;
            if node_index == effector {
                continue;
            }

            if let Some(axis) = self.links[i].limit.and_then(|l| l.plane_axis()) {
                self.solve_plane(hierarchy, i, axis, goal, effector, iteration);
                continue;
            }

            let node = &hierarchy.nodes()[node_index];
            let inv_global = node.global.inverse();
            let local_goal = inv_global.transform_point3(goal);
            let local_effector =
                inv_global.transform_point3(hierarchy.nodes()[effector].global_position());
            if local_goal.length_squared() < EPSILON || local_effector.length_squared() < EPSILON {
                continue;
            }
            let goal_dir = local_goal.normalize();
            let effector_dir = local_effector.normalize();

            let dot = goal_dir.dot(effector_dir).clamp(-1.0, 1.0);
            let angle = dot.acos();
            if angle.to_degrees() < MIN_ANGLE_DEG {
                continue;
            }
            let angle = angle.clamp(-self.limit_angle, self.limit_angle);

            let cross = effector_dir.cross(goal_dir);
            let axis = if cross.length_squared() > AXIS_EPSILON {
                cross.normalize()
            } else if dot < 0.0 {
                // 反向共线：任取一个正交轴
                effector_dir.any_orthonormal_vector()
            } else {
                continue;
            };
            let rot = Quat::from_axis_angle(axis, angle);

            let anim_rotate = node.animate_rotate();
            let mut chain_rotate = node.ik_rotate * anim_rotate * rot;

            let link = &mut self.links[i];
            if let Some(limit) = link.limit {
                let angles = decompose_xyz_closest(chain_rotate, link.prev_angle);
                let clamped = limit.clamp(angles);
                let delta = (clamped - link.prev_angle)
                    .clamp(Vec3::splat(-self.limit_angle), Vec3::splat(self.limit_angle));
                let limited = link.prev_angle + delta;
                chain_rotate = compose_xyz(limited);
                link.prev_angle = limited;
            }

            let ik_rotate = (chain_rotate * anim_rotate.inverse()).normalize();
            if let Some(node) = hierarchy.get_mut(node_index) {
                node.ik_rotate = ik_rotate;
            }
            hierarchy.update_local(node_index);
            hierarchy.update_global_subtree(node_index);
        }
    }

    /// 单轴限制链接：只绕该轴旋转
    fn solve_plane(
        &mut self,
        hierarchy: &mut NodeHierarchy,
        link_index: usize,
        axis_index: usize,
        goal: Vec3,
        effector: usize,
        iteration: u32,
    ) {
        let link = &mut self.links[link_index];
        let Some(limit) = link.limit else {
            return;
        };
        let node = &hierarchy.nodes()[link.node];
        let axis = Vec3::AXES[axis_index];

        let inv_global = node.global.inverse();
        let local_goal = inv_global.transform_point3(goal);
        let local_effector =
            inv_global.transform_point3(hierarchy.nodes()[effector].global_position());

        // 投影到与旋转轴正交的平面
        let goal_dir = local_goal - axis * local_goal.dot(axis);
        let effector_dir = local_effector - axis * local_effector.dot(axis);
        if goal_dir.length_squared() < EPSILON || effector_dir.length_squared() < EPSILON {
            return;
        }

        let delta = axis
            .dot(effector_dir.cross(goal_dir))
            .atan2(effector_dir.dot(goal_dir))
            .clamp(-self.limit_angle, self.limit_angle);
        let mut angle = link.plane_angle + delta;

        let (min, max) = (limit.min[axis_index], limit.max[axis_index]);
        if iteration == 0 && (angle < min || angle > max) {
            if -angle >= min && -angle <= max {
                angle = -angle;
            } else {
                let half = (min + max) * 0.5;
                if (half - angle).abs() > (half + angle).abs() {
                    angle = -angle;
                }
            }
        }
        let angle = angle.max(min).min(max);
        link.plane_angle = angle;

        let anim_rotate = node.animate_rotate();
        let ik_rotate = (Quat::from_axis_angle(axis, angle) * anim_rotate.inverse()).normalize();
        let node_index = link.node;
        if let Some(node) = hierarchy.get_mut(node_index) {
            node.ik_rotate = ik_rotate;
        }
        hierarchy.update_local(node_index);
        hierarchy.update_global_subtree(node_index);
    }
}

/// 为所有带 IK 描述的骨骼构建求解器，并在 IK 骨骼上记录求解器索引
pub fn build_solvers(
    descs: &[BoneDesc],
    hierarchy: &mut NodeHierarchy,
    config: &IkConfig,
) -> Vec<IkSolver> {
    let mut solvers = Vec::new();
    for (index, desc) in descs.iter().enumerate() {
        let Some(ik) = &desc.ik else {
            continue;
        };
        let mut solver = IkSolver::from_desc(index, ik, hierarchy, config);
        if !config.enabled {
            solver.set_enabled(false);
        }
        if let Some(node) = hierarchy.get_mut(index) {
            node.ik_solver = Some(solvers.len());
        }
        solvers.push(solver);
    }
    if !solvers.is_empty() {
        tracing::debug!(target: "ik", "Built {} IK solvers", solvers.len());
    }
    solvers
}
