//! 骨骼层级
//!
//! 平坦的节点数组加上按变形阶层排序的处理顺序。父子、付与、IK 关系全部使用索引。

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};

use super::node::{AppendFlags, AppendLink, Node};
use crate::model::desc::BoneDesc;
use crate::physics::PhysicsPose;

/// 骨骼层级
#[derive(Clone, Debug, Default)]
pub struct NodeHierarchy {
    nodes: Vec<Node>,
    /// 按 (deform_depth, index) 稳定排序的处理顺序
    sorted: Vec<usize>,
    /// 根节点，按处理顺序排列
    roots: Vec<usize>,
    name_to_index: HashMap<String, usize>,
}

impl NodeHierarchy {
    /// 从加载器提供的骨骼列表构建层级
    ///
    /// 结构缺陷（循环、越界引用、逆序阶层）只记录警告，不会失败。
    pub fn from_descs(descs: &[BoneDesc]) -> Self {
        let count = descs.len();
        let mut nodes: Vec<Node> = descs
            .iter()
            .enumerate()
            .map(|(i, desc)| {
                let mut node = Node::new(i, desc.name.clone());
                node.deform_depth = desc.deform_depth;
                node.deform_after_physics = desc.deform_after_physics;
                node
            })
            .collect();

        // 逆序分配父节点，沿祖先链检测循环
        for i in (0..count).rev() {
            let Some(parent) = descs[i].parent else {
                continue;
            };
            if parent >= count {
                tracing::warn!(
                    target: "skeleton",
                    "Bone {} ({}) references missing parent {}, treated as root",
                    i, descs[i].name, parent
                );
                continue;
            }
            if Self::creates_cycle(&nodes, i, parent) {
                tracing::warn!(
                    target: "skeleton",
                    "Bone {} ({}) would form a cycle through parent {}, treated as root",
                    i, descs[i].name, parent
                );
                continue;
            }
            if parent >= i {
                tracing::warn!(
                    target: "skeleton",
                    "Bone {} ({}) references later parent {}",
                    i, descs[i].name, parent
                );
            }
            nodes[i].parent = Some(parent);
        }

        for i in 0..count {
            if let Some(parent) = nodes[i].parent {
                nodes[parent].children.push(i);
                if nodes[i].deform_depth < nodes[parent].deform_depth {
                    tracing::warn!(
                        target: "skeleton",
                        "Bone {} has deform depth {} below its parent's {}",
                        i, nodes[i].deform_depth, nodes[parent].deform_depth
                    );
                }
            }
        }

        for (i, desc) in descs.iter().enumerate() {
            let Some(append) = desc.append else {
                continue;
            };
            if append.source >= count {
                tracing::warn!(
                    target: "skeleton",
                    "Bone {} append source {} is out of range, ignored",
                    i, append.source
                );
                continue;
            }
            if append.source >= i {
                tracing::warn!(
                    target: "skeleton",
                    "Bone {} append source {} is not an earlier bone",
                    i, append.source
                );
            }
            if append.rotate || append.translate {
                nodes[i].append = Some(AppendLink {
                    source: append.source,
                    weight: append.weight,
                    flags: AppendFlags {
                        rotate: append.rotate,
                        translate: append.translate,
                        local: append.local,
                    },
                });
            }
        }

        // 绑定姿态
        for i in 0..count {
            let position = descs[i].position;
            let parent_position = nodes[i]
                .parent
                .map(|p| descs[p].position)
                .unwrap_or(Vec3::ZERO);
            let node = &mut nodes[i];
            node.translate = position - parent_position;
            node.save_initial_trs();
            let bind = Mat4::from_translation(position);
            node.global = bind;
            node.inverse_bind = bind.inverse();
        }

        let mut sorted: Vec<usize> = (0..count).collect();
        sorted.sort_by_key(|&i| nodes[i].deform_depth);
        let roots = sorted
            .iter()
            .copied()
            .filter(|&i| nodes[i].parent.is_none())
            .collect();

        let mut name_to_index = HashMap::with_capacity(count);
        for node in &nodes {
            name_to_index.entry(node.name.clone()).or_insert(node.index);
        }

        let mut hierarchy = Self {
            nodes,
            sorted,
            roots,
            name_to_index,
        };
        hierarchy.update_all();

        tracing::debug!(
            target: "skeleton",
            "Built hierarchy with {} nodes, {} roots",
            hierarchy.len(),
            hierarchy.roots.len()
        );
        hierarchy
    }

    fn creates_cycle(nodes: &[Node], child: usize, parent: usize) -> bool {
        let mut current = Some(parent);
        let mut steps = 0;
        while let Some(c) = current {
            if c == child || steps > nodes.len() {
                return true;
            }
            current = nodes[c].parent;
            steps += 1;
        }
        false
    }

    // ========================================================================
    // 查询
    // ========================================================================

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    /// 通过名称查找节点索引（重名时返回第一个）
    pub fn find(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// 处理顺序
    pub fn sorted(&self) -> &[usize] {
        &self.sorted
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// 所有节点的全局变换，按节点索引
    pub fn global_transforms(&self) -> Vec<Mat4> {
        self.nodes.iter().map(|n| n.global).collect()
    }

    // ========================================================================
    // 单节点更新
    // ========================================================================

    /// 重新计算局部变换矩阵
    pub fn update_local(&mut self, index: usize) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.compute_local();
        }
    }

    /// 根据付与来源计算付与变换，然后更新局部矩阵
    pub fn update_append(&mut self, index: usize) {
        let Some(link) = self.nodes.get(index).and_then(|n| n.append) else {
            return;
        };
        let Some(source) = self.nodes.get(link.source) else {
            return;
        };
        let source_has_append = source.append.is_some();

        let mut append_rotate = None;
        if link.flags.rotate {
            let mut r = if !link.flags.local && source_has_append {
                source.append_rotate
            } else {
                source.animate_rotate()
            };
            if source.enable_ik {
                r = source.ik_rotate * r;
            }
            append_rotate = Some(Quat::IDENTITY.slerp(r, link.weight));
        }

        let mut append_translate = None;
        if link.flags.translate {
            let t = if !link.flags.local && source_has_append {
                source.append_translate
            } else {
                source.translate - source.initial.translation
            };
            append_translate = Some(t * link.weight);
        }

        let node = &mut self.nodes[index];
        if let Some(r) = append_rotate {
            node.append_rotate = r;
        }
        if let Some(t) = append_translate {
            node.append_translate = t;
        }
        node.compute_local();
    }

    /// `global = parent.global · local`，根节点为 `local`
    pub fn update_global(&mut self, index: usize) {
        let Some(node) = self.nodes.get(index) else {
            return;
        };
        let global = match node.parent {
            Some(parent) => self.nodes[parent].global * node.local,
            None => node.local,
        };
        self.nodes[index].global = global;
    }

    /// 更新节点及其全部后代的全局变换（先序遍历，子节点按列表顺序）
    pub fn update_global_subtree(&mut self, index: usize) {
        if index >= self.nodes.len() {
            return;
        }
        let mut stack = vec![index];
        while let Some(current) = stack.pop() {
            self.update_global(current);
            stack.extend(self.nodes[current].children.iter().rev().copied());
        }
    }

    // ========================================================================
    // 阶段更新
    // ========================================================================

    /// 按处理顺序更新指定阶段节点的局部矩阵
    pub fn update_local_pass(&mut self, after_physics: bool) {
        for i in 0..self.sorted.len() {
            let index = self.sorted[i];
            if self.nodes[index].deform_after_physics == after_physics {
                self.nodes[index].compute_local();
            }
        }
    }

    /// 按处理顺序从指定阶段的起点向下更新全局矩阵
    ///
    /// 起点是该阶段中父节点不存在或父节点属于另一阶段的节点，
    /// 因此挂在普通节点下的物理后节点也会在物理后阶段刷新。
    pub fn update_root_pass(&mut self, after_physics: bool) {
        for i in 0..self.sorted.len() {
            let index = self.sorted[i];
            let node = &self.nodes[index];
            if node.deform_after_physics != after_physics {
                continue;
            }
            let starts_phase = match node.parent {
                Some(parent) => self.nodes[parent].deform_after_physics != after_physics,
                None => true,
            };
            if starts_phase {
                self.update_global_subtree(index);
            }
        }
    }

    /// 全部节点重新计算局部和全局矩阵
    pub fn update_all(&mut self) {
        for i in 0..self.sorted.len() {
            let index = self.sorted[i];
            self.nodes[index].compute_local();
        }
        for i in 0..self.roots.len() {
            self.update_global_subtree(self.roots[i]);
        }
    }

    /// 帧开始：恢复初始 TRS 并清除 IK 旋转
    pub fn begin_update(&mut self) {
        for node in &mut self.nodes {
            node.load_initial_trs();
            node.ik_rotate = Quat::IDENTITY;
        }
    }

    /// 帧结束：恢复初始 TRS
    pub fn end_update(&mut self) {
        for node in &mut self.nodes {
            node.load_initial_trs();
        }
    }

    /// 清空动画通道
    pub fn reset_animation(&mut self) {
        for node in &mut self.nodes {
            node.anim_translate = Vec3::ZERO;
            node.anim_rotate = Quat::IDENTITY;
        }
    }

    /// 写入物理模拟后的全局姿态
    ///
    /// 注入节点的后代跟随移动；注入节点的局部矩阵根据父节点反算，
    /// 最后从根节点重新传播一次保证全局矩阵一致。
    pub fn apply_physics_poses(&mut self, poses: &[PhysicsPose]) {
        if poses.is_empty() {
            return;
        }
        let mut injected: Vec<Option<Mat4>> = vec![None; self.nodes.len()];
        for pose in poses {
            match injected.get_mut(pose.node) {
                Some(slot) => *slot = Some(pose.global),
                None => tracing::warn!(
                    target: "skeleton",
                    "Physics pose for missing node {} ignored",
                    pose.node
                ),
            }
        }

        for i in 0..self.sorted.len() {
            let index = self.sorted[i];
            let Some(global) = injected[index] else {
                continue;
            };
            self.nodes[index].global = global;
            for c in 0..self.nodes[index].children.len() {
                let child = self.nodes[index].children[c];
                self.update_global_subtree(child);
            }
        }

        for i in 0..self.sorted.len() {
            let index = self.sorted[i];
            if injected[index].is_none() {
                continue;
            }
            let node = &self.nodes[index];
            let local = match node.parent {
                Some(parent) => self.nodes[parent].global.inverse() * node.global,
                None => node.global,
            };
            self.nodes[index].local = local;
        }

        for i in 0..self.roots.len() {
            self.update_global_subtree(self.roots[i]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::quat_near;
    use crate::model::desc::AppendDesc;
    use proptest::prelude::*;

    fn chain() -> Vec<BoneDesc> {
        vec![
            BoneDesc::new("root", None, Vec3::ZERO),
            BoneDesc::new("spine", Some(0), Vec3::new(0.0, 1.0, 0.0)),
            BoneDesc::new("head", Some(1), Vec3::new(0.0, 2.0, 0.0)),
        ]
    }

    fn assert_mat_near(a: Mat4, b: Mat4) {
        assert!(a.abs_diff_eq(b, 1e-4), "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_bind_pose() {
        let h = NodeHierarchy::from_descs(&chain());
        assert_eq!(h.len(), 3);
        assert_eq!(h.roots(), &[0]);
        assert_eq!(h.get(0).unwrap().children, vec![1]);
        assert_eq!(h.get(2).unwrap().translate, Vec3::new(0.0, 1.0, 0.0));
        assert!((h.get(2).unwrap().global_position() - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-6);
        for node in h.nodes() {
            assert_mat_near(node.global * node.inverse_bind, Mat4::IDENTITY);
        }
        assert_eq!(h.find("spine"), Some(1));
        assert_eq!(h.find("tail"), None);
    }

    #[test]
    fn test_rotation_propagates() {
        let mut h = NodeHierarchy::from_descs(&chain());
        h.get_mut(1).unwrap().anim_rotate = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        h.update_all();
        // spine 绕 Z 旋转 90°，head 从 (0,2,0) 转到 (-1,1,0)
        let head = h.get(2).unwrap().global_position();
        assert!((head - Vec3::new(-1.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_cycle_tolerated() {
        let descs = vec![
            BoneDesc::new("a", Some(1), Vec3::ZERO),
            BoneDesc::new("b", Some(0), Vec3::X),
        ];
        let h = NodeHierarchy::from_descs(&descs);
        // 逆序分配：b → a 先建立，a → b 形成循环被拒绝
        assert_eq!(h.get(1).unwrap().parent, Some(0));
        assert_eq!(h.get(0).unwrap().parent, None);
        assert_eq!(h.roots(), &[0]);
    }

    #[test]
    fn test_self_parent_is_root() {
        let descs = vec![BoneDesc::new("a", Some(0), Vec3::ZERO)];
        let h = NodeHierarchy::from_descs(&descs);
        assert_eq!(h.get(0).unwrap().parent, None);
    }

    #[test]
    fn test_forward_reference_tolerated() {
        let descs = vec![
            BoneDesc::new("child", Some(1), Vec3::new(0.0, 2.0, 0.0)),
            BoneDesc::new("parent", None, Vec3::new(0.0, 1.0, 0.0)),
        ];
        let mut h = NodeHierarchy::from_descs(&descs);
        assert_eq!(h.get(0).unwrap().parent, Some(1));
        h.get_mut(1).unwrap().anim_translate = Vec3::X;
        h.update_all();
        // 两个节点同阶层时按索引处理，子节点先算；根节点传递保证最终一致
        let child = h.get(0).unwrap().global_position();
        assert!((child - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_missing_parent_is_root() {
        let descs = vec![BoneDesc::new("a", Some(7), Vec3::ONE)];
        let h = NodeHierarchy::from_descs(&descs);
        assert_eq!(h.roots(), &[0]);
        assert_eq!(h.get(0).unwrap().translate, Vec3::ONE);
    }

    #[test]
    fn test_sorted_by_deform_depth() {
        let mut descs = chain();
        descs[0].deform_depth = 2;
        descs[2].deform_depth = 1;
        let h = NodeHierarchy::from_descs(&descs);
        assert_eq!(h.sorted(), &[1, 2, 0]);
    }

    #[test]
    fn test_append_rotate_follows_source() {
        let mut descs = chain();
        descs.push(BoneDesc::new("follower", Some(0), Vec3::X));
        descs[3].append = Some(AppendDesc {
            source: 1,
            weight: 0.5,
            rotate: true,
            translate: false,
            local: false,
        });
        let mut h = NodeHierarchy::from_descs(&descs);
        h.get_mut(1).unwrap().anim_rotate = Quat::from_rotation_y(1.0);
        h.update_all();
        h.update_append(3);
        h.update_global_subtree(3);
        let r = h.get(3).unwrap().append_rotate();
        assert!(quat_near(r, Quat::from_rotation_y(0.5), 1e-5));
    }

    #[test]
    fn test_append_translate_uses_offset_from_initial() {
        let mut descs = chain();
        descs.push(BoneDesc::new("follower", Some(0), Vec3::X));
        descs[3].append = Some(AppendDesc {
            source: 1,
            weight: 1.0,
            rotate: false,
            translate: true,
            local: true,
        });
        let mut h = NodeHierarchy::from_descs(&descs);
        h.get_mut(1).unwrap().translate += Vec3::new(0.0, 0.0, 3.0);
        h.update_append(3);
        assert!((h.get(3).unwrap().append_translate() - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-6);
        h.update_global(3);
        assert!((h.get(3).unwrap().global_position() - Vec3::new(1.0, 0.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn test_begin_and_end_update_restore_trs() {
        let mut h = NodeHierarchy::from_descs(&chain());
        let node = h.get_mut(1).unwrap();
        node.translate = Vec3::splat(9.0);
        node.ik_rotate = Quat::from_rotation_x(1.0);
        h.begin_update();
        assert_eq!(h.get(1).unwrap().translate, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(h.get(1).unwrap().ik_rotate, Quat::IDENTITY);

        h.get_mut(1).unwrap().rotate = Quat::from_rotation_x(1.0);
        h.end_update();
        assert_eq!(h.get(1).unwrap().rotate, Quat::IDENTITY);
    }

    #[test]
    fn test_physics_pose_moves_descendants() {
        let mut h = NodeHierarchy::from_descs(&chain());
        let pose = PhysicsPose {
            node: 1,
            global: Mat4::from_translation(Vec3::new(5.0, 1.0, 0.0)),
        };
        h.apply_physics_poses(&[pose, PhysicsPose { node: 42, global: Mat4::IDENTITY }]);
        assert!((h.get(1).unwrap().global_position() - Vec3::new(5.0, 1.0, 0.0)).length() < 1e-5);
        assert!((h.get(2).unwrap().global_position() - Vec3::new(5.0, 2.0, 0.0)).length() < 1e-5);
        // 局部矩阵已与父节点一致
        let spine = h.get(1).unwrap();
        assert_mat_near(h.get(0).unwrap().global * spine.local, spine.global);
    }

    #[test]
    fn test_after_physics_child_of_normal_root_refreshed() {
        let mut descs = chain();
        descs[1].deform_after_physics = true;
        let mut h = NodeHierarchy::from_descs(&descs);
        h.get_mut(1).unwrap().anim_translate = Vec3::new(5.0, 0.0, 0.0);

        h.update_local_pass(false);
        h.update_root_pass(false);
        h.update_local_pass(true);
        h.update_root_pass(true);

        let spine = h.get(1).unwrap();
        assert!((spine.global_position() - Vec3::new(5.0, 1.0, 0.0)).length() < 1e-5);
        assert_mat_near(h.get(0).unwrap().global * spine.local, spine.global);
        // 物理后节点下的普通子节点随之更新
        assert!((h.get(2).unwrap().global_position() - Vec3::new(5.0, 2.0, 0.0)).length() < 1e-5);
    }

    fn tree_strategy() -> impl Strategy<Value = (Vec<BoneDesc>, Vec<(f32, f32, f32)>)> {
        (2usize..24).prop_flat_map(|n| {
            let parents = proptest::collection::vec(any::<u32>(), n);
            let angles = proptest::collection::vec((-3.0f32..3.0, -3.0f32..3.0, -3.0f32..3.0), n);
            let depths = proptest::collection::vec(0i32..3, n);
            (parents, angles, depths).prop_map(|(parents, angles, depths)| {
                let descs = parents
                    .iter()
                    .enumerate()
                    .map(|(i, p)| {
                        let parent = if i == 0 { None } else { Some(*p as usize % i) };
                        let mut desc =
                            BoneDesc::new(format!("b{}", i), parent, Vec3::new(i as f32, 1.0, 0.0));
                        desc.deform_depth = depths[i];
                        desc
                    })
                    .collect();
                (descs, angles)
            })
        })
    }

    proptest! {
        #[test]
        fn prop_global_is_parent_times_local((descs, angles) in tree_strategy()) {
            let mut h = NodeHierarchy::from_descs(&descs);
            for (i, (x, y, z)) in angles.iter().enumerate() {
                let node = h.get_mut(i).unwrap();
                node.anim_rotate = Quat::from_euler(glam::EulerRot::XYZ, *x, *y, *z);
                node.anim_translate = Vec3::new(*z, *x, *y) * 0.1;
            }
            h.update_all();
            for node in h.nodes() {
                let expected = match node.parent {
                    Some(p) => h.get(p).unwrap().global * node.local,
                    None => node.local,
                };
                prop_assert!(node.global.abs_diff_eq(expected, 1e-3));
            }
        }
    }
}
