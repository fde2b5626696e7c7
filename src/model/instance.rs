//! 可变形模型
//!
//! 把骨骼层级、IK 求解器、变形混合器、蒙皮引擎和物理桥接组装在一起，
//! 并按固定顺序驱动每一帧：
//!
//! ```text
//! begin_animation → update_morph_animation → update_node_animation(false)
//!   → update_physics_animation → update_node_animation(true)
//!   → end_animation → update_vertices
//! ```

use std::path::{Path, PathBuf};

use glam::{Mat4, Quat, Vec2, Vec3};

use crate::config::{DeformConfig, RenderParams};
use crate::core::{AssetError, DeformResult, ModelError, ModelResult};
use crate::ik::{build_solvers, IkSolver};
use crate::model::desc::{ModelDesc, ToonRef};
use crate::morph::{Material, MorphBlender, SubMesh};
use crate::physics::{NoPhysics, PhysicsBridge, PhysicsPose};
use crate::skeleton::NodeHierarchy;
use crate::skinning::{DeformedVertex, SkinningEngine, SkinningStats};

/// 加载选项
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// 模型纹理路径的基准目录
    pub resource_dir: PathBuf,
    /// 共享卡通贴图目录（toon01.bmp ~ toon10.bmp）；None 时不解析共享卡通贴图
    pub toon_dir: Option<PathBuf>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            resource_dir: PathBuf::from("."),
            toon_dir: None,
        }
    }
}

impl LoadOptions {
    pub fn new(resource_dir: impl Into<PathBuf>) -> Self {
        Self {
            resource_dir: resource_dir.into(),
            toon_dir: None,
        }
    }

    pub fn with_toon_dir(mut self, toon_dir: impl Into<PathBuf>) -> Self {
        self.toon_dir = Some(toon_dir.into());
        self
    }
}

/// 交给渲染器的一帧数据
///
/// 渲染参数每帧显式传入，不保存在模型中。
#[derive(Debug, Clone)]
pub struct RenderFrame<'a> {
    pub positions: &'a [Vec3],
    pub normals: &'a [Vec3],
    pub uvs: &'a [Vec2],
    pub indices: &'a [u32],
    pub materials: &'a [Material],
    pub sub_meshes: &'a [SubMesh],
    pub node_globals: Vec<Mat4>,
    pub params: RenderParams,
}

impl RenderFrame<'_> {
    /// 交错格式顶点
    pub fn interleaved(&self) -> Vec<DeformedVertex> {
        self.positions
            .iter()
            .zip(self.normals)
            .zip(self.uvs)
            .map(|((p, n), uv)| DeformedVertex {
                position: p.to_array(),
                normal: n.to_array(),
                uv: uv.to_array(),
            })
            .collect()
    }
}

/// 可变形模型
pub struct Model {
    name: String,
    hierarchy: NodeHierarchy,
    ik_solvers: Vec<IkSolver>,
    /// 全局配置是否允许 IK
    ik_allowed: bool,
    blender: MorphBlender,
    skinning: SkinningEngine,
    physics: Box<dyn PhysicsBridge>,
    physics_poses: Vec<PhysicsPose>,
    indices: Vec<u32>,
    sub_meshes: Vec<SubMesh>,
    last_stats: Option<SkinningStats>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("nodes", &self.hierarchy.len())
            .field("ik_solvers", &self.ik_solvers.len())
            .field("morphs", &self.blender.len())
            .field("vertices", &self.skinning.vertex_count())
            .field("sub_meshes", &self.sub_meshes.len())
            .finish()
    }
}

impl Model {
    // ========================================================================
    // 加载
    // ========================================================================

    /// 从加载器数据构建模型
    ///
    /// 结构上无法使用的数据返回错误；可容忍的缺陷只记录警告。
    pub fn load(desc: &ModelDesc, options: &LoadOptions, config: &DeformConfig) -> DeformResult<Self> {
        config.validate()?;

        let vertex_count = desc.vertices.len();
        if vertex_count > 0 && desc.bones.is_empty() {
            return Err(ModelError::EmptySkeleton {
                vertices: vertex_count,
            }
            .into());
        }
        if let Some(&index) = desc.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(ModelError::IndexOutOfRange {
                index,
                vertices: vertex_count,
            }
            .into());
        }

        let materials = resolve_materials(desc, options)?;
        let sub_meshes = build_sub_meshes(desc);

        let mut hierarchy = NodeHierarchy::from_descs(&desc.bones);
        let ik_solvers = build_solvers(&desc.bones, &mut hierarchy, &config.ik);
        let blender = MorphBlender::new(&desc.morphs, vertex_count, materials, hierarchy.len());
        let skinning = SkinningEngine::new(&desc.vertices, hierarchy.len(), &config.skinning);

        tracing::info!(
            target: "model",
            "Loaded model '{}': {} nodes, {} IK solvers, {} morphs, {} vertices, {} materials",
            desc.name,
            hierarchy.len(),
            ik_solvers.len(),
            blender.len(),
            vertex_count,
            blender.materials().len()
        );

        Ok(Self {
            name: desc.name.clone(),
            hierarchy,
            ik_solvers,
            ik_allowed: config.ik.enabled,
            blender,
            skinning,
            physics: Box::new(NoPhysics),
            physics_poses: Vec::new(),
            indices: desc.indices.clone(),
            sub_meshes,
            last_stats: None,
        })
    }

    /// 替换物理桥接并重置其状态
    pub fn set_physics(&mut self, mut physics: Box<dyn PhysicsBridge>) {
        physics.reset(&self.hierarchy);
        self.physics = physics;
    }

    // ========================================================================
    // 帧驱动
    // ========================================================================

    /// 清空动画输入，求解一次静止姿态并重置物理
    pub fn initialize_animation(&mut self) {
        self.hierarchy.reset_animation();
        for i in 0..self.blender.len() {
            self.blender.set_weight(i, 0.0);
        }
        for solver in &mut self.ik_solvers {
            solver.set_enabled(self.ik_allowed);
        }

        self.begin_animation();
        self.update_morph_animation();
        self.update_node_animation(false);
        self.physics.reset(&self.hierarchy);
        self.update_node_animation(true);
        self.end_animation();
    }

    /// 帧开始：恢复初始 TRS，清除 IK 旋转和变形累加器
    pub fn begin_animation(&mut self) {
        self.hierarchy.begin_update();
        self.blender.begin();
    }

    /// 帧结束：恢复初始 TRS（全局矩阵保留给蒙皮使用）
    pub fn end_animation(&mut self) {
        self.hierarchy.end_update();
    }

    /// 按权重混合全部变形并解析材质
    pub fn update_morph_animation(&mut self) {
        self.blender.apply_all(&mut self.hierarchy);
        self.blender.end();
    }

    /// 更新指定阶段（物理前 / 物理后）的节点
    ///
    /// 局部矩阵和全局矩阵先整体更新一次，然后按变形顺序处理付与和 IK。
    pub fn update_node_animation(&mut self, after_physics: bool) {
        self.hierarchy.update_local_pass(after_physics);
        self.hierarchy.update_root_pass(after_physics);

        for i in 0..self.hierarchy.sorted().len() {
            let index = self.hierarchy.sorted()[i];
            let Some(node) = self.hierarchy.get(index) else {
                continue;
            };
            if node.deform_after_physics != after_physics {
                continue;
            }
            let has_append = node.append.is_some();
            let solver = node.ik_solver;

            if has_append {
                self.hierarchy.update_append(index);
                self.hierarchy.update_global_subtree(index);
            }
            if let Some(solver) = solver.and_then(|s| self.ik_solvers.get_mut(s)) {
                if let Some(stats) = solver.solve(&mut self.hierarchy) {
                    tracing::trace!(
                        target: "ik",
                        "Solved '{}' in {} iterations, distance {:.5}",
                        solver.name, stats.iterations, stats.best_distance
                    );
                }
                self.hierarchy.update_global_subtree(index);
            }
        }

        self.hierarchy.update_root_pass(after_physics);
    }

    /// 推进物理模拟并写回物理驱动节点的全局姿态
    pub fn update_physics_animation(&mut self, elapsed: f32) {
        self.physics_poses.clear();
        self.physics
            .simulate(elapsed, &self.hierarchy, &mut self.physics_poses);
        self.hierarchy.apply_physics_poses(&self.physics_poses);
    }

    /// 蒙皮全部顶点
    pub fn update_vertices(&mut self) -> ModelResult<SkinningStats> {
        self.skinning.prepare(&self.hierarchy);
        let stats = self
            .skinning
            .skin(self.blender.morph_positions(), self.blender.morph_uvs())?;
        self.last_stats = Some(stats);
        Ok(stats)
    }

    /// 完整的一帧
    pub fn update(&mut self, elapsed: f32) -> ModelResult<SkinningStats> {
        self.begin_animation();
        self.update_morph_animation();
        self.update_node_animation(false);
        self.update_physics_animation(elapsed);
        self.update_node_animation(true);
        self.end_animation();
        self.update_vertices()
    }

    // ========================================================================
    // 动画输入
    // ========================================================================

    /// 写入节点的动画平移和旋转；节点不存在时返回 false
    pub fn set_node_animation(&mut self, index: usize, translate: Vec3, rotate: Quat) -> bool {
        match self.hierarchy.get_mut(index) {
            Some(node) => {
                node.anim_translate = translate;
                node.anim_rotate = rotate;
                true
            }
            None => false,
        }
    }

    /// 设置变形权重（截断到 [0, 1]）；变形不存在时返回 false
    pub fn set_morph_weight(&mut self, index: usize, weight: f32) -> bool {
        if index >= self.blender.len() {
            return false;
        }
        self.blender.set_weight(index, weight);
        true
    }

    /// 按 IK 骨骼名称启用或禁用求解器；求解器不存在时返回 false
    pub fn set_ik_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.find_ik_solver(name) {
            Some(index) => {
                self.ik_solvers[index].set_enabled(enabled && self.ik_allowed);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // 查询
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find_node(&self, name: &str) -> Option<usize> {
        self.hierarchy.find(name)
    }

    pub fn find_morph(&self, name: &str) -> Option<usize> {
        self.blender.find(name)
    }

    pub fn find_ik_solver(&self, name: &str) -> Option<usize> {
        self.ik_solvers.iter().position(|s| s.name == name)
    }

    pub fn hierarchy(&self) -> &NodeHierarchy {
        &self.hierarchy
    }

    pub fn ik_solvers(&self) -> &[IkSolver] {
        &self.ik_solvers
    }

    pub fn blender(&self) -> &MorphBlender {
        &self.blender
    }

    pub fn skinning(&self) -> &SkinningEngine {
        &self.skinning
    }

    pub fn positions(&self) -> &[Vec3] {
        self.skinning.positions()
    }

    pub fn normals(&self) -> &[Vec3] {
        self.skinning.normals()
    }

    pub fn uvs(&self) -> &[Vec2] {
        self.skinning.uvs()
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn materials(&self) -> &[Material] {
        self.blender.materials()
    }

    pub fn sub_meshes(&self) -> &[SubMesh] {
        &self.sub_meshes
    }

    pub fn node_globals(&self) -> Vec<Mat4> {
        self.hierarchy.global_transforms()
    }

    /// 最近一次蒙皮的统计
    pub fn last_stats(&self) -> Option<SkinningStats> {
        self.last_stats
    }

    /// 打包渲染所需的全部数据
    pub fn render_frame(&self, params: &RenderParams) -> RenderFrame<'_> {
        RenderFrame {
            positions: self.positions(),
            normals: self.normals(),
            uvs: self.uvs(),
            indices: &self.indices,
            materials: self.materials(),
            sub_meshes: &self.sub_meshes,
            node_globals: self.node_globals(),
            params: *params,
        }
    }
}

// ============================================================================
// 加载辅助
// ============================================================================

/// 创建材质并解析纹理路径
fn resolve_materials(desc: &ModelDesc, options: &LoadOptions) -> DeformResult<Vec<Material>> {
    let texture = |material: &str, index: usize| -> DeformResult<PathBuf> {
        let relative = desc
            .textures
            .get(index)
            .ok_or_else(|| ModelError::TextureIndexOutOfRange {
                material: material.to_string(),
                index,
                count: desc.textures.len(),
            })?;
        existing(options.resource_dir.join(relative))
    };

    let mut materials = Vec::with_capacity(desc.materials.len());
    for m in &desc.materials {
        let mut material = Material::from_desc(m);
        material.texture = m.texture.map(|i| texture(&m.name, i)).transpose()?;
        material.sphere_texture = m.sphere_texture.map(|i| texture(&m.name, i)).transpose()?;
        material.toon_texture = match m.toon {
            ToonRef::None => None,
            ToonRef::Texture(i) => Some(texture(&m.name, i)?),
            ToonRef::Shared(n) => match &options.toon_dir {
                Some(dir) => Some(existing(shared_toon_path(dir, n))?),
                None => {
                    tracing::debug!(
                        target: "model",
                        "Material '{}' uses shared toon {} but no toon directory is set",
                        m.name, n
                    );
                    None
                }
            },
        };
        materials.push(material);
    }
    Ok(materials)
}

/// 共享卡通贴图文件名从 toon01.bmp 开始编号
fn shared_toon_path(dir: &Path, index: u8) -> PathBuf {
    dir.join(format!("toon{:02}.bmp", u16::from(index) + 1))
}

fn existing(path: PathBuf) -> DeformResult<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(AssetError::NotFound {
            path: path.display().to_string(),
        }
        .into())
    }
}

/// 按材质顺序把索引缓冲区切分为子网格
fn build_sub_meshes(desc: &ModelDesc) -> Vec<SubMesh> {
    let total = desc.indices.len();
    let mut begin = 0usize;
    let mut sub_meshes = Vec::with_capacity(desc.materials.len());
    for (material, m) in desc.materials.iter().enumerate() {
        let available = total.saturating_sub(begin);
        if m.face_vertex_count > available {
            tracing::warn!(
                target: "model",
                "Material '{}' covers {} indices but only {} remain, truncated",
                m.name, m.face_vertex_count, available
            );
        }
        let count = m.face_vertex_count.min(available);
        sub_meshes.push(SubMesh {
            begin_index: begin,
            vertex_count: count,
            material,
        });
        begin += count;
    }
    sub_meshes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::quat_near;
    use crate::core::DeformError;
    use crate::model::desc::{
        BoneDesc, IkDesc, IkLinkDesc, MaterialDesc, MorphDesc, MorphPayload, PositionMorphDesc,
        VertexDesc, VertexWeightDesc,
    };

    fn vertex(position: Vec3, bone: usize) -> VertexDesc {
        VertexDesc {
            position,
            normal: Vec3::Z,
            uv: Vec2::ZERO,
            weight: VertexWeightDesc::Bdef1 { bone },
        }
    }

    /// 两段手臂 + IK 目标骨骼，一个三角形
    fn arm_desc() -> ModelDesc {
        let mut bones = vec![
            BoneDesc::new("shoulder", None, Vec3::ZERO),
            BoneDesc::new("elbow", Some(0), Vec3::new(1.0, 0.0, 0.0)),
            BoneDesc::new("wrist", Some(1), Vec3::new(2.0, 0.0, 0.0)),
            BoneDesc::new("hand_ik", None, Vec3::new(2.0, 0.0, 0.0)),
        ];
        bones[3].ik = Some(IkDesc {
            target: Some(2),
            iterate_count: Some(40),
            limit_angle: None,
            links: vec![
                IkLinkDesc { bone: 1, limit: None },
                IkLinkDesc { bone: 0, limit: None },
            ],
        });
        ModelDesc {
            name: "arm".to_string(),
            bones,
            morphs: vec![MorphDesc {
                name: "lift".to_string(),
                payload: MorphPayload::Position(vec![PositionMorphDesc {
                    vertex: 0,
                    offset: Vec3::new(0.0, 0.0, 1.0),
                }]),
            }],
            vertices: vec![
                vertex(Vec3::ZERO, 0),
                vertex(Vec3::new(1.0, 0.0, 0.0), 1),
                vertex(Vec3::new(2.0, 0.0, 0.0), 2),
            ],
            indices: vec![0, 1, 2],
            materials: vec![MaterialDesc::plain("skin", 3)],
            textures: Vec::new(),
        }
    }

    fn sequential_config() -> DeformConfig {
        let mut config = DeformConfig::default();
        config.skinning.parallel = false;
        config
    }

    fn load(desc: &ModelDesc) -> Model {
        Model::load(desc, &LoadOptions::default(), &sequential_config()).unwrap()
    }

    #[test]
    fn test_rest_pose_frame() {
        let mut model = load(&arm_desc());
        model.initialize_animation();
        let stats = model.update(1.0 / 30.0).unwrap();
        assert_eq!(stats.vertices, 3);
        assert!((model.positions()[2] - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-4);
        assert_eq!(model.sub_meshes(), &[SubMesh { begin_index: 0, vertex_count: 3, material: 0 }]);
    }

    #[test]
    fn test_ik_drives_wrist_to_goal() {
        let mut model = load(&arm_desc());
        let ik = model.find_node("hand_ik").unwrap();
        // 目标移动到 (1, 1, 0)
        assert!(model.set_node_animation(ik, Vec3::new(-1.0, 1.0, 0.0), Quat::IDENTITY));
        model.update(0.0).unwrap();
        let wrist = model.hierarchy().get(2).unwrap().global_position();
        assert!((wrist - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-3);
        assert!((model.positions()[2] - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_disabled_ik_keeps_pose() {
        let mut model = load(&arm_desc());
        let ik = model.find_node("hand_ik").unwrap();
        model.set_node_animation(ik, Vec3::new(-1.0, 1.0, 0.0), Quat::IDENTITY);
        assert!(model.set_ik_enabled("hand_ik", false));
        assert!(!model.set_ik_enabled("missing", false));
        model.update(0.0).unwrap();
        let wrist = model.hierarchy().get(2).unwrap().global_position();
        assert!((wrist - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_morph_and_node_animation() {
        let mut model = load(&arm_desc());
        let lift = model.find_morph("lift").unwrap();
        assert!(model.set_morph_weight(lift, 0.5));
        assert!(!model.set_morph_weight(7, 0.5));
        assert!(model.set_ik_enabled("hand_ik", false));
        model.set_node_animation(0, Vec3::ZERO, Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        model.update(0.0).unwrap();

        assert!((model.positions()[0] - Vec3::new(0.0, 0.0, 0.5)).length() < 1e-5);
        assert!((model.positions()[1] - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5);
        let elbow_rotation = Quat::from_mat4(&model.node_globals()[1]);
        assert!(quat_near(elbow_rotation, Quat::from_rotation_z(std::f32::consts::FRAC_PI_2), 1e-4));
    }

    #[test]
    fn test_frame_restores_initial_trs() {
        let mut model = load(&arm_desc());
        model.update(0.0).unwrap();
        let node = model.hierarchy().get(1).unwrap();
        assert_eq!(node.translate, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(node.rotate, Quat::IDENTITY);
    }

    #[test]
    fn test_physics_pose_moves_subtree() {
        struct Lift;
        impl PhysicsBridge for Lift {
            fn reset(&mut self, _hierarchy: &NodeHierarchy) {}
            fn simulate(&mut self, _elapsed: f32, hierarchy: &NodeHierarchy, poses: &mut Vec<PhysicsPose>) {
                let elbow = hierarchy.get(1).map(|n| n.global).unwrap_or(Mat4::IDENTITY);
                poses.push(PhysicsPose {
                    node: 1,
                    global: Mat4::from_translation(Vec3::Y) * elbow,
                });
            }
        }

        let mut model = load(&arm_desc());
        model.set_ik_enabled("hand_ik", false);
        model.set_physics(Box::new(Lift));
        model.update(1.0 / 60.0).unwrap();
        assert!((model.positions()[0] - Vec3::ZERO).length() < 1e-5);
        assert!((model.positions()[1] - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
        assert!((model.positions()[2] - Vec3::new(2.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_after_physics_node_animated_same_frame() {
        let mut bones = vec![
            BoneDesc::new("root", None, Vec3::ZERO),
            BoneDesc::new("late", Some(0), Vec3::new(0.0, 1.0, 0.0)),
        ];
        bones[1].deform_after_physics = true;
        let desc = ModelDesc {
            name: "late".to_string(),
            bones,
            vertices: vec![vertex(Vec3::new(0.0, 1.0, 0.0), 1)],
            ..ModelDesc::default()
        };
        let mut model = load(&desc);
        model.set_node_animation(1, Vec3::new(5.0, 0.0, 0.0), Quat::IDENTITY);
        model.update(0.0).unwrap();

        assert!((model.positions()[0] - Vec3::new(5.0, 1.0, 0.0)).length() < 1e-5);
        let h = model.hierarchy();
        let late = h.get(1).unwrap();
        assert!((h.get(0).unwrap().global * late.local).abs_diff_eq(late.global, 1e-5));
    }

    #[test]
    fn test_empty_skeleton_is_error() {
        let mut desc = arm_desc();
        desc.bones.clear();
        let err = Model::load(&desc, &LoadOptions::default(), &sequential_config()).unwrap_err();
        assert!(matches!(err, DeformError::Model(ModelError::EmptySkeleton { vertices: 3 })));
    }

    #[test]
    fn test_index_out_of_range_is_error() {
        let mut desc = arm_desc();
        desc.indices = vec![0, 1, 5];
        let err = Model::load(&desc, &LoadOptions::default(), &sequential_config()).unwrap_err();
        assert!(matches!(err, DeformError::Model(ModelError::IndexOutOfRange { index: 5, .. })));
    }

    #[test]
    fn test_texture_index_out_of_range_is_error() {
        let mut desc = arm_desc();
        desc.materials[0].texture = Some(2);
        let err = Model::load(&desc, &LoadOptions::default(), &sequential_config()).unwrap_err();
        assert!(matches!(
            err,
            DeformError::Model(ModelError::TextureIndexOutOfRange { index: 2, count: 0, .. })
        ));
    }

    #[test]
    fn test_textures_resolved_against_resource_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("body.png"), b"png").unwrap();
        let toon_dir = dir.path().join("toon");
        std::fs::create_dir(&toon_dir).unwrap();
        std::fs::write(toon_dir.join("toon03.bmp"), b"bmp").unwrap();

        let mut desc = arm_desc();
        desc.textures = vec![PathBuf::from("body.png")];
        desc.materials[0].texture = Some(0);
        desc.materials[0].toon = ToonRef::Shared(2);

        let options = LoadOptions::new(dir.path()).with_toon_dir(&toon_dir);
        let model = Model::load(&desc, &options, &sequential_config()).unwrap();
        let material = &model.materials()[0];
        assert_eq!(material.texture.as_deref(), Some(dir.path().join("body.png").as_path()));
        assert_eq!(material.toon_texture.as_deref(), Some(toon_dir.join("toon03.bmp").as_path()));
    }

    #[test]
    fn test_sub_meshes_truncated_to_index_count() {
        let mut desc = arm_desc();
        desc.materials = vec![MaterialDesc::plain("a", 3), MaterialDesc::plain("b", 3)];
        let model = load(&desc);
        assert_eq!(model.sub_meshes()[1].begin_index, 3);
        assert_eq!(model.sub_meshes()[1].vertex_count, 0);
    }

    #[test]
    fn test_render_frame_carries_params() {
        let mut model = load(&arm_desc());
        model.update(0.0).unwrap();
        let params = RenderParams {
            light_color: [1.0, 0.9, 0.8],
            ..RenderParams::default()
        };
        let frame = model.render_frame(&params);
        assert_eq!(frame.params, params);
        assert_eq!(frame.positions.len(), 3);
        assert_eq!(frame.node_globals.len(), 4);
        assert_eq!(frame.interleaved().len(), 3);
    }
}
