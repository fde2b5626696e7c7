//! 骨骼节点数据结构

use glam::{Mat4, Quat, Vec3};

// ============================================================================
// 骨骼变换
// ============================================================================

/// 骨骼变换（平移、旋转、缩放）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl BoneTransform {
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// 转换为 4x4 矩阵（T · R · S）
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

// ============================================================================
// 付与（继承）变换
// ============================================================================

/// 付与变换标志
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AppendFlags {
    /// 继承旋转
    pub rotate: bool,
    /// 继承平移
    pub translate: bool,
    /// 使用来源骨骼的局部值而不是其付与结果
    pub local: bool,
}

/// 付与关系：本节点的旋转/平移部分由来源节点按权重驱动
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AppendLink {
    /// 来源节点索引
    pub source: usize,
    pub weight: f32,
    pub flags: AppendFlags,
}

// ============================================================================
// 骨骼节点
// ============================================================================

/// 骨骼节点
///
/// 所有跨节点引用（父、子、付与来源、IK）都是 `NodeHierarchy` 平坦数组中的索引。
#[derive(Clone, Debug)]
pub struct Node {
    /// 节点索引
    pub index: usize,
    /// 骨骼名称
    pub name: String,
    /// 父节点索引（None 表示根节点）
    pub parent: Option<usize>,
    /// 子节点索引列表
    pub children: Vec<usize>,

    /// 局部平移（相对于父节点）
    pub translate: Vec3,
    /// 局部旋转
    pub rotate: Quat,
    /// 局部缩放
    pub scale: Vec3,
    /// 加载时保存的初始 TRS，每帧开始和结束时恢复
    pub(crate) initial: BoneTransform,

    /// 动画通道平移（外部每帧写入）
    pub anim_translate: Vec3,
    /// 动画通道旋转（外部每帧写入）
    pub anim_rotate: Quat,
    /// IK 求解得到的旋转
    pub ik_rotate: Quat,

    /// 付与关系
    pub append: Option<AppendLink>,
    pub(crate) append_translate: Vec3,
    pub(crate) append_rotate: Quat,

    /// 局部变换矩阵
    pub local: Mat4,
    /// 全局（模型空间）变换矩阵
    pub global: Mat4,
    /// 绑定姿态全局变换的逆矩阵
    pub inverse_bind: Mat4,

    /// 变形阶层，仅用于排序
    pub deform_depth: i32,
    /// 在物理之后变形
    pub deform_after_physics: bool,
    /// 是否受 IK 旋转影响
    pub enable_ik: bool,
    /// 以本节点为 IK 骨骼的求解器索引
    pub ik_solver: Option<usize>,
}

impl Node {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            parent: None,
            children: Vec::new(),
            translate: Vec3::ZERO,
            rotate: Quat::IDENTITY,
            scale: Vec3::ONE,
            initial: BoneTransform::identity(),
            anim_translate: Vec3::ZERO,
            anim_rotate: Quat::IDENTITY,
            ik_rotate: Quat::IDENTITY,
            append: None,
            append_translate: Vec3::ZERO,
            append_rotate: Quat::IDENTITY,
            local: Mat4::IDENTITY,
            global: Mat4::IDENTITY,
            inverse_bind: Mat4::IDENTITY,
            deform_depth: 0,
            deform_after_physics: false,
            enable_ik: false,
            ik_solver: None,
        }
    }

    /// 动画平移 + 局部平移
    pub fn animate_translate(&self) -> Vec3 {
        self.anim_translate + self.translate
    }

    /// 动画旋转 · 局部旋转
    pub fn animate_rotate(&self) -> Quat {
        self.anim_rotate * self.rotate
    }

    /// 当前局部 TRS
    pub fn transform(&self) -> BoneTransform {
        BoneTransform::new(self.translate, self.rotate, self.scale)
    }

    /// 加载时保存的初始 TRS
    pub fn initial_transform(&self) -> BoneTransform {
        self.initial
    }

    /// 全局变换中的平移部分
    pub fn global_position(&self) -> Vec3 {
        self.global.w_axis.truncate()
    }

    /// 付与计算后的旋转
    pub fn append_rotate(&self) -> Quat {
        self.append_rotate
    }

    /// 付与计算后的平移
    pub fn append_translate(&self) -> Vec3 {
        self.append_translate
    }

    pub(crate) fn save_initial_trs(&mut self) {
        self.initial = self.transform();
    }

    pub(crate) fn load_initial_trs(&mut self) {
        self.translate = self.initial.translation;
        self.rotate = self.initial.rotation;
        self.scale = self.initial.scale;
    }

    /// 计算局部变换矩阵
    pub(crate) fn compute_local(&mut self) {
        let mut t = self.animate_translate();
        let mut r = self.animate_rotate();
        if self.enable_ik {
            r = self.ik_rotate * r;
        }
        if let Some(link) = self.append {
            if link.flags.translate {
                t += self.append_translate;
            }
            if link.flags.rotate {
                r = r * self.append_rotate;
            }
        }
        self.local = BoneTransform::new(t, r, self.scale).to_matrix();
    }
}
