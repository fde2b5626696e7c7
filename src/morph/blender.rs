//! 变形混合器
//!
//! 每帧流程：`begin` 清空累加器 → `apply` / `apply_all` 按权重累加 → `end` 解析材质。

use glam::{Quat, Vec3, Vec4};

use super::material::{Material, MaterialFactor};
use crate::model::desc::{MaterialOp, MorphDesc, MorphPayload};
use crate::skeleton::NodeHierarchy;

// ============================================================================
// 变形数据
// ============================================================================

/// 变形类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphKind {
    Position,
    Uv,
    Material,
    Bone,
    Group,
    /// 加载时识别但不处理的类型
    Unsupported,
}

/// 变形
#[derive(Debug, Clone)]
pub struct Morph {
    pub name: String,
    /// 权重 [0, 1]
    pub weight: f32,
    pub kind: MorphKind,
    /// 对应类型数据表中的索引
    data_index: usize,
}

#[derive(Debug, Clone, Copy)]
struct PositionOffset {
    vertex: usize,
    offset: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct UvOffset {
    vertex: usize,
    offset: Vec4,
}

#[derive(Debug, Clone, Copy)]
struct MaterialOffset {
    /// None 表示全部材质
    material: Option<usize>,
    op: MaterialOp,
    factor: MaterialFactor,
}

#[derive(Debug, Clone, Copy)]
struct BoneOffset {
    node: usize,
    translate: Vec3,
    rotate: Quat,
}

#[derive(Debug, Clone, Copy)]
struct GroupEntry {
    /// None 表示无效条目
    morph: Option<usize>,
    weight: f32,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnStack,
    Done,
}

// ============================================================================
// 混合器
// ============================================================================

/// 变形混合器
#[derive(Debug, Clone, Default)]
pub struct MorphBlender {
    morphs: Vec<Morph>,

    positions: Vec<Vec<PositionOffset>>,
    uvs: Vec<Vec<UvOffset>>,
    material_offsets: Vec<Vec<MaterialOffset>>,
    bones: Vec<Vec<BoneOffset>>,
    groups: Vec<Vec<GroupEntry>>,

    morph_positions: Vec<Vec3>,
    morph_uvs: Vec<Vec4>,

    base_materials: Vec<Material>,
    materials: Vec<Material>,
    mul_factors: Vec<MaterialFactor>,
    add_factors: Vec<MaterialFactor>,
}

impl MorphBlender {
    /// 构建混合器
    ///
    /// 越界的顶点、材质、骨骼引用被丢弃；组变形中形成循环的条目被置为无效。
    pub fn new(
        descs: &[MorphDesc],
        vertex_count: usize,
        materials: Vec<Material>,
        node_count: usize,
    ) -> Self {
        let material_count = materials.len();
        let mut blender = Self {
            morph_positions: vec![Vec3::ZERO; vertex_count],
            morph_uvs: vec![Vec4::ZERO; vertex_count],
            mul_factors: vec![MaterialFactor::init_mul(); material_count],
            add_factors: vec![MaterialFactor::init_add(); material_count],
            base_materials: materials.clone(),
            materials,
            ..Self::default()
        };

        for desc in descs {
            let (kind, data_index) = match &desc.payload {
                MorphPayload::Position(entries) => {
                    let table = keep_valid(&desc.name, "vertex", vertex_count, entries, |e| {
                        (e.vertex, PositionOffset {
                            vertex: e.vertex,
                            offset: e.offset,
                        })
                    });
                    blender.positions.push(table);
                    (MorphKind::Position, blender.positions.len() - 1)
                }
                MorphPayload::Uv(entries) => {
                    let table = keep_valid(&desc.name, "vertex", vertex_count, entries, |e| {
                        (e.vertex, UvOffset {
                            vertex: e.vertex,
                            offset: e.offset,
                        })
                    });
                    blender.uvs.push(table);
                    (MorphKind::Uv, blender.uvs.len() - 1)
                }
                MorphPayload::Material(entries) => {
                    let mut table = Vec::with_capacity(entries.len());
                    for e in entries {
                        if let Some(m) = e.material.filter(|&m| m >= material_count) {
                            tracing::warn!(
                                target: "morph",
                                "Morph {} references missing material {}, entry dropped",
                                desc.name, m
                            );
                            continue;
                        }
                        table.push(MaterialOffset {
                            material: e.material,
                            op: e.op,
                            factor: MaterialFactor::from_morph(e),
                        });
                    }
                    blender.material_offsets.push(table);
                    (MorphKind::Material, blender.material_offsets.len() - 1)
                }
                MorphPayload::Bone(entries) => {
                    let table = keep_valid(&desc.name, "bone", node_count, entries, |e| {
                        (e.bone, BoneOffset {
                            node: e.bone,
                            translate: e.translate,
                            rotate: e.rotate,
                        })
                    });
                    blender.bones.push(table);
                    (MorphKind::Bone, blender.bones.len() - 1)
                }
                MorphPayload::Group(entries) => {
                    let table = entries
                        .iter()
                        .map(|e| GroupEntry {
                            morph: e.morph.filter(|&m| {
                                let valid = m < descs.len();
                                if !valid {
                                    tracing::warn!(
                                        target: "morph",
                                        "Group morph {} references missing morph {}, entry ignored",
                                        desc.name, m
                                    );
                                }
                                valid
                            }),
                            weight: e.weight,
                        })
                        .collect();
                    blender.groups.push(table);
                    (MorphKind::Group, blender.groups.len() - 1)
                }
                MorphPayload::Unsupported(kind) => {
                    tracing::warn!(
                        target: "morph",
                        "Morph {} has unsupported type {}, ignored",
                        desc.name, kind
                    );
                    (MorphKind::Unsupported, 0)
                }
            };
            blender.morphs.push(Morph {
                name: desc.name.clone(),
                weight: 0.0,
                kind,
                data_index,
            });
        }

        blender.break_group_cycles();
        blender
    }

    /// 深度优先遍历组变形，指向栈上变形的条目置为无效
    fn break_group_cycles(&mut self) {
        let count = self.morphs.len();
        let mut visit = vec![Visit::New; count];

        for start in 0..count {
            if visit[start] != Visit::New {
                continue;
            }
            visit[start] = Visit::OnStack;
            let mut stack = vec![(start, 0usize)];

            while let Some(&(morph, next)) = stack.last() {
                let group = match self.morphs[morph].kind {
                    MorphKind::Group => Some(self.morphs[morph].data_index),
                    _ => None,
                };
                let entry_count = group.map(|g| self.groups[g].len()).unwrap_or(0);

                if next >= entry_count {
                    visit[morph] = Visit::Done;
                    stack.pop();
                    continue;
                }
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }

                let Some(g) = group else {
                    continue;
                };
                let Some(child) = self.groups[g][next].morph else {
                    continue;
                };
                match visit[child] {
                    Visit::OnStack => {
                        tracing::warn!(
                            target: "morph",
                            "Group morph {} forms a cycle through {}, entry ignored",
                            self.morphs[morph].name, self.morphs[child].name
                        );
                        self.groups[g][next].morph = None;
                    }
                    Visit::New => {
                        visit[child] = Visit::OnStack;
                        stack.push((child, 0));
                    }
                    Visit::Done => {}
                }
            }
        }
    }

    // ========================================================================
    // 查询
    // ========================================================================

    pub fn morphs(&self) -> &[Morph] {
        &self.morphs
    }

    pub fn len(&self) -> usize {
        self.morphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.morphs.is_empty()
    }

    /// 通过名称查找变形索引
    pub fn find(&self, name: &str) -> Option<usize> {
        self.morphs.iter().position(|m| m.name == name)
    }

    /// 设置权重，超出 [0, 1] 的值会被截断
    pub fn set_weight(&mut self, index: usize, weight: f32) {
        if let Some(morph) = self.morphs.get_mut(index) {
            morph.weight = weight.clamp(0.0, 1.0);
        }
    }

    pub fn weight(&self, index: usize) -> Option<f32> {
        self.morphs.get(index).map(|m| m.weight)
    }

    /// 每个顶点的位置偏移
    pub fn morph_positions(&self) -> &[Vec3] {
        &self.morph_positions
    }

    /// 每个顶点的 UV 偏移（只使用 xy）
    pub fn morph_uvs(&self) -> &[Vec4] {
        &self.morph_uvs
    }

    pub fn mul_factors(&self) -> &[MaterialFactor] {
        &self.mul_factors
    }

    pub fn add_factors(&self) -> &[MaterialFactor] {
        &self.add_factors
    }

    /// 最近一次 `end` 解析后的材质
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    // ========================================================================
    // 每帧混合
    // ========================================================================

    /// 清空累加器
    pub fn begin(&mut self) {
        self.morph_positions.fill(Vec3::ZERO);
        self.morph_uvs.fill(Vec4::ZERO);
        self.mul_factors.fill(MaterialFactor::init_mul());
        self.add_factors.fill(MaterialFactor::init_add());
    }

    /// 以指定权重应用一个变形
    pub fn apply(&mut self, index: usize, weight: f32, hierarchy: &mut NodeHierarchy) {
        let Some(morph) = self.morphs.get(index) else {
            return;
        };
        let (kind, data) = (morph.kind, morph.data_index);
        match kind {
            MorphKind::Position => {
                if weight == 0.0 {
                    return;
                }
                for e in &self.positions[data] {
                    self.morph_positions[e.vertex] += e.offset * weight;
                }
            }
            MorphKind::Uv => {
                if weight == 0.0 {
                    return;
                }
                for e in &self.uvs[data] {
                    self.morph_uvs[e.vertex] += e.offset * weight;
                }
            }
            MorphKind::Material => {
                for e in &self.material_offsets[data] {
                    let targets = match e.material {
                        Some(m) => m..m + 1,
                        None => 0..self.mul_factors.len(),
                    };
                    for m in targets {
                        match e.op {
                            MaterialOp::Mul => self.mul_factors[m].mul(&e.factor, weight),
                            MaterialOp::Add => self.add_factors[m].add(&e.factor, weight),
                        }
                    }
                }
            }
            MorphKind::Bone => {
                for e in &self.bones[data] {
                    if let Some(node) = hierarchy.get_mut(e.node) {
                        node.translate += Vec3::ZERO.lerp(e.translate, weight);
                        node.rotate = node.rotate.slerp(e.rotate, weight);
                    }
                }
            }
            MorphKind::Group => {
                for i in 0..self.groups[data].len() {
                    let entry = self.groups[data][i];
                    if let Some(child) = entry.morph {
                        self.apply(child, entry.weight * weight, hierarchy);
                    }
                }
            }
            MorphKind::Unsupported => {}
        }
    }

    /// 按各自权重应用全部变形
    pub fn apply_all(&mut self, hierarchy: &mut NodeHierarchy) {
        for i in 0..self.morphs.len() {
            let weight = self.morphs[i].weight;
            self.apply(i, weight, hierarchy);
        }
    }

    /// 解析最终材质
    pub fn end(&mut self) {
        for (i, out) in self.materials.iter_mut().enumerate() {
            MaterialFactor::resolve(
                &self.base_materials[i],
                &self.mul_factors[i],
                &self.add_factors[i],
                out,
            );
        }
    }
}

/// 过滤越界引用的条目
fn keep_valid<D, T>(
    morph: &str,
    what: &str,
    limit: usize,
    entries: &[D],
    convert: impl Fn(&D) -> (usize, T),
) -> Vec<T> {
    let mut out = Vec::with_capacity(entries.len());
    let mut dropped = 0usize;
    for e in entries {
        let (index, value) = convert(e);
        if index < limit {
            out.push(value);
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        tracing::warn!(
            target: "morph",
            "Morph {} dropped {} entries with out-of-range {} index",
            morph, dropped, what
        );
    }
    out
}
