//! 顶点蒙皮
//!
//! 每帧先由 `prepare` 计算蒙皮矩阵，再由 `skin` 对全部顶点求变形结果。
//! 顶点区间被切成连续的块交给 rayon 并行处理，各块只写自己的输出切片。

use std::time::Instant;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use rayon::prelude::*;

use super::dual_quat::DualQuat;
use super::vertex::VertexBoneInfo;
use crate::config::SkinningConfig;
use crate::core::{ModelError, ModelResult};
use crate::model::desc::VertexDesc;
use crate::skeleton::NodeHierarchy;

/// 交错格式的变形顶点，可直接上传到 GPU 顶点缓冲区
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DeformedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// 蒙皮统计
#[derive(Debug, Clone, Copy, Default)]
pub struct SkinningStats {
    /// 处理的顶点数
    pub vertices: usize,
    /// 任务块数量（串行时为 1）
    pub chunks: usize,
    pub parallel: bool,
    /// 耗时（微秒）
    pub elapsed_us: u64,
}

/// 每帧只读的蒙皮输入
struct SkinInputs<'a> {
    positions: &'a [Vec3],
    normals: &'a [Vec3],
    uvs: &'a [Vec2],
    infos: &'a [VertexBoneInfo],
    skin: &'a [Mat4],
    rotations: &'a [Quat],
    dual_quats: &'a [DualQuat],
    morph_positions: &'a [Vec3],
    morph_uvs: &'a [Vec4],
}

impl SkinInputs<'_> {
    /// 处理从 `begin` 开始的一段连续顶点
    fn run(&self, begin: usize, positions: &mut [Vec3], normals: &mut [Vec3], uvs: &mut [Vec2]) {
        for (offset, ((out_p, out_n), out_uv)) in positions
            .iter_mut()
            .zip(normals.iter_mut())
            .zip(uvs.iter_mut())
            .enumerate()
        {
            let i = begin + offset;
            let (p, n) = self.skin_vertex(i);
            *out_p = p;
            *out_n = n;
            let morph_uv = self.morph_uvs[i];
            *out_uv = self.uvs[i] + Vec2::new(morph_uv.x, morph_uv.y);
        }
    }

    fn skin_vertex(&self, i: usize) -> (Vec3, Vec3) {
        let position = self.positions[i] + self.morph_positions[i];
        let normal = self.normals[i];
        let skin = self.skin;

        let matrix = match self.infos[i] {
            VertexBoneInfo::Weight1 { bone } => skin[bone],
            VertexBoneInfo::Weight2 { bones, weights } => {
                skin[bones[0]] * weights[0] + skin[bones[1]] * weights[1]
            }
            VertexBoneInfo::Weight4 { bones, weights } => {
                skin[bones[0]] * weights[0]
                    + skin[bones[1]] * weights[1]
                    + skin[bones[2]] * weights[2]
                    + skin[bones[3]] * weights[3]
            }
            VertexBoneInfo::Sdef(sdef) => {
                let [b0, b1] = sdef.bones;
                let w0 = sdef.weight;
                let w1 = 1.0 - w0;
                let rotation = self.rotations[b0].slerp(self.rotations[b1], w1);
                let p = rotation * (position - sdef.c)
                    + skin[b0].transform_point3(sdef.r0) * w0
                    + skin[b1].transform_point3(sdef.r1) * w1;
                return (p, rotation * normal);
            }
            VertexBoneInfo::DualQuaternion { bones, weights } => {
                let dq = DualQuat::blend(
                    bones
                        .iter()
                        .zip(weights.iter())
                        .map(|(&b, &w)| (self.dual_quats[b], w)),
                );
                return (
                    dq.transform_point(position),
                    dq.transform_vector(normal).normalize_or_zero(),
                );
            }
        };

        (
            matrix.transform_point3(position),
            matrix.transform_vector3(normal).normalize_or_zero(),
        )
    }
}

/// 蒙皮引擎
#[derive(Debug)]
pub struct SkinningEngine {
    base_positions: Vec<Vec3>,
    base_normals: Vec<Vec3>,
    base_uvs: Vec<Vec2>,
    infos: Vec<VertexBoneInfo>,

    skin: Vec<Mat4>,
    rotations: Vec<Quat>,
    dual_quats: Vec<DualQuat>,

    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,

    config: SkinningConfig,
    pool: Option<rayon::ThreadPool>,
}

impl SkinningEngine {
    /// 创建蒙皮引擎
    ///
    /// 越界的骨骼影响会被丢弃并汇总记录一条警告。
    pub fn new(vertices: &[VertexDesc], node_count: usize, config: &SkinningConfig) -> Self {
        let mut dropped = 0usize;
        let infos = vertices
            .iter()
            .map(|v| {
                let (info, lost) = VertexBoneInfo::from_desc(&v.weight, node_count);
                dropped += usize::from(lost);
                info
            })
            .collect();
        if dropped > 0 {
            tracing::warn!(
                target: "skinning",
                "{} vertices referenced missing bones, influences dropped",
                dropped
            );
        }

        let pool = if config.parallel && config.worker_threads > 0 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(config.worker_threads)
                .thread_name(|i| format!("skinning-{}", i))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    tracing::warn!(
                        target: "skinning",
                        "Failed to build skinning thread pool: {}, using global pool",
                        e
                    );
                    None
                }
            }
        } else {
            None
        };

        let base_positions: Vec<Vec3> = vertices.iter().map(|v| v.position).collect();
        let base_normals: Vec<Vec3> = vertices.iter().map(|v| v.normal).collect();
        let base_uvs: Vec<Vec2> = vertices.iter().map(|v| v.uv).collect();

        Self {
            positions: base_positions.clone(),
            normals: base_normals.clone(),
            uvs: base_uvs.clone(),
            base_positions,
            base_normals,
            base_uvs,
            infos,
            skin: vec![Mat4::IDENTITY; node_count],
            rotations: vec![Quat::IDENTITY; node_count],
            dual_quats: vec![DualQuat::IDENTITY; node_count],
            config: config.clone(),
            pool,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.base_positions.len()
    }

    pub fn infos(&self) -> &[VertexBoneInfo] {
        &self.infos
    }

    /// 蒙皮矩阵 `global · inverse_bind`
    pub fn skin_matrices(&self) -> &[Mat4] {
        &self.skin
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn config(&self) -> &SkinningConfig {
        &self.config
    }

    /// 计算每个节点的蒙皮矩阵、全局旋转和双四元数
    pub fn prepare(&mut self, hierarchy: &NodeHierarchy) {
        let count = hierarchy.len();
        self.skin.resize(count, Mat4::IDENTITY);
        self.rotations.resize(count, Quat::IDENTITY);
        self.dual_quats.resize(count, DualQuat::IDENTITY);

        for (i, node) in hierarchy.nodes().iter().enumerate() {
            let skin = node.global * node.inverse_bind;
            self.skin[i] = skin;
            self.rotations[i] = Quat::from_mat4(&node.global).normalize();
            self.dual_quats[i] = DualQuat::from_mat4(&skin);
        }
    }

    /// 对全部顶点执行蒙皮
    pub fn skin(
        &mut self,
        morph_positions: &[Vec3],
        morph_uvs: &[Vec4],
    ) -> ModelResult<SkinningStats> {
        let count = self.base_positions.len();
        if morph_positions.len() != count {
            return Err(ModelError::AttributeLengthMismatch {
                attribute: "morph_positions",
                expected: count,
                actual: morph_positions.len(),
            });
        }
        if morph_uvs.len() != count {
            return Err(ModelError::AttributeLengthMismatch {
                attribute: "morph_uvs",
                expected: count,
                actual: morph_uvs.len(),
            });
        }

        let start = Instant::now();
        let Self {
            base_positions,
            base_normals,
            base_uvs,
            infos,
            skin,
            rotations,
            dual_quats,
            positions,
            normals,
            uvs,
            config,
            pool,
        } = self;

        let inputs = SkinInputs {
            positions: base_positions,
            normals: base_normals,
            uvs: base_uvs,
            infos,
            skin,
            rotations,
            dual_quats,
            morph_positions,
            morph_uvs,
        };

        let chunk = config.chunk_size(count);
        let parallel = config.parallel && count > chunk;
        let chunks = if parallel { count.div_ceil(chunk) } else { 1 };

        if parallel {
            let mut job = || {
                positions
                    .par_chunks_mut(chunk)
                    .zip(normals.par_chunks_mut(chunk))
                    .zip(uvs.par_chunks_mut(chunk))
                    .enumerate()
                    .for_each(|(index, ((p, n), uv))| inputs.run(index * chunk, p, n, uv));
            };
            match pool {
                Some(pool) => pool.install(job),
                None => job(),
            }
        } else {
            inputs.run(0, positions, normals, uvs);
        }

        let stats = SkinningStats {
            vertices: count,
            chunks,
            parallel,
            elapsed_us: start.elapsed().as_micros() as u64,
        };
        tracing::trace!(
            target: "skinning",
            "Skinned {} vertices in {} chunks ({} us)",
            stats.vertices, stats.chunks, stats.elapsed_us
        );
        Ok(stats)
    }

    /// 输出交错格式顶点
    pub fn write_interleaved(&self, out: &mut Vec<DeformedVertex>) {
        out.clear();
        out.extend(
            self.positions
                .iter()
                .zip(&self.normals)
                .zip(&self.uvs)
                .map(|((p, n), uv)| DeformedVertex {
                    position: p.to_array(),
                    normal: n.to_array(),
                    uv: uv.to_array(),
                }),
        );
    }
}
