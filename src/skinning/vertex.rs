//! 顶点骨骼影响

use glam::Vec3;

use crate::model::desc::VertexWeightDesc;

/// 球面变形参数
///
/// `r0` / `r1` 是加载时校正后的 `(C + R') / 2`，运行时直接使用。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SdefParams {
    pub bones: [usize; 2],
    /// 第一根骨骼的权重，第二根为 `1 - weight`
    pub weight: f32,
    pub c: Vec3,
    pub r0: Vec3,
    pub r1: Vec3,
}

impl SdefParams {
    /// 由原始 C / R0 / R1 计算校正后的参数
    pub fn new(bones: [usize; 2], weight: f32, c: Vec3, r0: Vec3, r1: Vec3) -> Self {
        let w0 = weight;
        let w1 = 1.0 - weight;
        let rw = r0 * w0 + r1 * w1;
        let r0 = c + r0 - rw;
        let r1 = c + r1 - rw;
        Self {
            bones,
            weight,
            c,
            r0: (c + r0) * 0.5,
            r1: (c + r1) * 0.5,
        }
    }
}

/// 顶点蒙皮方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VertexBoneInfo {
    Weight1 { bone: usize },
    Weight2 { bones: [usize; 2], weights: [f32; 2] },
    Weight4 { bones: [usize; 4], weights: [f32; 4] },
    Sdef(SdefParams),
    DualQuaternion { bones: [usize; 4], weights: [f32; 4] },
}

impl VertexBoneInfo {
    /// 从加载器数据创建
    ///
    /// 越界骨骼的影响被丢弃，剩余权重重新归一化；第二个返回值表示是否有影响被丢弃。
    pub fn from_desc(desc: &VertexWeightDesc, node_count: usize) -> (Self, bool) {
        let valid = |b: usize| b < node_count;
        match *desc {
            VertexWeightDesc::Bdef1 { bone } => {
                if valid(bone) {
                    (Self::Weight1 { bone }, false)
                } else {
                    (Self::Weight1 { bone: 0 }, true)
                }
            }
            VertexWeightDesc::Bdef2 { bones, weight } => {
                if bones.iter().all(|&b| valid(b)) {
                    (
                        Self::Weight2 {
                            bones,
                            weights: [weight, 1.0 - weight],
                        },
                        false,
                    )
                } else {
                    (reduce(&bones, &[weight, 1.0 - weight], node_count), true)
                }
            }
            VertexWeightDesc::Bdef4 { bones, weights } => {
                if bones.iter().all(|&b| valid(b)) {
                    (Self::Weight4 { bones, weights }, false)
                } else {
                    (reduce(&bones, &weights, node_count), true)
                }
            }
            VertexWeightDesc::Sdef {
                bones,
                weight,
                c,
                r0,
                r1,
            } => {
                if bones.iter().all(|&b| valid(b)) {
                    (Self::Sdef(SdefParams::new(bones, weight, c, r0, r1)), false)
                } else {
                    (reduce(&bones, &[weight, 1.0 - weight], node_count), true)
                }
            }
            VertexWeightDesc::Qdef { bones, weights } => {
                if bones.iter().all(|&b| valid(b)) {
                    (Self::DualQuaternion { bones, weights }, false)
                } else {
                    let reduced = reduce(&bones, &weights, node_count);
                    match reduced {
                        Self::Weight4 { bones, weights } => {
                            (Self::DualQuaternion { bones, weights }, true)
                        }
                        other => (other, true),
                    }
                }
            }
        }
    }
}

/// 去掉越界骨骼后重新归一化；没有剩余影响时绑定到根骨骼
fn reduce(bones: &[usize], weights: &[f32], node_count: usize) -> VertexBoneInfo {
    let kept: Vec<(usize, f32)> = bones
        .iter()
        .zip(weights)
        .filter(|(b, w)| **b < node_count && **w > 0.0)
        .map(|(b, w)| (*b, *w))
        .collect();
    let total: f32 = kept.iter().map(|(_, w)| w).sum();
    if kept.is_empty() || total <= 0.0 {
        return VertexBoneInfo::Weight1 { bone: 0 };
    }
    if kept.len() == 1 {
        return VertexBoneInfo::Weight1 { bone: kept[0].0 };
    }
    let mut out_bones = [0usize; 4];
    let mut out_weights = [0.0f32; 4];
    for (slot, (b, w)) in kept.iter().enumerate().take(4) {
        out_bones[slot] = *b;
        out_weights[slot] = *w / total;
    }
    VertexBoneInfo::Weight4 {
        bones: out_bones,
        weights: out_weights,
    }
}
