//! 模型加载契约
//!
//! 由外部模型加载器填充的中间数据结构。文件格式解析不在本 crate 范围内，
//! 加载器只需要产出这些结构（或等价的 JSON）。坐标系转换由加载器负责。

use std::fs;
use std::path::{Path, PathBuf};

use glam::{Quat, Vec2, Vec3, Vec4};
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::{AssetError, AssetResult};

/// 完整模型描述
///
/// 可选索引字段（父骨骼、IK 末端、材质变形目标、组变形子项）接受 `null`、
/// 缺省或负数（如 `-1`），均表示“无”；材质变形目标为“无”时作用于全部材质。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelDesc {
    pub name: String,
    #[serde(default)]
    pub bones: Vec<BoneDesc>,
    #[serde(default)]
    pub morphs: Vec<MorphDesc>,
    #[serde(default)]
    pub vertices: Vec<VertexDesc>,
    /// 三角形索引列表（每三个一组）
    #[serde(default)]
    pub indices: Vec<u32>,
    #[serde(default)]
    pub materials: Vec<MaterialDesc>,
    /// 纹理路径（相对于资源目录）
    #[serde(default)]
    pub textures: Vec<PathBuf>,
}

impl ModelDesc {
    /// 从JSON字符串解析
    pub fn from_json_str(content: &str) -> AssetResult<Self> {
        serde_json::from_str(content).map_err(|e| AssetError::Decode(e.to_string()))
    }

    /// 从JSON文件加载
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> AssetResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AssetError::NotFound {
                path: path.display().to_string(),
            },
            _ => AssetError::LoadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            },
        })?;
        Self::from_json_str(&content)
    }
}

/// 可选索引：`null` 或负数映射为 None
fn optional_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
    let value: Option<i64> = Option::deserialize(deserializer)?;
    Ok(value.and_then(|v| usize::try_from(v).ok()))
}

/// 骨骼描述
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoneDesc {
    pub name: String,
    /// 父骨骼索引（None 表示根骨骼）
    #[serde(default, deserialize_with = "optional_index")]
    pub parent: Option<usize>,
    /// 绑定姿态下的模型空间位置
    pub position: Vec3,
    /// 变形阶层
    #[serde(default)]
    pub deform_depth: i32,
    /// 物理后变形
    #[serde(default)]
    pub deform_after_physics: bool,
    #[serde(default)]
    pub append: Option<AppendDesc>,
    #[serde(default)]
    pub ik: Option<IkDesc>,
}

impl BoneDesc {
    pub fn new(name: impl Into<String>, parent: Option<usize>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            parent,
            position,
            deform_depth: 0,
            deform_after_physics: false,
            append: None,
            ik: None,
        }
    }
}

/// 付与（继承）变换描述
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AppendDesc {
    pub source: usize,
    pub weight: f32,
    #[serde(default)]
    pub rotate: bool,
    #[serde(default)]
    pub translate: bool,
    #[serde(default)]
    pub local: bool,
}

/// IK 描述（挂在 IK 骨骼上）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IkDesc {
    /// 末端执行器骨骼索引
    #[serde(default, deserialize_with = "optional_index")]
    pub target: Option<usize>,
    #[serde(default)]
    pub iterate_count: Option<u32>,
    /// 单次迭代角度限制（弧度）
    #[serde(default)]
    pub limit_angle: Option<f32>,
    /// 链接骨骼，从靠近末端的一侧开始
    #[serde(default)]
    pub links: Vec<IkLinkDesc>,
}

/// IK 链接描述
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IkLinkDesc {
    pub bone: usize,
    #[serde(default)]
    pub limit: Option<AxisLimitDesc>,
}

/// 欧拉角限制（弧度，XYZ）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisLimitDesc {
    pub min: Vec3,
    pub max: Vec3,
}

/// 变形（Morph）描述
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MorphDesc {
    pub name: String,
    pub payload: MorphPayload,
}

/// 按类型区分的变形数据
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "entries")]
pub enum MorphPayload {
    Position(Vec<PositionMorphDesc>),
    Uv(Vec<UvMorphDesc>),
    Material(Vec<MaterialMorphDesc>),
    Bone(Vec<BoneMorphDesc>),
    Group(Vec<GroupMorphDesc>),
    /// 加载器识别但本引擎不支持的类型（如翻转、冲量）
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositionMorphDesc {
    pub vertex: usize,
    pub offset: Vec3,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UvMorphDesc {
    pub vertex: usize,
    pub offset: Vec4,
}

/// 材质运算类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialOp {
    Mul,
    Add,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MaterialMorphDesc {
    /// 目标材质（None 表示全部材质）
    #[serde(default, deserialize_with = "optional_index")]
    pub material: Option<usize>,
    pub op: MaterialOp,
    /// RGB + alpha
    pub diffuse: Vec4,
    pub specular: Vec3,
    pub specular_power: f32,
    pub ambient: Vec3,
    pub edge_color: Vec4,
    pub edge_size: f32,
    pub texture_factor: Vec4,
    pub sphere_texture_factor: Vec4,
    pub toon_texture_factor: Vec4,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoneMorphDesc {
    pub bone: usize,
    pub translate: Vec3,
    pub rotate: Quat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GroupMorphDesc {
    /// 子变形索引（None 表示无效条目）
    #[serde(default, deserialize_with = "optional_index")]
    pub morph: Option<usize>,
    pub weight: f32,
}

/// 顶点描述
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VertexDesc {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub weight: VertexWeightDesc,
}

/// 顶点骨骼权重（加载器原始形式）
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum VertexWeightDesc {
    Bdef1 {
        bone: usize,
    },
    /// 第二根骨骼权重为 `1 - weight`
    Bdef2 {
        bones: [usize; 2],
        weight: f32,
    },
    Bdef4 {
        bones: [usize; 4],
        weights: [f32; 4],
    },
    /// 球面变形：C/R0/R1 为绑定姿态下的原始点
    Sdef {
        bones: [usize; 2],
        weight: f32,
        c: Vec3,
        r0: Vec3,
        r1: Vec3,
    },
    /// 双四元数蒙皮
    Qdef {
        bones: [usize; 4],
        weights: [f32; 4],
    },
}

/// 球面贴图模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SphereMode {
    #[default]
    None,
    Mul,
    Add,
    SubTexture,
}

/// 卡通贴图引用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToonRef {
    #[default]
    None,
    /// 共享卡通贴图编号（toon01.bmp ~ toon10.bmp 对应 0 ~ 9）
    Shared(u8),
    /// 模型自带纹理索引
    Texture(usize),
}

/// 材质描述
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialDesc {
    pub name: String,
    pub diffuse: Vec4,
    pub specular: Vec3,
    pub specular_power: f32,
    pub ambient: Vec3,
    pub edge_color: Vec4,
    pub edge_size: f32,
    #[serde(default)]
    pub draw_edge: bool,
    #[serde(default)]
    pub both_face: bool,
    /// 使用该材质的索引数量
    pub face_vertex_count: usize,
    #[serde(default)]
    pub texture: Option<usize>,
    #[serde(default)]
    pub sphere_texture: Option<usize>,
    #[serde(default)]
    pub sphere_mode: SphereMode,
    #[serde(default)]
    pub toon: ToonRef,
}

impl MaterialDesc {
    /// 白色不透明材质，覆盖 `face_vertex_count` 个索引
    pub fn plain(name: impl Into<String>, face_vertex_count: usize) -> Self {
        Self {
            name: name.into(),
            diffuse: Vec4::ONE,
            specular: Vec3::ZERO,
            specular_power: 1.0,
            ambient: Vec3::splat(0.5),
            edge_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            edge_size: 1.0,
            draw_edge: false,
            both_face: false,
            face_vertex_count,
            texture: None,
            sphere_texture: None,
            sphere_mode: SphereMode::None,
            toon: ToonRef::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_desc_json() {
        let json = r#"{
            "name": "arm",
            "bones": [
                { "name": "root", "position": [0.0, 0.0, 0.0] },
                { "name": "elbow", "parent": 0, "position": [1.0, 0.0, 0.0], "deform_depth": 1 }
            ],
            "morphs": [
                { "name": "smile", "payload": { "type": "Position", "entries": [
                    { "vertex": 0, "offset": [0.0, 1.0, 0.0] }
                ] } },
                { "name": "flip", "payload": { "type": "Unsupported", "entries": "Flip" } }
            ],
            "vertices": [
                { "position": [0.0, 0.0, 0.0], "normal": [0.0, 1.0, 0.0], "uv": [0.0, 0.0],
                  "weight": { "Bdef1": { "bone": 0 } } }
            ]
        }"#;
        let desc = ModelDesc::from_json_str(json).unwrap();
        assert_eq!(desc.bones.len(), 2);
        assert_eq!(desc.bones[1].parent, Some(0));
        assert_eq!(desc.bones[1].deform_depth, 1);
        assert!(matches!(desc.morphs[0].payload, MorphPayload::Position(ref e) if e.len() == 1));
        assert!(matches!(desc.morphs[1].payload, MorphPayload::Unsupported(_)));
        assert!(desc.textures.is_empty());
    }

    #[test]
    fn test_negative_indices_mean_none() {
        let json = r#"{
            "name": "loader",
            "bones": [
                { "name": "root", "parent": -1, "position": [0.0, 0.0, 0.0],
                  "ik": { "target": -1, "links": [] } },
                { "name": "arm", "parent": 0, "position": [1.0, 0.0, 0.0] }
            ],
            "morphs": [
                { "name": "all", "payload": { "type": "Material", "entries": [ {
                    "material": -1, "op": "Add",
                    "diffuse": [0.1, 0.1, 0.1, 0.0], "specular": [0.0, 0.0, 0.0],
                    "specular_power": 0.0, "ambient": [0.0, 0.0, 0.0],
                    "edge_color": [0.0, 0.0, 0.0, 0.0], "edge_size": 0.0,
                    "texture_factor": [0.0, 0.0, 0.0, 0.0],
                    "sphere_texture_factor": [0.0, 0.0, 0.0, 0.0],
                    "toon_texture_factor": [0.0, 0.0, 0.0, 0.0]
                } ] } },
                { "name": "group", "payload": { "type": "Group", "entries": [
                    { "morph": -1, "weight": 1.0 },
                    { "morph": 0, "weight": 0.5 }
                ] } }
            ]
        }"#;
        let desc = ModelDesc::from_json_str(json).unwrap();
        assert_eq!(desc.bones[0].parent, None);
        assert_eq!(desc.bones[1].parent, Some(0));
        assert_eq!(desc.bones[0].ik.as_ref().unwrap().target, None);
        match &desc.morphs[0].payload {
            MorphPayload::Material(entries) => assert_eq!(entries[0].material, None),
            other => panic!("unexpected payload {:?}", other),
        }
        match &desc.morphs[1].payload {
            MorphPayload::Group(entries) => {
                assert_eq!(entries[0].morph, None);
                assert_eq!(entries[1].morph, Some(0));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_bad_json_is_decode_error() {
        let err = ModelDesc::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, AssetError::Decode(_)));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = ModelDesc::from_json_file("/nonexistent/model.json").unwrap_err();
        assert!(matches!(err, AssetError::NotFound { .. }));
    }
}
