//! 统一错误处理模块
//!
//! 提供变形管线范围内的统一错误类型定义
//!
//! ## 错误类型分层
//!
//! - **资源错误** (`AssetError`): 模型引用的外部文件缺失或不可读，对该模型是致命错误
//! - **模型错误** (`ModelError`): 加载器提供的数据在结构上无法使用
//! - **配置错误** (`config::ConfigError`): 配置文件读取、解析、验证失败
//!
//! 可容忍的结构缺陷（骨骼循环、越界引用等）只记录 `tracing::warn!`，不会产生错误。

use thiserror::Error;

use crate::config::ConfigError;

/// 变形引擎核心错误类型
#[derive(Error, Debug)]
pub enum DeformError {
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// 资源管理错误
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Asset not found: {path}")]
    NotFound { path: String },

    #[error("Failed to load asset: {path}, reason: {reason}")]
    LoadFailed { path: String, reason: String },

    #[error("Asset decode error: {0}")]
    Decode(String),
}

/// 模型数据错误
///
/// 只用于无法降级处理的情况；其余缺陷在加载时记录警告并忽略。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Model has {vertices} vertices but no bones to skin them")]
    EmptySkeleton { vertices: usize },

    #[error("Vertex attribute length mismatch: {attribute} has {actual} entries, expected {expected}")]
    AttributeLengthMismatch {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Material {material} references texture {index}, but only {count} textures exist")]
    TextureIndexOutOfRange {
        material: String,
        index: usize,
        count: usize,
    },

    #[error("Triangle index {index} is out of range for {vertices} vertices")]
    IndexOutOfRange { index: u32, vertices: usize },
}

/// 引擎结果类型别名
pub type DeformResult<T> = Result<T, DeformError>;
pub type AssetResult<T> = Result<T, AssetError>;
pub type ModelResult<T> = Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let asset_err = AssetError::NotFound {
            path: "tex/body.png".to_string(),
        };
        let deform_err: DeformError = asset_err.into();
        assert!(matches!(deform_err, DeformError::Asset(_)));

        let model_err = ModelError::EmptySkeleton { vertices: 3 };
        let deform_err: DeformError = model_err.into();
        assert!(matches!(deform_err, DeformError::Model(_)));
    }

    #[test]
    fn test_error_display() {
        let err = AssetError::NotFound {
            path: "toon01.bmp".to_string(),
        };
        assert_eq!(err.to_string(), "Asset not found: toon01.bmp");

        let err = ModelError::AttributeLengthMismatch {
            attribute: "normals",
            expected: 4,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Vertex attribute length mismatch: normals has 3 entries, expected 4"
        );
    }
}
