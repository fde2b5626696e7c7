//! 核心模块
//!
//! 包含变形引擎的基础设施：
//! - `error` - 错误类型定义
//! - `logging` - 日志初始化
//! - `macros` - 配置样板宏

pub mod error;
pub mod logging;
#[macro_use]
pub mod macros;
#[cfg(test)]
pub(crate) mod testing;

// 重新导出错误类型
pub use error::{
    AssetError, AssetResult, DeformError, DeformResult, ModelError, ModelResult,
};
pub use logging::init_logging;
