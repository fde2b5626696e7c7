//! 模型模块
//!
//! - `desc` - 加载器产出的模型描述
//! - `instance` - 组装完成、可逐帧驱动的模型
//! - `ecs` - bevy_ecs 组件与系统

pub mod desc;
pub mod ecs;
pub mod instance;

pub use desc::ModelDesc;
pub use ecs::{deform_model_system, DeformClock, DeformModel};
pub use instance::{LoadOptions, Model, RenderFrame};
