//! # Character Deform
//!
//! Per-frame skeletal character deformation: bone hierarchy propagation,
//! CCD inverse kinematics, morph blending and parallel vertex skinning.
//!
//! ## Features
//!
//! - **Skeleton**: flat index-based bone tree with inherited ("append") transforms
//! - **IK**: CCD solver with single-axis and Euler-limited joints
//! - **Morphs**: position, UV, material, bone and group morphs
//! - **Skinning**: BDEF1/2/4, SDEF and dual-quaternion skinning over rayon chunks
//! - **Physics bridge**: post-simulation poses injected through a trait
//! - **ECS**: `DeformModel` component driven by `deform_model_system`
//!
//! ## 帧流程
//!
//! ```text
//! begin → morphs → nodes (before physics) → physics → nodes (after physics) → end → skinning
//! ```
//!
//! ### Example
//!
//! ```ignore
//! use character_deform::{DeformConfig, LoadOptions, Model, ModelDesc};
//!
//! let desc = ModelDesc::from_json_file("model.json")?;
//! let mut model = Model::load(&desc, &LoadOptions::new("assets"), &DeformConfig::load_or_default())?;
//! model.initialize_animation();
//! model.update(1.0 / 30.0)?;
//! let frame = model.render_frame(&Default::default());
//! ```
//!
//! ## Modules
//!
//! - [`core`]: errors, logging and shared macros
//! - [`config`]: configuration
//! - [`skeleton`]: bone hierarchy
//! - [`ik`]: inverse kinematics
//! - [`morph`]: morph blending and materials
//! - [`skinning`]: vertex skinning
//! - [`physics`]: physics pose bridge
//! - [`model`]: model assembly, frame driver and ECS integration

/// Core infrastructure: errors, logging, macros
pub mod core;
/// Configuration system
pub mod config;
/// Bone hierarchy and transform propagation
pub mod skeleton;
/// CCD inverse kinematics
pub mod ik;
/// Morph blending and materials
pub mod morph;
/// Vertex skinning
pub mod skinning;
/// Physics pose bridge
pub mod physics;
/// Model loading, frame driver and ECS integration
pub mod model;

pub use crate::config::{DeformConfig, IkConfig, RenderParams, SkinningConfig};
pub use crate::core::{init_logging, AssetError, DeformError, DeformResult, ModelError};
pub use crate::model::{
    deform_model_system, DeformClock, DeformModel, LoadOptions, Model, ModelDesc, RenderFrame,
};
pub use crate::physics::{NoPhysics, PhysicsBridge, PhysicsPose};
pub use crate::skinning::{DeformedVertex, SkinningStats};
