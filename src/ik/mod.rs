//! IK 模块
//!
//! 循环坐标下降（CCD）反向运动学求解器，支持单轴（平面）限制和多轴欧拉角限制。

pub mod euler;
pub mod solver;

pub use solver::{build_solvers, AxisLimit, IkChainLink, IkSolveStats, IkSolver};
