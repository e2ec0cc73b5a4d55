//! # yun-motion
//!
//! Yun 运动候选推导库, 提供块级运动向量的两类来源:
//!
//! - **全局运动 (warp) 模型**: 由少量定点单应参数推导每个块的运动向量,
//!   包括参数的码流解析与剪切参数校验;
//! - **IntraBC 块哈希引擎**: 在同一帧内按内容寻址查找重复的像素块.
//!
//! 编码端与解码端必须逐位一致, 全部运算为整数/定点运算.
//!
//! ## 使用示例
//!
//! ```rust
//! use yun_core::BlockSize;
//! use yun_motion::mv::{Mv, MvPrecision};
//! use yun_motion::warp::WarpModel;
//!
//! let model = WarpModel::translation(-22, 37);
//! let mv = model.block_motion_vector(MvPrecision::Eighth, BlockSize::B8x8, 4, 2);
//! assert_eq!(mv, Mv::new(-22, 37));
//! ```

pub mod config;
pub mod hash;
pub mod mv;
pub mod warp;

// 重导出常用类型
pub use config::{HashConfig, InsertPolicy};
pub use hash::{BlockHashEntry, HashTable, IntraBcHashInfo};
pub use mv::{FullMvLimits, FullPelMv, INVALID_MV, Mv, MvPrecision, SubpelMvLimits};
pub use warp::{TransformKind, WarpModel};
