//! # Yun (云)
//!
//! 纯 Rust 实现的视频编解码运动候选推导库.
//!
//! Yun 提供两类块级运动候选:
//! - **全局运动**: 定点 warp 模型求值, 剪切参数校验, 参数码流解析
//! - **帧内块复制 (IntraBC)**: 多尺度块哈希金字塔与按内容寻址的哈希表
//!
//! # 快速开始
//!
//! ```rust
//! use yun::core::Picture;
//! use yun::motion::{HashConfig, IntraBcHashInfo};
//!
//! let mut picture = Picture::new_luma(64, 64, 8).unwrap();
//! picture.fill_rect(0, 8, 8, 16, 16, 200);
//!
//! let mut info = IntraBcHashInfo::new().unwrap();
//! info.build_frame(&picture, &HashConfig::default()).unwrap();
//! println!("已入表块尺寸: {:?}", info.built_sizes());
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `yun-core` | 错误类型, 比特流读取, CRC-32C, 图像缓冲, 块尺寸表 |
//! | `yun-motion` | 运动向量工具, 全局运动模型, IntraBC 块哈希 |

/// 核心类型与工具
pub use yun_core as core;

/// 运动向量, 全局运动与块哈希
pub use yun_motion as motion;

pub mod logging;

/// 获取 Yun 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
