//! # yun-core
//!
//! Yun 运动候选推导库核心库, 提供基础类型定义、错误处理和工具函数.
//!
//! 本 crate 承担编解码管线中由外部提供的基础设施: 比特流读取、校验和、
//! 图像缓冲区以及块尺寸表.

pub mod bitreader;
pub mod block_size;
pub mod crc;
pub mod error;
pub mod picture;

// 重导出常用类型
pub use bitreader::BitReader;
pub use block_size::{BlockSize, MI_SIZE};
pub use crc::Crc32c;
pub use error::{YunError, YunResult};
pub use picture::{Picture, Plane, PlaneRef};
