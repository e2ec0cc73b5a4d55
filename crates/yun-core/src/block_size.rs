//! 块尺寸定义.
//!
//! 编码块尺寸标识到像素宽高的映射, 用于计算块中心与网格偏移.

use std::fmt;

/// 模式信息 (MI) 网格单元的像素尺寸
pub const MI_SIZE: i32 = 4;

/// 编码块尺寸
///
/// 命名规则: `B{宽}x{高}`, 顺序与 AV1 的块尺寸枚举一致.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockSize {
    B4x4,
    B4x8,
    B8x4,
    B8x8,
    B8x16,
    B16x8,
    B16x16,
    B16x32,
    B32x16,
    B32x32,
    B32x64,
    B64x32,
    B64x64,
    B64x128,
    B128x64,
    B128x128,
    B4x16,
    B16x4,
    B8x32,
    B32x8,
    B16x64,
    B64x16,
}

impl BlockSize {
    /// 全部块尺寸, 按枚举顺序
    pub const ALL: [BlockSize; 22] = [
        BlockSize::B4x4,
        BlockSize::B4x8,
        BlockSize::B8x4,
        BlockSize::B8x8,
        BlockSize::B8x16,
        BlockSize::B16x8,
        BlockSize::B16x16,
        BlockSize::B16x32,
        BlockSize::B32x16,
        BlockSize::B32x32,
        BlockSize::B32x64,
        BlockSize::B64x32,
        BlockSize::B64x64,
        BlockSize::B64x128,
        BlockSize::B128x64,
        BlockSize::B128x128,
        BlockSize::B4x16,
        BlockSize::B16x4,
        BlockSize::B8x32,
        BlockSize::B32x8,
        BlockSize::B16x64,
        BlockSize::B64x16,
    ];

    /// 宽度 (像素)
    pub const fn width(self) -> i32 {
        match self {
            Self::B4x4 | Self::B4x8 | Self::B4x16 => 4,
            Self::B8x4 | Self::B8x8 | Self::B8x16 | Self::B8x32 => 8,
            Self::B16x8 | Self::B16x16 | Self::B16x32 | Self::B16x4 | Self::B16x64 => 16,
            Self::B32x16 | Self::B32x32 | Self::B32x64 | Self::B32x8 => 32,
            Self::B64x32 | Self::B64x64 | Self::B64x128 | Self::B64x16 => 64,
            Self::B128x64 | Self::B128x128 => 128,
        }
    }

    /// 高度 (像素)
    pub const fn height(self) -> i32 {
        match self {
            Self::B4x4 | Self::B8x4 | Self::B16x4 => 4,
            Self::B4x8 | Self::B8x8 | Self::B16x8 | Self::B32x8 => 8,
            Self::B8x16 | Self::B16x16 | Self::B32x16 | Self::B4x16 | Self::B64x16 => 16,
            Self::B16x32 | Self::B32x32 | Self::B64x32 | Self::B8x32 => 32,
            Self::B32x64 | Self::B64x64 | Self::B128x64 | Self::B16x64 => 64,
            Self::B64x128 | Self::B128x128 => 128,
        }
    }

    /// 按像素宽高查找块尺寸
    pub fn from_dimensions(width: i32, height: i32) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|bs| bs.width() == width && bs.height() == height)
    }

    /// 是否为正方形块
    pub const fn is_square(self) -> bool {
        self.width() == self.height()
    }
}

impl fmt::Display for BlockSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width(), self.height())
    }
}
