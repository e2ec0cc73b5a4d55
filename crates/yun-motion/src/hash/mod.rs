//! IntraBC 块哈希引擎.
//!
//! 在同一帧内查找内容相同 (或近似相同) 的像素块, 为帧内块复制预测提供候选.
//!
//! 每帧的构建过程:
//! 1. 对每个 2x2 邻域计算主/次哈希 (基础层);
//! 2. 由上一层四个象限合成下一层, 块尺寸逐层翻倍直到配置的上限;
//! 3. 不小于配置下限的各层按位置入表, 桶键同时编码块尺寸.
//!
//! 主哈希相同只是必要条件, 调用方需以次哈希和像素比对确认候选.

mod block;
mod pyramid;
mod table;
mod uniform;

use log::debug;
use yun_core::{Crc32c, Picture, PlaneRef, YunError, YunResult};

use crate::config::HashConfig;

pub use block::BlockHashScratch;
pub use pyramid::{LevelHashes, NodeHash, compose_level, hash_base_level};
pub use table::{BlockHashEntry, HashTable};
pub use uniform::{is_horizontal_uniform, is_vertical_uniform};

/// 可哈希的最小块尺寸
pub const MIN_HASH_BLOCK_SIZE: usize = 2;
/// 可哈希的最大块尺寸
pub const MAX_HASH_BLOCK_SIZE: usize = 128;

/// 桶键中取自主哈希的位数
pub const CRC_HASH_BITS: u32 = 16;
/// 桶键中块尺寸索引的位数
pub const BLOCK_SIZE_BITS: u32 = 3;
/// 桶数
pub const MAX_HASH_ADDR: usize = 1 << (CRC_HASH_BITS + BLOCK_SIZE_BITS);

/// 块尺寸索引: 2 -> 0, 4 -> 1, ..., 128 -> 6
pub fn size_index(block_size: usize) -> Option<u32> {
    if block_size.is_power_of_two()
        && (MIN_HASH_BLOCK_SIZE..=MAX_HASH_BLOCK_SIZE).contains(&block_size)
    {
        Some(block_size.trailing_zeros() - 1)
    } else {
        None
    }
}

/// 由主哈希与块尺寸得到桶键
pub fn bucket_key(primary: u32, block_size: usize) -> YunResult<u32> {
    let index = size_index(block_size)
        .ok_or_else(|| YunError::InvalidArgument(format!("不支持的哈希块尺寸: {}", block_size)))?;
    Ok((index << CRC_HASH_BITS) | (primary & ((1 << CRC_HASH_BITS) - 1)))
}

/// IntraBC 哈希会话状态
///
/// 会话内复用 CRC 表, 哈希表与全部缓冲区, 每帧调用 [`IntraBcHashInfo::build_frame`] 重建.
/// 帧级金字塔的两层乒乓缓冲与单块哈希的工作区相互独立.
#[derive(Debug)]
pub struct IntraBcHashInfo {
    crc: Crc32c,
    table: HashTable,
    levels: [LevelHashes; 2],
    scratch: BlockHashScratch,
    built_sizes: Vec<usize>,
}

impl IntraBcHashInfo {
    pub fn new() -> YunResult<Self> {
        Ok(Self {
            crc: Crc32c::new(),
            table: HashTable::new()?,
            levels: [LevelHashes::new(), LevelHashes::new()],
            scratch: BlockHashScratch::new(),
            built_sizes: Vec::new(),
        })
    }

    pub fn crc(&self) -> &Crc32c {
        &self.crc
    }

    /// 当前帧的哈希表
    pub fn table(&self) -> &HashTable {
        &self.table
    }

    /// 当前帧已入表的块尺寸, 升序
    pub fn built_sizes(&self) -> &[usize] {
        &self.built_sizes
    }

    /// 以图像亮度平面重建哈希表
    ///
    /// 分配失败时返回 [`YunError::OutOfMemory`], 此时哈希表只含部分条目, 不应使用.
    pub fn build_frame(&mut self, picture: &Picture, config: &HashConfig) -> YunResult<()> {
        config.validate()?;
        let plane = picture.luma()?;
        let (width, height) = (plane.width(), plane.height());
        if width > usize::from(u16::MAX) || height > usize::from(u16::MAX) {
            return Err(YunError::Unsupported(format!(
                "图像尺寸超出哈希坐标范围: {}x{}",
                width, height
            )));
        }

        self.table.clear();
        self.built_sizes.clear();

        let max_size = config.max_block_size.min(width).min(height);
        let [first, second] = &mut self.levels;
        first.build_base(&plane, &self.crc, config.parallel)?;
        let (mut src, mut dst) = (first, second);

        let mut n = MIN_HASH_BLOCK_SIZE;
        // 图像宽或高小于 2 时没有任何可入表的块
        while n <= max_size {
            if n >= config.min_block_size {
                let inserted = self.table.add_level(src, config.insert_policy)?;
                self.built_sizes.push(n);
                debug!(
                    "IntraBC 哈希层构建完成: block_size={}, positions={}x{}, inserted={}",
                    n,
                    src.positions_x(),
                    src.positions_y(),
                    inserted,
                );
            }
            if n * 2 > max_size {
                break;
            }
            dst.compose_from(src, &self.crc, config.parallel)?;
            std::mem::swap(&mut src, &mut dst);
            n *= 2;
        }

        debug!(
            "IntraBC 哈希表构建完成: {}x{}, sizes={:?}, entries={}",
            width,
            height,
            self.built_sizes,
            self.table.len(),
        );
        Ok(())
    }

    /// 直接计算单个块的 (桶键, 次哈希), 不经过帧级金字塔
    pub fn hash_single_block(
        &mut self,
        plane: &PlaneRef<'_>,
        x: usize,
        y: usize,
        block_size: usize,
    ) -> YunResult<(u32, u32)> {
        let (primary, secondary) = self.scratch.hash_block(&self.crc, plane, x, y, block_size)?;
        Ok((bucket_key(primary, block_size)?, secondary))
    }
}
