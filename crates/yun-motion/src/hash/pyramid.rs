//! 帧级哈希金字塔.
//!
//! 第 0 层对每个 2x2 邻域 (步长 1, 相互重叠) 计算一对哈希, 之后每层由上一层
//! 四个象限位置的哈希合成, 尺寸逐层翻倍. 每层按图像宽度作为行跨度存储,
//! 位置 (x, y) 合法当且仅当 `x <= W - n` 且 `y <= H - n`.
//!
//! 主哈希是快速的加性折叠, 只用于分桶; 次哈希是 CRC-32C, 用于桶内筛选.
//! 两者都只是必要条件, 调用方仍需逐像素比对.

use rayon::prelude::*;
use yun_core::{Crc32c, PlaneRef, YunError, YunResult};

const FOLD_PRIME: u32 = 0x9E37_79B1;
const SEED_8BIT: u32 = 0x2718_2818;
const SEED_HIGH_BITDEPTH: u32 = 0x5BD1_E995;
const SEED_COMPOSE: u32 = 0x3141_5926;

#[inline]
fn fold(h: u32, v: u32) -> u32 {
    h.rotate_left(5).wrapping_add(v).wrapping_mul(FOLD_PRIME)
}

#[inline]
fn finish(h: u32) -> u32 {
    h ^ (h >> 16)
}

/// 单个位置的哈希结果与一致性标志
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeHash {
    /// 主哈希 (分桶用)
    pub primary: u32,
    /// 次哈希 (CRC-32C)
    pub secondary: u32,
    /// 块内每一行都是常量
    pub row_uniform: bool,
    /// 块内每一列都是常量
    pub col_uniform: bool,
}

/// 2x2 基础哈希, 样本按 (x, y), (x+1, y), (x, y+1), (x+1, y+1) 的顺序
pub(crate) fn base_hash(plane: &PlaneRef<'_>, crc: &Crc32c, x: usize, y: usize) -> NodeHash {
    let p = [
        plane.sample(x, y),
        plane.sample(x + 1, y),
        plane.sample(x, y + 1),
        plane.sample(x + 1, y + 1),
    ];

    let (seed, secondary) = if plane.is_high_bitdepth() {
        let mut bytes = [0u8; 8];
        for (chunk, v) in bytes.chunks_exact_mut(2).zip(p) {
            chunk.copy_from_slice(&v.to_le_bytes());
        }
        (SEED_HIGH_BITDEPTH, crc.checksum(&bytes))
    } else {
        let bytes = p.map(|v| v as u8);
        (SEED_8BIT, crc.checksum(&bytes))
    };

    NodeHash {
        primary: finish(p.iter().fold(seed, |h, &v| fold(h, u32::from(v)))),
        secondary,
        row_uniform: p[0] == p[1] && p[2] == p[3],
        col_uniform: p[0] == p[2] && p[1] == p[3],
    }
}

/// 由四个象限 (左上, 右上, 左下, 右下) 的哈希合成上一级哈希
///
/// 一致性标志不在此处合成, 它需要象限之间重叠的子块.
#[inline]
pub(crate) fn compose_hash(crc: &Crc32c, primaries: [u32; 4], secondaries: [u32; 4]) -> (u32, u32) {
    let primary = finish(primaries.iter().fold(SEED_COMPOSE, |h, &v| fold(h, v)));
    (primary, crc.checksum_words(&secondaries))
}

/// 一层哈希
#[derive(Debug, Clone, Default)]
pub struct LevelHashes {
    nodes: Vec<NodeHash>,
    width: usize,
    height: usize,
    block_size: usize,
}

/// 某一维上合法起点的个数
#[inline]
fn positions(extent: usize, block_size: usize) -> usize {
    (extent + 1).saturating_sub(block_size)
}

/// 按行处理前 `rows` 行, 行之间互不重叠, 可安全并行
fn for_each_row<F>(nodes: &mut [NodeHash], width: usize, rows: usize, parallel: bool, f: F)
where
    F: Fn(usize, &mut [NodeHash]) + Sync + Send,
{
    if rows == 0 || width == 0 {
        return;
    }
    let nodes = &mut nodes[..rows * width];
    if parallel {
        nodes
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    } else {
        nodes
            .chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    }
}

impl LevelHashes {
    /// 空层, 首次构建时分配
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// 水平方向合法起点个数
    pub fn positions_x(&self) -> usize {
        positions(self.width, self.block_size)
    }

    /// 垂直方向合法起点个数
    pub fn positions_y(&self) -> usize {
        positions(self.height, self.block_size)
    }

    /// 读取 (x, y) 处的哈希, 越出合法范围时返回 `None`
    pub fn get(&self, x: usize, y: usize) -> Option<&NodeHash> {
        if x < self.positions_x() && y < self.positions_y() {
            self.nodes.get(y * self.width + x)
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn node(&self, pos: usize) -> &NodeHash {
        &self.nodes[pos]
    }

    fn prepare(&mut self, width: usize, height: usize, block_size: usize) -> YunResult<()> {
        let len = width * height;
        self.nodes.clear();
        self.nodes.try_reserve(len).map_err(|e| {
            YunError::OutOfMemory(format!(
                "哈希层分配失败: {}x{}, block_size={}, {}",
                width, height, block_size, e,
            ))
        })?;
        self.nodes.resize(len, NodeHash::default());
        self.width = width;
        self.height = height;
        self.block_size = block_size;
        Ok(())
    }

    /// 以平面内容构建 2x2 基础层
    pub fn build_base(&mut self, plane: &PlaneRef<'_>, crc: &Crc32c, parallel: bool) -> YunResult<()> {
        let (width, height) = (plane.width(), plane.height());
        self.prepare(width, height, 2)?;
        let cols = positions(width, 2);
        for_each_row(&mut self.nodes, width, positions(height, 2), parallel, |y, row| {
            for (x, node) in row[..cols].iter_mut().enumerate() {
                *node = base_hash(plane, crc, x, y);
            }
        });
        Ok(())
    }

    /// 由 `child` 层合成尺寸翻倍的一层
    pub fn compose_from(&mut self, child: &LevelHashes, crc: &Crc32c, parallel: bool) -> YunResult<()> {
        let (width, height) = (child.width, child.height);
        let n = child.block_size * 2;
        let half = child.block_size;
        let quarter = half / 2;
        self.prepare(width, height, n)?;

        let cols = positions(width, n);
        for_each_row(&mut self.nodes, width, positions(height, n), parallel, |y, row| {
            for (x, node) in row[..cols].iter_mut().enumerate() {
                let pos = y * width + x;
                let down = half * width;
                let quads = [pos, pos + half, pos + down, pos + down + half];
                let (primary, secondary) = compose_hash(
                    crc,
                    quads.map(|p| child.node(p).primary),
                    quads.map(|p| child.node(p).secondary),
                );

                let row_uniform = [
                    pos,
                    pos + quarter,
                    pos + half,
                    pos + down,
                    pos + down + quarter,
                    pos + down + half,
                ]
                .iter()
                .all(|&p| child.node(p).row_uniform);
                let col_uniform = [
                    pos,
                    pos + half,
                    pos + quarter * width,
                    pos + quarter * width + half,
                    pos + down,
                    pos + down + half,
                ]
                .iter()
                .all(|&p| child.node(p).col_uniform);

                *node = NodeHash {
                    primary,
                    secondary,
                    row_uniform,
                    col_uniform,
                };
            }
        });
        Ok(())
    }
}

/// 计算平面的 2x2 基础层
pub fn hash_base_level(plane: &PlaneRef<'_>, crc: &Crc32c, parallel: bool) -> YunResult<LevelHashes> {
    let mut level = LevelHashes::new();
    level.build_base(plane, crc, parallel)?;
    Ok(level)
}

/// 由上一层合成尺寸翻倍的新层
pub fn compose_level(child: &LevelHashes, crc: &Crc32c, parallel: bool) -> YunResult<LevelHashes> {
    let mut level = LevelHashes::new();
    level.compose_from(child, crc, parallel)?;
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::uniform::{is_horizontal_uniform, is_vertical_uniform};
    use yun_core::Picture;

    /// 伪随机图案, 局部带有重复纹理
    fn pattern_picture(width: u32, height: u32, bit_depth: u8) -> Picture {
        let mut pic = Picture::new_luma(width, height, bit_depth).unwrap();
        let max = (1u32 << bit_depth) - 1;
        for y in 0..height as usize {
            for x in 0..width as usize {
                let v = ((x * 7 + y * 13) ^ (x * y)) as u32 % (max + 1);
                pic.set_sample(0, x, y, v as u16);
            }
        }
        pic
    }

    #[test]
    fn test_base_level_positions() {
        let pic = pattern_picture(9, 5, 8);
        let crc = Crc32c::new();
        let level = hash_base_level(&pic.luma().unwrap(), &crc, false).unwrap();
        assert_eq!(level.positions_x(), 8);
        assert_eq!(level.positions_y(), 4);
        assert!(level.get(7, 3).is_some());
        assert!(level.get(8, 0).is_none());
        assert!(level.get(0, 4).is_none());
    }

    #[test]
    fn test_base_secondary_is_crc_of_samples() {
        let mut pic = Picture::new_luma(2, 2, 8).unwrap();
        pic.set_sample(0, 0, 0, 1);
        pic.set_sample(0, 1, 0, 2);
        pic.set_sample(0, 0, 1, 3);
        pic.set_sample(0, 1, 1, 4);
        let crc = Crc32c::new();
        let level = hash_base_level(&pic.luma().unwrap(), &crc, false).unwrap();
        let node = level.get(0, 0).unwrap();
        assert_eq!(node.secondary, crc.checksum(&[1, 2, 3, 4]));
        assert!(!node.row_uniform);
        assert!(!node.col_uniform);
    }

    #[test]
    fn test_sample_width_changes_packing() {
        let mut low = Picture::new_luma(4, 4, 8).unwrap();
        let mut high = Picture::new_luma(4, 4, 10).unwrap();
        low.fill_rect(0, 0, 0, 4, 4, 100);
        high.fill_rect(0, 0, 0, 4, 4, 100);
        let crc = Crc32c::new();
        let a = hash_base_level(&low.luma().unwrap(), &crc, false).unwrap();
        let b = hash_base_level(&high.luma().unwrap(), &crc, false).unwrap();
        let (a, b) = (a.get(0, 0).unwrap(), b.get(0, 0).unwrap());
        assert_ne!(a.secondary, b.secondary);
        assert_ne!(a.primary, b.primary);
        assert_eq!(b.secondary, crc.checksum(&[100, 0, 100, 0, 100, 0, 100, 0]));
    }

    #[test]
    fn test_parallel_matches_serial() {
        let pic = pattern_picture(37, 29, 10);
        let luma = pic.luma().unwrap();
        let crc = Crc32c::new();
        let mut serial = hash_base_level(&luma, &crc, false).unwrap();
        let mut parallel = hash_base_level(&luma, &crc, true).unwrap();
        for _ in 0..4 {
            assert_eq!(serial.nodes, parallel.nodes, "block_size={}", serial.block_size);
            serial = compose_level(&serial, &crc, false).unwrap();
            parallel = compose_level(&parallel, &crc, true).unwrap();
        }
        assert_eq!(serial.block_size(), 32);
        assert_eq!(serial.positions_x(), 6);
        assert_eq!(serial.nodes, parallel.nodes);
    }

    #[test]
    fn test_identical_content_shares_hashes() {
        let mut pic = Picture::new_luma(48, 24, 8).unwrap();
        for y in 0..16 {
            for x in 0..16 {
                let v = ((x * 31 + y * 17) % 251) as u16;
                pic.set_sample(0, x, y, v);
                pic.set_sample(0, x + 24, y + 5, v);
            }
        }
        let crc = Crc32c::new();
        let mut level = hash_base_level(&pic.luma().unwrap(), &crc, false).unwrap();
        while level.block_size() < 16 {
            level = compose_level(&level, &crc, false).unwrap();
        }
        assert_eq!(level.get(0, 0), level.get(24, 5));
        assert_ne!(level.get(0, 0), level.get(1, 0));
    }

    #[test]
    fn test_uniform_flags_match_pixel_checks() {
        // 水平条纹, 垂直条纹与平坦区域混合
        let mut pic = Picture::new_luma(24, 24, 8).unwrap();
        for y in 0..24 {
            for x in 0..24 {
                let v = match (x / 8, y / 8) {
                    (0, _) => (y % 3) as u16 * 40,
                    (1, _) => (x % 5) as u16 * 30,
                    _ => 77,
                };
                pic.set_sample(0, x, y, v);
            }
        }
        let luma = pic.luma().unwrap();
        let crc = Crc32c::new();
        let mut level = hash_base_level(&luma, &crc, false).unwrap();
        loop {
            let n = level.block_size();
            for y in 0..level.positions_y() {
                for x in 0..level.positions_x() {
                    let node = level.get(x, y).unwrap();
                    assert_eq!(node.row_uniform, is_horizontal_uniform(&luma, x, y, n), "n={} ({}, {})", n, x, y);
                    assert_eq!(node.col_uniform, is_vertical_uniform(&luma, x, y, n), "n={} ({}, {})", n, x, y);
                }
            }
            if n == 16 {
                break;
            }
            level = compose_level(&level, &crc, false).unwrap();
        }
    }

    #[test]
    fn test_picture_smaller_than_block() {
        let pic = pattern_picture(6, 6, 8);
        let crc = Crc32c::new();
        let mut level = hash_base_level(&pic.luma().unwrap(), &crc, true).unwrap();
        level = compose_level(&level, &crc, true).unwrap();
        level = compose_level(&level, &crc, true).unwrap();
        assert_eq!(level.block_size(), 8);
        assert_eq!(level.positions_x(), 0);
        assert!(level.get(0, 0).is_none());
    }
}
