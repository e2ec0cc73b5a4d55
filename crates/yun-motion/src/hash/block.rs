//! 单块哈希.
//!
//! 对单个 `n x n` 块从 2x2 不重叠网格开始逐级四合一, 结果与帧级金字塔在同一位置的
//! 哈希完全一致. 工作区为两组乒乓缓冲, 与帧级金字塔的层缓冲互不共享.

use yun_core::{Crc32c, PlaneRef, YunError, YunResult};

use super::pyramid::{base_hash, compose_hash};
use super::{MAX_HASH_BLOCK_SIZE, MIN_HASH_BLOCK_SIZE};

/// 每个乒乓缓冲的容量: 最大块的 2x2 网格单元数
const SCRATCH_LEN: usize = (MAX_HASH_BLOCK_SIZE / 2) * (MAX_HASH_BLOCK_SIZE / 2);

/// 单块哈希的乒乓工作区
pub struct BlockHashScratch {
    primary: [Vec<u32>; 2],
    secondary: [Vec<u32>; 2],
}

impl std::fmt::Debug for BlockHashScratch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockHashScratch")
            .field("capacity", &SCRATCH_LEN)
            .finish()
    }
}

impl BlockHashScratch {
    pub fn new() -> Self {
        Self {
            primary: [vec![0; SCRATCH_LEN], vec![0; SCRATCH_LEN]],
            secondary: [vec![0; SCRATCH_LEN], vec![0; SCRATCH_LEN]],
        }
    }

    /// 计算左上角位于 (x, y) 的 `block_size x block_size` 块的 (主哈希, 次哈希)
    pub fn hash_block(
        &mut self,
        crc: &Crc32c,
        plane: &PlaneRef<'_>,
        x: usize,
        y: usize,
        block_size: usize,
    ) -> YunResult<(u32, u32)> {
        if !block_size.is_power_of_two()
            || !(MIN_HASH_BLOCK_SIZE..=MAX_HASH_BLOCK_SIZE).contains(&block_size)
        {
            return Err(YunError::InvalidArgument(format!(
                "不支持的哈希块尺寸: {}",
                block_size
            )));
        }
        if !plane.contains_block(x, y, block_size) {
            return Err(YunError::InvalidArgument(format!(
                "块越出平面: ({}, {}) size={}, 平面 {}x{}",
                x,
                y,
                block_size,
                plane.width(),
                plane.height(),
            )));
        }

        let mut grid = block_size / 2;
        for i in 0..grid {
            for j in 0..grid {
                let node = base_hash(plane, crc, x + 2 * j, y + 2 * i);
                self.primary[0][i * grid + j] = node.primary;
                self.secondary[0][i * grid + j] = node.secondary;
            }
        }

        let mut src = 0;
        while grid > 1 {
            let next = grid / 2;
            let dst = src ^ 1;
            for i in 0..next {
                for j in 0..next {
                    let top = 2 * i * grid + 2 * j;
                    let bottom = top + grid;
                    let quads = [top, top + 1, bottom, bottom + 1];
                    let (primary, secondary) = compose_hash(
                        crc,
                        quads.map(|q| self.primary[src][q]),
                        quads.map(|q| self.secondary[src][q]),
                    );
                    self.primary[dst][i * next + j] = primary;
                    self.secondary[dst][i * next + j] = secondary;
                }
            }
            src = dst;
            grid = next;
        }

        Ok((self.primary[src][0], self.secondary[src][0]))
    }
}

impl Default for BlockHashScratch {
    fn default() -> Self {
        Self::new()
    }
}
