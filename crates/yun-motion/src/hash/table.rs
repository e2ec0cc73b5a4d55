//! 块哈希表.
//!
//! 以桶键 (块尺寸索引 + 主哈希低 16 位) 直接寻址, 桶内按插入顺序保存全部冲突项.
//! 不做淘汰, 不做去重.

use log::trace;
use yun_core::{YunError, YunResult};

use super::pyramid::LevelHashes;
use super::{MAX_HASH_ADDR, bucket_key};
use crate::config::InsertPolicy;

/// 哈希表项: 块左上角坐标与次哈希
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHashEntry {
    pub x: u16,
    pub y: u16,
    pub secondary: u32,
}

/// 主哈希桶表
pub struct HashTable {
    buckets: Vec<Vec<BlockHashEntry>>,
    len: usize,
}

impl std::fmt::Debug for HashTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashTable")
            .field("buckets", &self.buckets.len())
            .field("len", &self.len)
            .finish()
    }
}

impl HashTable {
    /// 分配全部桶 (空桶不占用条目内存)
    pub fn new() -> YunResult<Self> {
        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(MAX_HASH_ADDR)
            .map_err(|e| YunError::OutOfMemory(format!("哈希桶分配失败: {}", e)))?;
        buckets.resize_with(MAX_HASH_ADDR, Vec::new);
        Ok(Self { buckets, len: 0 })
    }

    /// 清空全部条目, 保留已分配的桶容量供下一帧复用
    pub fn clear(&mut self) {
        if self.len == 0 {
            return;
        }
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }

    /// 条目总数
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 追加一项到 `key` 对应的桶尾
    pub fn add(&mut self, key: u32, entry: BlockHashEntry) -> YunResult<()> {
        let bucket = self
            .buckets
            .get_mut(key as usize)
            .ok_or_else(|| YunError::InvalidArgument(format!("哈希键越界: {:#x}", key)))?;
        bucket
            .try_reserve(1)
            .map_err(|e| YunError::OutOfMemory(format!("哈希桶扩容失败: key={:#x}, {}", key, e)))?;
        bucket.push(entry);
        self.len += 1;
        Ok(())
    }

    /// 桶内条目数
    pub fn count(&self, key: u32) -> usize {
        self.buckets.get(key as usize).map_or(0, Vec::len)
    }

    /// 按插入顺序遍历桶内条目
    ///
    /// 键越界或桶为空时得到空迭代器.
    pub fn candidates(&self, key: u32) -> impl Iterator<Item = &BlockHashEntry> + '_ {
        self.buckets
            .get(key as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
    }

    /// 将一层的全部合法位置入表, 返回入表条目数
    ///
    /// 遍历顺序为外层 x, 内层 y.
    pub fn add_level(&mut self, level: &LevelHashes, policy: InsertPolicy) -> YunResult<usize> {
        let n = level.block_size();
        let (cols, rows) = (level.positions_x(), level.positions_y());
        let mut inserted = 0;
        for x in 0..cols {
            for y in 0..rows {
                let node = level.node(y * level.width() + x);
                if policy == InsertPolicy::SkipRedundantUniform
                    && (node.row_uniform || node.col_uniform)
                    && (x % n != 0 || y % n != 0)
                {
                    continue;
                }
                self.add(
                    bucket_key(node.primary, n)?,
                    BlockHashEntry {
                        x: x as u16,
                        y: y as u16,
                        secondary: node.secondary,
                    },
                )?;
                inserted += 1;
            }
        }
        trace!("哈希层入表: block_size={}, positions={}, inserted={}", n, cols * rows, inserted);
        Ok(inserted)
    }
}
