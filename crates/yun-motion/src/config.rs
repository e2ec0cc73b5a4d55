//! 块哈希构建配置.

use serde::{Deserialize, Serialize};
use yun_core::{YunError, YunResult};

use crate::hash::{MAX_HASH_BLOCK_SIZE, MIN_HASH_BLOCK_SIZE};

/// 入表策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertPolicy {
    /// 每个合法位置都入表
    #[default]
    All,
    /// 行或列一致的块仅在块尺寸对齐位置入表
    SkipRedundantUniform,
}

/// 帧级哈希构建参数
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HashConfig {
    /// 入表的最小块尺寸
    #[serde(default = "default_min_block_size")]
    pub min_block_size: usize,
    /// 构建到的最大块尺寸 (设为 8 即仅对 8x8 及以下建表)
    #[serde(default = "default_max_block_size")]
    pub max_block_size: usize,
    #[serde(default)]
    pub insert_policy: InsertPolicy,
    /// 层内按行并行计算
    #[serde(default = "default_true")]
    pub parallel: bool,
}

fn default_min_block_size() -> usize {
    4
}

fn default_max_block_size() -> usize {
    64
}

fn default_true() -> bool {
    true
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            min_block_size: default_min_block_size(),
            max_block_size: default_max_block_size(),
            insert_policy: InsertPolicy::default(),
            parallel: true,
        }
    }
}

impl HashConfig {
    /// 校验块尺寸范围
    pub fn validate(&self) -> YunResult<()> {
        for (name, size) in [
            ("min_block_size", self.min_block_size),
            ("max_block_size", self.max_block_size),
        ] {
            if !size.is_power_of_two() || !(MIN_HASH_BLOCK_SIZE..=MAX_HASH_BLOCK_SIZE).contains(&size) {
                return Err(YunError::InvalidArgument(format!(
                    "{} 必须是 {}..={} 之间的 2 的幂, 实际为 {}",
                    name, MIN_HASH_BLOCK_SIZE, MAX_HASH_BLOCK_SIZE, size,
                )));
            }
        }
        if self.min_block_size > self.max_block_size {
            return Err(YunError::InvalidArgument(format!(
                "min_block_size ({}) 大于 max_block_size ({})",
                self.min_block_size, self.max_block_size,
            )));
        }
        Ok(())
    }
}
