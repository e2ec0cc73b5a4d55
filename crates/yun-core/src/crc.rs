//! CRC 校验和计算.
//!
//! 提供 CRC-32C (Castagnoli) 计算器, 作为块哈希的强哈希 (次哈希) 来源.
//!
//! 查找表由 [`Crc32c::new`] 显式构造, 构造后只读; 由会话持有并以引用传入各哈希函数,
//! 不存在隐藏的全局可变状态, 可在多线程间共享.

/// CRC-32C 多项式 (反射形式)
const CRC32C_POLY: u32 = 0x82F6_3B78;

/// CRC-32C 计算器
#[derive(Clone)]
pub struct Crc32c {
    /// 逐字节查找表
    table: [u32; 256],
}

impl Crc32c {
    /// 构造查找表
    pub const fn new() -> Self {
        let mut table = [0u32; 256];
        let mut i = 0u32;
        while i < 256 {
            let mut crc = i;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ CRC32C_POLY;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i as usize] = crc;
            i += 1;
        }
        Self { table }
    }

    /// 计算整段数据的 CRC-32C (初始值与结果异或值均为 0xFFFFFFFF)
    pub fn checksum(&self, data: &[u8]) -> u32 {
        let mut crc = !0u32;
        for &byte in data {
            crc = self.table[((crc ^ u32::from(byte)) & 0xFF) as usize] ^ (crc >> 8);
        }
        !crc
    }

    /// 按小端字节序计算若干 32 位字的 CRC-32C
    pub fn checksum_words(&self, words: &[u32]) -> u32 {
        let mut crc = !0u32;
        for word in words {
            for byte in word.to_le_bytes() {
                crc = self.table[((crc ^ u32::from(byte)) & 0xFF) as usize] ^ (crc >> 8);
            }
        }
        !crc
    }
}

impl Default for Crc32c {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Crc32c {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32c").finish_non_exhaustive()
    }
}
