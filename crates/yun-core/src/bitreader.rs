//! 比特流读取器.
//!
//! 提供从字节缓冲区中按位读取数据的能力, 全局运动参数等帧头语法元素均经由此读取.
//!
//! 按大端位序读取 (MSB first), 与 AV1 非熵编码头部的位序一致.

use log::trace;

use crate::{YunError, YunResult};

/// 比特流读取器
///
/// 从字节缓冲区中按位读取数据, 使用大端位序 (MSB first).
/// 数据耗尽时统一返回 [`YunError::Eof`], 调用方不做局部恢复.
///
/// # 示例
/// ```
/// use yun_core::bitreader::BitReader;
///
/// let data = [0b10110001, 0b01010101];
/// let mut br = BitReader::new(&data);
/// assert_eq!(br.read_bits(4).unwrap(), 0b1011);
/// assert_eq!(br.read_bits(4).unwrap(), 0b0001);
/// assert_eq!(br.read_bits(8).unwrap(), 0b01010101);
/// ```
pub struct BitReader<'a> {
    /// 源数据
    data: &'a [u8],
    /// 当前字节索引
    byte_pos: usize,
    /// 当前字节中的位位置 (0-7, 0 表示最高位)
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    /// 创建新的比特流读取器
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_pos: 0,
            bit_pos: 0,
        }
    }

    /// 获取已读取的总位数
    pub fn bits_read(&self) -> usize {
        self.byte_pos * 8 + self.bit_pos as usize
    }

    /// 获取已消耗的字节数 (不足一字节按一字节计)
    pub fn bytes_read(&self) -> usize {
        self.bits_read().div_ceil(8)
    }

    /// 获取剩余可读位数
    pub fn bits_left(&self) -> usize {
        if self.byte_pos >= self.data.len() {
            return 0;
        }
        (self.data.len() - self.byte_pos) * 8 - self.bit_pos as usize
    }

    /// 是否已到达末尾
    pub fn is_eof(&self) -> bool {
        self.bits_left() == 0
    }

    /// 读取 1 个位
    pub fn read_bit(&mut self) -> YunResult<u32> {
        if self.byte_pos >= self.data.len() {
            return Err(YunError::Eof);
        }

        let bit = (self.data[self.byte_pos] >> (7 - self.bit_pos)) & 1;
        self.bit_pos += 1;
        if self.bit_pos >= 8 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }

        Ok(u32::from(bit))
    }

    /// 读取 N 个位 (最多 32 位)
    ///
    /// 按大端位序读取, 返回值的低 N 位有效.
    pub fn read_bits(&mut self, n: u32) -> YunResult<u32> {
        if n == 0 {
            return Ok(0);
        }
        if n > 32 {
            return Err(YunError::InvalidArgument(format!(
                "read_bits: n={} 超过 32 位",
                n,
            )));
        }
        if (n as usize) > self.bits_left() {
            return Err(YunError::Eof);
        }

        let mut result: u32 = 0;
        let mut remaining = n;

        while remaining > 0 {
            let available = 8 - self.bit_pos as u32;
            let to_read = remaining.min(available);

            // 从当前字节中提取位
            let shift = available - to_read;
            let mask = ((1u32 << to_read) - 1) as u8;
            let bits = (self.data[self.byte_pos] >> shift) & mask;

            result = (result << to_read) | u32::from(bits);

            self.bit_pos += to_read as u8;
            if self.bit_pos >= 8 {
                self.bit_pos = 0;
                self.byte_pos += 1;
            }
            remaining -= to_read;
        }

        Ok(result)
    }

    /// 读取有符号整数 (二进制补码)
    pub fn read_bits_signed(&mut self, n: u32) -> YunResult<i32> {
        let val = self.read_bits(n)?;
        if n == 0 {
            return Ok(0);
        }
        // n == 32 时, val 的全部 32 位有效, 直接转换为 i32 (二进制补码)
        if n >= 32 {
            return Ok(val as i32);
        }
        // 符号扩展: 若最高有效位为 1, 则填充高位
        if (val >> (n - 1)) & 1 != 0 {
            Ok(val as i32 | !((1i32 << n) - 1))
        } else {
            Ok(val as i32)
        }
    }

    /// 读取变长无符号整数 (uvlc)
    ///
    /// 前缀为连续的 0, 以 1 结束, 随后读取与前缀等长的字面值.
    /// 前缀达到 32 个 0 时码字过长, 返回保留值 `u32::MAX`.
    pub fn read_uvlc(&mut self) -> YunResult<u32> {
        let mut leading_zeros = 0u32;
        while leading_zeros < 32 && self.read_bit()? == 0 {
            leading_zeros += 1;
        }
        if leading_zeros == 32 {
            trace!("uvlc 前缀过长, bits_read={}", self.bits_read());
            return Ok(u32::MAX);
        }
        let base = ((1u64 << leading_zeros) - 1) as u32;
        let value = self.read_bits(leading_zeros)?;
        Ok(base.wrapping_add(value))
    }

    /// 读取反向有符号字面值
    ///
    /// 实际读取 `bits + 1` 位, 最高位为符号位, 按二进制补码扩展.
    pub fn read_inv_signed_literal(&mut self, bits: u32) -> YunResult<i32> {
        self.read_bits_signed(bits + 1)
    }

    /// 读取 [0, n) 范围内的准均匀码
    fn read_primitive_quniform(&mut self, n: u32) -> YunResult<u32> {
        if n <= 1 {
            return Ok(0);
        }
        let l = 32 - n.leading_zeros();
        let m = (1u32 << l) - n;
        let v = self.read_bits(l - 1)?;
        if v < m {
            Ok(v)
        } else {
            Ok((v << 1) - m + self.read_bit()?)
        }
    }

    /// 读取 [0, n) 范围内的有限子指数码, `k` 为首段位数
    fn read_primitive_subexpfin(&mut self, n: u32, k: u32) -> YunResult<u32> {
        let mut i = 0u32;
        let mut mk = 0u32;
        loop {
            let b = if i > 0 { k + i - 1 } else { k };
            let a = 1u32 << b;
            if n <= mk + 3 * a {
                return Ok(self.read_primitive_quniform(n - mk)? + mk);
            }
            if self.read_bit()? == 0 {
                return Ok(self.read_bits(b)? + mk);
            }
            i += 1;
            mk += a;
        }
    }

    /// 读取相对参考值 `reference` 重新居中的有限子指数码, 结果位于 [0, n)
    fn read_primitive_refsubexpfin(&mut self, n: u32, k: u32, reference: u32) -> YunResult<u32> {
        let v = self.read_primitive_subexpfin(n, k)?;
        Ok(inv_recenter_finite_nonneg(n, reference, v))
    }

    /// 读取有符号的参考子指数码
    ///
    /// 解码值位于 `(-n, n)`, 以 `reference` 为预测中心; 用于紧凑编码
    /// 全局运动参数相对于参考帧参数的小偏差.
    pub fn read_signed_primitive_refsubexpfin(
        &mut self,
        n: u16,
        k: u16,
        reference: i16,
    ) -> YunResult<i32> {
        if n == 0 {
            return Err(YunError::InvalidArgument(
                "read_signed_primitive_refsubexpfin: n 不能为 0".into(),
            ));
        }
        let n = u32::from(n);
        // 合法码流中参考值总在 (-n, n) 内, 此处钳位只防止越界下溢
        let reference = i32::from(reference).clamp(1 - n as i32, n as i32 - 1);
        let shifted_ref = (reference + n as i32 - 1) as u32;
        let scaled_n = (n << 1) - 1;
        let v = self.read_primitive_refsubexpfin(scaled_n, u32::from(k), shifted_ref)?;
        Ok(v as i32 - n as i32 + 1)
    }
}

/// 以 `r` 为中心的反向重新居中 (无上界)
fn inv_recenter_nonneg(r: u32, v: u32) -> u32 {
    if v > (r << 1) {
        v
    } else if v & 1 == 0 {
        (v >> 1) + r
    } else {
        r - ((v + 1) >> 1)
    }
}

/// 以 `r` 为中心的反向重新居中 (结果限定在 [0, n))
fn inv_recenter_finite_nonneg(n: u32, r: u32, v: u32) -> u32 {
    if (r << 1) <= n {
        inv_recenter_nonneg(r, v)
    } else {
        n - 1 - inv_recenter_nonneg(n - 1 - r, v)
    }
}
