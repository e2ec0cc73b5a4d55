//! 剪切参数推导.
//!
//! 将仿射部分分解为水平与垂直两次剪切 (alpha, beta, gamma, delta),
//! 除法以 257 项倒数表近似, 保证编解码两端结果一致.

use super::{WARPEDMODEL_ONE, WARPEDMODEL_PREC_BITS, WarpModel, round_power_of_two_signed};

const DIV_LUT_BITS: u32 = 8;
const DIV_LUT_PREC_BITS: u32 = 14;
const DIV_LUT_NUM: usize = 1 << DIV_LUT_BITS;

/// 剪切参数保留的精度位数之外被舍去的低位数
const WARP_PARAM_REDUCE_BITS: u32 = 6;

/// 倒数表: `DIV_LUT[i] = round(2^14 * 256 / (256 + i))`
const DIV_LUT: [i32; DIV_LUT_NUM + 1] = {
    let mut table = [0i32; DIV_LUT_NUM + 1];
    let mut i = 0;
    while i <= DIV_LUT_NUM {
        let d = (DIV_LUT_NUM + i) as i32;
        table[i] = ((1 << DIV_LUT_PREC_BITS) * DIV_LUT_NUM as i32 + d / 2) / d;
        i += 1;
    }
    table
};

/// 求 `1 / d` 的定点近似, 返回 (乘数, 右移位数)
fn resolve_divisor_32(d: u32) -> (i32, u32) {
    let mut shift = 31 - d.leading_zeros();
    // 去掉最高位 1 后的余量
    let e = d - (1u32 << shift);
    let f = if shift > DIV_LUT_BITS {
        let n = shift - DIV_LUT_BITS;
        (e + ((1 << n) >> 1)) >> n
    } else {
        e << (DIV_LUT_BITS - shift)
    };
    shift += DIV_LUT_PREC_BITS;
    (DIV_LUT[f as usize], shift)
}

#[inline]
fn clamp_i16(v: i64) -> i16 {
    v.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}

#[inline]
fn reduce(v: i16) -> i16 {
    (round_power_of_two_signed(i64::from(v), WARP_PARAM_REDUCE_BITS) << WARP_PARAM_REDUCE_BITS) as i16
}

/// 剪切参数是否落在 warp 滤波器支持的范围内
pub fn is_affine_shear_allowed(alpha: i16, beta: i16, gamma: i16, delta: i16) -> bool {
    let (alpha, beta) = (i32::from(alpha).abs(), i32::from(beta).abs());
    let (gamma, delta) = (i32::from(gamma).abs(), i32::from(delta).abs());
    4 * alpha + 7 * beta < WARPEDMODEL_ONE && 4 * gamma + 4 * delta < WARPEDMODEL_ONE
}

impl WarpModel {
    /// 计算并缓存剪切参数, 返回参数是否合法
    ///
    /// 要求 `m2 > 0`; 结果不合法时剪切参数仍会写入, 由调用方决定是否标记无效.
    pub fn compute_shear(&mut self) -> bool {
        let mat = self.wmmat;
        if mat[2] <= 0 {
            return false;
        }

        self.alpha = clamp_i16(i64::from(mat[2] - WARPEDMODEL_ONE));
        self.beta = clamp_i16(i64::from(mat[3]));

        let (divisor, shift) = resolve_divisor_32(mat[2].unsigned_abs());
        let divisor = i64::from(divisor);

        let v = (i64::from(mat[4]) << WARPEDMODEL_PREC_BITS).saturating_mul(divisor);
        self.gamma = clamp_i16(round_power_of_two_signed(v, shift));

        let v = (i64::from(mat[3]) * i64::from(mat[4])).saturating_mul(divisor);
        self.delta = clamp_i16(
            i64::from(mat[5]) - round_power_of_two_signed(v, shift) - i64::from(WARPEDMODEL_ONE),
        );

        self.alpha = reduce(self.alpha);
        self.beta = reduce(self.beta);
        self.gamma = reduce(self.gamma);
        self.delta = reduce(self.delta);

        is_affine_shear_allowed(self.alpha, self.beta, self.gamma, self.delta)
    }
}
