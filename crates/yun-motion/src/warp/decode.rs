//! 全局运动参数码流解析.
//!
//! 系数以参考帧的参数为预测中心, 使用有符号参考子指数码传输.
//! 解析只通过 [`BitReader`] 的原语读取; 码流耗尽时原样返回 [`yun_core::YunError::Eof`],
//! 不做局部恢复.

use log::debug;
use yun_core::{BitReader, YunResult};

use super::{GM_TRANS_ONLY_PREC_DIFF, TransformKind, WARPEDMODEL_ONE, WARPEDMODEL_PREC_BITS, WarpModel};
use crate::mv::MvPrecision;

/// 子指数码首段位数
pub const SUBEXPFIN_K: u16 = 3;

/// 平移参数的传输精度 (小数位数)
pub const GM_TRANS_PREC_BITS: u32 = 6;
/// 平移参数的绝对值位数
pub const GM_ABS_TRANS_BITS: u32 = 12;
/// 纯平移参数的绝对值位数
pub const GM_ABS_TRANS_ONLY_BITS: u32 = GM_ABS_TRANS_BITS - GM_TRANS_PREC_BITS + 3;
const GM_TRANS_PREC_DIFF: u32 = WARPEDMODEL_PREC_BITS - GM_TRANS_PREC_BITS;

/// 非平移参数的传输精度 (小数位数)
pub const GM_ALPHA_PREC_BITS: u32 = 15;
/// 非平移参数的绝对值位数
pub const GM_ABS_ALPHA_BITS: u32 = 12;
const GM_ALPHA_PREC_DIFF: u32 = WARPEDMODEL_PREC_BITS - GM_ALPHA_PREC_BITS;

/// 读取单个系数: 参考值降到传输精度后作为预测中心, 解码值再放大回模型精度
fn read_param(
    reader: &mut BitReader<'_>,
    abs_bits: u32,
    prec_diff: u32,
    reference: i32,
    offset: i32,
) -> YunResult<i32> {
    let n = (1u16 << abs_bits) + 1;
    let predicted = ((reference >> prec_diff) - (offset >> prec_diff)) as i16;
    let coded = reader.read_signed_primitive_refsubexpfin(n, SUBEXPFIN_K, predicted)?;
    Ok((coded << prec_diff) + offset)
}

/// 解析一个参考帧的全局运动参数
///
/// `ref_model` 为预测参考 (上一帧对应参考的参数或默认恒等参数).
/// 剪切参数不合法时返回的模型被标记为 `invalid`, 这不是解析错误.
pub fn read_global_motion_params(
    reader: &mut BitReader<'_>,
    ref_model: &WarpModel,
    allow_high_precision_mv: bool,
) -> YunResult<WarpModel> {
    let kind = if reader.read_bit()? == 0 {
        TransformKind::Identity
    } else if reader.read_bit()? == 1 {
        TransformKind::RotZoom
    } else if reader.read_bit()? == 1 {
        TransformKind::Translation
    } else {
        TransformKind::Affine
    };

    let mut model = WarpModel {
        kind,
        ..WarpModel::IDENTITY
    };
    let ref_mat = &ref_model.wmmat;

    if kind >= TransformKind::RotZoom {
        model.wmmat[2] = read_param(reader, GM_ABS_ALPHA_BITS, GM_ALPHA_PREC_DIFF, ref_mat[2], WARPEDMODEL_ONE)?;
        model.wmmat[3] = read_param(reader, GM_ABS_ALPHA_BITS, GM_ALPHA_PREC_DIFF, ref_mat[3], 0)?;
    }

    if kind == TransformKind::Affine {
        model.wmmat[4] = read_param(reader, GM_ABS_ALPHA_BITS, GM_ALPHA_PREC_DIFF, ref_mat[4], 0)?;
        model.wmmat[5] = read_param(reader, GM_ABS_ALPHA_BITS, GM_ALPHA_PREC_DIFF, ref_mat[5], WARPEDMODEL_ONE)?;
    } else {
        model.wmmat[4] = -model.wmmat[3];
        model.wmmat[5] = model.wmmat[2];
    }

    if kind >= TransformKind::Translation {
        let loss = MvPrecision::from_allow_hp(allow_high_precision_mv).gm_precision_loss();
        let (abs_bits, prec_diff) = if kind == TransformKind::Translation {
            (GM_ABS_TRANS_ONLY_BITS - loss, GM_TRANS_ONLY_PREC_DIFF + loss)
        } else {
            (GM_ABS_TRANS_BITS, GM_TRANS_PREC_DIFF)
        };
        model.wmmat[0] = read_param(reader, abs_bits, prec_diff, ref_mat[0], 0)?;
        model.wmmat[1] = read_param(reader, abs_bits, prec_diff, ref_mat[1], 0)?;
    }

    if !model.compute_shear() {
        debug!("全局运动参数剪切检查失败, 标记为无效: kind={:?}, wmmat={:?}", kind, model.wmmat);
        model.invalid = true;
    }

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use yun_core::YunError;

    /// 按 MSB 优先把若干位串拼成字节
    fn pack_bits(bits: &str) -> Vec<u8> {
        let bits: Vec<u8> = bits
            .chars()
            .filter(|c| *c == '0' || *c == '1')
            .map(|c| c as u8 - b'0')
            .collect();
        bits.chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, b)| acc | (b << (7 - i)))
            })
            .collect()
    }

    #[test]
    fn test_identity() {
        let data = pack_bits("0");
        let mut br = BitReader::new(&data);
        let model = read_global_motion_params(&mut br, &WarpModel::IDENTITY, true).unwrap();
        assert_eq!(model, WarpModel::IDENTITY);
        assert_eq!(br.bits_read(), 1);
    }

    #[test]
    fn test_translation_high_precision() {
        // 类型: 1 0 1; 平移位宽 9, 首段 b=3, 3*8 < 513 -> 标志位 0 + 3 位
        // m0: 0 100 -> +2; m1: 0 101 -> -3
        let data = pack_bits("101 0100 0101");
        let mut br = BitReader::new(&data);
        let model = read_global_motion_params(&mut br, &WarpModel::IDENTITY, true).unwrap();
        assert_eq!(model.kind, TransformKind::Translation);
        assert_eq!(model.wmmat[0], 2 << GM_TRANS_ONLY_PREC_DIFF);
        assert_eq!(model.wmmat[1], -3 << GM_TRANS_ONLY_PREC_DIFF);
        assert!(!model.invalid);
        assert_eq!(
            model.block_motion_vector(MvPrecision::Eighth, yun_core::BlockSize::B8x8, 5, 5),
            crate::mv::Mv::new(2, -3)
        );
    }

    #[test]
    fn test_translation_low_precision_scales_by_two() {
        let data = pack_bits("101 0100 0101");
        let mut br = BitReader::new(&data);
        let model = read_global_motion_params(&mut br, &WarpModel::IDENTITY, false).unwrap();
        assert_eq!(model.wmmat[0], 2 << (GM_TRANS_ONLY_PREC_DIFF + 1));
        assert_eq!(model.wmmat[1], -3 << (GM_TRANS_ONLY_PREC_DIFF + 1));
    }

    #[test]
    fn test_rotzoom_mirrors_coefficients() {
        // 类型: 1 1; m2: 0 100 -> +2; m3: 0 101 -> -3; m0, m1: 0 000
        let data = pack_bits("11 0100 0101 0000 0000");
        let mut br = BitReader::new(&data);
        let model = read_global_motion_params(&mut br, &WarpModel::IDENTITY, true).unwrap();
        assert_eq!(model.kind, TransformKind::RotZoom);
        assert_eq!(model.wmmat[2], WARPEDMODEL_ONE + (2 << GM_ALPHA_PREC_DIFF));
        assert_eq!(model.wmmat[3], -3 << GM_ALPHA_PREC_DIFF);
        assert_eq!(model.wmmat[5], model.wmmat[2]);
        assert_eq!(model.wmmat[4], -model.wmmat[3]);
        assert_eq!(model.derived_kind(), TransformKind::RotZoom);
        assert!(!model.invalid);
    }

    #[test]
    fn test_reference_model_is_prediction_center() {
        // 全部码字为 0 000 时结果等于参考参数
        let reference = WarpModel::from_coefficients([
            64 << GM_TRANS_PREC_DIFF,
            -(32 << GM_TRANS_PREC_DIFF),
            WARPEDMODEL_ONE + (40 << GM_ALPHA_PREC_DIFF),
            6 << GM_ALPHA_PREC_DIFF,
            -(6 << GM_ALPHA_PREC_DIFF),
            WARPEDMODEL_ONE + (40 << GM_ALPHA_PREC_DIFF),
            0,
            0,
        ]);
        let data = pack_bits("11 0000 0000 0000 0000");
        let mut br = BitReader::new(&data);
        let model = read_global_motion_params(&mut br, &reference, true).unwrap();
        assert_eq!(model, reference);
    }

    #[test]
    fn test_affine_coded_rotzoom_equals_built_model() {
        // 类型 AFFINE, 但 m2 = m5 且 m4 = -m3, 系数符合 ROTZOOM 模式
        // m2: +1, m3: -1, m4: +1, m5: +1, m0, m1: 0
        let data = pack_bits("100 0010 0001 0010 0010 0000 0000");
        let mut br = BitReader::new(&data);
        let decoded = read_global_motion_params(&mut br, &WarpModel::IDENTITY, true).unwrap();
        assert_eq!(decoded.kind, TransformKind::Affine);
        assert_eq!(
            decoded.wmmat,
            [0, 0, WARPEDMODEL_ONE + 2, -2, 2, WARPEDMODEL_ONE + 2, 0, 0]
        );

        let built = WarpModel::from_coefficients(decoded.wmmat);
        assert_eq!(built.kind, TransformKind::RotZoom);
        assert_eq!(decoded, built);
    }

    #[test]
    fn test_truncated_stream_is_eof() {
        let data = pack_bits("1100");
        let mut br = BitReader::new(&data[..0]);
        assert!(matches!(
            read_global_motion_params(&mut br, &WarpModel::IDENTITY, true),
            Err(YunError::Eof)
        ));

        // 类型读完后系数不足
        let data = pack_bits("11010000");
        let mut br = BitReader::new(&data);
        assert!(matches!(
            read_global_motion_params(&mut br, &WarpModel::IDENTITY, true),
            Err(YunError::Eof)
        ));
    }
}
