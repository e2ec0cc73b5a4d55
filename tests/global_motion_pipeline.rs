//! 全局运动端到端测试: 码流解析 -> 模型校验 -> 块级运动向量.

use yun::core::{BitReader, BlockSize, YunError};
use yun::motion::warp::decode::read_global_motion_params;
use yun::motion::warp::{WARPEDMODEL_ONE, classify};
use yun::motion::{Mv, MvPrecision, SubpelMvLimits, TransformKind, WarpModel};

/// 按 MSB 优先写入若干字段
#[derive(Default)]
struct BitWriter {
    bits: Vec<u8>,
}

impl BitWriter {
    fn put(&mut self, value: u32, width: u32) {
        for i in (0..width).rev() {
            self.bits.push(((value >> i) & 1) as u8);
        }
    }

    /// 子指数码 (k = 3) 的首段: 标志 0 + 3 位值, 适用于 |v| < 4 的小偏差
    fn put_small_delta(&mut self, delta: i32) {
        // 参考值居中时的折叠: 0, +1 -> 2, -1 -> 1, +2 -> 4, -2 -> 3 ...
        let folded = if delta >= 0 { 2 * delta } else { -2 * delta - 1 };
        assert!(folded < 8);
        self.put(0, 1);
        self.put(folded as u32, 3);
    }

    fn finish(&self) -> Vec<u8> {
        self.bits
            .chunks(8)
            .map(|c| c.iter().enumerate().fold(0u8, |acc, (i, b)| acc | (b << (7 - i))))
            .collect()
    }
}

#[test]
fn test_affine_stream_to_block_vectors() {
    let mut w = BitWriter::default();
    // is_global = 1, is_rot_zoom = 0, is_translation = 0 -> AFFINE
    w.put(0b100, 3);
    for delta in [3, -2, 1, -3] {
        w.put_small_delta(delta);
    }
    // 平移参数
    w.put_small_delta(2);
    w.put_small_delta(-1);
    let data = w.finish();

    let mut reader = BitReader::new(&data);
    let model = read_global_motion_params(&mut reader, &WarpModel::IDENTITY, true).expect("解析失败");
    assert_eq!(model.kind, TransformKind::Affine);
    assert!(!model.invalid);
    assert_eq!(model.wmmat[2], WARPEDMODEL_ONE + 6);
    assert_eq!(model.wmmat[3], -4);
    assert_eq!(model.wmmat[4], 2);
    assert_eq!(model.wmmat[5], WARPEDMODEL_ONE - 6);
    assert_eq!(model.wmmat[0], 2 << 10);
    assert_eq!(model.wmmat[1], -1 << 10);
    assert_eq!(classify(&model.wmmat), TransformKind::Affine);

    let mut checked = model;
    assert!(checked.check_kind());

    // 纯整数求值: 多次调用结果一致, 且在更粗精度下满足网格对齐
    for (mi_col, mi_row) in [(0, 0), (12, 40), (200, 150)] {
        let fine = model.block_motion_vector(MvPrecision::Eighth, BlockSize::B16x16, mi_col, mi_row);
        assert_eq!(fine, model.block_motion_vector(MvPrecision::Eighth, BlockSize::B16x16, mi_col, mi_row));
        let coarse = model.block_motion_vector(MvPrecision::Quarter, BlockSize::B16x16, mi_col, mi_row);
        assert_eq!(coarse.row % 2, 0);
        assert_eq!(coarse.col % 2, 0);
        assert_eq!(coarse.lower_precision(MvPrecision::Quarter), coarse);
    }
}

#[test]
fn test_translation_stream_vector_is_clamped() {
    let mut w = BitWriter::default();
    w.put(0b101, 3);
    w.put_small_delta(-3);
    w.put_small_delta(3);
    let data = w.finish();

    let mut reader = BitReader::new(&data);
    let model = read_global_motion_params(&mut reader, &WarpModel::IDENTITY, true).expect("解析失败");
    assert_eq!(model.kind, TransformKind::Translation);
    let mv = model.block_motion_vector(MvPrecision::Eighth, BlockSize::B32x32, 3, 3);
    assert_eq!(mv, Mv::new(-3, 3));

    let limits = SubpelMvLimits {
        col_min: -1,
        col_max: 1,
        row_min: -2,
        row_max: 2,
    };
    assert_eq!(mv.clamp(&limits), Mv::new(-2, 1));
}

#[test]
fn test_previous_frame_is_reference() {
    let previous = WarpModel::translation(40, -16);

    // 全零偏差: 重复上一帧的参数
    let mut w = BitWriter::default();
    w.put(0b101, 3);
    w.put_small_delta(0);
    w.put_small_delta(0);
    let data = w.finish();
    let mut reader = BitReader::new(&data);
    let model = read_global_motion_params(&mut reader, &previous, true).expect("解析失败");
    assert_eq!(model, previous);
}

#[test]
fn test_truncated_stream_propagates_eof() {
    let mut w = BitWriter::default();
    w.put(0b11, 2);
    w.put_small_delta(1);
    let data = w.finish();
    let mut reader = BitReader::new(&data[..1]);
    assert!(matches!(
        read_global_motion_params(&mut reader, &WarpModel::IDENTITY, false),
        Err(YunError::Eof)
    ));
}

#[test]
fn test_oversized_shear_is_marked_invalid() {
    let mut w = BitWriter::default();
    // ROTZOOM, 以大偏差的参考模型为中心, 偏差为 0
    w.put(0b11, 2);
    for _ in 0..4 {
        w.put_small_delta(0);
    }
    let data = w.finish();

    let mut reference = WarpModel::IDENTITY;
    reference.wmmat[2] = WARPEDMODEL_ONE + 8000;
    reference.wmmat[5] = WARPEDMODEL_ONE + 8000;
    reference.wmmat[3] = 8000;
    reference.wmmat[4] = -8000;
    let mut reader = BitReader::new(&data);
    let model = read_global_motion_params(&mut reader, &reference, true).expect("剪切不合法不是解析错误");
    assert_eq!(model.kind, TransformKind::RotZoom);
    assert_eq!(model.wmmat[2], WARPEDMODEL_ONE + 8000);
    assert_eq!(model.wmmat[3], 8000);
    assert!(model.invalid);
}
