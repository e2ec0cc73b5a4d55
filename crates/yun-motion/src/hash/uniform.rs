//! 块内容一致性检查.
//!
//! 行 (列) 一致的块在相邻位置上会产生大量重复的哈希项, 入表策略据此裁剪.

use yun_core::PlaneRef;

/// 行跨度大于宽度时越界读取不会触发切片 panic, 因此显式检查
#[inline]
fn assert_block_inside(plane: &PlaneRef<'_>, x: usize, y: usize, size: usize) {
    assert!(
        plane.contains_block(x, y, size),
        "块越出平面: ({}, {}) size={}, 平面 {}x{}",
        x,
        y,
        size,
        plane.width(),
        plane.height(),
    );
}

/// 块内每一行的样本都相同 (不同行之间可以不同)
///
/// # Panics
///
/// 块必须完整落在平面内 (见 [`PlaneRef::contains_block`]), 否则 panic.
pub fn is_horizontal_uniform(plane: &PlaneRef<'_>, x: usize, y: usize, size: usize) -> bool {
    assert_block_inside(plane, x, y, size);
    (y..y + size).all(|row| {
        let first = plane.sample(x, row);
        (x + 1..x + size).all(|col| plane.sample(col, row) == first)
    })
}

/// 块内每一列的样本都相同 (不同列之间可以不同)
///
/// # Panics
///
/// 与 [`is_horizontal_uniform`] 相同, 块必须完整落在平面内.
pub fn is_vertical_uniform(plane: &PlaneRef<'_>, x: usize, y: usize, size: usize) -> bool {
    assert_block_inside(plane, x, y, size);
    (x..x + size).all(|col| {
        let first = plane.sample(col, y);
        (y + 1..y + size).all(|row| plane.sample(col, row) == first)
    })
}
