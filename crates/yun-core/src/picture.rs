//! 图像缓冲区.
//!
//! 按平面分离存储的像素缓冲, 每个平面有独立的行跨度 (linesize).
//! 高位深 (>8 位) 样本以 2 字节小端存储, 与 `Yuv420p10le` 等格式的内存布局一致.
//! 哈希引擎只通过 [`PlaneRef`] 的跨度寻址读取样本.

use crate::{YunError, YunResult};

/// 单个图像平面
#[derive(Debug, Clone)]
pub struct Plane {
    /// 像素数据
    pub data: Vec<u8>,
    /// 每行字节数 (linesize / stride)
    pub linesize: usize,
    /// 宽度 (像素)
    pub width: u32,
    /// 高度 (像素)
    pub height: u32,
}

/// 图像 (按平面存储)
///
/// 平面 0 为亮度平面.
#[derive(Debug, Clone)]
pub struct Picture {
    /// 各平面数据
    pub planes: Vec<Plane>,
    /// 样本位深 (8, 10, 12)
    pub bit_depth: u8,
}

impl Picture {
    /// 创建单平面 (仅亮度) 的全零图像
    pub fn new_luma(width: u32, height: u32, bit_depth: u8) -> YunResult<Self> {
        if width == 0 || height == 0 {
            return Err(YunError::InvalidArgument(format!(
                "图像尺寸无效: {}x{}",
                width, height,
            )));
        }
        if !matches!(bit_depth, 8 | 10 | 12) {
            return Err(YunError::Unsupported(format!("不支持的位深: {}", bit_depth)));
        }
        let bytes_per_sample = if bit_depth > 8 { 2 } else { 1 };
        let linesize = width as usize * bytes_per_sample;
        Ok(Self {
            planes: vec![Plane {
                data: vec![0; linesize * height as usize],
                linesize,
                width,
                height,
            }],
            bit_depth,
        })
    }

    /// 是否为高位深图像
    pub fn is_high_bitdepth(&self) -> bool {
        self.bit_depth > 8
    }

    /// 亮度平面宽度
    pub fn width(&self) -> u32 {
        self.planes.first().map_or(0, |p| p.width)
    }

    /// 亮度平面高度
    pub fn height(&self) -> u32 {
        self.planes.first().map_or(0, |p| p.height)
    }

    /// 获取指定平面的只读视图
    pub fn plane(&self, index: usize) -> YunResult<PlaneRef<'_>> {
        let plane = self
            .planes
            .get(index)
            .ok_or_else(|| YunError::InvalidArgument(format!("平面索引越界: {}", index)))?;
        PlaneRef::new(
            &plane.data,
            plane.linesize,
            plane.width as usize,
            plane.height as usize,
            self.is_high_bitdepth(),
        )
    }

    /// 获取亮度平面的只读视图
    pub fn luma(&self) -> YunResult<PlaneRef<'_>> {
        self.plane(0)
    }

    /// 写入单个样本
    ///
    /// # Panics
    ///
    /// 平面索引或坐标越界时 panic.
    pub fn set_sample(&mut self, plane: usize, x: usize, y: usize, value: u16) {
        let high = self.is_high_bitdepth();
        let p = &mut self.planes[plane];
        assert!(
            x < p.width as usize && y < p.height as usize,
            "样本坐标越界: ({}, {}), 平面 {}x{}",
            x,
            y,
            p.width,
            p.height,
        );
        if high {
            let off = y * p.linesize + x * 2;
            p.data[off..off + 2].copy_from_slice(&value.to_le_bytes());
        } else {
            p.data[y * p.linesize + x] = value as u8;
        }
    }

    /// 以单一值填充矩形区域
    ///
    /// # Panics
    ///
    /// 矩形越出平面时 panic, 与 [`Picture::set_sample`] 相同.
    pub fn fill_rect(&mut self, plane: usize, x: usize, y: usize, w: usize, h: usize, value: u16) {
        for row in y..y + h {
            for col in x..x + w {
                self.set_sample(plane, col, row, value);
            }
        }
    }
}

/// 图像平面只读视图
///
/// 以字节切片加行跨度描述一个平面, 样本宽度由 `high_bitdepth` 决定.
#[derive(Debug, Clone, Copy)]
pub struct PlaneRef<'a> {
    data: &'a [u8],
    linesize: usize,
    width: usize,
    height: usize,
    high_bitdepth: bool,
}

impl<'a> PlaneRef<'a> {
    /// 创建平面视图, 校验缓冲区足以覆盖 `width x height` 个样本
    pub fn new(
        data: &'a [u8],
        linesize: usize,
        width: usize,
        height: usize,
        high_bitdepth: bool,
    ) -> YunResult<Self> {
        let bytes_per_sample = if high_bitdepth { 2 } else { 1 };
        if width == 0 || height == 0 || linesize < width * bytes_per_sample {
            return Err(YunError::InvalidArgument(format!(
                "平面参数无效: {}x{}, linesize={}",
                width, height, linesize,
            )));
        }
        let required = (height - 1) * linesize + width * bytes_per_sample;
        if data.len() < required {
            return Err(YunError::InvalidData(format!(
                "平面数据不足: 需要 {} 字节, 实际 {} 字节",
                required,
                data.len(),
            )));
        }
        Ok(Self {
            data,
            linesize,
            width,
            height,
            high_bitdepth,
        })
    }

    /// 宽度 (像素)
    pub fn width(&self) -> usize {
        self.width
    }

    /// 高度 (像素)
    pub fn height(&self) -> usize {
        self.height
    }

    /// 每行字节数
    pub fn linesize(&self) -> usize {
        self.linesize
    }

    /// 是否为 16 位样本存储
    pub fn is_high_bitdepth(&self) -> bool {
        self.high_bitdepth
    }

    /// 读取 (x, y) 处的样本
    #[inline]
    pub fn sample(&self, x: usize, y: usize) -> u16 {
        if self.high_bitdepth {
            let off = y * self.linesize + x * 2;
            u16::from_le_bytes([self.data[off], self.data[off + 1]])
        } else {
            u16::from(self.data[y * self.linesize + x])
        }
    }

    /// 检查 `size x size` 的块是否完整落在平面内
    pub fn contains_block(&self, x: usize, y: usize, size: usize) -> bool {
        x + size <= self.width && y + size <= self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_luma_8bit() {
        let pic = Picture::new_luma(16, 8, 8).unwrap();
        assert_eq!(pic.width(), 16);
        assert_eq!(pic.height(), 8);
        assert!(!pic.is_high_bitdepth());
        assert_eq!(pic.planes[0].linesize, 16);
    }

    #[test]
    fn test_high_bitdepth_sample_roundtrip() {
        let mut pic = Picture::new_luma(4, 4, 10).unwrap();
        pic.set_sample(0, 3, 2, 1023);
        let luma = pic.luma().unwrap();
        assert_eq!(luma.sample(3, 2), 1023);
        assert_eq!(luma.sample(2, 2), 0);
        assert_eq!(luma.linesize(), 8);
    }

    #[test]
    fn test_fill_rect() {
        let mut pic = Picture::new_luma(8, 8, 8).unwrap();
        pic.fill_rect(0, 2, 2, 3, 3, 200);
        let luma = pic.luma().unwrap();
        assert_eq!(luma.sample(2, 2), 200);
        assert_eq!(luma.sample(4, 4), 200);
        assert_eq!(luma.sample(5, 4), 0);
    }

    #[test]
    fn test_plane_ref_rejects_short_buffer() {
        let data = [0u8; 10];
        assert!(matches!(
            PlaneRef::new(&data, 4, 4, 4, false),
            Err(YunError::InvalidData(_))
        ));
        assert!(PlaneRef::new(&data, 4, 2, 3, false).is_ok());
    }

    #[test]
    fn test_unsupported_bit_depth() {
        assert!(matches!(
            Picture::new_luma(4, 4, 9),
            Err(YunError::Unsupported(_))
        ));
    }

    #[test]
    #[should_panic(expected = "样本坐标越界")]
    fn test_set_sample_out_of_bounds_panics() {
        let mut pic = Picture::new_luma(4, 4, 10).unwrap();
        pic.set_sample(0, 4, 0, 1);
    }

    #[test]
    fn test_contains_block() {
        let pic = Picture::new_luma(8, 4, 8).unwrap();
        let luma = pic.luma().unwrap();
        assert!(luma.contains_block(4, 0, 4));
        assert!(!luma.contains_block(5, 0, 4));
    }
}
