//! 定点运动向量工具.
//!
//! 运动向量以 1/8 像素为单位存储 (16 位有符号), 整像素向量单独成型,
//! 两种单位的限幅类型也彼此独立, 在编译期防止混用.
//!
//! 精度降低与单位换算的舍入规则必须与解码端逐位一致.

/// 运动向量 (1/8 像素单位)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Mv {
    pub row: i16,
    pub col: i16,
}

/// 整像素运动向量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FullPelMv {
    pub row: i16,
    pub col: i16,
}

/// 无效运动向量哨兵: 两个分量均为 0x8000
///
/// 表示 "没有可用向量", 不得当作零向量使用.
pub const INVALID_MV: Mv = Mv {
    row: i16::MIN,
    col: i16::MIN,
};

/// 子像素精度等级, 由粗到细
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MvPrecision {
    /// 整像素
    None = 0,
    /// 1/2 像素
    Half = 1,
    /// 1/4 像素
    Quarter = 2,
    /// 1/8 像素
    Eighth = 3,
}

impl MvPrecision {
    /// 该精度下运动向量必须对齐的步长 (1/8 像素单位)
    pub const fn radix(self) -> i32 {
        1 << (MvPrecision::Eighth as i32 - self as i32)
    }

    /// 由帧级 `allow_high_precision_mv` 标志得到的精度
    pub const fn from_allow_hp(allow_high_precision_mv: bool) -> Self {
        if allow_high_precision_mv {
            MvPrecision::Eighth
        } else {
            MvPrecision::Quarter
        }
    }

    /// 纯平移全局参数相对 1/8 精度可少传的位数 (最多 1 位)
    pub const fn gm_precision_loss(self) -> u32 {
        let loss = MvPrecision::Eighth as u32 - self as u32;
        if loss < 1 { loss } else { 1 }
    }
}

/// 整像素运动向量限幅范围 (闭区间)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullMvLimits {
    pub col_min: i32,
    pub col_max: i32,
    pub row_min: i32,
    pub row_max: i32,
}

/// 子像素运动向量限幅范围 (闭区间)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubpelMvLimits {
    pub col_min: i32,
    pub col_max: i32,
    pub row_min: i32,
    pub row_max: i32,
}

/// 将单个分量舍入到 `radix` 的整数倍
///
/// 余数按截断取模得到, 仅当 |余数| 严格大于 radix/2 时按余数符号远离零进位.
#[inline]
fn lower_component(v: i16, radix: i32) -> i16 {
    let mut v = i32::from(v);
    let rem = v % radix;
    if rem != 0 {
        v -= rem;
        if rem.abs() > radix / 2 {
            if rem > 0 {
                v += radix;
            } else {
                v -= radix;
            }
        }
    }
    v as i16
}

/// 钳位到 `[low, high]`; 区间为空时不报错, 先比较下界
#[inline]
fn clamp_axis(v: i16, low: i32, high: i32) -> i16 {
    let v = i32::from(v);
    let v = if v < low {
        low
    } else if v > high {
        high
    } else {
        v
    };
    v as i16
}

/// 1/8 像素分量转整像素 (带非对称偏置的就近舍入)
#[inline]
fn rawpel(v: i16) -> i16 {
    let v = i32::from(v);
    ((v + 3 + i32::from(v >= 0)) >> 3) as i16
}

impl Mv {
    /// 零向量
    pub const ZERO: Mv = Mv { row: 0, col: 0 };

    pub const fn new(row: i16, col: i16) -> Self {
        Self { row, col }
    }

    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    /// 是否为 [`INVALID_MV`] 哨兵
    pub fn is_invalid(self) -> bool {
        self == INVALID_MV
    }

    /// 将向量降到指定子像素精度
    ///
    /// 精度为 1/8 时不做任何处理.
    pub fn lower_precision(self, precision: MvPrecision) -> Self {
        let radix = precision.radix();
        if radix == 1 {
            return self;
        }
        Self {
            row: lower_component(self.row, radix),
            col: lower_component(self.col, radix),
        }
    }

    /// 按子像素限幅范围逐轴钳位
    pub fn clamp(self, limits: &SubpelMvLimits) -> Self {
        Self {
            row: clamp_axis(self.row, limits.row_min, limits.row_max),
            col: clamp_axis(self.col, limits.col_min, limits.col_max),
        }
    }

    /// 转为整像素向量
    pub fn to_fullpel(self) -> FullPelMv {
        FullPelMv {
            row: rawpel(self.row),
            col: rawpel(self.col),
        }
    }
}

impl FullPelMv {
    /// 零向量
    pub const ZERO: FullPelMv = FullPelMv { row: 0, col: 0 };

    pub const fn new(row: i16, col: i16) -> Self {
        Self { row, col }
    }

    /// 按整像素限幅范围逐轴钳位
    pub fn clamp(self, limits: &FullMvLimits) -> Self {
        Self {
            row: clamp_axis(self.row, limits.row_min, limits.row_max),
            col: clamp_axis(self.col, limits.col_min, limits.col_max),
        }
    }

    /// 转为 1/8 像素向量
    pub fn to_subpel(self) -> Mv {
        Mv {
            row: (i32::from(self.row) * 8) as i16,
            col: (i32::from(self.col) * 8) as i16,
        }
    }
}

impl From<FullPelMv> for Mv {
    fn from(mv: FullPelMv) -> Self {
        mv.to_subpel()
    }
}
