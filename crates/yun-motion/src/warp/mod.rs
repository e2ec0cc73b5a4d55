//! 全局运动 (warp) 模型.
//!
//! 以 16 位小数精度的 8 个定点系数描述一个单应变换, 右下角元素隐含为 1:
//!
//! ```text
//!      [x'     (m2 m3 m0   [x
//!  z .  y'  =   m4 m5 m1 *  y
//!       1]      m6 m7 1)    1]
//! ```
//!
//! 由模型在块中心求值得到块级子像素运动向量. 全部运算为整数/定点运算,
//! 编码端与解码端必须逐位一致, 因此本模块不使用任何浮点.

pub mod decode;
mod shear;

use log::warn;
use yun_core::{BlockSize, MI_SIZE};

use crate::mv::{Mv, MvPrecision};

pub use shear::is_affine_shear_allowed;

/// 模型系数的小数位数
pub const WARPEDMODEL_PREC_BITS: u32 = 16;

/// 定点 1.0
pub const WARPEDMODEL_ONE: i32 = 1 << WARPEDMODEL_PREC_BITS;

/// 纯平移参数相对模型精度被丢弃的位数 (保留 3 位小数)
pub const GM_TRANS_ONLY_PREC_DIFF: u32 = WARPEDMODEL_PREC_BITS - 3;

/// 变换类型, 参数个数依次为 0/2/4/6
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TransformKind {
    /// 恒等变换
    #[default]
    Identity = 0,
    /// 平移
    Translation = 1,
    /// 旋转 + 缩放
    RotZoom = 2,
    /// 仿射
    Affine = 3,
}

impl TransformKind {
    /// 该类型需要的参数个数
    pub const fn param_count(self) -> usize {
        match self {
            Self::Identity => 0,
            Self::Translation => 2,
            Self::RotZoom => 4,
            Self::Affine => 6,
        }
    }
}

/// 由系数的数值模式判定变换类型
///
/// 纯函数, 既用于校验编码端选定的模型, 也用于解释解码得到的模型.
pub fn classify(wmmat: &[i32; 8]) -> TransformKind {
    if wmmat[5] == WARPEDMODEL_ONE
        && wmmat[4] == 0
        && wmmat[2] == WARPEDMODEL_ONE
        && wmmat[3] == 0
    {
        return if wmmat[1] == 0 && wmmat[0] == 0 {
            TransformKind::Identity
        } else {
            TransformKind::Translation
        };
    }
    if wmmat[2] == wmmat[5] && wmmat[3] == -wmmat[4] {
        TransformKind::RotZoom
    } else {
        TransformKind::Affine
    }
}

/// 全局运动模型参数
///
/// 相等比较逐字段精确进行: 有效标志, 由系数重新推导的类型, 四个剪切参数, 八个系数.
/// 存储的 `kind` 标签本身不参与比较.
#[derive(Debug, Clone, Copy)]
pub struct WarpModel {
    /// 单应矩阵系数
    pub wmmat: [i32; 8],
    /// 缓存的剪切参数, 供逐像素 warp 插值使用
    pub alpha: i16,
    pub beta: i16,
    pub gamma: i16,
    pub delta: i16,
    /// 变换类型
    pub kind: TransformKind,
    /// 模型未通过合法性检查, 不得求值
    pub invalid: bool,
}

impl Default for WarpModel {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl PartialEq for WarpModel {
    fn eq(&self, other: &Self) -> bool {
        self.invalid == other.invalid
            && self.derived_kind() == other.derived_kind()
            && self.alpha == other.alpha
            && self.beta == other.beta
            && self.gamma == other.gamma
            && self.delta == other.delta
            && self.wmmat == other.wmmat
    }
}

impl Eq for WarpModel {}

impl std::hash::Hash for WarpModel {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.invalid.hash(state);
        self.derived_kind().hash(state);
        (self.alpha, self.beta, self.gamma, self.delta).hash(state);
        self.wmmat.hash(state);
    }
}

/// 块中心横坐标 (像素)
#[inline]
pub fn block_center_x(mi_col: i32, bsize: BlockSize) -> i32 {
    mi_col * MI_SIZE + bsize.width() / 2 - 1
}

/// 块中心纵坐标 (像素)
#[inline]
pub fn block_center_y(mi_row: i32, bsize: BlockSize) -> i32 {
    mi_row * MI_SIZE + bsize.height() / 2 - 1
}

/// 有符号的 2 的幂舍入除法, 对称于零
#[inline]
pub(crate) fn round_power_of_two_signed(value: i64, n: u32) -> i64 {
    let half = (1i64 << n) >> 1;
    if value < 0 {
        -((-value + half) >> n)
    } else {
        (value + half) >> n
    }
}

/// 模型精度的位移量换算为 3 位小数的平移量
///
/// 低于 1/8 精度时先舍入到 1/4 网格再乘 2, 而不是舍入到 1/8 后截断,
/// 两者结果不同, 必须保持此分支.
#[inline]
fn convert_to_trans_prec(precision: MvPrecision, coor: i64) -> i32 {
    if precision > MvPrecision::Quarter {
        round_power_of_two_signed(coor, WARPEDMODEL_PREC_BITS - 3) as i32
    } else {
        (round_power_of_two_signed(coor, WARPEDMODEL_PREC_BITS - 2) * 2) as i32
    }
}

impl WarpModel {
    /// 默认参数: 恒等变换
    pub const IDENTITY: WarpModel = WarpModel {
        wmmat: [0, 0, WARPEDMODEL_ONE, 0, 0, WARPEDMODEL_ONE, 0, 0],
        alpha: 0,
        beta: 0,
        gamma: 0,
        delta: 0,
        kind: TransformKind::Identity,
        invalid: false,
    };

    /// 由系数构造并定型模型
    ///
    /// 类型由 [`classify`] 推导, 随后计算剪切参数; 剪切参数不合法时模型被标记为无效.
    pub fn from_coefficients(wmmat: [i32; 8]) -> Self {
        let mut model = Self {
            wmmat,
            kind: classify(&wmmat),
            ..Self::IDENTITY
        };
        if !model.compute_shear() {
            model.invalid = true;
        }
        model
    }

    /// 纯平移模型, 参数为 1/8 像素单位的位移
    pub fn translation(row: i32, col: i32) -> Self {
        let mut wmmat = Self::IDENTITY.wmmat;
        wmmat[0] = row << GM_TRANS_ONLY_PREC_DIFF;
        wmmat[1] = col << GM_TRANS_ONLY_PREC_DIFF;
        Self::from_coefficients(wmmat)
    }

    /// 按系数重新推导的类型
    pub fn derived_kind(&self) -> TransformKind {
        classify(&self.wmmat)
    }

    /// 校验存储的类型能否表达当前系数
    ///
    /// 系数需要的参数多于存储类型时 (例如标记为 ROTZOOM 却不满足其约束),
    /// 模型被标记为无效并返回 `false`. 系数退化为更简单的类型是允许的.
    pub fn check_kind(&mut self) -> bool {
        if self.derived_kind() > self.kind {
            warn!(
                "全局运动模型类型与系数不符, 标记为无效: kind={:?}, derived={:?}",
                self.kind,
                self.derived_kind(),
            );
            self.invalid = true;
            return false;
        }
        true
    }

    /// 在块中心求值, 得到块的运动向量
    ///
    /// 结果具有 3 位小数精度, 并已降到 `precision`. 调用前须确认模型有效,
    /// 对无效模型求值属于违约调用.
    pub fn block_motion_vector(
        &self,
        precision: MvPrecision,
        bsize: BlockSize,
        mi_col: i32,
        mi_row: i32,
    ) -> Mv {
        match self.kind {
            TransformKind::Identity => Mv::ZERO,
            TransformKind::Translation => {
                // 行取 m0, 列取 m1, 与一般路径的行列取法不同, 保持原样以保证码流兼容
                let mv = Mv {
                    row: (self.wmmat[0] >> GM_TRANS_ONLY_PREC_DIFF) as i16,
                    col: (self.wmmat[1] >> GM_TRANS_ONLY_PREC_DIFF) as i16,
                };
                mv.lower_precision(precision)
            }
            TransformKind::RotZoom | TransformKind::Affine => {
                let mat = &self.wmmat;
                let x = i64::from(block_center_x(mi_col, bsize));
                let y = i64::from(block_center_y(mi_row, bsize));

                let xc = i64::from(mat[2] - WARPEDMODEL_ONE) * x
                    + i64::from(mat[3]) * y
                    + i64::from(mat[0]);
                let yc = i64::from(mat[4]) * x
                    + i64::from(mat[5] - WARPEDMODEL_ONE) * y
                    + i64::from(mat[1]);

                let tx = convert_to_trans_prec(precision, xc);
                let ty = convert_to_trans_prec(precision, yc);

                Mv {
                    row: ty as i16,
                    col: tx as i16,
                }
                .lower_precision(precision)
            }
        }
    }
}
