//! 统一错误类型定义.
//!
//! 所有 Yun crate 共用的错误类型, 支持跨模块传播.

use thiserror::Error;

/// Yun 统一错误类型
#[derive(Debug, Error)]
pub enum YunError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 不支持的操作
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 无效数据 (损坏的码流等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// 比特流已耗尽
    #[error("已到达比特流末尾")]
    Eof,

    /// 内存分配失败
    #[error("内存分配失败: {0}")]
    OutOfMemory(String),
}

/// Yun 统一 Result 类型
pub type YunResult<T> = Result<T, YunError>;
