//! # Error 模块
//!
//! 定义 tween-core 中使用的错误类型。
//!
//! 这里的错误都是调用方的编程错误（构造参数非法、重复注册等），
//! 在出错的调用点立即返回，逐帧推进过程中不会产生新的错误。

use thiserror::Error;

/// 补间构造错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TweenError {
    /// 无效的参数值（负数或非有限值的时长/延迟）
    #[error("参数 '{param}' 的值无效: {value}")]
    InvalidParameter { param: &'static str, value: f32 },

    /// 无法解析的缓动函数名
    #[error("未知的缓动函数 '{name}'")]
    UnknownEasing { name: String },
}

/// 优先级追踪器错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    /// 同一调用方未注销就重复注册
    #[error("调用方 {caller} 已注册，必须先移除才能再次注册")]
    DuplicateRegistration { caller: String },
}

/// tween-core 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// 补间错误
    #[error("补间错误: {0}")]
    Tween(#[from] TweenError),

    /// 追踪器错误
    #[error("追踪器错误: {0}")]
    Tracker(#[from] TrackerError),
}

/// Result 类型别名
pub type CoreResult<T> = Result<T, CoreError>;
