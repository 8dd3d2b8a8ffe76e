//! # Logging 模块
//!
//! 安装 `tracing-subscriber` 的 fmt 输出。日志写到 stderr，
//! stdout 只留给轨迹输出，方便重定向。

use tracing::Level;
use tracing::level_filters::LevelFilter;

/// 根据 `-v` 次数提升日志级别
///
/// 0 次保持配置值，1 次至少 debug，2 次及以上 trace。
pub fn effective_level(configured: Level, verbose: u8) -> Level {
    let requested = match verbose {
        0 => return configured,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    // tracing 中越详细的级别越"大"
    configured.max(requested)
}

/// 初始化全局日志
///
/// 重复初始化（例如测试中）时静默忽略。
pub fn init(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from_level(level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
