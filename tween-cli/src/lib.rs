//! # Tween CLI
//!
//! 无界面补间场景播放器的库部分，`tween-cli` 二进制与 `xtask`
//! 共用场景解析与校验。
//!
//! ## 模块结构
//!
//! - [`config`]：播放器配置
//! - [`scenario`]：场景文件与逐帧回放
//! - [`curve`]：缓动曲线采样
//! - [`logging`]：日志初始化

pub mod config;
pub mod curve;
pub mod logging;
pub mod scenario;

pub use config::{CliConfig, ConfigError};
pub use scenario::{PlayOptions, Player, Scenario, ScenarioError, TraceLine};
