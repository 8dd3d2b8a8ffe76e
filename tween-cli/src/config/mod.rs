//! # Config 模块
//!
//! 播放器配置管理。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (tween-cli.json)
//! 3. 默认值（最低）

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::{Level, debug, warn};
use tween_core::EasingFunction;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "tween-cli.json";

/// 播放器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// 场景未指定帧率时使用的帧率
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 补间未指定缓动时使用的缓动函数
    #[serde(default)]
    pub default_easing: EasingFunction,

    /// 输出数值的小数位数
    #[serde(default = "default_precision")]
    pub precision: usize,
}

// 默认值函数
fn default_fps() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_precision() -> usize {
    4
}

/// 帧率上限
const MAX_FPS: u32 = 1000;

/// 小数位数上限
const MAX_PRECISION: usize = 9;

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            log_level: default_log_level(),
            default_easing: EasingFunction::default(),
            precision: default_precision(),
        }
    }
}

impl CliConfig {
    /// 读取并解析配置文件
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 加载配置文件
    ///
    /// 如果文件不存在、解析失败或校验失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        match Self::try_load(path) {
            Ok(config) => {
                debug!(?config, "配置文件加载成功");
                config
            }
            Err(ConfigError::NotFound(path)) => {
                debug!(?path, "配置文件不存在，使用默认配置");
                Self::default()
            }
            Err(e) => {
                warn!(error = %e, "配置文件不可用，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 || self.fps > MAX_FPS {
            return Err(ConfigError::Validation(format!(
                "帧率必须在 1 - {MAX_FPS} 之间，当前为 {}",
                self.fps
            )));
        }

        if self.precision > MAX_PRECISION {
            return Err(ConfigError::Validation(format!(
                "小数位数不能超过 {MAX_PRECISION}，当前为 {}",
                self.precision
            )));
        }

        self.level()?;
        Ok(())
    }

    /// 解析日志级别
    pub fn level(&self) -> Result<Level, ConfigError> {
        Level::from_str(&self.log_level)
            .map_err(|_| ConfigError::Validation(format!("未知的日志级别: {}", self.log_level)))
    }
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件不存在
    #[error("配置文件不存在: {0:?}")]
    NotFound(PathBuf),

    /// IO 错误
    #[error("配置 IO 错误 {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 解析失败
    #[error("配置解析失败 {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    Serialize(#[source] serde_json::Error),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    Validation(String),
}
