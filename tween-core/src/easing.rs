//! # Easing 模块
//!
//! 缓动函数库，用于补间的时间插值。
//!
//! 所有曲线都是纯函数：同一个标识符对同一个 `t` 总是得到逐位相同的结果。
//! `apply` **不会**限制输入范围，由补间引擎决定传入的 `t`；
//! 回弹（Back）、弹性（Elastic）类曲线的输出可以超出 `[0, 1]`。
//!
//! 名称解析（[`EasingFunction::from_name`]）遇到未知名称直接报错，
//! 不会静默回退到 `Linear`。

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TweenError;

const BACK_C1: f32 = 1.70158;
const BACK_C2: f32 = BACK_C1 * 1.525;
const BACK_C3: f32 = BACK_C1 + 1.0;
const ELASTIC_C4: f32 = (2.0 * PI) / 3.0;
const ELASTIC_C5: f32 = (2.0 * PI) / 4.5;

/// 缓动函数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EasingFunction {
    /// 线性（匀速）
    #[default]
    Linear,
    /// 缓入（先慢后快，Cubic）
    EaseIn,
    /// 缓出（先快后慢，Cubic）
    EaseOut,
    /// 缓入缓出（两头慢中间快，Cubic）
    EaseInOut,
    /// 二次缓入
    EaseInQuad,
    /// 二次缓出
    EaseOutQuad,
    /// 二次缓入缓出
    EaseInOutQuad,
    /// 三次缓入
    EaseInCubic,
    /// 三次缓出
    EaseOutCubic,
    /// 三次缓入缓出
    EaseInOutCubic,
    /// 四次缓入
    EaseInQuart,
    /// 四次缓出
    EaseOutQuart,
    /// 四次缓入缓出
    EaseInOutQuart,
    /// 五次缓入
    EaseInQuint,
    /// 五次缓出
    EaseOutQuint,
    /// 五次缓入缓出
    EaseInOutQuint,
    /// 正弦缓入
    EaseInSine,
    /// 正弦缓出
    EaseOutSine,
    /// 正弦缓入缓出
    EaseInOutSine,
    /// 指数缓入
    EaseInExpo,
    /// 指数缓出
    EaseOutExpo,
    /// 指数缓入缓出
    EaseInOutExpo,
    /// 圆形缓入
    EaseInCirc,
    /// 圆形缓出
    EaseOutCirc,
    /// 圆形缓入缓出
    EaseInOutCirc,
    /// 回弹缓入（起步先反向）
    EaseInBack,
    /// 回弹缓出（结尾越过终点再回来）
    EaseOutBack,
    /// 回弹缓入缓出
    EaseInOutBack,
    /// 弹性缓入
    EaseInElastic,
    /// 弹性缓出
    EaseOutElastic,
    /// 弹性缓入缓出
    EaseInOutElastic,
    /// 弹跳缓入
    EaseInBounce,
    /// 弹跳缓出
    EaseOutBounce,
    /// 弹跳缓入缓出
    EaseInOutBounce,
}

impl EasingFunction {
    /// 全部缓动函数（按声明顺序）
    pub const ALL: [EasingFunction; 34] = [
        EasingFunction::Linear,
        EasingFunction::EaseIn,
        EasingFunction::EaseOut,
        EasingFunction::EaseInOut,
        EasingFunction::EaseInQuad,
        EasingFunction::EaseOutQuad,
        EasingFunction::EaseInOutQuad,
        EasingFunction::EaseInCubic,
        EasingFunction::EaseOutCubic,
        EasingFunction::EaseInOutCubic,
        EasingFunction::EaseInQuart,
        EasingFunction::EaseOutQuart,
        EasingFunction::EaseInOutQuart,
        EasingFunction::EaseInQuint,
        EasingFunction::EaseOutQuint,
        EasingFunction::EaseInOutQuint,
        EasingFunction::EaseInSine,
        EasingFunction::EaseOutSine,
        EasingFunction::EaseInOutSine,
        EasingFunction::EaseInExpo,
        EasingFunction::EaseOutExpo,
        EasingFunction::EaseInOutExpo,
        EasingFunction::EaseInCirc,
        EasingFunction::EaseOutCirc,
        EasingFunction::EaseInOutCirc,
        EasingFunction::EaseInBack,
        EasingFunction::EaseOutBack,
        EasingFunction::EaseInOutBack,
        EasingFunction::EaseInElastic,
        EasingFunction::EaseOutElastic,
        EasingFunction::EaseInOutElastic,
        EasingFunction::EaseInBounce,
        EasingFunction::EaseOutBounce,
        EasingFunction::EaseInOutBounce,
    ];

    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 归一化时间进度，通常在 0.0 - 1.0 之间，但不会被限制
    ///
    /// # 返回
    /// - 缓动后的进度值（回弹/弹性曲线可能超出 0.0 - 1.0）
    pub fn apply(&self, t: f32) -> f32 {
        match self {
            EasingFunction::Linear => t,
            EasingFunction::EaseIn | EasingFunction::EaseInCubic => t * t * t,
            EasingFunction::EaseOut | EasingFunction::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            EasingFunction::EaseInOut | EasingFunction::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            EasingFunction::EaseInQuad => t * t,
            EasingFunction::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            EasingFunction::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            EasingFunction::EaseInQuart => t.powi(4),
            EasingFunction::EaseOutQuart => 1.0 - (1.0 - t).powi(4),
            EasingFunction::EaseInOutQuart => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            EasingFunction::EaseInQuint => t.powi(5),
            EasingFunction::EaseOutQuint => 1.0 - (1.0 - t).powi(5),
            EasingFunction::EaseInOutQuint => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
                }
            }
            EasingFunction::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            EasingFunction::EaseOutSine => (t * PI / 2.0).sin(),
            EasingFunction::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            EasingFunction::EaseInExpo => ease_in_expo(t),
            EasingFunction::EaseOutExpo => ease_out_expo(t),
            EasingFunction::EaseInOutExpo => ease_in_out_expo(t),
            EasingFunction::EaseInCirc => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            EasingFunction::EaseOutCirc => (1.0 - (t - 1.0).powi(2)).max(0.0).sqrt(),
            EasingFunction::EaseInOutCirc => ease_in_out_circ(t),
            EasingFunction::EaseInBack => BACK_C3 * t * t * t - BACK_C1 * t * t,
            EasingFunction::EaseOutBack => {
                1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2)
            }
            EasingFunction::EaseInOutBack => ease_in_out_back(t),
            EasingFunction::EaseInElastic => ease_in_elastic(t),
            EasingFunction::EaseOutElastic => ease_out_elastic(t),
            EasingFunction::EaseInOutElastic => ease_in_out_elastic(t),
            EasingFunction::EaseInBounce => 1.0 - ease_out_bounce(1.0 - t),
            EasingFunction::EaseOutBounce => ease_out_bounce(t),
            EasingFunction::EaseInOutBounce => {
                if t < 0.5 {
                    (1.0 - ease_out_bounce(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + ease_out_bounce(2.0 * t - 1.0)) / 2.0
                }
            }
        }
    }

    /// 标识符名称（snake_case，用于配置文件和序列化）
    pub fn name(&self) -> &'static str {
        match self {
            EasingFunction::Linear => "linear",
            EasingFunction::EaseIn => "ease_in",
            EasingFunction::EaseOut => "ease_out",
            EasingFunction::EaseInOut => "ease_in_out",
            EasingFunction::EaseInQuad => "ease_in_quad",
            EasingFunction::EaseOutQuad => "ease_out_quad",
            EasingFunction::EaseInOutQuad => "ease_in_out_quad",
            EasingFunction::EaseInCubic => "ease_in_cubic",
            EasingFunction::EaseOutCubic => "ease_out_cubic",
            EasingFunction::EaseInOutCubic => "ease_in_out_cubic",
            EasingFunction::EaseInQuart => "ease_in_quart",
            EasingFunction::EaseOutQuart => "ease_out_quart",
            EasingFunction::EaseInOutQuart => "ease_in_out_quart",
            EasingFunction::EaseInQuint => "ease_in_quint",
            EasingFunction::EaseOutQuint => "ease_out_quint",
            EasingFunction::EaseInOutQuint => "ease_in_out_quint",
            EasingFunction::EaseInSine => "ease_in_sine",
            EasingFunction::EaseOutSine => "ease_out_sine",
            EasingFunction::EaseInOutSine => "ease_in_out_sine",
            EasingFunction::EaseInExpo => "ease_in_expo",
            EasingFunction::EaseOutExpo => "ease_out_expo",
            EasingFunction::EaseInOutExpo => "ease_in_out_expo",
            EasingFunction::EaseInCirc => "ease_in_circ",
            EasingFunction::EaseOutCirc => "ease_out_circ",
            EasingFunction::EaseInOutCirc => "ease_in_out_circ",
            EasingFunction::EaseInBack => "ease_in_back",
            EasingFunction::EaseOutBack => "ease_out_back",
            EasingFunction::EaseInOutBack => "ease_in_out_back",
            EasingFunction::EaseInElastic => "ease_in_elastic",
            EasingFunction::EaseOutElastic => "ease_out_elastic",
            EasingFunction::EaseInOutElastic => "ease_in_out_elastic",
            EasingFunction::EaseInBounce => "ease_in_bounce",
            EasingFunction::EaseOutBounce => "ease_out_bounce",
            EasingFunction::EaseInOutBounce => "ease_in_out_bounce",
        }
    }

    /// 按名称解析缓动函数
    ///
    /// 忽略大小写以及 `_`、`-`、空格，因此 `"ease_out_back"`、
    /// `"EaseOutBack"`、`"ease-out-back"` 都能解析。
    ///
    /// # 错误
    /// 名称无法识别时返回 [`TweenError::UnknownEasing`]。
    pub fn from_name(name: &str) -> Result<Self, TweenError> {
        let wanted = normalize(name);
        Self::ALL
            .iter()
            .copied()
            .find(|easing| normalize(easing.name()) == wanted)
            .ok_or_else(|| TweenError::UnknownEasing {
                name: name.to_string(),
            })
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl fmt::Display for EasingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EasingFunction {
    type Err = TweenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl Serialize for EasingFunction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for EasingFunction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::from_name(&name).map_err(serde::de::Error::custom)
    }
}

fn ease_in_expo(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else {
        2.0_f32.powf(10.0 * t - 10.0)
    }
}

fn ease_out_expo(t: f32) -> f32 {
    if t == 1.0 {
        1.0
    } else {
        1.0 - 2.0_f32.powf(-10.0 * t)
    }
}

fn ease_in_out_expo(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else if t < 0.5 {
        2.0_f32.powf(20.0 * t - 10.0) / 2.0
    } else {
        (2.0 - 2.0_f32.powf(-20.0 * t + 10.0)) / 2.0
    }
}

fn ease_in_out_circ(t: f32) -> f32 {
    if t < 0.5 {
        (1.0 - (1.0 - (2.0 * t).powi(2)).max(0.0).sqrt()) / 2.0
    } else {
        ((1.0 - (-2.0 * t + 2.0).powi(2)).max(0.0).sqrt() + 1.0) / 2.0
    }
}

fn ease_in_out_back(t: f32) -> f32 {
    if t < 0.5 {
        ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
    } else {
        ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2) + 2.0) / 2.0
    }
}

fn ease_in_elastic(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else {
        -(2.0_f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin()
    }
}

/// 弹性缓出
fn ease_out_elastic(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else {
        2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
    }
}

fn ease_in_out_elastic(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else if t < 0.5 {
        -(2.0_f32.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0
    } else {
        (2.0_f32.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0 + 1.0
    }
}

/// 弹跳缓出
fn ease_out_bounce(t: f32) -> f32 {
    let n1 = 7.5625;
    let d1 = 2.75;

    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        let t = t - 1.5 / d1;
        n1 * t * t + 0.75
    } else if t < 2.5 / d1 {
        let t = t - 2.25 / d1;
        n1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / d1;
        n1 * t * t + 0.984375
    }
}
