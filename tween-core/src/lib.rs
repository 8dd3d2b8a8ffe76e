//! # Tween Core
//!
//! 卡牌对战游戏表现层的引擎无关核心。
//!
//! ## 架构概述
//!
//! `tween-core` 是纯逻辑核心，不依赖任何 IO、渲染或游戏引擎，
//! 由宿主的帧循环同步驱动：
//!
//! ```text
//! Host 帧循环                       Core
//!   │                                 │
//!   │──── tween.advance(dt) ────────►│ setter(value)
//!   │                                 │ on_complete()
//!   │──── tracker.add / remove ─────►│ listener(active)
//!   │                                 │
//! ```
//!
//! 两个组件互不依赖：
//!
//! - **补间引擎**：[`Tween`] 按时长、延迟、缓动输出插值，支持停止、反向、
//!   跳到终点，可绑定目标做存活检查
//! - **优先级追踪器**：[`PriorityTracker`] 在多个请求者之间按优先级仲裁，
//!   生效项变化时同步通知
//!
//! ## 使用示例
//!
//! ```ignore
//! use tween_core::{CallerId, EasingFunction, PriorityTracker, Tween};
//!
//! // 卡牌翻面：0.25 秒后开始，0.4 秒内缩放回弹
//! let mut flip = Tween::builder(0.0_f32, 1.0, 0.4)
//!     .delay(0.25)
//!     .easing(EasingFunction::EaseOutBack)
//!     .target(card_guard.token())
//!     .on_complete(|| println!("翻面完成"))
//!     .build(move |scale| card.set_scale_x(scale))?;
//!
//! // 时间缩放仲裁：暂停菜单优先于慢动作
//! let time_scale = PriorityTracker::new();
//! time_scale.subscribe(|item| apply_time_scale(item.map_or(1.0, |i| i.value)));
//! time_scale.add(0.3, 10, slow_motion_id)?;
//! time_scale.add(0.0, 100, pause_menu_id)?;
//!
//! // 主循环
//! loop {
//!     let dt = frame_dt * time_scale.value_or(1.0);
//!     flip.advance(dt);
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`tween`]：补间实例与构造器
//! - [`easing`]：缓动函数表
//! - [`lerp`]：各值类型的插值规则
//! - [`value`]：向量与颜色类型
//! - [`liveness`]：目标存活检查
//! - [`set`]：补间集合
//! - [`tracker`]：优先级追踪器
//! - [`error`]：错误类型定义

pub mod easing;
pub mod error;
pub mod lerp;
pub mod liveness;
pub mod set;
pub mod tracker;
pub mod tween;
pub mod value;

// 重导出核心类型
pub use easing::EasingFunction;
pub use error::{CoreError, CoreResult, TrackerError, TweenError};
pub use lerp::Lerp;
pub use liveness::{LifeGuard, LifeToken, Liveness, Probe};
pub use set::{TweenEvent, TweenId, TweenSet, Tweening};
pub use tracker::{CallerId, ListenerId, PriorityTracker, TrackedItem};
pub use tween::{OnComplete, Setter, Tween, TweenBuilder, TweenState};
pub use value::{Color, Vec2, Vec3, Vec4};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        // 验证所有公共类型都可以正常使用
        let _tween = Tween::new(0.0_f32, 1.0, 0.5, |_| {}).unwrap();
        let _easing = EasingFunction::default();
        let _tracker: PriorityTracker<Color> = PriorityTracker::new();
        let _set = TweenSet::new();
        let _guard = LifeGuard::new();
        let _caller = CallerId::next();
    }
}
