//! # Tween 模块
//!
//! 单个补间实例：在 `duration` 时间内把值从 `from` 变到 `to`，
//! 每帧由调用方推进一次，通过 setter 回调输出当前值。
//!
//! ## 状态机
//!
//! ```text
//! Pending(delay > 0) ──► Running ──► Completed
//!        │                  │
//!        └──── stop() ──────┴──────► Stopped
//! ```
//!
//! `Completed` 与 `Stopped` 都是终态，之后的 `advance` 什么也不做。
//!
//! ## 时间轴约定
//!
//! - `elapsed` 从 `-delay` 开始累加，小于 0 时处于延迟窗口
//! - 离开延迟窗口的那一帧输出起点值（`t = 0`），除非剩余时间已经足够完成
//! - 未完成时把未截断的进度交给缓动函数，回弹类曲线可以越过端点
//! - 完成时 setter 收到的一定是 `to` 本身，完成回调恰好触发一次

use std::fmt;

use tracing::{debug, trace};

use crate::easing::EasingFunction;
use crate::error::TweenError;
use crate::lerp::Lerp;
use crate::liveness::Liveness;

/// 值输出回调
pub type Setter<V> = Box<dyn FnMut(V)>;

/// 完成回调
pub type OnComplete = Box<dyn FnOnce()>;

/// 补间状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TweenState {
    /// 等待开始（处于延迟窗口）
    #[default]
    Pending,
    /// 正在播放
    Running,
    /// 已完成
    Completed,
    /// 已停止
    Stopped,
}

impl TweenState {
    /// 是否为活跃状态（需要推进）
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped)
    }
}

/// 构造时的缓动选择，名称在 `build` 时解析
enum EasingChoice {
    Known(EasingFunction),
    Named(String),
}

/// 补间构造器
///
/// 所有参数在 [`TweenBuilder::build`] 时统一校验，任何非法输入都在
/// 第一帧推进之前报错。
pub struct TweenBuilder<V> {
    from: V,
    to: V,
    duration: f32,
    delay: f32,
    easing: EasingChoice,
    on_complete: Option<OnComplete>,
    target: Option<Box<dyn Liveness>>,
}

impl<V: Lerp + Clone + 'static> TweenBuilder<V> {
    /// 设置缓动函数
    pub fn easing(mut self, easing: EasingFunction) -> Self {
        self.easing = EasingChoice::Known(easing);
        self
    }

    /// 按名称设置缓动函数（常见于配置文件）
    ///
    /// 未知名称会让 `build` 返回 [`TweenError::UnknownEasing`]。
    pub fn easing_named(mut self, name: impl Into<String>) -> Self {
        self.easing = EasingChoice::Named(name.into());
        self
    }

    /// 设置延迟（秒）
    pub fn delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    /// 设置完成回调
    pub fn on_complete(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// 绑定目标（仅用于存活检查）
    pub fn target(mut self, target: impl Liveness + 'static) -> Self {
        self.target = Some(Box::new(target));
        self
    }

    /// 校验参数并创建补间
    ///
    /// # 错误
    /// - 时长或延迟为负数、NaN、无穷大：[`TweenError::InvalidParameter`]
    /// - 缓动名称无法解析：[`TweenError::UnknownEasing`]
    pub fn build(self, setter: impl FnMut(V) + 'static) -> Result<Tween<V>, TweenError> {
        check_time("duration", self.duration)?;
        check_time("delay", self.delay)?;

        let easing = match self.easing {
            EasingChoice::Known(easing) => easing,
            EasingChoice::Named(name) => EasingFunction::from_name(&name)?,
        };

        let state = if self.delay > 0.0 {
            TweenState::Pending
        } else {
            TweenState::Running
        };

        Ok(Tween {
            from: self.from,
            to: self.to,
            duration: self.duration,
            delay: self.delay,
            elapsed: -self.delay,
            easing,
            state,
            progress: 0.0,
            current: None,
            setter: Box::new(setter),
            on_complete: self.on_complete,
            target: self.target,
        })
    }
}

fn check_time(param: &'static str, value: f32) -> Result<(), TweenError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TweenError::InvalidParameter { param, value })
    }
}

/// 补间实例
///
/// 由创建者独占，引擎不维护全局列表；需要批量驱动时见 [`crate::TweenSet`]。
pub struct Tween<V> {
    /// 起始值
    from: V,
    /// 目标值
    to: V,
    /// 时长（秒）
    duration: f32,
    /// 延迟（秒）
    delay: f32,
    /// 已经过的时间，从 `-delay` 开始
    elapsed: f32,
    /// 缓动函数
    easing: EasingFunction,
    /// 当前状态
    state: TweenState,
    /// 归一化进度（0.0 - 1.0，未应用缓动）
    progress: f32,
    /// 最近一次输出的值
    current: Option<V>,
    setter: Setter<V>,
    on_complete: Option<OnComplete>,
    target: Option<Box<dyn Liveness>>,
}

impl<V: Lerp + Clone + 'static> Tween<V> {
    /// 创建线性、无延迟的补间
    pub fn new(
        from: V,
        to: V,
        duration: f32,
        setter: impl FnMut(V) + 'static,
    ) -> Result<Self, TweenError> {
        Self::builder(from, to, duration).build(setter)
    }

    /// 创建构造器
    pub fn builder(from: V, to: V, duration: f32) -> TweenBuilder<V> {
        TweenBuilder {
            from,
            to,
            duration,
            delay: 0.0,
            easing: EasingChoice::Known(EasingFunction::Linear),
            on_complete: None,
            target: None,
        }
    }

    /// 推进补间
    ///
    /// 负数或非有限的 `dt` 视为 0。
    ///
    /// # 返回
    /// - `true`: 补间仍在进行中
    /// - `false`: 补间已结束（完成或停止）
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.state.is_finished() {
            return false;
        }

        if let Some(target) = &self.target
            && !target.is_alive()
        {
            debug!(state = ?self.state, "补间目标已失效，自动停止");
            self.halt();
            return false;
        }

        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.elapsed += dt;

        match self.state {
            TweenState::Pending => {
                if self.elapsed < 0.0 {
                    return true;
                }
                trace!(delay = self.delay, "补间延迟结束");
                self.state = TweenState::Running;
                if self.elapsed >= self.duration {
                    self.complete();
                    false
                } else {
                    // 延迟结束的那一帧输出起点
                    self.emit(0.0);
                    true
                }
            }
            TweenState::Running => {
                if self.elapsed >= self.duration {
                    self.complete();
                    false
                } else {
                    self.emit(self.elapsed / self.duration);
                    true
                }
            }
            TweenState::Completed | TweenState::Stopped => false,
        }
    }

    /// 停止补间
    ///
    /// 可重复调用。停止后不再调用 setter，也不会触发完成回调。
    pub fn stop(&mut self) {
        if self.state.is_active() {
            debug!(state = ?self.state, "补间被停止");
            self.halt();
        }
    }

    /// 立即跳到终点
    ///
    /// 输出 `to` 并触发完成回调，已结束的补间不受影响。
    pub fn finish(&mut self) {
        if self.state.is_active() {
            self.complete();
        }
    }

    /// 反向播放
    ///
    /// - 尚未输出过任何值（延迟窗口中，或无延迟但还没推进过）：直接交换 `from` 与 `to`
    /// - 播放中：以当前输出值为新起点、原起点为新终点，时间轴从 0 重新开始，
    ///   时长不变，输出值不会跳变
    /// - 已结束：无效果
    pub fn reverse(&mut self) {
        match self.state {
            TweenState::Pending => {
                std::mem::swap(&mut self.from, &mut self.to);
            }
            TweenState::Running => match self.current.clone() {
                Some(current) => {
                    self.to = std::mem::replace(&mut self.from, current);
                    self.elapsed = 0.0;
                    self.progress = 0.0;
                }
                None => std::mem::swap(&mut self.from, &mut self.to),
            },
            TweenState::Completed | TweenState::Stopped => return,
        }
        trace!(state = ?self.state, "补间反向");
    }

    fn emit(&mut self, raw_progress: f32) {
        self.progress = raw_progress.clamp(0.0, 1.0);
        let eased = self.easing.apply(raw_progress);
        let value = V::lerp(&self.from, &self.to, eased);
        self.current = Some(value.clone());
        (self.setter)(value);
    }

    fn complete(&mut self) {
        self.progress = 1.0;
        self.current = Some(self.to.clone());
        (self.setter)(self.to.clone());
        self.state = TweenState::Completed;
        trace!(duration = self.duration, "补间完成");
        if let Some(callback) = self.on_complete.take() {
            callback();
        }
    }

    fn halt(&mut self) {
        self.state = TweenState::Stopped;
        self.on_complete = None;
    }
}

impl<V> Tween<V> {
    /// 当前状态
    pub fn state(&self) -> TweenState {
        self.state
    }

    /// 归一化进度（0.0 - 1.0，未应用缓动）
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// 已经过的时间（秒），延迟窗口中为负数
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// 最近一次输出的值，尚未输出过时为 `None`
    pub fn current_value(&self) -> Option<&V> {
        self.current.as_ref()
    }

    /// 起始值（反向后会改变）
    pub fn from(&self) -> &V {
        &self.from
    }

    /// 目标值（反向后会改变）
    pub fn to(&self) -> &V {
        &self.to
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    pub fn easing(&self) -> EasingFunction {
        self.easing
    }

    /// 是否正在播放
    pub fn is_running(&self) -> bool {
        self.state == TweenState::Running
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// 是否为活跃状态
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

impl<V> fmt::Debug for Tween<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tween")
            .field("state", &self.state)
            .field("duration", &self.duration)
            .field("delay", &self.delay)
            .field("elapsed", &self.elapsed)
            .field("easing", &self.easing)
            .field("progress", &self.progress)
            .field("has_target", &self.target.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liveness::LifeGuard;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// 记录 setter 输出的测试补间
    fn recorded(duration: f32) -> (TweenBuilder<f32>, Rc<RefCell<Vec<f32>>>) {
        (
            Tween::builder(0.0, 1.0, duration),
            Rc::new(RefCell::new(Vec::new())),
        )
    }

    fn sink(log: &Rc<RefCell<Vec<f32>>>) -> impl FnMut(f32) + 'static {
        let log = log.clone();
        move |v| log.borrow_mut().push(v)
    }

    #[test]
    fn test_tween_creation() {
        let (builder, log) = recorded(1.0);
        let tween = builder.build(sink(&log)).unwrap();
        assert_eq!(tween.state(), TweenState::Running);
        assert_eq!(tween.progress(), 0.0);
        assert_eq!(*tween.from(), 0.0);
        assert_eq!(*tween.to(), 1.0);
        assert!(tween.current_value().is_none());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_tween_update() {
        let (builder, log) = recorded(1.0);
        let mut tween = builder.build(sink(&log)).unwrap();

        // 进行中
        assert!(tween.advance(0.5));
        assert_eq!(tween.progress(), 0.5);
        assert_eq!(tween.current_value(), Some(&0.5));

        // 完成
        assert!(!tween.advance(0.6));
        assert_eq!(tween.state(), TweenState::Completed);
        assert_eq!(tween.progress(), 1.0);
        assert_eq!(*log.borrow(), vec![0.5, 1.0]);

        // 终态下继续推进无效果
        assert!(!tween.advance(1.0));
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_invalid_parameters() {
        let err = Tween::new(0.0_f32, 1.0, -1.0, |_| {}).unwrap_err();
        assert_eq!(
            err,
            TweenError::InvalidParameter {
                param: "duration",
                value: -1.0
            }
        );

        let err = Tween::builder(0.0_f32, 1.0, 1.0)
            .delay(-0.1)
            .build(|_| {})
            .unwrap_err();
        assert!(matches!(
            err,
            TweenError::InvalidParameter { param: "delay", .. }
        ));

        assert!(Tween::new(0.0_f32, 1.0, f32::NAN, |_| {}).is_err());
        assert!(Tween::new(0.0_f32, 1.0, f32::INFINITY, |_| {}).is_err());
    }

    #[test]
    fn test_unknown_easing_fails_at_build() {
        let err = Tween::builder(0.0_f32, 1.0, 1.0)
            .easing_named("ease_sideways")
            .build(|_| {})
            .unwrap_err();
        assert_eq!(
            err,
            TweenError::UnknownEasing {
                name: "ease_sideways".to_string()
            }
        );

        let tween = Tween::builder(0.0_f32, 1.0, 1.0)
            .easing_named("EaseOutQuad")
            .build(|_| {})
            .unwrap();
        assert_eq!(tween.easing(), EasingFunction::EaseOutQuad);
    }

    #[test]
    fn test_zero_duration() {
        let (builder, log) = recorded(0.0);
        let mut tween = builder.build(sink(&log)).unwrap();

        // dt = 0 也会立即完成
        assert!(!tween.advance(0.0));
        assert_eq!(tween.state(), TweenState::Completed);
        assert_eq!(*log.borrow(), vec![1.0]);
    }

    #[test]
    fn test_tween_with_delay() {
        let (builder, log) = recorded(1.0);
        let mut tween = builder.delay(0.5).build(sink(&log)).unwrap();
        assert_eq!(tween.state(), TweenState::Pending);
        assert_eq!(tween.elapsed(), -0.5);

        // 延迟期间
        assert!(tween.advance(0.25));
        assert_eq!(tween.state(), TweenState::Pending);
        assert!(log.borrow().is_empty());

        // 延迟结束，输出起点
        assert!(tween.advance(0.5));
        assert_eq!(tween.state(), TweenState::Running);
        assert_eq!(*log.borrow(), vec![0.0]);

        // 后续帧把越过延迟的时间也算上
        assert!(tween.advance(0.25));
        assert_eq!(tween.current_value(), Some(&0.5));
    }

    #[test]
    fn test_delay_with_zero_duration() {
        let (builder, log) = recorded(0.0);
        let mut tween = builder.delay(0.5).build(sink(&log)).unwrap();

        assert!(tween.advance(0.25));
        assert!(log.borrow().is_empty());
        assert!(!tween.advance(0.25));
        assert_eq!(*log.borrow(), vec![1.0]);
    }

    #[test]
    fn test_large_step_through_delay_completes() {
        let (builder, log) = recorded(0.5);
        let mut tween = builder.delay(1.0).build(sink(&log)).unwrap();

        // 一帧同时越过延迟和时长
        assert!(!tween.advance(2.0));
        assert_eq!(tween.state(), TweenState::Completed);
        assert_eq!(*log.borrow(), vec![1.0]);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (builder, log) = recorded(1.0);
        let completed = Rc::new(Cell::new(0));
        let counter = completed.clone();
        let mut tween = builder
            .on_complete(move || counter.set(counter.get() + 1))
            .build(sink(&log))
            .unwrap();

        tween.advance(0.25);
        tween.stop();
        tween.stop();
        assert_eq!(tween.state(), TweenState::Stopped);

        tween.advance(5.0);
        tween.finish();
        tween.reverse();
        assert_eq!(*log.borrow(), vec![0.25]);
        assert_eq!(completed.get(), 0);
    }

    #[test]
    fn test_on_complete_once() {
        let (builder, log) = recorded(0.5);
        let completed = Rc::new(Cell::new(0));
        let counter = completed.clone();
        let mut tween = builder
            .on_complete(move || counter.set(counter.get() + 1))
            .build(sink(&log))
            .unwrap();

        for _ in 0..10 {
            tween.advance(0.2);
        }
        assert_eq!(completed.get(), 1);
        assert_eq!(log.borrow().last(), Some(&1.0));
    }

    #[test]
    fn test_finish() {
        let (builder, log) = recorded(1.0);
        let completed = Rc::new(Cell::new(false));
        let flag = completed.clone();
        let mut tween = builder
            .on_complete(move || flag.set(true))
            .build(sink(&log))
            .unwrap();

        tween.advance(0.1);
        tween.finish();
        assert_eq!(tween.state(), TweenState::Completed);
        assert_eq!(log.borrow().last(), Some(&1.0));
        assert!(completed.get());
    }

    #[test]
    fn test_reverse_running() {
        let (builder, log) = recorded(1.0);
        let mut tween = builder.build(sink(&log)).unwrap();

        tween.advance(0.5);
        tween.reverse();
        assert_eq!(*tween.from(), 0.5);
        assert_eq!(*tween.to(), 0.0);
        assert_eq!(tween.progress(), 0.0);

        tween.advance(0.5);
        assert_eq!(tween.current_value(), Some(&0.25));
        tween.advance(0.5);
        assert_eq!(tween.state(), TweenState::Completed);
        assert_eq!(*log.borrow(), vec![0.5, 0.25, 0.0]);
    }

    #[test]
    fn test_reverse_pending_swaps() {
        let (builder, log) = recorded(1.0);
        let mut tween = builder.delay(0.5).build(sink(&log)).unwrap();

        tween.reverse();
        assert_eq!(*tween.from(), 1.0);
        assert_eq!(*tween.to(), 0.0);
        assert_eq!(tween.state(), TweenState::Pending);

        tween.advance(0.5);
        assert_eq!(*log.borrow(), vec![1.0]);
    }

    #[test]
    fn test_reverse_before_first_advance_swaps() {
        let (builder, log) = recorded(1.0);
        let mut tween = builder.build(sink(&log)).unwrap();
        assert_eq!(tween.state(), TweenState::Running);

        // 无延迟补间构造后即为 Running，但还没有输出过值
        tween.reverse();
        assert_eq!(*tween.from(), 1.0);
        assert_eq!(*tween.to(), 0.0);

        tween.advance(0.5);
        assert_eq!(tween.current_value(), Some(&0.5));
        tween.advance(0.6);
        assert_eq!(tween.state(), TweenState::Completed);
        assert_eq!(*log.borrow(), vec![0.5, 0.0]);
    }

    #[test]
    fn test_reverse_completed_is_noop() {
        let (builder, log) = recorded(0.5);
        let mut tween = builder.build(sink(&log)).unwrap();
        tween.advance(1.0);
        tween.reverse();
        assert_eq!(*tween.from(), 0.0);
        assert_eq!(*tween.to(), 1.0);
        assert_eq!(tween.state(), TweenState::Completed);
    }

    #[test]
    fn test_dead_target_stops_silently() {
        let (builder, log) = recorded(1.0);
        let guard = LifeGuard::new();
        let completed = Rc::new(Cell::new(false));
        let flag = completed.clone();
        let mut tween = builder
            .target(guard.token())
            .on_complete(move || flag.set(true))
            .build(sink(&log))
            .unwrap();

        tween.advance(0.5);
        drop(guard);

        assert!(!tween.advance(1.0));
        assert_eq!(tween.state(), TweenState::Stopped);
        assert_eq!(*log.borrow(), vec![0.5]);
        assert!(!completed.get());
    }

    #[test]
    fn test_overshoot_easing_passes_through() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut tween = Tween::builder(0.0_f32, 10.0, 1.0)
            .easing(EasingFunction::EaseOutBack)
            .build(sink(&log))
            .unwrap();

        tween.advance(0.8);
        // 回弹曲线在 0.8 处越过终点
        assert!(*tween.current_value().unwrap() > 10.0);
        assert!(tween.progress() <= 1.0);

        tween.advance(0.2);
        assert_eq!(tween.current_value(), Some(&10.0));
    }

    #[test]
    fn test_negative_dt_ignored() {
        let (builder, log) = recorded(1.0);
        let mut tween = builder.build(sink(&log)).unwrap();
        tween.advance(0.5);
        tween.advance(-0.3);
        tween.advance(f32::NAN);
        assert_eq!(tween.elapsed(), 0.5);
        assert_eq!(*log.borrow(), vec![0.5, 0.5, 0.5]);
    }
}
