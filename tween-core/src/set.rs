//! # Set 模块
//!
//! 补间集合：替调用方持有一批补间并统一推进。
//!
//! 集合只负责"每帧推进所有存活补间、清理已结束的补间"，
//! 不提供先后编排（序列/并行/错峰），那属于调用方的逻辑。
//!
//! ```rust,ignore
//! let mut set = TweenSet::new();
//! let id = set.add(Tween::new(0.0, 1.0, 0.3, move |v| card.set_alpha(v))?);
//!
//! // 每帧
//! for event in set.advance(dt) {
//!     if event == TweenEvent::Completed(id) { /* ... */ }
//! }
//! ```

use crate::lerp::Lerp;
use crate::tween::{Tween, TweenState};

/// 补间 ID（集合内唯一）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(u64);

impl TweenId {
    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TweenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TweenId({})", self.0)
    }
}

/// 补间结束事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenEvent {
    /// 补间正常完成
    Completed(TweenId),
    /// 补间被停止（手动停止或目标失效）
    Stopped(TweenId),
}

/// 类型擦除后的补间接口
///
/// 让不同值类型的补间可以放进同一个集合。
pub trait Tweening {
    /// 推进，返回是否仍在进行
    fn advance(&mut self, dt: f32) -> bool;

    /// 停止
    fn stop(&mut self);

    /// 跳到终点
    fn finish(&mut self);

    /// 反向播放
    fn reverse(&mut self);

    /// 当前状态
    fn state(&self) -> TweenState;
}

impl<V: Lerp + Clone + 'static> Tweening for Tween<V> {
    fn advance(&mut self, dt: f32) -> bool {
        Tween::advance(self, dt)
    }

    fn stop(&mut self) {
        Tween::stop(self)
    }

    fn finish(&mut self) {
        Tween::finish(self)
    }

    fn reverse(&mut self) {
        Tween::reverse(self)
    }

    fn state(&self) -> TweenState {
        Tween::state(self)
    }
}

/// 补间集合
///
/// 按加入顺序推进，同一帧内先加入的补间先输出。
#[derive(Default)]
pub struct TweenSet {
    /// 补间（按加入顺序）
    tweens: Vec<(TweenId, Box<dyn Tweening>)>,
    /// 下一个补间 ID
    next_id: u64,
}

impl std::fmt::Debug for TweenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TweenSet")
            .field("tweens", &self.tweens.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl TweenSet {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入补间
    pub fn add(&mut self, tween: impl Tweening + 'static) -> TweenId {
        self.next_id += 1;
        let id = TweenId(self.next_id);
        self.tweens.push((id, Box::new(tween)));
        id
    }

    /// 推进所有补间
    ///
    /// 已结束的补间（包括本帧之前被停止的）会被移出集合并产生事件。
    ///
    /// # 返回
    /// 本帧产生的结束事件列表
    pub fn advance(&mut self, dt: f32) -> Vec<TweenEvent> {
        let mut events = Vec::new();

        self.tweens.retain_mut(|(id, tween)| {
            if tween.state().is_active() {
                tween.advance(dt);
            }
            match tween.state() {
                TweenState::Completed => {
                    events.push(TweenEvent::Completed(*id));
                    false
                }
                TweenState::Stopped => {
                    events.push(TweenEvent::Stopped(*id));
                    false
                }
                TweenState::Pending | TweenState::Running => true,
            }
        });

        events
    }

    /// 停止指定补间，返回是否找到
    ///
    /// 补间在下一次 `advance` 时移出集合。
    pub fn stop(&mut self, id: TweenId) -> bool {
        match self.tweens.iter_mut().find(|(tid, _)| *tid == id) {
            Some((_, tween)) => {
                tween.stop();
                true
            }
            None => false,
        }
    }

    /// 反向播放指定补间，返回是否找到
    pub fn reverse(&mut self, id: TweenId) -> bool {
        match self.tweens.iter_mut().find(|(tid, _)| *tid == id) {
            Some((_, tween)) => {
                tween.reverse();
                true
            }
            None => false,
        }
    }

    /// 停止所有补间
    pub fn stop_all(&mut self) {
        for (_, tween) in &mut self.tweens {
            tween.stop();
        }
    }

    /// 所有补间立即跳到终点
    pub fn finish_all(&mut self) {
        for (_, tween) in &mut self.tweens {
            tween.finish();
        }
    }

    /// 集合中是否有该补间
    pub fn contains(&self, id: TweenId) -> bool {
        self.tweens.iter().any(|(tid, _)| *tid == id)
    }

    /// 指定补间的状态
    pub fn state(&self, id: TweenId) -> Option<TweenState> {
        self.tweens
            .iter()
            .find(|(tid, _)| *tid == id)
            .map(|(_, tween)| tween.state())
    }

    /// 集合中的补间数量（含尚未清理的已结束补间）
    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    /// 活跃补间数量
    pub fn active_count(&self) -> usize {
        self.tweens
            .iter()
            .filter(|(_, tween)| tween.state().is_active())
            .count()
    }

    /// 直接丢弃所有补间（不输出任何值）
    pub fn clear(&mut self) {
        self.tweens.clear();
    }
}
