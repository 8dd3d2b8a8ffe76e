//! # Tracker 模块
//!
//! 优先级仲裁：多个调用方各自登记"想要的值 + 优先级"，
//! 追踪器始终把优先级最高的登记项视为生效项，并在生效项变化时通知监听者。
//!
//! 用于仲裁全局共享资源，例如光标样式、时间缩放、当前启用的输入映射。
//! 每个资源持有自己的追踪器实例，按需传给各个子系统。
//!
//! ## 规则
//!
//! - 每个调用方同时最多一个登记项，重复登记返回
//!   [`TrackerError::DuplicateRegistration`]，状态不变
//! - 优先级相同时，**最近登记**的生效；移除后重新登记算作新的登记
//! - 移除未登记的调用方不是错误
//! - 生效项变化（包括变为"无"）时同步通知，载荷是新的生效项或 `None`
//!
//! ## 重入
//!
//! 通知前会对监听者列表做快照，监听者回调里可以再调用同一追踪器的
//! `add` / `remove` / `subscribe`。回调中引起的变化进入队列，
//! 在当前这一轮通知结束后按顺序继续派发。

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::error::TrackerError;

/// 调用方标识
///
/// 作为登记键使用，比较的是标识本身而不是调用方对象。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallerId(u64);

impl CallerId {
    /// 使用指定值创建标识
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// 分配一个进程内唯一的新标识
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1 << 32);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallerId({})", self.0)
    }
}

/// 登记项
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedItem<T, K = CallerId> {
    /// 期望的值
    pub value: T,
    /// 优先级（越大越优先）
    pub priority: i32,
    /// 登记者
    pub caller: K,
}

/// 监听者 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T, K> = Rc<RefCell<Box<dyn FnMut(Option<&TrackedItem<T, K>>)>>>;

struct Entry<T, K> {
    item: TrackedItem<T, K>,
    /// 登记序号，用于同优先级时的先后判断
    seq: u64,
}

struct Inner<T, K> {
    entries: Vec<Entry<T, K>>,
    next_seq: u64,
    /// 当前生效项的登记序号
    active_seq: Option<u64>,
    listeners: Vec<(ListenerId, Listener<T, K>)>,
    next_listener: u64,
    /// 待派发的通知
    pending: VecDeque<Option<TrackedItem<T, K>>>,
    dispatching: bool,
}

impl<T: Clone, K: Clone> Inner<T, K> {
    fn best(&self) -> Option<&Entry<T, K>> {
        self.entries
            .iter()
            .max_by_key(|entry| (entry.item.priority, entry.seq))
    }

    /// 重新计算生效项，变化时加入通知队列
    fn refresh(&mut self) -> bool {
        let best = self.best();
        let best_seq = best.map(|entry| entry.seq);
        if best_seq == self.active_seq {
            return false;
        }
        let payload = best.map(|entry| entry.item.clone());
        self.active_seq = best_seq;
        self.pending.push_back(payload);
        true
    }
}

/// 优先级追踪器
///
/// 内部共享，`clone()` 得到的是同一个追踪器的另一个句柄。
/// 基于 `Rc`，只能在创建它的线程上使用。
pub struct PriorityTracker<T, K = CallerId> {
    inner: Rc<RefCell<Inner<T, K>>>,
}

impl<T, K> Clone for PriorityTracker<T, K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static, K: Clone + PartialEq + fmt::Debug + 'static> Default
    for PriorityTracker<T, K>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K> fmt::Debug for PriorityTracker<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("PriorityTracker")
                .field("entries", &inner.entries.len())
                .field("listeners", &inner.listeners.len())
                .field("active_seq", &inner.active_seq)
                .finish(),
            Err(_) => f.write_str("PriorityTracker { <borrowed> }"),
        }
    }
}

/// 派发期间出现 panic 时也要复位派发标记
struct DispatchGuard<'a, T, K> {
    inner: &'a RefCell<Inner<T, K>>,
}

impl<T, K> Drop for DispatchGuard<'_, T, K> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.dispatching = false;
        }
    }
}

impl<T: Clone + 'static, K: Clone + PartialEq + fmt::Debug + 'static> PriorityTracker<T, K> {
    /// 创建空的追踪器
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                entries: Vec::new(),
                next_seq: 0,
                active_seq: None,
                listeners: Vec::new(),
                next_listener: 0,
                pending: VecDeque::new(),
                dispatching: false,
            })),
        }
    }

    /// 登记
    ///
    /// # 错误
    /// 调用方已有登记项时返回 [`TrackerError::DuplicateRegistration`]，
    /// 追踪器状态保持不变。
    pub fn add(&self, value: T, priority: i32, caller: K) -> Result<(), TrackerError> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.entries.iter().any(|entry| entry.item.caller == caller) {
                warn!(caller = ?caller, priority, "重复登记被拒绝");
                return Err(TrackerError::DuplicateRegistration {
                    caller: format!("{caller:?}"),
                });
            }

            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.entries.push(Entry {
                item: TrackedItem {
                    value,
                    priority,
                    caller,
                },
                seq,
            });
            if inner.refresh() {
                debug!(priority, "生效项变化（登记）");
            }
        }
        self.flush();
        Ok(())
    }

    /// 移除登记
    ///
    /// 调用方没有登记项时什么也不做。
    ///
    /// # 返回
    /// 被移除的登记项
    pub fn remove(&self, caller: &K) -> Option<TrackedItem<T, K>> {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let index = inner
                .entries
                .iter()
                .position(|entry| entry.item.caller == *caller)?;
            let removed = inner.entries.remove(index).item;
            if inner.refresh() {
                debug!(caller = ?caller, "生效项变化（移除）");
            }
            removed
        };
        self.flush();
        Some(removed)
    }

    /// 调用方是否已登记
    pub fn has_caller(&self, caller: &K) -> bool {
        self.inner
            .borrow()
            .entries
            .iter()
            .any(|entry| entry.item.caller == *caller)
    }

    /// 当前生效项
    pub fn active(&self) -> Option<TrackedItem<T, K>> {
        self.inner.borrow().best().map(|entry| entry.item.clone())
    }

    /// 当前生效的值
    pub fn active_value(&self) -> Option<T> {
        self.inner.borrow().best().map(|entry| entry.item.value.clone())
    }

    /// 当前生效的值，没有登记项时返回 `default`
    pub fn value_or(&self, default: T) -> T {
        self.active_value().unwrap_or(default)
    }

    /// 按生效顺序列出所有登记项（第一个即生效项）
    pub fn items(&self) -> Vec<TrackedItem<T, K>> {
        let inner = self.inner.borrow();
        let mut entries: Vec<&Entry<T, K>> = inner.entries.iter().collect();
        entries.sort_by(|a, b| (b.item.priority, b.seq).cmp(&(a.item.priority, a.seq)));
        entries.into_iter().map(|entry| entry.item.clone()).collect()
    }

    /// 登记项数量
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// 订阅生效项变化
    pub fn subscribe(
        &self,
        listener: impl FnMut(Option<&TrackedItem<T, K>>) + 'static,
    ) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        let callback: Box<dyn FnMut(Option<&TrackedItem<T, K>>)> = Box::new(listener);
        inner.listeners.push((id, Rc::new(RefCell::new(callback))));
        id
    }

    /// 取消订阅，返回是否找到
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _)| *lid != id);
        inner.listeners.len() != before
    }

    /// 强制派发一次当前状态
    ///
    /// 监听者挂好之后调用一次，让下游拿到初始基线（可能是 `None`）。
    pub fn initialize(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            let payload = inner.best().map(|entry| entry.item.clone());
            inner.pending.push_back(payload);
        }
        self.flush();
    }

    /// 派发队列中的通知
    ///
    /// 已在派发中时直接返回，由外层循环继续处理新入队的通知。
    fn flush(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.dispatching {
                return;
            }
            inner.dispatching = true;
        }
        let _guard = DispatchGuard {
            inner: self.inner.as_ref(),
        };

        loop {
            let (payload, listeners) = {
                let mut inner = self.inner.borrow_mut();
                match inner.pending.pop_front() {
                    Some(payload) => (payload, inner.listeners.clone()),
                    None => break,
                }
            };

            for (id, listener) in listeners {
                // 本轮派发中已被取消订阅的监听者不再收到通知
                let subscribed = self
                    .inner
                    .borrow()
                    .listeners
                    .iter()
                    .any(|(lid, _)| *lid == id);
                if subscribed {
                    let mut callback = listener.borrow_mut();
                    (*callback)(payload.as_ref());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    type Log = Rc<RefCell<Vec<Option<&'static str>>>>;

    fn watch(tracker: &PriorityTracker<&'static str>) -> Log {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        tracker.subscribe(move |item| sink.borrow_mut().push(item.map(|i| i.value)));
        log
    }

    fn render(log: &Log) -> String {
        log.borrow()
            .iter()
            .map(|v| v.unwrap_or("none"))
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    #[test]
    fn test_empty_tracker() {
        let tracker: PriorityTracker<f32> = PriorityTracker::new();
        assert!(tracker.is_empty());
        assert!(tracker.active().is_none());
        assert_eq!(tracker.value_or(1.0), 1.0);
    }

    #[test]
    fn test_highest_priority_wins() {
        let tracker = PriorityTracker::new();
        let a = CallerId::new(1);
        let b = CallerId::new(2);

        tracker.add("low", 1, a).unwrap();
        tracker.add("high", 10, b).unwrap();
        assert_eq!(tracker.active_value(), Some("high"));
        assert_eq!(tracker.active().unwrap().caller, b);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_lower_priority_add_does_not_notify() {
        let tracker = PriorityTracker::new();
        let log = watch(&tracker);

        tracker.add("menu", 10, CallerId::new(1)).unwrap();
        tracker.add("game", 0, CallerId::new(2)).unwrap();
        assert_eq!(render(&log), "menu");

        // 移除非生效项也不通知
        tracker.remove(&CallerId::new(2));
        assert_eq!(render(&log), "menu");
    }

    #[test]
    fn test_tie_most_recent_wins() {
        let tracker = PriorityTracker::new();
        let a = CallerId::new(1);
        let b = CallerId::new(2);

        tracker.add("a", 5, a).unwrap();
        tracker.add("b", 5, b).unwrap();
        assert_eq!(tracker.active_value(), Some("b"));

        // 重新登记算作新的登记
        tracker.remove(&a);
        tracker.add("a", 5, a).unwrap();
        assert_eq!(tracker.active_value(), Some("a"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let tracker = PriorityTracker::new();
        let log = watch(&tracker);
        let a = CallerId::new(7);

        tracker.add("first", 1, a).unwrap();
        let err = tracker.add("second", 99, a).unwrap_err();
        assert_eq!(
            err,
            TrackerError::DuplicateRegistration {
                caller: "CallerId(7)".to_string()
            }
        );

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.active_value(), Some("first"));
        assert_eq!(render(&log), "first");
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let tracker: PriorityTracker<&str> = PriorityTracker::new();
        let log = watch(&tracker);
        assert!(tracker.remove(&CallerId::new(42)).is_none());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_initialize_sends_baseline() {
        let tracker = PriorityTracker::new();
        let log = watch(&tracker);

        tracker.initialize();
        assert_eq!(render(&log), "none");

        tracker.add("cursor", 1, CallerId::new(1)).unwrap();
        tracker.initialize();
        assert_eq!(render(&log), "none -> cursor -> cursor");
    }

    #[test]
    fn test_items_in_precedence_order() {
        let tracker = PriorityTracker::new();
        tracker.add("a", 1, CallerId::new(1)).unwrap();
        tracker.add("b", 3, CallerId::new(2)).unwrap();
        tracker.add("c", 3, CallerId::new(3)).unwrap();

        let values: Vec<&str> = tracker.items().into_iter().map(|i| i.value).collect();
        assert_eq!(values, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_clone_shares_state() {
        let tracker = PriorityTracker::new();
        let handle = tracker.clone();
        handle.add(0.5_f32, 1, CallerId::new(1)).unwrap();
        assert_eq!(tracker.active_value(), Some(0.5));
        assert!(tracker.has_caller(&CallerId::new(1)));
    }

    #[test]
    fn test_unsubscribe() {
        let tracker = PriorityTracker::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let id = tracker.subscribe(move |_| counter.set(counter.get() + 1));

        tracker.add("x", 1, CallerId::new(1)).unwrap();
        assert!(tracker.unsubscribe(id));
        assert!(!tracker.unsubscribe(id));
        tracker.remove(&CallerId::new(1));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_reentrant_listener() {
        let tracker = PriorityTracker::new();
        let log = watch(&tracker);

        // 当 "pause" 生效时，监听者顺手撤掉它，模拟一次性请求
        let handle = tracker.clone();
        tracker.subscribe(move |item| {
            if item.map(|i| i.value) == Some("pause") {
                handle.remove(&CallerId::new(2));
            }
        });

        tracker.add("normal", 1, CallerId::new(1)).unwrap();
        tracker.add("pause", 5, CallerId::new(2)).unwrap();

        assert_eq!(render(&log), "normal -> pause -> normal");
        assert_eq!(tracker.active_value(), Some("normal"));
        assert!(!tracker.has_caller(&CallerId::new(2)));
    }

    #[test]
    fn test_reentrant_add_and_subscribe_deferred() {
        let tracker = PriorityTracker::new();
        let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

        let record = |tag: &'static str| {
            let log = log.clone();
            move |item: Option<&TrackedItem<&'static str>>| {
                log.borrow_mut()
                    .push(format!("{tag}:{}", item.map_or("none", |i| i.value)));
            }
        };

        tracker.subscribe(record("first"));

        // "normal" 生效时登记更高优先级的 "alert"
        let handle = tracker.clone();
        tracker.subscribe(move |item| {
            if item.map(|i| i.value) == Some("normal") {
                handle.add("alert", 9, CallerId::new(3)).unwrap();
            }
        });

        tracker.subscribe(record("second"));

        // 第一次收到通知时挂上新的监听者
        let handle = tracker.clone();
        let late = record("late");
        let mut pending = Some(late);
        tracker.subscribe(move |_| {
            if let Some(listener) = pending.take() {
                handle.subscribe(listener);
            }
        });

        tracker.add("normal", 1, CallerId::new(1)).unwrap();

        // 本轮的 "normal" 先送完，回调里登记的 "alert" 在下一轮送达；
        // 中途订阅的监听者只收到下一轮
        assert_eq!(
            log.borrow().join(" -> "),
            "first:normal -> second:normal -> first:alert -> second:alert -> late:alert"
        );
        assert_eq!(tracker.active_value(), Some("alert"));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_caller_id_next_unique() {
        let a = CallerId::next();
        let b = CallerId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_custom_key_type() {
        let tracker: PriorityTracker<bool, &'static str> = PriorityTracker::new();
        tracker.add(true, 1, "inventory").unwrap();
        tracker.add(false, 2, "cutscene").unwrap();
        assert_eq!(tracker.active_value(), Some(false));
        assert!(tracker.add(true, 3, "cutscene").is_err());
    }
}
