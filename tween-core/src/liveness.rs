//! # Liveness 模块
//!
//! 补间目标的存活检查。
//!
//! 补间可以绑定一个"目标"，只用来判断拥有者是否已经销毁，不持有强引用。
//! 每次 `advance` 前都会询问目标是否存活；目标失效时补间静默停止，
//! 既不调用 setter 也不触发完成回调。
//!
//! ## 用法
//!
//! ```rust,ignore
//! let guard = LifeGuard::new();          // 拥有者持有
//! let tween = Tween::builder(0.0, 1.0, 0.3)
//!     .target(guard.token())              // 补间持有弱令牌
//!     .build(move |v| card.set_alpha(v))?;
//! drop(guard);                            // 拥有者销毁 → 补间下一帧自动停止
//! ```

use std::rc::{Rc, Weak};

/// 存活检查能力
pub trait Liveness {
    /// 目标是否仍然有效
    fn is_alive(&self) -> bool;
}

impl<T: ?Sized> Liveness for Weak<T> {
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

impl<T: ?Sized> Liveness for std::sync::Weak<T> {
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

/// 以闭包作为存活探针
#[derive(Debug, Clone, Copy)]
pub struct Probe<F>(pub F);

impl<F: Fn() -> bool> Liveness for Probe<F> {
    fn is_alive(&self) -> bool {
        (self.0)()
    }
}

/// 生命周期守卫
///
/// 由拥有者持有。守卫被丢弃或调用 [`LifeGuard::revoke`] 后，
/// 由它发出的所有 [`LifeToken`] 都会失效。
#[derive(Debug)]
pub struct LifeGuard {
    alive: Option<Rc<()>>,
}

impl Default for LifeGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl LifeGuard {
    /// 创建新的守卫
    pub fn new() -> Self {
        Self {
            alive: Some(Rc::new(())),
        }
    }

    /// 发出一个弱令牌
    pub fn token(&self) -> LifeToken {
        LifeToken {
            alive: self.alive.as_ref().map(Rc::downgrade).unwrap_or_default(),
        }
    }

    /// 提前使所有令牌失效（守卫本身仍可继续持有）
    pub fn revoke(&mut self) {
        self.alive = None;
    }

    /// 守卫是否仍然有效
    pub fn is_active(&self) -> bool {
        self.alive.is_some()
    }
}

/// 生命周期令牌（弱引用，不延长拥有者寿命）
#[derive(Debug, Clone)]
pub struct LifeToken {
    alive: Weak<()>,
}

impl Liveness for LifeToken {
    fn is_alive(&self) -> bool {
        self.alive.strong_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_drop_kills_tokens() {
        let guard = LifeGuard::new();
        let t1 = guard.token();
        let t2 = t1.clone();
        assert!(t1.is_alive());
        assert!(t2.is_alive());

        drop(guard);
        assert!(!t1.is_alive());
        assert!(!t2.is_alive());
    }

    #[test]
    fn test_guard_revoke() {
        let mut guard = LifeGuard::new();
        let token = guard.token();
        guard.revoke();
        assert!(!guard.is_active());
        assert!(!token.is_alive());

        // 撤销后新发出的令牌一出生就失效
        assert!(!guard.token().is_alive());
    }

    #[test]
    fn test_weak_liveness() {
        let owner = Rc::new(String::from("board"));
        let weak = Rc::downgrade(&owner);
        assert!(weak.is_alive());
        drop(owner);
        assert!(!weak.is_alive());

        let owner = std::sync::Arc::new(1_u32);
        let weak = std::sync::Arc::downgrade(&owner);
        assert!(Liveness::is_alive(&weak));
    }

    #[test]
    fn test_closure_liveness() {
        use std::cell::Cell;

        let flag = Rc::new(Cell::new(true));
        let probe = {
            let flag = flag.clone();
            Probe(move || flag.get())
        };
        assert!(probe.is_alive());
        flag.set(false);
        assert!(!probe.is_alive());
    }
}
