//! # Lerp 模块
//!
//! 各值类型的插值规则。
//!
//! 插值**不限制** `t`：回弹类缓动会把 `t` 暂时推到 `[0, 1]` 之外，
//! 结果应当随之越过端点。何时停在终点由补间引擎负责。

use crate::value::{Color, Vec2, Vec3, Vec4};

/// 可插值类型
pub trait Lerp: Sized {
    /// `t = 0.0` 返回 `from`，`t = 1.0` 返回 `to`，其余不限制
    fn lerp(from: &Self, to: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        from + (to - from) * t
    }
}

impl Lerp for f64 {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        from + (to - from) * f64::from(t)
    }
}

/// 整数插值：在 f64 上计算后四舍五入（.5 远离零），超出范围时饱和
impl Lerp for i32 {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        let from = f64::from(*from);
        let to = f64::from(*to);
        // `as` 对浮点到整数的转换本身就是饱和的
        (from + (to - from) * f64::from(t)).round() as i32
    }
}

impl Lerp for i64 {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        let from = *from as f64;
        let to = *to as f64;
        (from + (to - from) * f64::from(t)).round() as i64
    }
}

impl Lerp for Vec2 {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        Vec2 {
            x: f32::lerp(&from.x, &to.x, t),
            y: f32::lerp(&from.y, &to.y, t),
        }
    }
}

impl Lerp for Vec3 {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        Vec3 {
            x: f32::lerp(&from.x, &to.x, t),
            y: f32::lerp(&from.y, &to.y, t),
            z: f32::lerp(&from.z, &to.z, t),
        }
    }
}

impl Lerp for Vec4 {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        Vec4 {
            x: f32::lerp(&from.x, &to.x, t),
            y: f32::lerp(&from.y, &to.y, t),
            z: f32::lerp(&from.z, &to.z, t),
            w: f32::lerp(&from.w, &to.w, t),
        }
    }
}

impl Lerp for Color {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        Color {
            r: f32::lerp(&from.r, &to.r, t),
            g: f32::lerp(&from.g, &to.g, t),
            b: f32::lerp(&from.b, &to.b, t),
            a: f32::lerp(&from.a, &to.a, t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_lerp() {
        assert_eq!(f32::lerp(&0.0, &10.0, 0.0), 0.0);
        assert_eq!(f32::lerp(&0.0, &10.0, 0.5), 5.0);
        assert_eq!(f32::lerp(&0.0, &10.0, 1.0), 10.0);
        // 越界不截断
        assert_eq!(f32::lerp(&0.0, &10.0, 1.5), 15.0);
        assert_eq!(f32::lerp(&0.0, &10.0, -0.5), -5.0);
    }

    #[test]
    fn test_int_rounding() {
        // 0.5 远离零
        assert_eq!(i32::lerp(&0, &1, 0.5), 1);
        assert_eq!(i32::lerp(&0, &-1, 0.5), -1);
        assert_eq!(i32::lerp(&0, &10, 0.24), 2);
        assert_eq!(i32::lerp(&0, &10, 0.25), 3);
        assert_eq!(i64::lerp(&100, &200, 0.5), 150);
        // 越界
        assert_eq!(i32::lerp(&0, &10, 1.2), 12);
    }

    #[test]
    fn test_int_saturates() {
        assert_eq!(i32::lerp(&0, &i32::MAX, 2.0), i32::MAX);
        assert_eq!(i32::lerp(&0, &i32::MIN, 2.0), i32::MIN);
    }

    #[test]
    fn test_vec_lerp() {
        let v1 = Vec2::new(0.0, 0.0);
        let v2 = Vec2::new(10.0, 20.0);
        let mid = Vec2::lerp(&v1, &v2, 0.5);
        assert_eq!(mid, Vec2::new(5.0, 10.0));

        let mid = Vec3::lerp(&Vec3::zero(), &Vec3::new(2.0, 4.0, 8.0), 0.25);
        assert_eq!(mid, Vec3::new(0.5, 1.0, 2.0));

        let over = Vec4::lerp(&Vec4::zero(), &Vec4::new(1.0, 1.0, 1.0, 1.0), 1.5);
        assert_eq!(over, Vec4::new(1.5, 1.5, 1.5, 1.5));
    }

    #[test]
    fn test_color_lerp() {
        let mid = Color::lerp(&Color::BLACK, &Color::WHITE.with_alpha(0.0), 0.5);
        assert_eq!(mid, Color::rgba(0.5, 0.5, 0.5, 0.5));
    }
}
