//! 缓动曲线采样

use tween_core::EasingFunction;

/// 在 `[0, 1]` 上等距采样缓动曲线，包含两个端点
///
/// `samples` 为区间数，至少为 1。
pub fn sample(easing: EasingFunction, samples: usize) -> Vec<(f32, f32)> {
    let samples = samples.max(1);
    (0..=samples)
        .map(|i| {
            let t = i as f32 / samples as f32;
            (t, easing.apply(t))
        })
        .collect()
}

/// 渲染为每行 `t value`
pub fn render(points: &[(f32, f32)], precision: usize) -> String {
    points
        .iter()
        .map(|(t, v)| format!("{:.p$} {:.p$}", t, v, p = precision))
        .collect::<Vec<_>>()
        .join("\n")
}
