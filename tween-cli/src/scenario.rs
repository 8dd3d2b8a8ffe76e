//! # Scenario 模块
//!
//! 场景文件：描述一组补间与时间缩放事件，由 [`Player`] 逐帧回放并
//! 记录每一帧的输出。
//!
//! ## 文件格式
//!
//! ```json
//! {
//!   "fps": 60,
//!   "duration": 2.0,
//!   "tweens": [
//!     { "name": "alpha", "kind": "scalar", "from": 0, "to": 1,
//!       "duration": 0.5, "easing": "ease_out_quad", "delay": 0.1,
//!       "reverse_at": 0.4, "stop_at": 1.5 }
//!   ],
//!   "time_scale": [
//!     { "at": 0.5, "caller": 1, "priority": 10, "value": 0.5 },
//!     { "at": 1.0, "remove": 1 }
//!   ]
//! }
//! ```
//!
//! 所有时间点（`at`、`reverse_at`、`stop_at`）都按真实时间计算，
//! 不受时间缩放影响；时间缩放只作用于传给补间的帧间隔。

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use tween_core::{
    CallerId, Color, CoreError, CoreResult, EasingFunction, Lerp, PriorityTracker, Tween,
    TweenEvent, TweenId, TweenSet, Vec2, Vec3,
};

/// 未被任何事件影响时的时间缩放
pub const DEFAULT_TIME_SCALE: f32 = 1.0;

/// 场景错误
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// 读取失败
    #[error("无法读取场景文件 {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 解析失败
    #[error("场景文件解析失败 {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// 场景内容不合法
    #[error("场景无效: {0}")]
    Invalid(String),

    /// 补间取值与类型不符
    #[error("补间 '{name}' 的 {field} 无法解析为 {kind}: {source}")]
    Value {
        name: String,
        field: &'static str,
        kind: ValueKind,
        #[source]
        source: serde_json::Error,
    },

    /// 补间构造失败或时间缩放事件冲突
    #[error("{context}: {source}")]
    Core {
        context: String,
        #[source]
        source: CoreError,
    },
}

/// 补间值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// 单个浮点数
    #[default]
    Scalar,
    /// 整数
    Int,
    /// 二维向量
    Vec2,
    /// 三维向量
    Vec3,
    /// 颜色（RGBA）
    Color,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Scalar => "scalar",
            ValueKind::Int => "int",
            ValueKind::Vec2 => "vec2",
            ValueKind::Vec3 => "vec3",
            ValueKind::Color => "color",
        };
        f.write_str(name)
    }
}

/// 单个补间描述
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweenSpec {
    pub name: String,

    #[serde(default)]
    pub kind: ValueKind,

    /// 起始值，形状由 `kind` 决定
    pub from: serde_json::Value,

    /// 目标值，形状由 `kind` 决定
    pub to: serde_json::Value,

    pub duration: f32,

    /// 缓动名称，缺省时使用配置中的默认缓动
    #[serde(default)]
    pub easing: Option<String>,

    #[serde(default)]
    pub delay: f32,

    /// 在该时间点反向
    #[serde(default)]
    pub reverse_at: Option<f32>,

    /// 在该时间点停止
    #[serde(default)]
    pub stop_at: Option<f32>,
}

/// 时间缩放事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeScaleEvent {
    /// 登记一个时间缩放请求
    Add {
        at: f32,
        caller: u64,
        priority: i32,
        value: f32,
    },
    /// 撤销某个调用方的请求
    Remove { at: f32, remove: u64 },
}

impl TimeScaleEvent {
    /// 事件发生的时间点
    pub fn at(&self) -> f32 {
        match self {
            TimeScaleEvent::Add { at, .. } | TimeScaleEvent::Remove { at, .. } => *at,
        }
    }
}

/// 场景
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// 帧率，缺省时使用配置值
    #[serde(default)]
    pub fps: Option<u32>,

    /// 回放总时长（秒）
    pub duration: f32,

    #[serde(default)]
    pub tweens: Vec<TweenSpec>,

    #[serde(default)]
    pub time_scale: Vec<TimeScaleEvent>,
}

impl Scenario {
    /// 从文件加载场景
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ScenarioError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 从 JSON 文本解析场景
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// 校验场景
    ///
    /// 除了时间字段本身的合法性，还会实际构造每个补间（检查取值形状与
    /// 缓动名称），并按时间顺序模拟一遍时间缩放事件（检查重复登记）。
    pub fn validate(&self, default_easing: EasingFunction) -> Result<(), ScenarioError> {
        check_time("duration", self.duration)?;

        if self.fps == Some(0) {
            return Err(ScenarioError::Invalid("fps 必须大于 0".to_string()));
        }

        let mut names = HashSet::new();
        for spec in &self.tweens {
            if spec.name.is_empty() {
                return Err(ScenarioError::Invalid("补间名称不能为空".to_string()));
            }
            if !names.insert(spec.name.as_str()) {
                return Err(ScenarioError::Invalid(format!(
                    "补间名称重复: {}",
                    spec.name
                )));
            }
            if let Some(at) = spec.reverse_at {
                check_time("reverse_at", at)?;
            }
            if let Some(at) = spec.stop_at {
                check_time("stop_at", at)?;
            }
            // 构造后立即丢弃，只关心能否构造
            build_track(spec, default_easing, &Rc::new(RefCell::new(Vec::new())))?;
        }

        // 在一个独立的追踪器上预演全部事件
        let rehearsal: PriorityTracker<f32> = PriorityTracker::new();
        for event in sorted_events(&self.time_scale) {
            check_time("at", event.at())?;
            if let TimeScaleEvent::Add { value, .. } = event
                && (!value.is_finite() || *value < 0.0)
            {
                return Err(ScenarioError::Invalid(format!(
                    "时间缩放必须是非负有限值，当前为 {value}"
                )));
            }
            apply_event(&rehearsal, event).map_err(|source| ScenarioError::Core {
                context: format!("时间缩放事件无效 (at = {})", event.at()),
                source,
            })?;
        }

        Ok(())
    }
}

fn check_time(field: &str, value: f32) -> Result<(), ScenarioError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ScenarioError::Invalid(format!(
            "{field} 必须是非负有限值，当前为 {value}"
        )))
    }
}

/// 把一个时间缩放事件应用到追踪器
fn apply_event(tracker: &PriorityTracker<f32>, event: &TimeScaleEvent) -> CoreResult<()> {
    match *event {
        TimeScaleEvent::Add {
            caller,
            priority,
            value,
            ..
        } => tracker.add(value, priority, CallerId::new(caller))?,
        TimeScaleEvent::Remove { remove, .. } => {
            tracker.remove(&CallerId::new(remove));
        }
    }
    Ok(())
}

/// 按时间排序事件，同一时间点保持文件中的先后顺序
fn sorted_events(events: &[TimeScaleEvent]) -> Vec<&TimeScaleEvent> {
    let mut sorted: Vec<&TimeScaleEvent> = events.iter().collect();
    sorted.sort_by(|a, b| a.at().total_cmp(&b.at()));
    sorted
}

//=============================================================================
// 取值与输出
//=============================================================================

/// 可写入轨迹的值
pub trait TraceValue {
    /// 按指定小数位数格式化
    fn render(&self, precision: usize) -> String;
}

impl TraceValue for f32 {
    fn render(&self, precision: usize) -> String {
        format!("{:.p$}", self, p = precision)
    }
}

impl TraceValue for i64 {
    fn render(&self, _precision: usize) -> String {
        self.to_string()
    }
}

impl TraceValue for Vec2 {
    fn render(&self, precision: usize) -> String {
        format!("({:.p$}, {:.p$})", self.x, self.y, p = precision)
    }
}

impl TraceValue for Vec3 {
    fn render(&self, precision: usize) -> String {
        format!(
            "({:.p$}, {:.p$}, {:.p$})",
            self.x,
            self.y,
            self.z,
            p = precision
        )
    }
}

impl TraceValue for Color {
    fn render(&self, precision: usize) -> String {
        format!(
            "rgba({:.p$}, {:.p$}, {:.p$}, {:.p$})",
            self.r,
            self.g,
            self.b,
            self.a,
            p = precision
        )
    }
}

/// 补间输出：(补间序号, 格式化后的值)
type Sink = Rc<RefCell<Vec<(usize, String)>>>;

/// 轨迹中的一条记录
#[derive(Debug, Clone, PartialEq)]
pub struct TraceLine {
    /// 帧号（从 1 开始）
    pub frame: u64,
    /// 真实时间（秒）
    pub time: f32,
    /// 补间名称，时间缩放变化记为 `time_scale`
    pub name: String,
    /// 输出值或事件（`completed` / `stopped`）
    pub value: String,
}

impl TraceLine {
    /// 渲染为 `frame time name value`
    pub fn render(&self, precision: usize) -> String {
        format!(
            "{} {:.p$} {} {}",
            self.frame,
            self.time,
            self.name,
            self.value,
            p = precision
        )
    }
}

fn parse_value<V: serde::de::DeserializeOwned>(
    spec: &TweenSpec,
    field: &'static str,
    raw: &serde_json::Value,
) -> Result<V, ScenarioError> {
    serde_json::from_value(raw.clone()).map_err(|source| ScenarioError::Value {
        name: spec.name.clone(),
        field,
        kind: spec.kind,
        source,
    })
}

/// 按类型构造补间，输出写入 `sink`
///
/// `index` 是补间在场景中的序号，用于把输出归属回名称。
fn build_typed<V>(
    spec: &TweenSpec,
    index: usize,
    easing: EasingFunction,
    precision: usize,
    sink: &Sink,
) -> Result<Tween<V>, ScenarioError>
where
    V: Lerp + Clone + TraceValue + serde::de::DeserializeOwned + 'static,
{
    let from: V = parse_value(spec, "from", &spec.from)?;
    let to: V = parse_value(spec, "to", &spec.to)?;

    let sink = sink.clone();
    make_tween(spec, from, to, easing, move |value: V| {
        sink.borrow_mut().push((index, value.render(precision)))
    })
    .map_err(|source| ScenarioError::Core {
        context: format!("补间 '{}' 构造失败", spec.name),
        source,
    })
}

fn make_tween<V: Lerp + Clone + 'static>(
    spec: &TweenSpec,
    from: V,
    to: V,
    easing: EasingFunction,
    setter: impl FnMut(V) + 'static,
) -> CoreResult<Tween<V>> {
    let mut builder = Tween::builder(from, to, spec.duration).delay(spec.delay);
    builder = match &spec.easing {
        Some(name) => builder.easing_named(name.as_str()),
        None => builder.easing(easing),
    };
    Ok(builder.build(setter)?)
}

/// 构造校验用的补间（不记录输出）
fn build_track(
    spec: &TweenSpec,
    easing: EasingFunction,
    sink: &Sink,
) -> Result<(), ScenarioError> {
    match spec.kind {
        ValueKind::Scalar => build_typed::<f32>(spec, 0, easing, 0, sink).map(drop),
        ValueKind::Int => build_typed::<i64>(spec, 0, easing, 0, sink).map(drop),
        ValueKind::Vec2 => build_typed::<Vec2>(spec, 0, easing, 0, sink).map(drop),
        ValueKind::Vec3 => build_typed::<Vec3>(spec, 0, easing, 0, sink).map(drop),
        ValueKind::Color => build_typed::<Color>(spec, 0, easing, 0, sink).map(drop),
    }
}

//=============================================================================
// 回放
//=============================================================================

/// 回放选项
#[derive(Debug, Clone)]
pub struct PlayOptions {
    /// 覆盖场景中的帧率
    pub fps: Option<u32>,
    /// 命令行与场景都未指定帧率时使用
    pub default_fps: u32,
    /// 补间未指定缓动时使用
    pub default_easing: EasingFunction,
    /// 输出小数位数
    pub precision: usize,
    /// 是否把时间缩放的变化也写入轨迹
    pub time_scale_trace: bool,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            fps: None,
            default_fps: 60,
            default_easing: EasingFunction::Linear,
            precision: 4,
            time_scale_trace: false,
        }
    }
}

/// 场景中的一个补间
struct Track {
    name: String,
    id: TweenId,
    reverse_at: Option<f32>,
    stop_at: Option<f32>,
}

/// 场景播放器
///
/// 每帧的顺序：
/// 1. 应用时间点已到的时间缩放事件
/// 2. 应用时间点已到的 `reverse_at` / `stop_at`
/// 3. 以 `帧间隔 × 当前时间缩放` 推进所有补间
pub struct Player {
    frame: u64,
    frames: u64,
    frame_dt: f32,
    precision: usize,
    tracks: Vec<Track>,
    set: TweenSet,
    sink: Sink,
    events: Vec<TimeScaleEvent>,
    next_event: usize,
    time_scale: PriorityTracker<f32>,
    /// 时间缩放变化记录（未开启时为 `None`）
    scale_changes: Option<Rc<RefCell<Vec<f32>>>>,
    lines: Vec<TraceLine>,
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("frame", &self.frame)
            .field("frames", &self.frames)
            .field("frame_dt", &self.frame_dt)
            .field("tracks", &self.tracks.len())
            .field("time_scale", &self.time_scale)
            .finish_non_exhaustive()
    }
}

impl Player {
    /// 校验并准备回放
    pub fn new(scenario: &Scenario, options: &PlayOptions) -> Result<Self, ScenarioError> {
        scenario.validate(options.default_easing)?;

        let fps = options
            .fps
            .or(scenario.fps)
            .unwrap_or(options.default_fps);
        if fps == 0 {
            return Err(ScenarioError::Invalid("fps 必须大于 0".to_string()));
        }
        let frame_dt = 1.0 / fps as f32;
        let frames = (scenario.duration * fps as f32).ceil() as u64;

        let sink: Sink = Rc::new(RefCell::new(Vec::new()));
        let mut set = TweenSet::new();
        let mut tracks = Vec::with_capacity(scenario.tweens.len());

        for (index, spec) in scenario.tweens.iter().enumerate() {
            let easing = options.default_easing;
            let precision = options.precision;
            let id = match spec.kind {
                ValueKind::Scalar => {
                    set.add(build_typed::<f32>(spec, index, easing, precision, &sink)?)
                }
                ValueKind::Int => {
                    set.add(build_typed::<i64>(spec, index, easing, precision, &sink)?)
                }
                ValueKind::Vec2 => {
                    set.add(build_typed::<Vec2>(spec, index, easing, precision, &sink)?)
                }
                ValueKind::Vec3 => {
                    set.add(build_typed::<Vec3>(spec, index, easing, precision, &sink)?)
                }
                ValueKind::Color => {
                    set.add(build_typed::<Color>(spec, index, easing, precision, &sink)?)
                }
            };
            tracks.push(Track {
                name: spec.name.clone(),
                id,
                reverse_at: spec.reverse_at,
                stop_at: spec.stop_at,
            });
        }

        let time_scale: PriorityTracker<f32> = PriorityTracker::new();
        let scale_changes = options.time_scale_trace.then(|| {
            let changes = Rc::new(RefCell::new(Vec::new()));
            let log = changes.clone();
            time_scale.subscribe(move |item| {
                log.borrow_mut()
                    .push(item.map_or(DEFAULT_TIME_SCALE, |i| i.value))
            });
            changes
        });

        let events = sorted_events(&scenario.time_scale)
            .into_iter()
            .cloned()
            .collect();

        info!(
            fps,
            frames,
            tweens = tracks.len(),
            "场景准备完成"
        );

        Ok(Self {
            frame: 0,
            frames,
            frame_dt,
            precision: options.precision,
            tracks,
            set,
            sink,
            events,
            next_event: 0,
            time_scale,
            scale_changes,
            lines: Vec::new(),
        })
    }

    /// 当前时间缩放
    pub fn time_scale(&self) -> f32 {
        self.time_scale.value_or(DEFAULT_TIME_SCALE)
    }

    /// 已播放的帧数
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// 是否已播放完毕
    pub fn is_done(&self) -> bool {
        self.frame >= self.frames
    }

    /// 播放一帧
    ///
    /// # 返回
    /// 本帧产生的轨迹记录
    pub fn step(&mut self) -> Vec<TraceLine> {
        if self.is_done() {
            return Vec::new();
        }

        self.frame += 1;
        let time = self.frame as f32 * self.frame_dt;
        let mut lines = Vec::new();

        self.apply_time_scale_events(time);
        if let Some(changes) = &self.scale_changes {
            for scale in changes.borrow_mut().drain(..) {
                lines.push(TraceLine {
                    frame: self.frame,
                    time,
                    name: "time_scale".to_string(),
                    value: scale.render(self.precision),
                });
            }
        }

        for track in &mut self.tracks {
            if track.reverse_at.is_some_and(|at| at <= time) {
                track.reverse_at = None;
                debug!(name = %track.name, time, "补间反向");
                self.set.reverse(track.id);
            }
            if track.stop_at.is_some_and(|at| at <= time) {
                track.stop_at = None;
                debug!(name = %track.name, time, "补间停止");
                self.set.stop(track.id);
            }
        }

        let dt = self.frame_dt * self.time_scale();
        let ended = self.set.advance(dt);

        for (index, value) in self.sink.borrow_mut().drain(..) {
            lines.push(TraceLine {
                frame: self.frame,
                time,
                name: self.tracks[index].name.clone(),
                value,
            });
        }

        for event in ended {
            let (id, what) = match event {
                TweenEvent::Completed(id) => (id, "completed"),
                TweenEvent::Stopped(id) => (id, "stopped"),
            };
            if let Some(track) = self.tracks.iter().find(|track| track.id == id) {
                lines.push(TraceLine {
                    frame: self.frame,
                    time,
                    name: track.name.clone(),
                    value: what.to_string(),
                });
            }
        }

        self.lines.extend(lines.iter().cloned());
        lines
    }

    /// 播放到结束，返回完整轨迹
    pub fn run(mut self) -> Vec<TraceLine> {
        while !self.is_done() {
            self.step();
        }
        debug!(frames = self.frame, lines = self.lines.len(), "场景播放结束");
        self.lines
    }

    fn apply_time_scale_events(&mut self, time: f32) {
        while let Some(event) = self.events.get(self.next_event) {
            if event.at() > time {
                break;
            }
            self.next_event += 1;
            if let Err(e) = apply_event(&self.time_scale, event) {
                warn!(error = %e, "时间缩放事件被忽略");
            }
        }
    }
}

/// 按名称汇总每个补间最后一次输出的值
pub fn final_values(lines: &[TraceLine]) -> HashMap<&str, &str> {
    let mut values = HashMap::new();
    for line in lines {
        if line.name != "time_scale" && line.value != "completed" && line.value != "stopped" {
            values.insert(line.name.as_str(), line.value.as_str());
        }
    }
    values
}
