//! # Tween CLI
//!
//! 无界面补间场景播放器：逐帧回放场景文件并把输出写到 stdout。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p tween-cli -- run scenarios/card_flip.json
//! cargo run -p tween-cli -- run scenarios/card_flip.json --fps 30 --time-scale-trace
//! cargo run -p tween-cli -- easing ease_out_back --samples 20
//! cargo run -p tween-cli -- list-easings
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{Level, warn};
use tween_cli::config::DEFAULT_CONFIG_FILE;
use tween_cli::{CliConfig, ConfigError, PlayOptions, Player, Scenario, curve, logging};
use tween_core::EasingFunction;

#[derive(Parser)]
#[command(name = "tween-cli")]
#[command(about = "补间场景播放器 - 逐帧回放补间与时间缩放")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件（默认：tween-cli.json）
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// 输出更详细的日志（可重复）
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// 回放场景，输出 `frame time name value`
    Run {
        /// 场景文件路径
        scenario: PathBuf,

        /// 覆盖场景与配置中的帧率
        #[arg(long)]
        fps: Option<u32>,

        /// 同时输出时间缩放的变化
        #[arg(long)]
        time_scale_trace: bool,
    },

    /// 采样缓动曲线，输出 `t value`
    Easing {
        /// 缓动名称（如 ease_out_back）
        name: String,

        /// 采样区间数
        #[arg(short, long, default_value = "10")]
        samples: usize,
    },

    /// 列出所有缓动函数
    ListEasings,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // 日志级别来自配置，先读配置再初始化日志，读取问题在日志就绪后补报
    let (config, problem) = match CliConfig::try_load(&cli.config) {
        Ok(config) => (config, None),
        Err(ConfigError::NotFound(_)) => (CliConfig::default(), None),
        Err(e) => (CliConfig::default(), Some(e)),
    };
    let level = config.level().unwrap_or(Level::INFO);
    logging::init(logging::effective_level(level, cli.verbose));
    if let Some(e) = problem {
        warn!(error = %e, "配置文件不可用，使用默认配置");
    }

    if let Err(e) = real_main(cli, &config) {
        eprintln!("❌ {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn real_main(cli: Cli, config: &CliConfig) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Run {
            scenario,
            fps,
            time_scale_trace,
        } => {
            let loaded = Scenario::load(&scenario)?;
            let options = PlayOptions {
                fps,
                default_fps: config.fps,
                default_easing: config.default_easing,
                precision: config.precision,
                time_scale_trace,
            };
            let player = Player::new(&loaded, &options)
                .with_context(|| format!("无法回放场景 {}", scenario.display()))?;

            for line in player.run() {
                writeln!(out, "{}", line.render(config.precision))?;
            }
        }
        Commands::Easing { name, samples } => {
            let easing = EasingFunction::from_name(&name)?;
            let points = curve::sample(easing, samples);
            writeln!(out, "{}", curve::render(&points, config.precision))?;
        }
        Commands::ListEasings => {
            for easing in EasingFunction::ALL {
                writeln!(out, "{easing}")?;
            }
        }
    }

    out.flush().context("写入 stdout 失败")?;
    Ok(())
}
