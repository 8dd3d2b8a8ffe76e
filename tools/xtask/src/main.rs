//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-core`: 运行 tween-core 覆盖率
//! - `scenario-check`: 检查场景文件（解析、补间构造、时间缩放事件）

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tween_cli::{CliConfig, Scenario};
use walkdir::WalkDir;
use xshell::{Shell, cmd};

fn ensure_cargo_llvm_cov_available(sh: &Shell) -> anyhow::Result<()> {
    match cmd!(sh, "cargo llvm-cov --version").quiet().ignore_stdout().run() {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());
    let sh = Shell::new()?;

    match sub.as_str() {
        "check-all" => {
            eprintln!("\n==> cargo fmt --all -- --check");
            cmd!(sh, "cargo fmt --all -- --check").run()?;

            eprintln!("\n==> cargo clippy --workspace --all-targets");
            cmd!(sh, "cargo clippy --workspace --all-targets").run()?;

            eprintln!("\n==> cargo test --workspace");
            cmd!(sh, "cargo test --workspace").run()?;
        }
        "cov-core" => {
            ensure_cargo_llvm_cov_available(&sh)?;

            eprintln!("\n==> cargo llvm-cov -p tween-core --html");
            cmd!(sh, "cargo llvm-cov -p tween-core --html").run()?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "scenario-check" => {
            let path = args.next();
            scenario_check(path.as_deref())?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-core        运行 tween-core 覆盖率报告
  scenario-check  检查场景文件

SCENARIO-CHECK:
  cargo xtask scenario-check [path]

  不带参数：检查 scenarios/ 下所有 .json 文件
  带路径参数：检查指定文件或目录

  检查内容：
    - JSON 结构
    - 时间字段、补间名称
    - 取值形状与缓动名称（实际构造补间）
    - 时间缩放事件的重复登记

ALIASES (in .cargo/config.toml):
  cargo check-all      -> cargo xtask check-all
  cargo cov-core       -> cargo xtask cov-core
  cargo scenario-check -> cargo xtask scenario-check
"#
    );
}

//=============================================================================
// scenario-check 命令实现
//=============================================================================

/// 默认场景目录（相对于 workspace root）
const DEFAULT_SCENARIOS_DIR: &str = "scenarios";

/// 场景检查结果
#[derive(Default)]
struct ScenarioCheckResult {
    /// 检查的场景数量
    checked: usize,
    /// 失败的场景及原因
    failures: Vec<(PathBuf, String)>,
}

/// 执行场景检查
fn scenario_check(path: Option<&str>) -> anyhow::Result<()> {
    // 默认缓动来自播放器配置，与 `tween-cli run` 的行为一致
    let config = CliConfig::load(tween_cli::config::DEFAULT_CONFIG_FILE);

    let files = match path {
        Some(p) => {
            let path = PathBuf::from(p);
            if path.is_file() {
                vec![path]
            } else if path.is_dir() {
                collect_scenario_files(&path)
            } else {
                anyhow::bail!("路径不存在: {}", p);
            }
        }
        None => {
            let dir = Path::new(DEFAULT_SCENARIOS_DIR);
            if !dir.exists() {
                anyhow::bail!(
                    "默认场景目录不存在: {}\n请在 workspace 根目录运行，或指定场景路径",
                    dir.display()
                );
            }
            collect_scenario_files(dir)
        }
    };

    if files.is_empty() {
        eprintln!("未找到场景文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个场景文件...\n", files.len());

    let mut result = ScenarioCheckResult::default();
    for file in &files {
        result.checked += 1;
        let outcome = Scenario::load(file)
            .and_then(|scenario| scenario.validate(config.default_easing));
        if let Err(e) = outcome {
            result.failures.push((file.clone(), e.to_string()));
        }
    }

    print_check_result(&result);

    if !result.failures.is_empty() {
        anyhow::bail!("场景检查发现错误");
    }

    Ok(())
}

/// 收集目录下的所有场景文件
fn collect_scenario_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// 输出检查结果
fn print_check_result(result: &ScenarioCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个场景", result.checked);
    eprintln!();

    for (file, reason) in &result.failures {
        eprintln!("[ERROR] {}: {}", file.display(), reason);
    }

    eprintln!();
    if result.failures.is_empty() {
        eprintln!("✅ 检查通过，无错误");
    } else {
        eprintln!("❌ {} 个错误", result.failures.len());
    }
}
