//! 日志工具模块
//!
//! 初始化 tracing 订阅者，并提供日志格式化和输出的辅助函数。
//! 日志写到标准错误（标准输出留给提取结果），同时追加到运行日志文件。

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::models::{BatchReport, ProgressTracker};

/// 初始化日志
///
/// `RUST_LOG` 优先；否则默认 `info`，`verbose` 时为 `debug`。
/// 给出 `log_file` 时写入文件头并同时输出到该文件
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("strongbird={},warn", default_level)));

    let file_layer = match log_file {
        Some(path) => {
            init_log_file(path)?;
            let file = OpenOptions::new()
                .append(true)
                .open(path)
                .with_context(|| format!("无法打开日志文件: {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .try_init()
        .context("日志系统已初始化")?;
    Ok(())
}

/// 初始化日志文件（覆盖旧文件并写入文件头）
pub fn init_log_file(log_file_path: &Path) -> Result<()> {
    let log_header = format!(
        "{}\n提取日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path.display()))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, pipeline: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 并发提取模式");
    info!("📊 并发数: {}", config.max_workers);
    info!("🧭 提取方式: {}", pipeline);
    info!("📝 输出格式: {}", config.extraction.output_format);
    info!("{}", "=".repeat(60));
}

/// 记录展开结果
pub fn log_jobs_planned(total: usize, skipped_lines: usize, invalid_urls: usize, workers: usize) {
    info!("✓ 共 {} 个待处理的 URL", total);
    if skipped_lines > 0 {
        info!("⚠️ 跳过 {} 行语法错误的模板", skipped_lines);
    }
    if invalid_urls > 0 {
        info!("⚠️ 丢弃 {} 个无效 URL", invalid_urls);
    }
    info!("📋 最多 {} 个任务同时运行\n", workers.min(total));
}

/// 记录任务完成进度
pub fn log_progress(progress: &ProgressTracker) {
    info!(
        "📈 进度: {}/{} ({:.1}%) | 失败 {} | 成功率 {:.1}%",
        progress.completed,
        progress.total,
        progress.percentage(),
        progress.failed,
        progress.success_rate()
    );
}

/// 打印最终统计信息
pub fn print_final_stats(report: &BatchReport, log_file_path: &str, failed_log_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("总耗时: {:.2}s", report.elapsed.as_secs_f64());
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", report.succeeded, report.total);
    info!("❌ 失败: {}", report.failed);
    info!("{}", "=".repeat(60));
    if report.has_failures() {
        info!("失败的 URL 已记录至: {}", failed_log_path);
    }
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_text("数学公式处理", 2), "数学...");
        assert_eq!(truncate_text("short", 10), "short");
    }

    #[test]
    fn log_file_gets_header() {
        let path = std::env::temp_dir().join(format!("strongbird-log-{}.log", std::process::id()));
        init_log_file(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
        assert!(content.contains("提取日志"));
    }
}
