//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use crate::config::Config;
use crate::workflow::summary::ResultsSummary;
use anyhow::Result;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 订阅者
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info 级别。
/// 重复调用时保持第一次的设置
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("quiz_autofill={}", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n答题处理日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", config.mode.label());
    info!("🌐 答案服务: {}", config.service_base_url);
    info!("📦 分发方式: {:?}", config.strategy);
    info!(
        "🔄 单题最多重试 {} 次，基础间隔 {} ms",
        config.max_retries, config.retry_base_delay_ms
    );
    info!("{}", "=".repeat(60));
}

/// 记录题目提取信息
pub fn log_questions_loaded(total: usize) {
    info!("✓ 页面中找到 {} 道题目", total);
}

/// 打印最终统计信息
///
/// # 参数
/// - `summary`: 处理结果统计
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(summary: &ResultsSummary, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 完成: {}/{}", summary.completed, summary.total);
    info!(
        "🟢 高: {} | 🟡 中: {} | 🔴 低: {}",
        summary.high, summary.medium, summary.low
    );
    if summary.errors > 0 {
        info!("❌ 处理失败: {}", summary.errors);
    }
    if summary.pending > 0 {
        info!("⏳ 未完成: {}", summary.pending);
    }
    if summary.multi_model > 0 {
        info!(
            "🧠 多模型: ✅ 一致 {} | 🔄 部分一致 {} | ⚠️ 分歧 {} | ❌ 模型错误 {}",
            summary.consensus, summary.partial, summary.disagreement, summary.model_errors
        );
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
