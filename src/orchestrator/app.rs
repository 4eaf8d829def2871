//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：日志文件、连接浏览器、创建 JsExecutor
//! 2. **题目提取**：从测验页面读取全部题目，建立存储
//! 3. **处理**：按配置的模式和分发方式获取答案
//! 4. **重试**：有失败题目时重试一次
//! 5. **自动填写**：全部题目完成后选择答案并停在最后一题，由用户手动提交

use crate::browser;
use crate::config::Config;
use crate::infrastructure::{JsExecutor, TokioSleeper};
use crate::models::store::QuestionStore;
use crate::orchestrator::context::OrchestratorContext;
use crate::orchestrator::runner::Orchestrator;
use crate::services::{HttpAnswerClient, PageExtractor, PageNotifier, PageQuizUi};
use crate::utils::logging::{init_log_file, log_questions_loaded, log_startup, print_final_stats};
use anyhow::{Context, Result};
use chromiumoxide::Browser;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    executor: JsExecutor,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;
        log_startup(&config);

        let (browser, page) = browser::connect_to_browser_and_page(
            config.browser_debug_port,
            config.target_url.as_deref(),
        )
        .await?;

        // JsExecutor 持有 page
        let executor = JsExecutor::new(page);

        Ok(Self {
            config,
            _browser: browser,
            executor,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        info!("\n🔍 正在提取题目...");
        let records = PageExtractor::new(self.executor.clone())
            .extract_questions()
            .await
            .context("提取题目失败")?;

        if records.is_empty() {
            warn!("⚠️ 页面中没有找到题目，程序结束");
            return Ok(());
        }
        log_questions_loaded(records.len());

        let store = QuestionStore::new(records)?.into_shared();
        let orchestrator = self.build_orchestrator(OrchestratorContext::new(
            store,
            self.config.mode,
        ))?;

        if let Err(e) = orchestrator.process_all(self.config.strategy).await {
            error!("处理题目失败: {}", e);
        }

        let summary = orchestrator.summary().await;
        if summary.errors > 0 {
            info!("🔄 {} 道题目处理失败，开始重试", summary.errors);
            let report = orchestrator.retry_failed().await?;
            info!(
                "重试结果: {} 成功, {} 失败",
                report.succeeded, report.failed
            );
        }

        print_final_stats(&orchestrator.summary().await, &self.config.output_log_file);

        match orchestrator.auto_fill_when_ready().await? {
            Some(report) => info!(
                "✓ 自动填写结束: 填写 {} 道题目 ({:?})",
                report.filled.len(),
                report.end
            ),
            None => warn!("⚠️ 存在未完成的题目，程序结束，请检查后重新运行"),
        }

        Ok(())
    }

    fn build_orchestrator(&self, ctx: OrchestratorContext) -> Result<Orchestrator> {
        let service = HttpAnswerClient::new(&self.config)?;
        Ok(Orchestrator::new(
            ctx,
            Arc::new(service),
            Arc::new(PageQuizUi::new(self.executor.clone())),
            Arc::new(PageNotifier::new(self.executor.clone())),
            Arc::new(TokioSleeper),
            self.config.retry_policy(),
            self.config.fill_timing(),
        ))
    }
}
