//! 测验处理编排器 - 编排层
//!
//! 把分发器、重试协调器和自动填写组合成面向用户的操作：
//! - `process_all`：按配置的分发方式处理全部未完成题目
//! - `process_current`：只处理页面上当前可见的题目
//! - `retry_failed`：逐题重试失败的题目
//! - `retry_question`：重新处理指定题目
//! - `auto_fill`：按顺序填写答案，停在最后一题
//!
//! 分发类操作互斥，自动填写只读取存储，可以与分发同时进行

use crate::error::{AppError, AppResult};
use crate::infrastructure::Sleeper;
use crate::models::mode::{DispatchStrategy, Mode};
use crate::orchestrator::context::{DispatchGuard, OrchestratorContext};
use crate::services::{AnswerService, Notifier, QuizUi, Severity};
use crate::workflow::classifier;
use crate::workflow::{
    AnswerDispatcher, AutoFillSequencer, FillReport, FillTiming, ResultsSummary, RetryCoordinator,
    RetryPolicy, RetryReport, SingleOutcome,
};
use std::sync::Arc;
use tracing::{info, warn};

pub struct Orchestrator {
    ctx: OrchestratorContext,
    dispatcher: Arc<AnswerDispatcher>,
    retry: RetryCoordinator,
    sequencer: AutoFillSequencer,
    ui: Arc<dyn QuizUi>,
    notifier: Arc<dyn Notifier>,
}

impl Orchestrator {
    pub fn new(
        ctx: OrchestratorContext,
        service: Arc<dyn AnswerService>,
        ui: Arc<dyn QuizUi>,
        notifier: Arc<dyn Notifier>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
        timing: FillTiming,
    ) -> Self {
        let dispatcher = Arc::new(AnswerDispatcher::new(service, sleeper.clone(), policy));
        let retry = RetryCoordinator::new(dispatcher.clone(), notifier.clone());
        let sequencer = AutoFillSequencer::new(ui.clone(), sleeper, notifier.clone(), timing);
        Self {
            ctx,
            dispatcher,
            retry,
            sequencer,
            ui,
            notifier,
        }
    }

    pub fn context(&self) -> &OrchestratorContext {
        &self.ctx
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.ctx.set_mode(mode);
    }

    /// 处理全部未完成的题目
    ///
    /// 批量请求失败时所有未完成题目已标记为 error，错误返回给调用方
    pub async fn process_all(&self, strategy: DispatchStrategy) -> AppResult<ResultsSummary> {
        let _guard = self.begin()?;
        let store = self.ctx.store();
        let mode = self.ctx.mode();

        match strategy {
            DispatchStrategy::Batch => {
                if let Err(e) = self.dispatcher.dispatch_batch(store, mode).await {
                    self.notifier.notify(
                        &format!("批量处理失败: {}", e.record_message()),
                        Severity::Error,
                    );
                    return Err(e);
                }
            }
            DispatchStrategy::Single => {
                let pending = store.lock().await.incomplete_indices();
                info!("📤 逐题发送 {} 道题目 ({})", pending.len(), mode.label());
                for index in pending {
                    self.dispatcher.dispatch_single(store, index, mode).await;
                }
            }
        }

        let summary = self.summary().await;
        let message = format!("处理完成: {}/{} 道题目", summary.completed, summary.total);
        if summary.failed_total() > 0 {
            self.notifier.notify(
                &format!("{}，{} 道需要重试", message, summary.failed_total()),
                Severity::Info,
            );
        } else {
            self.notifier.notify(&message, Severity::Success);
        }
        Ok(summary)
    }

    /// 只处理页面上当前可见的题目，完成后在页面上高亮答案
    pub async fn process_current(&self) -> AppResult<SingleOutcome> {
        let index = self.ui.current_visible_index().await?.ok_or(AppError::NoData)?;
        if self.ctx.store().lock().await.get(index).is_none() {
            return Err(AppError::UnknownQuestion { index });
        }

        let _guard = self.begin()?;
        let outcome = self
            .dispatcher
            .dispatch_single(self.ctx.store(), index, self.ctx.mode())
            .await;

        if outcome == SingleOutcome::Completed {
            self.highlight_answer(index).await;
        }
        self.report_single(index, outcome);
        Ok(outcome)
    }

    /// 重新分发指定题目，沿用该题上次的模式
    pub async fn retry_question(&self, index: usize) -> AppResult<SingleOutcome> {
        let mode = {
            let guard = self.ctx.store().lock().await;
            let rec = guard.get(index).ok_or(AppError::UnknownQuestion { index })?;
            rec.mode().unwrap_or(self.ctx.mode())
        };

        let _guard = self.begin()?;
        info!("[题目 {}] 🔄 重新处理 ({})", index + 1, mode.label());
        let outcome = self
            .dispatcher
            .dispatch_single(self.ctx.store(), index, mode)
            .await;
        self.report_single(index, outcome);
        Ok(outcome)
    }

    /// 重试所有失败的题目
    pub async fn retry_failed(&self) -> AppResult<RetryReport> {
        let _guard = self.begin()?;
        Ok(self
            .retry
            .retry_failed(self.ctx.store(), self.ctx.mode())
            .await)
    }

    /// 自动填写答案，停在最后一题，不提交
    pub async fn auto_fill(&self) -> AppResult<FillReport> {
        self.sequencer.run(self.ctx.store()).await
    }

    /// 所有题目都已完成时才自动填写
    ///
    /// 仍有失败或未处理的题目时，自动填写会停在该题一直等待，
    /// 因此直接提示并返回 `None`
    pub async fn auto_fill_when_ready(&self) -> AppResult<Option<FillReport>> {
        let summary = self.summary().await;
        let unfinished = summary.errors + summary.pending;
        if unfinished > 0 {
            warn!("还有 {} 道题目未完成，跳过自动填写", unfinished);
            self.notifier.notify(
                &format!("还有 {} 道题目未完成，已跳过自动填写", unfinished),
                Severity::Error,
            );
            return Ok(None);
        }
        self.auto_fill().await.map(Some)
    }

    pub async fn summary(&self) -> ResultsSummary {
        ResultsSummary::from_store(&*self.ctx.store().lock().await)
    }

    async fn highlight_answer(&self, index: usize) {
        let target = {
            let guard = self.ctx.store().lock().await;
            guard.get(index).and_then(|rec| {
                rec.answer()
                    .map(|answer| (answer.to_string(), classifier::highlight_style(rec)))
            })
        };
        let Some((answer, style)) = target else {
            return;
        };
        if let Err(e) = self.ui.apply_highlight(index, &answer, &style).await {
            warn!("[题目 {}] 高亮答案失败: {}", index + 1, e);
        }
    }

    fn report_single(&self, index: usize, outcome: SingleOutcome) {
        match outcome {
            SingleOutcome::Completed => self
                .notifier
                .notify(&format!("第 {} 题已完成", index + 1), Severity::Success),
            SingleOutcome::Failed => self
                .notifier
                .notify(&format!("第 {} 题处理失败", index + 1), Severity::Error),
        }
    }

    fn begin(&self) -> AppResult<DispatchGuard> {
        self.ctx.try_begin().map_err(|e| {
            warn!("{}", e);
            self.notifier.notify(&e.to_string(), Severity::Error);
            e
        })
    }
}
