//! 失败题目重试 - 流程层
//!
//! 按顺序逐题重新分发所有 error 状态的题目，汇总成功/失败数量

use crate::models::mode::Mode;
use crate::models::store::SharedStore;
use crate::services::{Notifier, Severity};
use crate::workflow::dispatcher::{AnswerDispatcher, SingleOutcome};
use std::sync::Arc;
use tracing::info;

/// 一次重试的汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct RetryCoordinator {
    dispatcher: Arc<AnswerDispatcher>,
    notifier: Arc<dyn Notifier>,
}

impl RetryCoordinator {
    pub fn new(dispatcher: Arc<AnswerDispatcher>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            dispatcher,
            notifier,
        }
    }

    /// 重试所有失败的题目
    ///
    /// 每道题沿用它上次分发时的模式，没有记录模式时使用 `default_mode`
    pub async fn retry_failed(&self, store: &SharedStore, default_mode: Mode) -> RetryReport {
        let targets: Vec<(usize, Mode)> = {
            let guard = store.lock().await;
            guard
                .failed_indices()
                .into_iter()
                .filter_map(|i| guard.get(i))
                .map(|rec| (rec.index(), rec.mode().unwrap_or(default_mode)))
                .collect()
        };

        let mut report = RetryReport {
            attempted: targets.len(),
            ..Default::default()
        };

        if targets.is_empty() {
            self.notifier.notify("没有需要重试的题目", Severity::Success);
            return report;
        }

        info!("🔄 开始重试 {} 道失败的题目", targets.len());

        for (index, mode) in targets {
            match self.dispatcher.dispatch_single(store, index, mode).await {
                SingleOutcome::Completed => report.succeeded += 1,
                SingleOutcome::Failed => report.failed += 1,
            }
        }

        let message = format!(
            "重试完成: {} 成功, {} 失败",
            report.succeeded, report.failed
        );
        info!("{}", message);
        let severity = if report.succeeded > 0 {
            Severity::Success
        } else {
            Severity::Error
        };
        self.notifier.notify(&message, severity);
        report
    }
}
