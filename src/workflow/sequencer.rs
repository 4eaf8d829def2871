//! 自动填写 - 流程层
//!
//! 从当前可见题目（或第一题）开始按顺序选择答案、高亮并翻页。
//! 题目尚未完成时在同一位置轮询等待，最后一题填写后停止，不再翻页

use crate::error::{AppError, AppResult};
use crate::infrastructure::Sleeper;
use crate::models::highlight::HighlightStyle;
use crate::models::store::SharedStore;
use crate::services::{Notifier, QuizUi, Severity};
use crate::workflow::classifier;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(150);

/// 自动填写的各个等待间隔
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTiming {
    /// 题目未完成时的轮询间隔
    pub poll_interval: Duration,
    /// 选择答案后到点击"下一题"之间
    pub advance_delay: Duration,
    /// 翻页后等待页面稳定
    pub settle_delay: Duration,
}

impl Default for FillTiming {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            advance_delay: DEFAULT_ADVANCE_DELAY,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// 自动填写的结束原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillEnd {
    /// 最后一题已填写
    ReachedLast,
    /// 页面上没有"下一题"按钮
    NextControlMissing { index: usize },
    /// 页面操作失败
    Interrupted { index: usize, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillReport {
    pub start_position: usize,
    /// 已填写的题目 index（按填写顺序）
    pub filled: Vec<usize>,
    /// 等待未完成题目的轮询次数
    pub polls: usize,
    pub end: FillEnd,
}

/// 当前位置题目的快照，读取后立即释放存储锁
enum Step {
    Waiting { index: usize },
    Ready {
        index: usize,
        answer: String,
        style: HighlightStyle,
        is_last: bool,
    },
}

pub struct AutoFillSequencer {
    ui: Arc<dyn QuizUi>,
    sleeper: Arc<dyn Sleeper>,
    notifier: Arc<dyn Notifier>,
    timing: FillTiming,
}

impl AutoFillSequencer {
    pub fn new(
        ui: Arc<dyn QuizUi>,
        sleeper: Arc<dyn Sleeper>,
        notifier: Arc<dyn Notifier>,
        timing: FillTiming,
    ) -> Self {
        Self {
            ui,
            sleeper,
            notifier,
            timing,
        }
    }

    /// 开始自动填写
    ///
    /// 存储为空时返回 `AppError::NoData`；页面操作失败时停止并在报告中说明
    pub async fn run(&self, store: &SharedStore) -> AppResult<FillReport> {
        if store.lock().await.is_empty() {
            self.notifier
                .notify(&AppError::NoData.to_string(), Severity::Error);
            return Err(AppError::NoData);
        }

        let start_position = self.start_position(store).await;
        let mut report = FillReport {
            start_position,
            filled: Vec::new(),
            polls: 0,
            end: FillEnd::ReachedLast,
        };

        info!("🚀 开始自动填写，从第 {} 题开始", start_position + 1);
        self.notifier.notify(
            &format!("开始自动填写，从第 {} 题开始", start_position + 1),
            Severity::Info,
        );

        let mut position = start_position;
        loop {
            let Some(step) = Self::snapshot(store, position).await else {
                break;
            };

            let (index, answer, style, is_last) = match step {
                Step::Waiting { index } => {
                    if report.polls % 50 == 0 {
                        debug!("[题目 {}] 等待答案...", index + 1);
                    }
                    report.polls += 1;
                    self.sleeper.sleep(self.timing.poll_interval).await;
                    continue;
                }
                Step::Ready {
                    index,
                    answer,
                    style,
                    is_last,
                } => (index, answer, style, is_last),
            };

            if let Err(e) = self.fill_one(index, &answer, &style).await {
                return Ok(self.interrupted(report, index, e));
            }
            report.filled.push(index);
            info!("[题目 {}] ✓ 已选择 {}", index + 1, answer);

            if is_last {
                info!("🏁 已到达最后一题");
                self.notifier
                    .notify("所有题目已填写完毕，请检查后手动提交", Severity::Success);
                report.end = FillEnd::ReachedLast;
                return Ok(report);
            }

            self.sleeper.sleep(self.timing.advance_delay).await;
            match self.ui.advance_to_next().await {
                Ok(true) => {}
                Ok(false) => {
                    warn!("[题目 {}] 未找到下一题按钮，停止自动填写", index + 1);
                    self.notifier
                        .notify("未找到下一题按钮，自动填写已停止", Severity::Error);
                    report.end = FillEnd::NextControlMissing { index };
                    return Ok(report);
                }
                Err(e) => return Ok(self.interrupted(report, index, e)),
            }
            self.sleeper.sleep(self.timing.settle_delay).await;
            position += 1;
        }

        Ok(report)
    }

    async fn start_position(&self, store: &SharedStore) -> usize {
        let visible = match self.ui.current_visible_index().await {
            Ok(visible) => visible,
            Err(e) => {
                warn!("读取当前可见题目失败，从第一题开始: {}", e);
                None
            }
        };
        match visible {
            Some(index) => store.lock().await.position_of(index).unwrap_or(0),
            None => 0,
        }
    }

    async fn snapshot(store: &SharedStore, position: usize) -> Option<Step> {
        let guard = store.lock().await;
        let rec = guard.at(position)?;
        let index = rec.index();
        let step = match rec.answer() {
            Some(answer) if rec.is_completed() => Step::Ready {
                index,
                answer: answer.to_string(),
                style: classifier::highlight_style(rec),
                is_last: position + 1 == guard.len(),
            },
            _ => Step::Waiting { index },
        };
        Some(step)
    }

    async fn fill_one(&self, index: usize, answer: &str, style: &HighlightStyle) -> AppResult<()> {
        self.ui.select_option(index, answer).await?;
        self.ui.apply_highlight(index, answer, style).await
    }

    fn interrupted(&self, mut report: FillReport, index: usize, err: AppError) -> FillReport {
        warn!("[题目 {}] 自动填写中断: {}", index + 1, err);
        self.notifier
            .notify(&format!("自动填写中断: {}", err), Severity::Error);
        report.end = FillEnd::Interrupted {
            index,
            message: err.to_string(),
        };
        report
    }
}
