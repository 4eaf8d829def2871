//! 答案分发器 - 流程层
//!
//! 把存储中未完成的题目交给答案服务，结果写回存储：
//! - `dispatch_batch`：一次请求发送全部未完成题目，传输失败时所有未完成题目标记为 error
//! - `dispatch_single`：逐题请求，失败后按 `RetryPolicy` 退避重试
//!
//! 调用网络期间不持有存储锁

use crate::error::{AppError, AppResult};
use crate::infrastructure::Sleeper;
use crate::models::answer::{AnswerPayload, QuestionPayload};
use crate::models::mode::Mode;
use crate::models::store::{QuestionStore, SharedStore};
use crate::services::AnswerService;
use crate::utils::logging::truncate_text;
use crate::workflow::classifier;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

/// 单题重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 首次失败后的额外尝试次数
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// 第 `attempt` 次重试前的等待时间
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_RETRY_BASE_DELAY,
        }
    }
}

/// 单题分发结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleOutcome {
    Completed,
    Failed,
}

/// 批量分发统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub sent: usize,
    pub completed: usize,
    pub failed: usize,
}

pub struct AnswerDispatcher {
    service: Arc<dyn AnswerService>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl AnswerDispatcher {
    pub fn new(
        service: Arc<dyn AnswerService>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            service,
            sleeper,
            policy,
        }
    }

    /// 批量分发所有未完成的题目
    ///
    /// 传输失败时，已完成的题目保持不变，其余题目全部标记为 error，
    /// 并把同一个错误返回给调用方用于通知
    pub async fn dispatch_batch(&self, store: &SharedStore, mode: Mode) -> AppResult<BatchStats> {
        let (indices, payloads): (Vec<usize>, Vec<QuestionPayload>) = {
            let mut guard = store.lock().await;
            let indices = guard.incomplete_indices();
            let payloads = indices
                .iter()
                .filter_map(|&i| {
                    guard.get_mut(i).map(|rec| {
                        rec.mark_processing(mode);
                        rec.payload()
                    })
                })
                .collect();
            (indices, payloads)
        };

        let mut stats = BatchStats {
            sent: indices.len(),
            ..Default::default()
        };
        if indices.is_empty() {
            info!("没有需要处理的题目");
            return Ok(stats);
        }

        info!(
            "📤 批量发送 {} 道题目 ({})",
            indices.len(),
            mode.label()
        );

        let results = match self.service.ask_batch(&payloads, mode).await {
            Ok(results) => results,
            Err(e) => {
                error!("批量处理失败: {}", e);
                let message = e.record_message();
                let mut guard = store.lock().await;
                for i in guard.incomplete_indices() {
                    if let Some(rec) = guard.get_mut(i) {
                        rec.mark_failed(message.clone(), None);
                    }
                }
                return Err(e);
            }
        };

        if results.len() != indices.len() {
            warn!(
                "批量响应数量不匹配: 发送 {} 道，收到 {} 条",
                indices.len(),
                results.len()
            );
        }

        let mut guard = store.lock().await;
        let mut results = results.into_iter();
        for &index in &indices {
            match results.next() {
                Some(payload) => match apply_result(&mut guard, index, mode, payload) {
                    Ok(()) => stats.completed += 1,
                    Err(e) => {
                        warn!("[题目 {}] 处理失败: {}", index + 1, e);
                        if let Some(rec) = guard.get_mut(index) {
                            rec.mark_failed(e.record_message(), None);
                        }
                        stats.failed += 1;
                    }
                },
                None => {
                    if let Some(rec) = guard.get_mut(index) {
                        rec.mark_failed("批量响应缺少该题结果", None);
                    }
                    stats.failed += 1;
                }
            }
        }

        info!(
            "✓ 批量处理完成: 成功 {}/{}，失败 {}",
            stats.completed, stats.sent, stats.failed
        );
        Ok(stats)
    }

    /// 分发单道题目，失败时退避重试
    ///
    /// 所有错误都写入记录本身，不向上抛出
    pub async fn dispatch_single(
        &self,
        store: &SharedStore,
        index: usize,
        mode: Mode,
    ) -> SingleOutcome {
        let payload = {
            let mut guard = store.lock().await;
            match guard.get_mut(index) {
                Some(rec) => {
                    rec.mark_processing(mode);
                    rec.payload()
                }
                None => {
                    warn!("[题目 {}] 不存在，跳过", index + 1);
                    return SingleOutcome::Failed;
                }
            }
        };

        debug!(
            "[题目 {}] 题干: {}",
            index + 1,
            truncate_text(&payload.question, 80)
        );

        let mut attempt: u32 = 0;
        loop {
            let result = match self.service.ask(&payload, mode).await {
                Ok(answer) => {
                    let mut guard = store.lock().await;
                    apply_result(&mut guard, index, mode, answer)
                }
                Err(e) => Err(e),
            };

            let err = match result {
                Ok(()) => return SingleOutcome::Completed,
                Err(e) => e,
            };

            warn!(
                "[题目 {}] 第 {} 次尝试失败: {}",
                index + 1,
                attempt + 1,
                err
            );

            if attempt >= self.policy.max_retries {
                let mut guard = store.lock().await;
                if let Some(rec) = guard.get_mut(index) {
                    rec.mark_failed(err.record_message(), Some(attempt));
                }
                error!(
                    "[题目 {}] ❌ 共尝试 {} 次后失败: {}",
                    index + 1,
                    attempt + 1,
                    err
                );
                return SingleOutcome::Failed;
            }

            attempt += 1;
            {
                let mut guard = store.lock().await;
                if let Some(rec) = guard.get_mut(index) {
                    rec.set_retry_count(attempt);
                }
            }

            let delay = self.policy.delay_for(attempt);
            info!(
                "[题目 {}] 🔄 {} ms 后重试 ({}/{})",
                index + 1,
                delay.as_millis(),
                attempt + 1,
                self.policy.max_retries + 1
            );
            self.sleeper.sleep(delay).await;
        }
    }
}

/// 写入一条响应并推导高亮类型
///
/// 失败时记录保持原状，由调用方决定是否标记为 error
fn apply_result(
    store: &mut QuestionStore,
    index: usize,
    mode: Mode,
    payload: AnswerPayload,
) -> AppResult<()> {
    let rec = store
        .get_mut(index)
        .ok_or(AppError::UnknownQuestion { index })?;

    rec.apply_answer(mode, payload)?;
    classifier::refresh_highlight(rec);

    info!(
        "[题目 {}] ✓ {} 答案: {} ({}) {}",
        index + 1,
        mode.label(),
        rec.answer().unwrap_or("-"),
        rec.confidence().map(|c| c.to_string()).unwrap_or_default(),
        classifier::consensus_label(rec)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer::ModelAnswer;
    use crate::models::confidence::Confidence;
    use crate::models::highlight::HighlightKind;
    use crate::models::question::Status;
    use crate::workflow::testing::{store_with, transport_error, RecordingSleeper, ScriptedService};
    use std::collections::BTreeMap;

    fn dispatcher(
        service: &Arc<ScriptedService>,
        sleeper: &Arc<RecordingSleeper>,
    ) -> AnswerDispatcher {
        AnswerDispatcher::new(service.clone(), sleeper.clone(), RetryPolicy::default())
    }

    #[tokio::test]
    async fn test_single_succeeds_on_third_attempt() {
        let service = Arc::new(ScriptedService::default());
        service
            .push_single(Err(transport_error("HTTP 502: bad gateway")))
            .push_single(Err(transport_error("HTTP 503: unavailable")))
            .push_single(Ok(AnswerPayload::single("B", Confidence::Score(9))));
        let sleeper = Arc::new(RecordingSleeper::default());
        let store = store_with(1);

        let outcome = dispatcher(&service, &sleeper)
            .dispatch_single(&store, 0, Mode::Single)
            .await;

        assert_eq!(outcome, SingleOutcome::Completed);
        let guard = store.lock().await;
        let rec = guard.get(0).unwrap();
        assert_eq!(rec.status(), Status::Completed);
        assert_eq!(rec.answer(), Some("B"));
        assert_eq!(rec.retry_count(), None);
        assert_eq!(
            sleeper.sleeps(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
        assert!(sleeper.total() >= Duration::from_millis(3000));
    }

    #[tokio::test]
    async fn test_single_fails_after_three_attempts() {
        let service = Arc::new(ScriptedService::default());
        service
            .push_single(Err(transport_error("HTTP 500: first")))
            .push_single(Err(transport_error("HTTP 500: second")))
            .push_single(Err(transport_error("HTTP 500: model overloaded")));
        let sleeper = Arc::new(RecordingSleeper::default());
        let store = store_with(1);

        let outcome = dispatcher(&service, &sleeper)
            .dispatch_single(&store, 0, Mode::Multi)
            .await;

        assert_eq!(outcome, SingleOutcome::Failed);
        assert_eq!(service.asked().len(), 3);
        let guard = store.lock().await;
        let rec = guard.get(0).unwrap();
        assert_eq!(rec.status(), Status::Error);
        assert_eq!(rec.retry_count(), Some(2));
        assert_eq!(rec.error(), Some("HTTP 500: model overloaded"));
        assert_eq!(rec.mode(), Some(Mode::Multi));
        assert!(rec.answer().is_none());
    }

    #[tokio::test]
    async fn test_single_retries_invalid_letter() {
        let service = Arc::new(ScriptedService::default());
        service
            .push_single(Ok(AnswerPayload::single("F", Confidence::Score(9))))
            .push_single(Ok(AnswerPayload::single("D", Confidence::Score(9))));
        let sleeper = Arc::new(RecordingSleeper::default());
        let store = store_with(1);

        let outcome = dispatcher(&service, &sleeper)
            .dispatch_single(&store, 0, Mode::Single)
            .await;

        assert_eq!(outcome, SingleOutcome::Completed);
        assert_eq!(store.lock().await.get(0).unwrap().answer(), Some("D"));
        assert_eq!(sleeper.sleeps().len(), 1);
    }

    #[tokio::test]
    async fn test_single_multi_mode_classifies() {
        let mut models = BTreeMap::new();
        models.insert("m1".to_string(), ModelAnswer::answered("A"));
        models.insert("m2".to_string(), ModelAnswer::answered("A"));
        models.insert("m3".to_string(), ModelAnswer::failed());

        let service = Arc::new(ScriptedService::default());
        service.push_single(Ok(AnswerPayload::multi(
            "A",
            Confidence::Score(8),
            false,
            models,
        )));
        let sleeper = Arc::new(RecordingSleeper::default());
        let store = store_with(1);

        dispatcher(&service, &sleeper)
            .dispatch_single(&store, 0, Mode::Multi)
            .await;

        let guard = store.lock().await;
        let rec = guard.get(0).unwrap();
        assert_eq!(rec.highlight(), Some(HighlightKind::Partial));
        assert_eq!(rec.consensus(), Some(false));
        assert_eq!(rec.individual_answers().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_single_unknown_index_is_failed() {
        let service = Arc::new(ScriptedService::default());
        let sleeper = Arc::new(RecordingSleeper::default());
        let store = store_with(1);

        let outcome = dispatcher(&service, &sleeper)
            .dispatch_single(&store, 9, Mode::Single)
            .await;
        assert_eq!(outcome, SingleOutcome::Failed);
        assert!(service.asked().is_empty());
    }

    #[tokio::test]
    async fn test_batch_applies_results_by_position() {
        let service = Arc::new(ScriptedService::default());
        service.push_batch(Ok(vec![
            AnswerPayload::single("A", Confidence::Score(9)),
            AnswerPayload::reported_error("model refused"),
            AnswerPayload::single("Z", Confidence::Score(9)),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let store = store_with(4);

        let stats = dispatcher(&service, &sleeper)
            .dispatch_batch(&store, Mode::Single)
            .await
            .unwrap();

        assert_eq!(
            stats,
            BatchStats {
                sent: 4,
                completed: 1,
                failed: 3
            }
        );
        let guard = store.lock().await;
        assert_eq!(guard.get(0).unwrap().status(), Status::Completed);
        assert_eq!(guard.get(0).unwrap().highlight(), Some(HighlightKind::Single));
        assert_eq!(guard.get(1).unwrap().error(), Some("model refused"));
        assert_eq!(guard.get(2).unwrap().status(), Status::Error);
        assert_eq!(
            guard.get(3).unwrap().error(),
            Some("批量响应缺少该题结果")
        );
        assert!(sleeper.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_batch_multi_mode_sets_highlight() {
        let mut split = BTreeMap::new();
        split.insert("m1".to_string(), ModelAnswer::answered("A"));
        split.insert("m2".to_string(), ModelAnswer::answered("C"));

        let service = Arc::new(ScriptedService::default());
        service.push_batch(Ok(vec![AnswerPayload::multi(
            "A",
            Confidence::Score(5),
            false,
            split,
        )]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let store = store_with(1);

        dispatcher(&service, &sleeper)
            .dispatch_batch(&store, Mode::Multi)
            .await
            .unwrap();

        let guard = store.lock().await;
        assert_eq!(
            guard.get(0).unwrap().highlight(),
            Some(HighlightKind::Disagreement)
        );
    }

    #[tokio::test]
    async fn test_batch_transport_error_preserves_completed() {
        let service = Arc::new(ScriptedService::default());
        service
            .push_batch(Ok(vec![
                AnswerPayload::single("C", Confidence::Score(7)),
                AnswerPayload::reported_error("timeout"),
            ]))
            .push_batch(Err(transport_error("HTTP 500: Internal Server Error")));
        let sleeper = Arc::new(RecordingSleeper::default());
        let store = store_with(2);
        let dispatcher = dispatcher(&service, &sleeper);

        dispatcher.dispatch_batch(&store, Mode::Single).await.unwrap();
        let err = dispatcher
            .dispatch_batch(&store, Mode::Single)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Transport { .. }));
        assert_eq!(service.batch_sizes(), vec![2, 1]);
        let guard = store.lock().await;
        assert_eq!(guard.get(0).unwrap().status(), Status::Completed);
        assert_eq!(guard.get(0).unwrap().answer(), Some("C"));
        assert_eq!(guard.get(1).unwrap().status(), Status::Error);
        assert_eq!(
            guard.get(1).unwrap().error(),
            Some("HTTP 500: Internal Server Error")
        );
    }

    #[tokio::test]
    async fn test_batch_with_nothing_pending_skips_request() {
        let service = Arc::new(ScriptedService::default());
        service.push_batch(Ok(vec![AnswerPayload::single("A", Confidence::Score(9))]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let store = store_with(1);
        let dispatcher = dispatcher(&service, &sleeper);

        dispatcher.dispatch_batch(&store, Mode::Single).await.unwrap();
        let stats = dispatcher.dispatch_batch(&store, Mode::Single).await.unwrap();

        assert_eq!(stats.sent, 0);
        assert_eq!(service.batch_sizes(), vec![1]);
    }
}
