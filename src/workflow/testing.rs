//! 流程层测试用的外部协作者替身

use crate::error::{AppError, AppResult};
use crate::infrastructure::Sleeper;
use crate::models::answer::{AnswerPayload, QuestionPayload};
use crate::models::highlight::HighlightStyle;
use crate::models::mode::Mode;
use crate::models::store::{QuestionStore, SharedStore};
use crate::services::QuizUi;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub fn options(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("option {}", i)).collect()
}

pub fn store_with(n: usize) -> SharedStore {
    QuestionStore::from_questions((0..n).map(|i| (format!("question {}", i), options(4))))
        .into_shared()
}

pub fn transport_error(message: &str) -> AppError {
    AppError::transport("http://localhost:3000/ask", message)
}

/// 按脚本依次返回结果的答案服务
#[derive(Default)]
pub struct ScriptedService {
    single: Mutex<VecDeque<AppResult<AnswerPayload>>>,
    batch: Mutex<VecDeque<AppResult<Vec<AnswerPayload>>>>,
    asked: Mutex<Vec<(String, Mode)>>,
    batch_sizes: Mutex<Vec<usize>>,
}

impl ScriptedService {
    pub fn push_single(&self, result: AppResult<AnswerPayload>) -> &Self {
        self.single.lock().unwrap().push_back(result);
        self
    }

    pub fn push_batch(&self, result: AppResult<Vec<AnswerPayload>>) -> &Self {
        self.batch.lock().unwrap().push_back(result);
        self
    }

    /// 单题请求记录 (题干, 模式)
    pub fn asked(&self) -> Vec<(String, Mode)> {
        self.asked.lock().unwrap().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl crate::services::AnswerService for ScriptedService {
    async fn ask(&self, question: &QuestionPayload, mode: Mode) -> AppResult<AnswerPayload> {
        self.asked
            .lock()
            .unwrap()
            .push((question.question.clone(), mode));
        self.single
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(transport_error("脚本已耗尽")))
    }

    async fn ask_batch(
        &self,
        questions: &[QuestionPayload],
        _mode: Mode,
    ) -> AppResult<Vec<AnswerPayload>> {
        self.batch_sizes.lock().unwrap().push(questions.len());
        self.batch
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(transport_error("脚本已耗尽")))
    }
}

/// 只记录等待时长、不真正等待
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    pub fn total(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}

/// 页面操作记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCall {
    Select(usize, String),
    Highlight(usize, String, &'static str),
    Advance,
}

/// 记录所有操作的测验页面
pub struct RecordingUi {
    visible: Option<usize>,
    has_next: bool,
    calls: Mutex<Vec<UiCall>>,
}

impl RecordingUi {
    pub fn new(visible: Option<usize>) -> Self {
        Self {
            visible,
            has_next: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn without_next_button(mut self) -> Self {
        self.has_next = false;
        self
    }

    pub fn calls(&self) -> Vec<UiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn selections(&self) -> Vec<(usize, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                UiCall::Select(i, letter) => Some((i, letter)),
                _ => None,
            })
            .collect()
    }

    pub fn advance_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, UiCall::Advance))
            .count()
    }
}

#[async_trait]
impl QuizUi for RecordingUi {
    async fn current_visible_index(&self) -> AppResult<Option<usize>> {
        Ok(self.visible)
    }

    async fn select_option(&self, index: usize, letter: &str) -> AppResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(UiCall::Select(index, letter.to_string()));
        Ok(())
    }

    async fn apply_highlight(
        &self,
        index: usize,
        letter: &str,
        style: &HighlightStyle,
    ) -> AppResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(UiCall::Highlight(index, letter.to_string(), style.border));
        Ok(())
    }

    async fn advance_to_next(&self) -> AppResult<bool> {
        if self.has_next {
            self.calls.lock().unwrap().push(UiCall::Advance);
        }
        Ok(self.has_next)
    }
}
