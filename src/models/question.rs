use crate::error::{AppError, AppResult};
use crate::models::answer::{AnswerPayload, ModelAnswer, QuestionPayload};
use crate::models::confidence::Confidence;
use crate::models::highlight::HighlightKind;
use crate::models::mode::Mode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 题目处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Processing,
    Completed,
    Error,
}

/// 将答案字母转换为选项下标（A → 0）
pub fn letter_index(letter: &str) -> Option<usize> {
    let mut chars = letter.trim().chars();
    let c = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() || !c.is_ascii_uppercase() {
        return None;
    }
    Some((c as u8 - b'A') as usize)
}

/// 单道题目的记录及其处理状态
///
/// 状态字段只能通过下面的方法修改，保证
/// "completed ⇔ answer 与 confidence 均已设置" 始终成立
#[derive(Debug, Clone, Serialize)]
pub struct QuestionRecord {
    index: usize,
    question: String,
    options: Vec<String>,
    status: Status,
    mode: Option<Mode>,
    answer: Option<String>,
    confidence: Option<Confidence>,
    reasoning: Option<String>,
    raw: Option<String>,
    consensus: Option<bool>,
    individual_answers: Option<BTreeMap<String, ModelAnswer>>,
    highlight: Option<HighlightKind>,
    retry_count: Option<u32>,
    error: Option<String>,
}

impl QuestionRecord {
    /// 创建待处理的题目记录（index 从 0 开始）
    pub fn new(index: usize, question: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            index,
            question: question.into(),
            options,
            status: Status::Pending,
            mode: None,
            answer: None,
            confidence: None,
            reasoning: None,
            raw: None,
            consensus: None,
            individual_answers: None,
            highlight: None,
            retry_count: None,
            error: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn confidence(&self) -> Option<Confidence> {
        self.confidence
    }

    pub fn reasoning(&self) -> Option<&str> {
        self.reasoning.as_deref()
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn consensus(&self) -> Option<bool> {
        self.consensus
    }

    pub fn individual_answers(&self) -> Option<&BTreeMap<String, ModelAnswer>> {
        self.individual_answers.as_ref()
    }

    pub fn highlight(&self) -> Option<HighlightKind> {
        self.highlight
    }

    pub fn retry_count(&self) -> Option<u32> {
        self.retry_count
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// 发送给答案服务的请求体
    pub fn payload(&self) -> QuestionPayload {
        QuestionPayload {
            question: self.question.clone(),
            options: self.options.clone(),
        }
    }

    /// 开始分发：固定模式并标记为 processing，清空上一次的结果
    pub fn mark_processing(&mut self, mode: Mode) {
        self.status = Status::Processing;
        self.mode = Some(mode);
        self.answer = None;
        self.confidence = None;
        self.reasoning = None;
        self.raw = None;
        self.consensus = None;
        self.individual_answers = None;
        self.highlight = None;
        self.error = None;
    }

    /// 记录当前重试次数
    pub fn set_retry_count(&mut self, count: u32) {
        self.retry_count = Some(count);
    }

    /// 写入服务响应
    ///
    /// 响应中带 error 字段、缺少答案/置信度、或答案字母超出选项范围时返回错误，
    /// 记录保持不变
    ///
    /// 多模型模式下 `highlight` 保持为 `None`，需要随后调用
    /// `workflow::classifier::refresh_highlight` 推导。分发器统一在
    /// `apply_result` 中完成这两步，其他写入路径应经过分发器
    pub fn apply_answer(&mut self, mode: Mode, payload: AnswerPayload) -> AppResult<()> {
        if let Some(message) = payload.error {
            return Err(AppError::ServiceReported {
                index: self.index,
                message,
            });
        }

        let answer = payload.answer.unwrap_or_default();
        let normalized = match letter_index(&answer) {
            Some(i) if i < self.options.len() => answer.trim().to_ascii_uppercase(),
            _ => {
                return Err(AppError::InvalidAnswer {
                    index: self.index,
                    answer,
                    option_count: self.options.len(),
                })
            }
        };

        let confidence = payload.confidence.ok_or_else(|| AppError::ServiceReported {
            index: self.index,
            message: "响应缺少 confidence 字段".to_string(),
        })?;

        self.mode = Some(mode);
        self.answer = Some(normalized);
        self.confidence = Some(confidence);
        self.reasoning = payload.reasoning;
        self.raw = payload.raw;
        if mode.is_multi() {
            self.consensus = Some(payload.consensus.unwrap_or(false));
            self.individual_answers = Some(payload.individual_answers.unwrap_or_default());
            self.highlight = None;
        } else {
            self.consensus = None;
            self.individual_answers = None;
            self.highlight = Some(HighlightKind::Single);
        }
        self.status = Status::Completed;
        self.retry_count = None;
        self.error = None;
        Ok(())
    }

    /// 设置推导出的高亮类型
    pub fn set_highlight(&mut self, kind: HighlightKind) {
        self.highlight = Some(kind);
    }

    /// 标记为失败
    ///
    /// 已完成的记录不会被覆盖
    pub fn mark_failed(&mut self, message: impl Into<String>, retry_count: Option<u32>) {
        if self.is_completed() {
            return;
        }
        self.status = Status::Error;
        self.error = Some(message.into());
        if retry_count.is_some() {
            self.retry_count = retry_count;
        }
    }
}
