//! 答案服务的请求/响应数据结构

use crate::models::confidence::Confidence;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单题请求体 `{question, options}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPayload {
    pub question: String,
    pub options: Vec<String>,
}

/// 批量请求体 `{questions: [...]}`
#[derive(Debug, Clone, Serialize)]
pub struct BatchRequest<'a> {
    pub questions: &'a [QuestionPayload],
}

/// 单个模型的答案
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelAnswer {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub error: bool,
}

impl ModelAnswer {
    pub fn answered(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            ..Default::default()
        }
    }

    pub fn failed() -> Self {
        Self {
            error: true,
            ..Default::default()
        }
    }
}

/// 每道题的服务响应
///
/// 单题接口和批量接口的每一项都使用这个结构
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnswerPayload {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub consensus: Option<bool>,
    #[serde(default)]
    pub individual_answers: Option<BTreeMap<String, ModelAnswer>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AnswerPayload {
    /// 单模型答案
    pub fn single(answer: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            answer: Some(answer.into()),
            confidence: Some(confidence),
            ..Default::default()
        }
    }

    /// 多模型答案
    pub fn multi(
        answer: impl Into<String>,
        confidence: Confidence,
        consensus: bool,
        individual_answers: BTreeMap<String, ModelAnswer>,
    ) -> Self {
        Self {
            answer: Some(answer.into()),
            confidence: Some(confidence),
            consensus: Some(consensus),
            individual_answers: Some(individual_answers),
            ..Default::default()
        }
    }

    /// 服务报告的单题错误
    pub fn reported_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }
}
