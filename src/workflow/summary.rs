//! 处理结果统计

use crate::models::confidence::ConfidenceTier;
use crate::models::highlight::HighlightKind;
use crate::models::mode::Mode;
use crate::models::question::Status;
use crate::models::store::QuestionStore;
use crate::workflow::classifier;
use serde::Serialize;

/// 一次处理后的统计数据
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResultsSummary {
    pub total: usize,
    pub completed: usize,
    /// status = error 的题目
    pub errors: usize,
    /// pending 或 processing
    pub pending: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// 以多模型完成的题目
    pub multi_model: usize,
    pub consensus: usize,
    pub disagreement: usize,
    pub partial: usize,
    /// 多模型判定为 error 的题目
    pub model_errors: usize,
}

impl ResultsSummary {
    pub fn from_store(store: &QuestionStore) -> Self {
        let mut summary = ResultsSummary {
            total: store.len(),
            ..Default::default()
        };

        for rec in store.iter() {
            match rec.status() {
                Status::Completed => summary.completed += 1,
                Status::Error => summary.errors += 1,
                Status::Pending | Status::Processing => summary.pending += 1,
            }

            if let Some(confidence) = rec.confidence() {
                match confidence.level() {
                    ConfidenceTier::High => summary.high += 1,
                    ConfidenceTier::Medium => summary.medium += 1,
                    ConfidenceTier::Low => summary.low += 1,
                    ConfidenceTier::Unknown => {}
                }
            }

            if rec.is_completed() && rec.mode() == Some(Mode::Multi) {
                summary.multi_model += 1;
                match rec.highlight().unwrap_or_else(|| classifier::classify(rec)) {
                    HighlightKind::Consensus => summary.consensus += 1,
                    HighlightKind::Disagreement => summary.disagreement += 1,
                    HighlightKind::Partial => summary.partial += 1,
                    HighlightKind::Error => summary.model_errors += 1,
                    HighlightKind::Single => {}
                }
            }
        }

        summary
    }

    /// 需要重试的题目数：处理失败 + 多模型判定为 error
    pub fn failed_total(&self) -> usize {
        self.errors + self.model_errors
    }

    pub fn all_completed(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}
