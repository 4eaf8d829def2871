//! 多模型共识分类
//!
//! 纯函数：根据 `consensus` 和 `individual_answers` 推导高亮类型

use crate::models::highlight::{HighlightKind, HighlightStyle};
use crate::models::mode::Mode;
use crate::models::question::QuestionRecord;

/// 推导题目的高亮类型
///
/// 按顺序判断，先命中者生效：
/// 1. 非多模型 → `Single`
/// 2. `consensus == true` → `Consensus`
/// 3. 有模型失败：剩余可用模型 ≥ 2 且答案全部相同 → `Partial`，否则 → `Error`
/// 4. 无模型失败 → `Disagreement`
pub fn classify(record: &QuestionRecord) -> HighlightKind {
    if record.mode() != Some(Mode::Multi) {
        return HighlightKind::Single;
    }

    if record.consensus() == Some(true) {
        return HighlightKind::Consensus;
    }

    let models: Vec<_> = record
        .individual_answers()
        .map(|answers| answers.values().collect())
        .unwrap_or_default();

    let has_failed_models = models.iter().any(|m| m.error);
    if !has_failed_models {
        return HighlightKind::Disagreement;
    }

    let working: Vec<_> = models.iter().filter(|m| !m.error).collect();
    let working_agree = working
        .windows(2)
        .all(|pair| pair[0].answer == pair[1].answer);

    if working.len() >= 2 && working_agree {
        HighlightKind::Partial
    } else {
        HighlightKind::Error
    }
}

/// 重新计算并写回记录的高亮类型
pub fn refresh_highlight(record: &mut QuestionRecord) -> HighlightKind {
    let kind = classify(record);
    record.set_highlight(kind);
    kind
}

/// 自动填写时使用的高亮样式
///
/// 单模型固定使用"一致"配色，多模型按高亮类型取色
pub fn highlight_style(record: &QuestionRecord) -> HighlightStyle {
    match record.mode() {
        Some(Mode::Multi) => record
            .highlight()
            .unwrap_or_else(|| classify(record))
            .style(),
        _ => HighlightKind::Consensus.style(),
    }
}

/// 日志显示用的共识标签
pub fn consensus_label(record: &QuestionRecord) -> String {
    if record.mode() != Some(Mode::Multi) {
        return String::new();
    }
    if record.consensus() == Some(true) {
        return "✅ 一致".to_string();
    }

    let failed = record
        .individual_answers()
        .map(|answers| answers.values().filter(|m| m.error).count())
        .unwrap_or(0);

    if failed > 0 {
        format!("❌ 无共识 ({} 个模型失败)", failed)
    } else {
        "⚠️ 无共识 (答案分歧)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer::{AnswerPayload, ModelAnswer};
    use crate::models::confidence::Confidence;
    use std::collections::BTreeMap;

    fn multi_record(consensus: bool, models: Vec<(&str, ModelAnswer)>) -> QuestionRecord {
        let mut record = QuestionRecord::new(
            0,
            "q",
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
        );
        let individual: BTreeMap<String, ModelAnswer> = models
            .into_iter()
            .map(|(name, m)| (name.to_string(), m))
            .collect();
        record
            .apply_answer(
                Mode::Multi,
                AnswerPayload::multi("A", Confidence::Score(7), consensus, individual),
            )
            .unwrap();
        record
    }

    #[test]
    fn test_consensus_wins_first() {
        let record = multi_record(
            true,
            vec![("m1", ModelAnswer::answered("A")), ("m2", ModelAnswer::failed())],
        );
        assert_eq!(classify(&record), HighlightKind::Consensus);
    }

    #[test]
    fn test_partial_when_working_models_agree() {
        let record = multi_record(
            false,
            vec![
                ("m1", ModelAnswer::answered("A")),
                ("m2", ModelAnswer::answered("A")),
                ("m3", ModelAnswer::failed()),
            ],
        );
        assert_eq!(classify(&record), HighlightKind::Partial);
    }

    #[test]
    fn test_disagreement_without_failures() {
        let record = multi_record(
            false,
            vec![
                ("m1", ModelAnswer::answered("A")),
                ("m2", ModelAnswer::answered("B")),
            ],
        );
        assert_eq!(classify(&record), HighlightKind::Disagreement);
    }

    #[test]
    fn test_all_failed_is_error() {
        let record = multi_record(
            false,
            vec![("m1", ModelAnswer::failed()), ("m2", ModelAnswer::failed())],
        );
        assert_eq!(classify(&record), HighlightKind::Error);
    }

    #[test]
    fn test_single_working_model_is_error() {
        let record = multi_record(
            false,
            vec![("m1", ModelAnswer::answered("A")), ("m2", ModelAnswer::failed())],
        );
        assert_eq!(classify(&record), HighlightKind::Error);
    }

    #[test]
    fn test_failures_with_disagreeing_survivors_is_error() {
        let record = multi_record(
            false,
            vec![
                ("m1", ModelAnswer::answered("A")),
                ("m2", ModelAnswer::answered("B")),
                ("m3", ModelAnswer::failed()),
            ],
        );
        assert_eq!(classify(&record), HighlightKind::Error);
    }

    #[test]
    fn test_missing_individual_answers_is_disagreement() {
        let mut record = QuestionRecord::new(0, "q", vec!["a".to_string()]);
        let payload = AnswerPayload {
            answer: Some("A".to_string()),
            confidence: Some(Confidence::Score(5)),
            consensus: Some(false),
            ..Default::default()
        };
        record.apply_answer(Mode::Multi, payload).unwrap();
        assert_eq!(classify(&record), HighlightKind::Disagreement);
    }

    #[test]
    fn test_single_mode_uses_consensus_palette() {
        let mut record = QuestionRecord::new(0, "q", vec!["a".to_string()]);
        record
            .apply_answer(Mode::Single, AnswerPayload::single("A", Confidence::Score(3)))
            .unwrap();
        assert_eq!(classify(&record), HighlightKind::Single);
        assert_eq!(highlight_style(&record), HighlightKind::Consensus.style());
        assert_eq!(consensus_label(&record), "");
    }

    #[test]
    fn test_refresh_writes_back_and_labels() {
        let mut record = multi_record(
            false,
            vec![
                ("m1", ModelAnswer::answered("A")),
                ("m2", ModelAnswer::answered("A")),
                ("m3", ModelAnswer::failed()),
            ],
        );
        assert_eq!(record.highlight(), None);
        assert_eq!(refresh_highlight(&mut record), HighlightKind::Partial);
        assert_eq!(record.highlight(), Some(HighlightKind::Partial));
        assert_eq!(highlight_style(&record).border, "#17a2b8");
        assert!(consensus_label(&record).contains("1 个模型失败"));
    }
}
