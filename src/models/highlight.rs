use serde::{Deserialize, Serialize};
use std::fmt;

/// 高亮类型（由多模型结果推导）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
    /// 单模型
    Single,
    /// 所有模型答案一致
    Consensus,
    /// 所有模型都有响应但答案不同
    Disagreement,
    /// 部分模型失败，剩余模型答案一致
    Partial,
    /// 模型失败且无法形成可信的一致
    Error,
}

impl HighlightKind {
    /// 对应的高亮配色
    ///
    /// 单模型始终使用"一致"的绿色配色
    pub fn style(self) -> HighlightStyle {
        match self {
            HighlightKind::Single | HighlightKind::Consensus => HighlightStyle {
                background: "rgba(0, 255, 0, 0.3)",
                border: "#28a745",
                text: "green",
            },
            HighlightKind::Disagreement => HighlightStyle {
                background: "rgba(255, 193, 7, 0.3)",
                border: "#ffc107",
                text: "orange",
            },
            HighlightKind::Error => HighlightStyle {
                background: "rgba(220, 53, 69, 0.3)",
                border: "#dc3545",
                text: "red",
            },
            HighlightKind::Partial => HighlightStyle {
                background: "rgba(23, 162, 184, 0.3)",
                border: "#17a2b8",
                text: "blue",
            },
        }
    }
}

impl fmt::Display for HighlightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HighlightKind::Single => "single",
            HighlightKind::Consensus => "consensus",
            HighlightKind::Disagreement => "disagreement",
            HighlightKind::Partial => "partial",
            HighlightKind::Error => "error",
        };
        f.write_str(name)
    }
}

/// 选项高亮样式（CSS 颜色值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HighlightStyle {
    pub background: &'static str,
    pub border: &'static str,
    pub text: &'static str,
}
