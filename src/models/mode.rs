//! 处理模式与分发策略

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 答题模式
///
/// 在分发时固定到每条题目记录上
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// 单模型
    #[default]
    Single,
    /// 多模型共识
    Multi,
}

impl Mode {
    /// 是否为多模型模式
    pub fn is_multi(self) -> bool {
        matches!(self, Mode::Multi)
    }

    /// 日志显示用名称
    pub fn label(self) -> &'static str {
        match self {
            Mode::Single => "单模型",
            Mode::Multi => "多模型共识",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Single => write!(f, "single"),
            Mode::Multi => write!(f, "multi"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Mode::Single),
            "multi" => Ok(Mode::Multi),
            other => Err(format!("未知的答题模式: {}", other)),
        }
    }
}

/// 分发策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStrategy {
    /// 一次请求发送全部题目
    #[default]
    Batch,
    /// 逐题请求（带重试）
    Single,
}

impl FromStr for DispatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batch" => Ok(DispatchStrategy::Batch),
            "single" => Ok(DispatchStrategy::Single),
            other => Err(format!("未知的分发策略: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!("multi".parse::<Mode>().unwrap(), Mode::Multi);
        assert_eq!(" Single ".parse::<Mode>().unwrap(), Mode::Single);
        assert!("both".parse::<Mode>().is_err());
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(
            "BATCH".parse::<DispatchStrategy>().unwrap(),
            DispatchStrategy::Batch
        );
        assert!("parallel".parse::<DispatchStrategy>().is_err());
    }
}
