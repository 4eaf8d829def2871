//! 置信度
//!
//! 服务可能返回 1-10 的整数，也可能返回旧版的 `High|Medium|Low` 字符串

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// 置信度等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
    Unknown,
}

impl ConfidenceTier {
    /// 按包含关系解析旧版字符串（不区分大小写）
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("high") {
            ConfidenceTier::High
        } else if label.contains("medium") {
            ConfidenceTier::Medium
        } else if label.contains("low") {
            ConfidenceTier::Low
        } else {
            ConfidenceTier::Unknown
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ConfidenceTier::High => "High",
            ConfidenceTier::Medium => "Medium",
            ConfidenceTier::Low => "Low",
            ConfidenceTier::Unknown => "Unknown",
        }
    }
}

/// 置信度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// 1-10 分
    Score(u8),
    /// 旧版等级字符串
    Tier(ConfidenceTier),
}

impl Confidence {
    /// 创建分数置信度，超出范围时截断到 1-10
    pub fn score(value: i64) -> Self {
        Confidence::Score(value.clamp(1, 10) as u8)
    }

    /// 统计用的等级：>=8 高，5-7 中，<5 低
    pub fn level(&self) -> ConfidenceTier {
        match self {
            Confidence::Score(s) if *s >= 8 => ConfidenceTier::High,
            Confidence::Score(s) if *s >= 5 => ConfidenceTier::Medium,
            Confidence::Score(_) => ConfidenceTier::Low,
            Confidence::Tier(tier) => *tier,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Score(s) => write!(f, "{}/10", s),
            Confidence::Tier(tier) => write!(f, "{}", tier.name()),
        }
    }
}

impl Serialize for Confidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Confidence::Score(s) => serializer.serialize_u8(*s),
            Confidence::Tier(tier) => serializer.serialize_str(tier.name()),
        }
    }
}

// 同时接受整数、浮点和字符串
impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Visitor;

        struct ConfidenceVisitor;

        impl<'de> Visitor<'de> for ConfidenceVisitor {
            type Value = Confidence;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an integer 1-10 or a High/Medium/Low label")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Confidence::score(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Confidence::score(value.min(i64::MAX as u64) as i64))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Confidence::score(value.round() as i64))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Confidence::Tier(ConfidenceTier::from_label(value)))
            }
        }

        deserializer.deserialize_any(ConfidenceVisitor)
    }
}
