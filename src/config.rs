use crate::error::AppResult;
use crate::models::mode::{DispatchStrategy, Mode};
use crate::workflow::dispatcher::RetryPolicy;
use crate::workflow::sequencer::FillTiming;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 程序配置
///
/// 加载顺序：默认值 → TOML 文件（可选）→ 环境变量
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 答案服务地址
    pub service_base_url: String,
    /// 以 `X-API-Key` 发送的密钥
    pub api_key: Option<String>,
    /// 答题模式
    pub mode: Mode,
    /// 分发策略
    pub strategy: DispatchStrategy,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 单题请求失败后的额外重试次数
    pub max_retries: u32,
    /// 退避基数，第 n 次重试前等待 n × 该值
    pub retry_base_delay_ms: u64,
    /// 题目未就绪时的轮询间隔
    pub poll_interval_ms: u64,
    /// 选中答案后点击"下一题"前的等待
    pub advance_delay_ms: u64,
    /// 点击"下一题"后等待页面渲染
    pub settle_delay_ms: u64,
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 测验页面 URL（用于查找已打开的标签页）
    pub target_url: Option<String>,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_base_url: "http://localhost:3000".to_string(),
            api_key: None,
            mode: Mode::Single,
            strategy: DispatchStrategy::Batch,
            request_timeout_secs: 60,
            max_retries: 2,
            retry_base_delay_ms: 1000,
            poll_interval_ms: 100,
            advance_delay_ms: 100,
            settle_delay_ms: 150,
            browser_debug_port: 9222,
            target_url: None,
            output_log_file: "quiz_autofill.log".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 默认值 + 环境变量
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// 从 TOML 文件加载，缺失的字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 完整加载：`QUIZ_CONFIG` 指定的 TOML 文件（如有）再叠加环境变量
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var("QUIZ_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        Ok(base.with_overrides(|name| std::env::var(name).ok()))
    }

    /// 用查找函数覆盖字段，无法解析的值保持原值
    pub fn with_overrides<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(value: Option<String>, current: T) -> T {
            value.and_then(|v| v.parse().ok()).unwrap_or(current)
        }

        Self {
            service_base_url: lookup("QUIZ_SERVICE_URL").unwrap_or(self.service_base_url),
            api_key: lookup("QUIZ_API_KEY").or(self.api_key),
            mode: parsed(lookup("QUIZ_MODE"), self.mode),
            strategy: parsed(lookup("QUIZ_STRATEGY"), self.strategy),
            request_timeout_secs: parsed(
                lookup("QUIZ_REQUEST_TIMEOUT_SECS"),
                self.request_timeout_secs,
            ),
            max_retries: parsed(lookup("QUIZ_MAX_RETRIES"), self.max_retries),
            retry_base_delay_ms: parsed(
                lookup("QUIZ_RETRY_BASE_DELAY_MS"),
                self.retry_base_delay_ms,
            ),
            poll_interval_ms: parsed(lookup("QUIZ_POLL_INTERVAL_MS"), self.poll_interval_ms),
            advance_delay_ms: parsed(lookup("QUIZ_ADVANCE_DELAY_MS"), self.advance_delay_ms),
            settle_delay_ms: parsed(lookup("QUIZ_SETTLE_DELAY_MS"), self.settle_delay_ms),
            browser_debug_port: parsed(lookup("BROWSER_DEBUG_PORT"), self.browser_debug_port),
            target_url: lookup("TARGET_URL").or(self.target_url),
            output_log_file: lookup("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            verbose_logging: parsed(lookup("VERBOSE_LOGGING"), self.verbose_logging),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }

    pub fn fill_timing(&self) -> FillTiming {
        FillTiming {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            advance_delay: Duration::from_millis(self.advance_delay_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
        }
    }
}
