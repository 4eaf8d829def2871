use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 网络错误或非 2xx 响应
    #[error("传输错误 ({endpoint}): {message}")]
    Transport { endpoint: String, message: String },

    /// 服务在成功的批量响应中为单题返回了 error 字段
    #[error("服务返回错误 (题目 {}): {message}", .index + 1)]
    ServiceReported { index: usize, message: String },

    /// 服务返回的答案字母不在选项范围内
    #[error("题目 {} 的答案 {answer:?} 超出选项范围 (共 {option_count} 个选项)", .index + 1)]
    InvalidAnswer {
        index: usize,
        answer: String,
        option_count: usize,
    },

    /// 存储中没有该题目
    #[error("题目 {} 不存在", .index + 1)]
    UnknownQuestion { index: usize },

    /// 题目列表为空，无法开始自动填写
    #[error("没有可用的题目数据，请先处理题目")]
    NoData,

    /// 题目尚未完成（遍历时在本地轮询恢复，不向上抛出）
    #[error("题目 {} 尚未就绪", .index + 1)]
    NotReady { index: usize },

    /// 已有一次分发正在进行
    #[error("题目正在处理中，请等待当前任务完成")]
    DispatchInProgress,

    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("正则表达式错误: {0}")]
    Regex(#[from] regex::Error),
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// 创建传输错误
    pub fn transport(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Transport {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// 写入题目记录的错误信息
    ///
    /// 传输错误只保留原始消息（如 `HTTP 500: ...`），其余使用完整描述
    pub fn record_message(&self) -> String {
        match self {
            AppError::Transport { message, .. } => message.clone(),
            AppError::ServiceReported { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
