//! # Quiz Autofill
//!
//! 连接浏览器中的 WP-Pro-Quiz 测验页面，向答案服务获取答案（单模型或多模型共识），
//! 并按顺序自动填写，停在最后一题由用户手动提交
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `Sleeper` - 可替换的等待，用于退避和轮询
//!
//! ### ② 业务能力层（Services）
//! - `AnswerService` - 向答案服务提问（单题 / 批量）
//! - `QuizUi` / `PageExtractor` - 读取和操作测验页面
//! - `Notifier` - 发出即忘的提示
//!
//! ### ③ 流程层（Workflow）
//! - `AnswerDispatcher` - 批量或逐题分发，逐题失败时退避重试
//! - `classifier` - 多模型共识分类
//! - `AutoFillSequencer` - 按顺序填写，题目未完成时原地等待
//! - `RetryCoordinator` - 顺序重试失败题目
//!
//! ### ④ 编排层（Orchestration）
//! - `Orchestrator` - 面向用户的操作，分发互斥
//! - `App` - 浏览器连接与完整运行流程
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::connect_to_browser_and_page;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::JsExecutor;
pub use models::{Mode, QuestionRecord, QuestionStore, SharedStore, Status};
pub use orchestrator::{App, Orchestrator, OrchestratorContext};
pub use workflow::{AutoFillSequencer, ResultsSummary, RetryCoordinator};
