//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 管理浏览器资源（Browser、JsExecutor）
//! - 输出全局统计信息
//!
//! ### `runner` - 测验处理编排器
//! - 处理全部 / 当前题目、重试、自动填写
//! - 分发类操作互斥
//!
//! ### `context` - 会话上下文
//! - 共享存储、当前模式、分发标记
//!
//! ## 层次关系
//!
//! ```text
//! app (浏览器、页面、配置)
//!     ↓
//! runner::Orchestrator (面向用户的操作)
//!     ↓
//! workflow (分发 / 分类 / 重试 / 自动填写)
//!     ↓
//! services (能力层：答案服务 / 页面 / 通知)
//!     ↓
//! infrastructure (基础设施：JsExecutor、Sleeper)
//! ```

pub mod app;
pub mod context;
pub mod runner;

pub use app::App;
pub use context::{DispatchGuard, OrchestratorContext};
pub use runner::Orchestrator;
