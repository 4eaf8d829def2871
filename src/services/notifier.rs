//! 通知服务
//!
//! 接收 (消息, 级别)，发出即忘、自动消失

use crate::infrastructure::JsExecutor;
#[cfg(test)]
use std::sync::Mutex;
use tracing::{error, info, warn};

/// 通知级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Error,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// 只写日志的通知
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Success => info!("✅ {}", message),
            Severity::Info => info!("💡 {}", message),
            Severity::Error => error!("❌ {}", message),
        }
    }
}

/// 在测验页面上显示横幅，3 秒后自动移除
pub struct PageNotifier {
    executor: JsExecutor,
}

impl PageNotifier {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }

    fn banner_script(message: &str, severity: Severity) -> String {
        let background = match severity {
            Severity::Success => "#28a745",
            Severity::Info => "#17a2b8",
            Severity::Error => "#dc3545",
        };
        let text = serde_json::to_string(message).unwrap_or_else(|_| "\"\"".to_string());
        format!(
            r#"
            (() => {{
                const el = document.createElement('div');
                el.textContent = {text};
                el.style.cssText = 'position:fixed;top:20px;right:20px;z-index:10002;padding:12px 16px;border-radius:8px;color:#fff;font-weight:bold;box-shadow:0 4px 8px rgba(0,0,0,0.3);background:{background};';
                document.body.appendChild(el);
                setTimeout(() => el.remove(), 3000);
                return true;
            }})()
            "#
        )
    }
}

impl Notifier for PageNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        TracingNotifier.notify(message, severity);

        let executor = self.executor.clone();
        let script = Self::banner_script(message, severity);
        tokio::spawn(async move {
            if let Err(e) = executor.eval(script).await {
                warn!("页面通知显示失败: {}", e);
            }
        });
    }
}

/// 收集所有通知（测试用）
#[cfg(test)]
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    messages: Mutex<Vec<(String, Severity)>>,
}

#[cfg(test)]
impl CollectingNotifier {
    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
impl Notifier for CollectingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((message.to_string(), severity));
        }
    }
}
