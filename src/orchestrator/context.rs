//! 一次测验会话的共享上下文

use crate::error::{AppError, AppResult};
use crate::models::mode::Mode;
use crate::models::store::SharedStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 存储、当前模式和"正在分发"标记
///
/// 同一时间只允许一个分发任务（批量、逐题或重试）写入存储
#[derive(Clone)]
pub struct OrchestratorContext {
    store: SharedStore,
    mode: Mode,
    in_flight: Arc<AtomicBool>,
}

impl OrchestratorContext {
    pub fn new(store: SharedStore, mode: Mode) -> Self {
        Self {
            store,
            mode,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn is_dispatching(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 占用分发权，guard 释放时自动归还
    pub fn try_begin(&self) -> AppResult<DispatchGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| AppError::DispatchInProgress)?;
        Ok(DispatchGuard {
            flag: self.in_flight.clone(),
        })
    }
}

pub struct DispatchGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
