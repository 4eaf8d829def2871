//! 基础设施层
//!
//! 持有稀缺资源（Page、计时器），只暴露能力

pub mod js_executor;
pub mod sleeper;

pub use js_executor::JsExecutor;
pub use sleeper::{Sleeper, TokioSleeper};
