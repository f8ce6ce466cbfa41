//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量调度和资源管理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量提取处理器
//! - 管理应用生命周期（读取输入、规划、执行、写出）
//! - 管理浏览器资源（Browser、页面池）
//! - 输出全局统计信息
//!
//! ### `extraction` - 提取编排器
//! - 按顺序把任务调度到页面池上
//! - 控制并发数量（Semaphore + 页面池）
//! - 隔离单个任务的失败与 panic
//! - 按 `seq` 汇总为批量报告
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理一次调用)
//!     ↓
//! extraction (处理 Vec<ExpansionJob>)
//!     ↓
//! workflow::JobFlow (处理单个 URL)
//!     ↓
//! services (能力层：pipeline / formatter / writer)
//!     ↓
//! infrastructure (基础设施：PagePool / JsExecutor)
//! ```

pub mod batch_processor;
pub mod extraction;

// 重新导出主要类型
pub use batch_processor::{error_exit_code, exit_code, App, Input};
pub use extraction::ExtractionOrchestrator;
