//! # Strongbird
//!
//! 批量网页内容提取工具：展开 curl 风格的 URL 模板，在固定大小的页面池上并发提取正文
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PagePool` - 固定大小的句柄池，借出期间独占
//! - `JsExecutor` - 唯一的 page owner，提供 goto() / eval() 能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个 URL
//! - `BrowserPipeline` / `HttpPipeline` - 渲染与正文提取
//! - `job_planner` - 模板解析与展开
//! - `ReportWriter` / `FailureWriter` - 写出结果与失败记录
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个 URL"的完整处理流程
//! - `JobCtx` - 上下文封装（seq + 总数）
//! - `JobFlow` - 提取、计时、生成结果
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 一次调用的入口，管理资源
//! - `orchestrator/extraction` - 并发调度与结果汇总
//!
//! 模板语法见 [`glob`]。
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod glob;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, JobError, JobErrorKind, PatternError};
pub use glob::{expand_template, parse_template};
pub use infrastructure::{JsExecutor, PagePool};
pub use models::{BatchReport, ExpansionJob, JobResult};
pub use orchestrator::{App, ExtractionOrchestrator, Input};
pub use services::ExtractionPipeline;
pub use workflow::{JobCtx, JobFlow};
