//! 批量提取处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次调用的资源管理和阶段衔接。
//!
//! ## 核心功能
//!
//! 1. **读取输入**：命令行 URL 或批量文件
//! 2. **任务规划**：解析、展开模板，得到有序任务列表
//! 3. **资源管理**：启动浏览器并创建页面池（或创建 HTTP 客户端池），用完后关闭
//! 4. **并发执行**：委托 [`ExtractionOrchestrator`] 调度任务
//! 5. **写出结果**：成功内容写入目录或标准输出，失败 URL 追加到失败记录
//! 6. **全局统计**：汇总报告并输出统计

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::browser::{open_pages, BrowserSession};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{JsExecutor, PagePool};
use crate::models::{load_batch_file, BatchReport, ExpansionJob};
use crate::orchestrator::extraction::ExtractionOrchestrator;
use crate::services::{
    plan_jobs, BrowserPipeline, ExtractionPipeline, FailureWriter, HttpPipeline, JobSource,
    PlanOptions, ReportWriter,
};
use crate::utils::logging::{log_jobs_planned, log_startup, print_final_stats};
use crate::workflow::JobFlow;

/// 命令行输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// 直接给出的 URL 模板
    Urls(Vec<String>),
    /// 批量文件路径
    BatchFile(PathBuf),
}

impl Input {
    /// 解析命令行参数：`-f <文件>` / `--file <文件>` 为批量文件，其余为 URL 模板
    pub fn from_args<I>(args: I) -> Option<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut urls = Vec::new();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-f" | "--file" => return args.next().map(|path| Input::BatchFile(path.into())),
                _ => urls.push(arg),
            }
        }
        (!urls.is_empty()).then_some(Input::Urls(urls))
    }
}

/// 应用主结构
pub struct App {
    config: Config,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Self {
        let pipeline = if config.browser.javascript {
            "浏览器渲染"
        } else {
            "HTTP 直接抓取"
        };
        log_startup(&config, pipeline);
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 运行应用主逻辑，返回批量报告
    pub async fn run(&self, input: Input) -> Result<BatchReport> {
        let source = self.read_source(input).await?;
        let jobs = self.plan(&source)?;

        let report = if self.config.browser.javascript {
            self.run_with_browser(jobs).await?
        } else {
            self.run_with_http(jobs).await?
        };

        self.write_outputs(&report).await?;
        print_final_stats(
            &report,
            &self.config.output_log_file,
            &self.config.failed_log_file,
        );
        Ok(report)
    }

    /// 读取输入
    async fn read_source(&self, input: Input) -> AppResult<JobSource> {
        match input {
            Input::Urls(urls) => Ok(JobSource::Urls(urls)),
            Input::BatchFile(path) => {
                info!("\n📁 正在读取批量文件: {}", path.display());
                let lines = load_batch_file(&path).await?;
                if lines.is_empty() {
                    warn!("⚠️ 批量文件中没有 URL: {}", path.display());
                }
                Ok(JobSource::Batch(lines))
            }
        }
    }

    /// 展开为任务列表
    fn plan(&self, source: &JobSource) -> AppResult<Vec<ExpansionJob>> {
        let plan = plan_jobs(
            source,
            PlanOptions {
                ignore_glob: self.config.ignore_glob,
                warn_threshold: self.config.expansion_warn_threshold,
            },
        )?;
        log_jobs_planned(
            plan.jobs.len(),
            plan.skipped_lines.len(),
            plan.invalid_urls,
            self.config.max_workers,
        );
        Ok(plan.jobs)
    }

    /// 浏览器模式：池大小等于并发数，页面在调用结束后关闭
    async fn run_with_browser(&self, jobs: Vec<ExpansionJob>) -> Result<BatchReport> {
        let settings = &self.config.browser;
        let session = BrowserSession::start(settings).await?;

        let pool_size = self.config.max_workers.min(jobs.len()).max(1);
        let pages = match open_pages(session.browser(), pool_size, settings).await {
            Ok(pages) => pages,
            Err(e) => {
                session.shutdown(Vec::new()).await;
                return Err(e.into());
            }
        };
        info!("✓ 页面池就绪: {} 个页面", pages.len());

        let timeout = std::time::Duration::from_millis(settings.timeout_ms);
        let executors: Vec<JsExecutor> = pages
            .into_iter()
            .map(|page| JsExecutor::new(page, timeout))
            .collect();

        let (report, executors) = self.execute(BrowserPipeline::new(), executors, jobs).await;
        session
            .shutdown(executors.into_iter().map(JsExecutor::into_page).collect())
            .await;
        Ok(report)
    }

    /// HTTP 模式：每个并发槽位一个客户端
    async fn run_with_http(&self, jobs: Vec<ExpansionJob>) -> Result<BatchReport> {
        let pool_size = self.config.max_workers.min(jobs.len()).max(1);
        let clients = (0..pool_size)
            .map(|_| HttpPipeline::build_client(&self.config.browser))
            .collect::<Result<Vec<_>, _>>()?;
        let (report, _) = self.execute(HttpPipeline::new(), clients, jobs).await;
        Ok(report)
    }

    /// 用给定的提取流程和句柄执行全部任务，返回报告和归还的句柄
    async fn execute<P: ExtractionPipeline>(
        &self,
        pipeline: P,
        handles: Vec<P::Handle>,
        jobs: Vec<ExpansionJob>,
    ) -> (BatchReport, Vec<P::Handle>) {
        info!("🧭 使用 {} 提取流程", pipeline.name());
        let pool = PagePool::new(handles);
        let flow = Arc::new(JobFlow::new(
            pipeline,
            Arc::new(self.config.extraction.clone()),
        ));
        let orchestrator = ExtractionOrchestrator::new(Arc::clone(&pool), flow, self.config.max_workers);
        let report = orchestrator.run(jobs).await;
        (report, pool.drain())
    }

    /// 写出成功内容与失败记录
    async fn write_outputs(&self, report: &BatchReport) -> Result<()> {
        let writer = ReportWriter::new(
            self.config.output_dir.as_deref().map(PathBuf::from),
            self.config.extraction.output_format,
        );
        let written = writer.write(report).await.context("写出提取结果失败")?;
        info!("📝 已输出 {} 个结果", written);

        if report.has_failures() {
            let failures = FailureWriter::with_path(Path::new(&self.config.failed_log_file));
            let count = failures.append(report.failures())?;
            warn!("⚠️ {} 个 URL 提取失败，已记录到 {}", count, failures.path().display());
        }
        Ok(())
    }
}

/// 报告对应的退出码：有失败任务时非零
pub fn exit_code(report: &BatchReport) -> i32 {
    if report.has_failures() {
        1
    } else {
        0
    }
}

/// 错误对应的退出码
pub fn error_exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<AppError>() {
        Some(AppError::NoJobs) => 3,
        Some(AppError::Pattern { .. }) | Some(AppError::Config(_)) => 2,
        _ => 1,
    }
}
