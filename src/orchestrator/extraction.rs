//! 提取编排器 - 编排层
//!
//! 把有序的任务列表调度到固定大小的句柄池上并发执行，汇总为 [`BatchReport`]。
//!
//! ## 调度规则
//!
//! - 按 `seq` 顺序提交：调度循环先拿到并发许可和池句柄，再 `tokio::spawn`
//! - 同时运行的任务数不超过 `min(并发数, 池大小)`
//! - 单个任务失败或 panic 只记录到结果中，不取消、不重试其他任务
//! - 进度按完成顺序记录，汇总时按 `seq` 重新排序
//! - 每个任务的状态记录在 [`StateBoard`] 中，拿到句柄后才进入 `Running`

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::error::{JobError, JobErrorKind};
use crate::infrastructure::PagePool;
use crate::models::{BatchReport, ExpansionJob, JobResult, JobState, ProgressTracker, StateBoard};
use crate::services::ExtractionPipeline;
use crate::utils::logging::log_progress;
use crate::workflow::{JobCtx, JobFlow};

/// 提取编排器
pub struct ExtractionOrchestrator<P: ExtractionPipeline> {
    pool: Arc<PagePool<P::Handle>>,
    flow: Arc<JobFlow<P>>,
    workers: Arc<Semaphore>,
    concurrency: usize,
}

impl<P: ExtractionPipeline> ExtractionOrchestrator<P> {
    /// `max_workers` 与池大小取较小者作为并发上限
    pub fn new(pool: Arc<PagePool<P::Handle>>, flow: Arc<JobFlow<P>>, max_workers: usize) -> Self {
        let concurrency = max_workers.min(pool.capacity()).max(1);
        Self {
            pool,
            flow,
            workers: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        }
    }

    /// 实际并发上限
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn pool(&self) -> &Arc<PagePool<P::Handle>> {
        &self.pool
    }

    /// 执行所有任务并汇总报告
    pub async fn run(&self, jobs: Vec<ExpansionJob>) -> BatchReport {
        let board = Arc::new(StateBoard::new(jobs.len()));
        self.run_with_states(jobs, board).await
    }

    /// 执行所有任务，状态记录在 `board` 中（按提交位置索引）
    pub async fn run_with_states(
        &self,
        jobs: Vec<ExpansionJob>,
        board: Arc<StateBoard>,
    ) -> BatchReport {
        let started_at = Local::now();
        let started = Instant::now();
        let total = jobs.len();

        let mut pending = FuturesUnordered::new();
        for (index, job) in jobs.into_iter().enumerate() {
            let task = self.dispatch(index, job.clone(), total, &board).await;
            pending.push(async move { (job, task.await) });
        }

        // 按完成顺序统计进度，汇总时再按 seq 排序
        let mut progress = ProgressTracker::new(total);
        let mut results = Vec::with_capacity(total);
        while let Some((job, joined)) = pending.next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    error!("{} 任务执行失败: {}", JobCtx::new(&job, total), e);
                    let kind = if e.is_panic() {
                        JobErrorKind::Panic
                    } else {
                        JobErrorKind::Resource
                    };
                    JobResult::failure(
                        &job,
                        JobError::new(kind, format!("任务异常终止: {}", e)),
                        Duration::ZERO,
                    )
                }
            };
            progress.update(result.is_success());
            log_progress(&progress);
            results.push(result);
        }
        debug!(
            "同时运行的任务数峰值 {}/{}",
            board.peak_running(),
            self.concurrency
        );

        BatchReport::from_results(results, started_at, started.elapsed())
    }

    /// 拿到并发许可与池句柄后启动任务
    ///
    /// 等待发生在调度循环中，因此任务按 `seq` 顺序进入运行状态
    async fn dispatch(
        &self,
        index: usize,
        job: ExpansionJob,
        total: usize,
        board: &Arc<StateBoard>,
    ) -> JoinHandle<JobResult> {
        let ctx = JobCtx::new(&job, total);
        // 信号量从不关闭，这里的错误只会在关闭后出现
        let permit = Arc::clone(&self.workers).acquire_owned().await;
        let handle = self.pool.acquire().await;
        debug!("{} 已获得页面，空闲 {}", ctx, self.pool.available());

        let flow = Arc::clone(&self.flow);
        let board = Arc::clone(board);
        tokio::spawn(async move {
            let _permit = permit;
            match handle {
                Ok(mut handle) => {
                    // 守卫先于句柄释放，句柄归还前任务已离开 Running
                    let running = board.enter(index);
                    let result = flow.run(&mut handle, &job, &ctx).await;
                    running.finish(result.state());
                    result
                }
                Err(e) => {
                    error!("{} ❌ 无法获得页面: {}", ctx, e);
                    board.transition(index, JobState::Failed);
                    JobResult::failure(&job, e, Duration::ZERO)
                }
            }
        })
    }
}
