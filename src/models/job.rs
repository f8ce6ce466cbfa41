//! 任务、任务结果与批量报告

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};

use crate::error::JobError;
use crate::models::content::ExtractedContent;

/// 一个展开后的具体 URL
///
/// 由展开阶段创建，编排器消费一次，创建后不可修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpansionJob {
    seq: usize,
    template_index: usize,
    index_in_template: usize,
    url: String,
}

impl ExpansionJob {
    pub fn new(
        seq: usize,
        template_index: usize,
        index_in_template: usize,
        url: impl Into<String>,
    ) -> Self {
        Self {
            seq,
            template_index,
            index_in_template,
            url: url.into(),
        }
    }

    /// 在整批提交顺序中的序号（从 0 开始）
    pub fn seq(&self) -> usize {
        self.seq
    }

    /// 来源模板的序号
    pub fn template_index(&self) -> usize {
        self.template_index
    }

    /// 在来源模板展开结果中的序号（从 0 开始）
    pub fn index_in_template(&self) -> usize {
        self.index_in_template
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// 任务状态
///
/// `Pending → Running → {Succeeded | Failed}`，只有拿到页面句柄后才进入 `Running`；
/// 拿不到句柄的任务直接 `Pending → Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn can_transition_to(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Pending, JobState::Running)
                | (JobState::Pending, JobState::Failed)
                | (JobState::Running, JobState::Succeeded)
                | (JobState::Running, JobState::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

/// 一次批量执行中所有任务的状态表，按提交位置索引
#[derive(Debug)]
pub struct StateBoard {
    inner: Mutex<BoardInner>,
}

#[derive(Debug)]
struct BoardInner {
    states: Vec<JobState>,
    running: usize,
    peak_running: usize,
}

impl StateBoard {
    pub fn new(total: usize) -> Self {
        Self {
            inner: Mutex::new(BoardInner {
                states: vec![JobState::Pending; total],
                running: 0,
                peak_running: 0,
            }),
        }
    }

    /// 迁移状态，非法迁移或越界时不做修改并返回 `false`
    pub fn transition(&self, index: usize, next: JobState) -> bool {
        let mut inner = self.lock();
        let Some(current) = inner.states.get(index).copied() else {
            return false;
        };
        if !current.can_transition_to(next) {
            return false;
        }
        inner.states[index] = next;
        if next == JobState::Running {
            inner.running += 1;
            inner.peak_running = inner.peak_running.max(inner.running);
        } else if current == JobState::Running {
            inner.running -= 1;
        }
        true
    }

    /// 标记为 `Running`，返回的守卫在未正常结束时（panic）把任务记为失败
    pub fn enter(self: &Arc<Self>, index: usize) -> RunningJob {
        self.transition(index, JobState::Running);
        RunningJob {
            board: Arc::clone(self),
            index,
            finished: false,
        }
    }

    pub fn state(&self, index: usize) -> Option<JobState> {
        self.lock().states.get(index).copied()
    }

    pub fn count(&self, state: JobState) -> usize {
        self.lock().states.iter().filter(|s| **s == state).count()
    }

    pub fn running(&self) -> usize {
        self.lock().running
    }

    /// 同时处于 `Running` 的任务数的最大值
    pub fn peak_running(&self) -> usize {
        self.lock().peak_running
    }

    fn lock(&self) -> MutexGuard<'_, BoardInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 运行中的任务
#[derive(Debug)]
pub struct RunningJob {
    board: Arc<StateBoard>,
    index: usize,
    finished: bool,
}

impl RunningJob {
    /// 以终止状态结束，通常为 [`JobResult::state`]
    pub fn finish(mut self, outcome: JobState) {
        self.board.transition(self.index, outcome);
        self.finished = true;
    }
}

impl Drop for RunningJob {
    fn drop(&mut self) {
        if !self.finished {
            self.board.transition(self.index, JobState::Failed);
        }
    }
}

/// 任务结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Success { content: ExtractedContent },
    Failure { error: JobError },
}

/// 单个任务的执行结果，以 `seq` 为键
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResult {
    pub seq: usize,
    pub url: String,
    #[serde(flatten)]
    pub status: JobStatus,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl JobResult {
    pub fn success(job: &ExpansionJob, content: ExtractedContent, elapsed: Duration) -> Self {
        Self {
            seq: job.seq(),
            url: job.url().to_string(),
            status: JobStatus::Success { content },
            elapsed,
        }
    }

    pub fn failure(job: &ExpansionJob, error: JobError, elapsed: Duration) -> Self {
        Self {
            seq: job.seq(),
            url: job.url().to_string(),
            status: JobStatus::Failure { error },
            elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, JobStatus::Success { .. })
    }

    pub fn content(&self) -> Option<&ExtractedContent> {
        match &self.status {
            JobStatus::Success { content } => Some(content),
            JobStatus::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&JobError> {
        match &self.status {
            JobStatus::Success { .. } => None,
            JobStatus::Failure { error } => Some(error),
        }
    }

    /// 任务的终止状态
    pub fn state(&self) -> JobState {
        if self.is_success() {
            JobState::Succeeded
        } else {
            JobState::Failed
        }
    }
}

fn serialize_millis<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

/// 一次调用的汇总报告，结果按 `seq` 排序
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub started_at: DateTime<Local>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub results: Vec<JobResult>,
}

impl BatchReport {
    /// 恢复提交顺序并统计
    pub fn from_results(
        mut results: Vec<JobResult>,
        started_at: DateTime<Local>,
        elapsed: Duration,
    ) -> Self {
        results.sort_by_key(|r| r.seq);
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            started_at,
            elapsed,
            results,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn successes(&self) -> impl Iterator<Item = &JobResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}

/// 进度统计
#[derive(Debug, Default, Clone, Copy)]
pub struct ProgressTracker {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn update(&mut self, success: bool) {
        self.completed += 1;
        if !success {
            self.failed += 1;
        }
    }

    /// 已完成任务中的成功率（百分比）
    pub fn success_rate(&self) -> f64 {
        if self.completed == 0 {
            return 0.0;
        }
        (self.completed - self.failed) as f64 / self.completed as f64 * 100.0
    }

    /// 完成百分比
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}
