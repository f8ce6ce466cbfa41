//! 任务处理上下文
//!
//! 封装"我正在处理第几个任务、来自哪个模板"这一信息

use std::fmt::Display;

use crate::models::ExpansionJob;

/// 任务处理上下文（仅用于日志显示）
#[derive(Debug, Clone)]
pub struct JobCtx {
    /// 任务序号（从 0 开始）
    pub seq: usize,

    /// 本次调用的任务总数
    pub total: usize,

    /// 来源模板序号
    pub template_index: usize,
}

impl JobCtx {
    pub fn new(job: &ExpansionJob, total: usize) -> Self {
        Self {
            seq: job.seq(),
            total,
            template_index: job.template_index(),
        }
    }
}

impl Display for JobCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[任务 {}/{}]", self.seq + 1, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_one_based_position() {
        let job = ExpansionJob::new(2, 0, 2, "https://a.com/3");
        assert_eq!(JobCtx::new(&job, 10).to_string(), "[任务 3/10]");
    }
}
