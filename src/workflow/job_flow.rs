//! 任务处理流程 - 流程层
//!
//! 核心职责：定义"一个 URL"的完整处理流程
//!
//! 在借到的句柄上调用提取流程 → 计时 → 生成 [`JobResult`]。
//! 失败只记录到结果中，不重试，也不影响其他任务。

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::config::ExtractionConfig;
use crate::models::{ExpansionJob, JobResult};
use crate::services::ExtractionPipeline;
use crate::utils::logging::truncate_text;
use crate::workflow::job_ctx::JobCtx;

/// 任务处理流程
///
/// - 不持有任何资源（page），句柄由编排层借出后传入
/// - 只依赖提取能力（services）
pub struct JobFlow<P: ExtractionPipeline> {
    pipeline: P,
    config: Arc<ExtractionConfig>,
}

impl<P: ExtractionPipeline> JobFlow<P> {
    pub fn new(pipeline: P, config: Arc<ExtractionConfig>) -> Self {
        Self { pipeline, config }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// 处理单个任务，总是返回一个结果
    pub async fn run(&self, handle: &mut P::Handle, job: &ExpansionJob, ctx: &JobCtx) -> JobResult {
        info!("{} 🔍 开始提取: {}", ctx, job.url());
        let started = Instant::now();

        let outcome = self.pipeline.extract(handle, job.url(), &self.config).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(content) => {
                let title = content
                    .metadata
                    .as_ref()
                    .and_then(|m| m.title.as_deref())
                    .unwrap_or("-");
                info!(
                    "{} ✅ 提取成功 ({:.2}s): {} 个内容块 | {}",
                    ctx,
                    elapsed.as_secs_f64(),
                    content.blocks.len(),
                    truncate_text(title, 40)
                );
                if content.math_count > 0 {
                    debug!("{} 转换公式 {} 个", ctx, content.math_count);
                }
                JobResult::success(job, content, elapsed)
            }
            Err(e) => {
                error!(
                    "{} ❌ 提取失败 ({:.2}s): {}",
                    ctx,
                    elapsed.as_secs_f64(),
                    e
                );
                JobResult::failure(job, e, elapsed)
            }
        }
    }
}
