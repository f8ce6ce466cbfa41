//! 任务规划服务 - 业务能力层
//!
//! 把输入（命令行 URL 或批量文件中的模板）解析、展开并展平为有序的任务列表。
//!
//! 错误策略：
//! - 命令行给出的模板语法错误：整个调用终止
//! - 批量文件中某行语法错误：报告行号并跳过，其余行照常处理

use reqwest::Url;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};
use crate::glob::{compile, ParsedTemplate};
use crate::models::{ExpansionJob, SourceLine};

/// 任务来源
#[derive(Debug, Clone)]
pub enum JobSource {
    /// 命令行直接给出的模板
    Urls(Vec<String>),
    /// 批量文件中读取的模板
    Batch(Vec<SourceLine>),
}

/// 规划选项
#[derive(Debug, Clone, Copy)]
pub struct PlanOptions {
    /// 关闭模板展开，原样使用
    pub ignore_glob: bool,
    /// 单个模板展开数超过该值时给出警告
    pub warn_threshold: usize,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            ignore_glob: false,
            warn_threshold: 1000,
        }
    }
}

/// 规划结果
#[derive(Debug, Default)]
pub struct JobPlan {
    pub jobs: Vec<ExpansionJob>,
    /// 因语法错误被跳过的批量文件行
    pub skipped_lines: Vec<usize>,
    /// 展开后因 URL 无效被丢弃的数量
    pub invalid_urls: usize,
}

/// 解析、展开并展平所有模板
///
/// 没有任何可处理的 URL 时返回 [`AppError::NoJobs`]
pub fn plan_jobs(source: &JobSource, options: PlanOptions) -> AppResult<JobPlan> {
    let mut plan = JobPlan::default();
    let mut template_index = 0;

    match source {
        JobSource::Urls(urls) => {
            for url in urls {
                let parsed =
                    compile(url, options.ignore_glob).map_err(|e| AppError::pattern(url, e))?;
                push_template(&mut plan, &parsed, template_index, options);
                template_index += 1;
            }
        }
        JobSource::Batch(lines) => {
            for line in lines {
                match compile(&line.template, options.ignore_glob) {
                    Ok(parsed) => {
                        push_template(&mut plan, &parsed, template_index, options);
                        template_index += 1;
                    }
                    Err(e) => {
                        error!(
                            "❌ 第 {} 行模板语法错误，已跳过: {} (位置 {}: {})",
                            line.line_number,
                            line.template,
                            e.position(),
                            e
                        );
                        plan.skipped_lines.push(line.line_number);
                    }
                }
            }
        }
    }

    if plan.jobs.is_empty() {
        return Err(AppError::NoJobs);
    }

    info!(
        "✓ {} 个模板展开为 {} 个任务",
        template_index,
        plan.jobs.len()
    );
    Ok(plan)
}

/// 展开单个模板并追加任务，`seq` 在整批中连续
fn push_template(
    plan: &mut JobPlan,
    parsed: &ParsedTemplate,
    template_index: usize,
    options: PlanOptions,
) {
    match parsed.combination_count() {
        Some(count) if count > options.warn_threshold => warn!(
            "⚠️ 模板 {} 展开为 {} 个 URL，超过阈值 {}",
            parsed.source(),
            count,
            options.warn_threshold
        ),
        None => warn!("⚠️ 模板 {} 的展开数量超出可表示范围", parsed.source()),
        _ => {}
    }

    for (index_in_template, url) in parsed.expand().enumerate() {
        if !is_valid_url(&url) {
            warn!("⚠️ 跳过无效 URL: {}", url);
            plan.invalid_urls += 1;
            continue;
        }
        let seq = plan.jobs.len();
        debug!("[任务 {}] {}", seq, url);
        plan.jobs
            .push(ExpansionJob::new(seq, template_index, index_in_template, url));
    }
}

/// 是否为可访问的绝对 URL（带主机的 http/https，或 file）
pub fn is_valid_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => match parsed.scheme() {
            "http" | "https" => parsed.host_str().is_some_and(|h| !h.is_empty()),
            "file" => true,
            _ => false,
        },
        Err(_) => false,
    }
}
