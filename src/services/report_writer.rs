//! 结果写入服务 - 业务能力层
//!
//! 有输出目录时每个成功任务写一个文件，否则按提交顺序打印到标准输出

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::Url;
use tokio::fs;
use tracing::{debug, info};

use crate::models::{BatchReport, ExtractedContent, JobResult, OutputFormat};
use crate::services::formatter::format_content;

/// 文件名（不含扩展名）的最大长度
const MAX_FILE_STEM: usize = 150;

/// 报告摘要文件名
const REPORT_FILE: &str = "report.json";

/// 结果写入服务
pub struct ReportWriter {
    output_dir: Option<PathBuf>,
    format: OutputFormat,
}

impl ReportWriter {
    pub fn new(output_dir: Option<PathBuf>, format: OutputFormat) -> Self {
        Self { output_dir, format }
    }

    /// 写出所有成功结果，返回写出的条数
    pub async fn write(&self, report: &BatchReport) -> Result<usize> {
        match &self.output_dir {
            Some(dir) => self.write_to_dir(dir, report).await,
            None => self.write_to_stdout(report),
        }
    }

    async fn write_to_dir(&self, dir: &Path, report: &BatchReport) -> Result<usize> {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("无法创建输出目录: {}", dir.display()))?;

        let mut written = 0;
        for result in report.successes() {
            let Some(content) = result.content() else {
                continue;
            };
            let path = dir.join(output_file_name(result, self.format));
            let body = format_content(content, self.format)?;
            fs::write(&path, body)
                .await
                .with_context(|| format!("写入失败: {}", path.display()))?;
            debug!("已写入: {}", path.display());
            written += 1;
        }

        let summary_path = dir.join(REPORT_FILE);
        let summary = serde_json::to_string_pretty(&ReportSummary::from(report))?;
        fs::write(&summary_path, summary)
            .await
            .with_context(|| format!("写入失败: {}", summary_path.display()))?;
        info!("📁 结果已写入目录: {}", dir.display());

        Ok(written)
    }

    fn write_to_stdout(&self, report: &BatchReport) -> Result<usize> {
        let contents: Vec<&ExtractedContent> =
            report.successes().filter_map(JobResult::content).collect();

        let stdout = std::io::stdout();
        let mut out = stdout.lock();

        if self.format == OutputFormat::Json {
            // 多个结果合并为一个数组，保证标准输出是合法 JSON
            let body = if contents.len() == 1 {
                serde_json::to_string_pretty(contents[0])?
            } else {
                serde_json::to_string_pretty(&contents)?
            };
            writeln!(out, "{}", body)?;
            return Ok(contents.len());
        }

        for (i, content) in contents.iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            write!(out, "{}", format_content(content, self.format)?)?;
        }
        out.flush()?;
        Ok(contents.len())
    }
}

/// 写入目录的报告摘要，不含正文
#[derive(serde::Serialize)]
struct ReportSummary<'a> {
    total: usize,
    succeeded: usize,
    failed: usize,
    started_at: String,
    elapsed_ms: u64,
    results: Vec<ResultSummary<'a>>,
}

#[derive(serde::Serialize)]
struct ResultSummary<'a> {
    seq: usize,
    url: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a crate::error::JobError>,
    elapsed_ms: u64,
}

impl<'a> From<&'a BatchReport> for ReportSummary<'a> {
    fn from(report: &'a BatchReport) -> Self {
        Self {
            total: report.total,
            succeeded: report.succeeded,
            failed: report.failed,
            started_at: report.started_at.to_rfc3339(),
            elapsed_ms: report.elapsed.as_millis() as u64,
            results: report
                .results
                .iter()
                .map(|r| ResultSummary {
                    seq: r.seq,
                    url: &r.url,
                    status: if r.is_success() { "success" } else { "failure" },
                    error: r.error(),
                    elapsed_ms: r.elapsed.as_millis() as u64,
                })
                .collect(),
        }
    }
}

/// 输出文件名：`{seq:03}_{域名}_{路径}.{扩展名}`
pub fn output_file_name(result: &JobResult, format: OutputFormat) -> String {
    let (domain, path) = match Url::parse(&result.url) {
        Ok(url) => (
            url.host_str().unwrap_or("local").to_string(),
            url.path().to_string(),
        ),
        Err(_) => (String::from("unknown"), result.url.clone()),
    };

    let path = sanitize(path.trim_matches('/'));
    let path = if path.is_empty() { "index".to_string() } else { path };
    let stem = format!("{:03}_{}_{}", result.seq, sanitize(&domain), path);
    let stem: String = stem.chars().take(MAX_FILE_STEM).collect();
    format!("{}.{}", stem, format.extension())
}

/// 非字母数字字符替换为 `_`，连续的 `_` 合并
fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if c.is_alphanumeric() || c == '-' || c == '.' {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('_').to_string()
}
