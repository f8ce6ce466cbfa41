//! 失败记录服务 - 业务能力层
//!
//! 只负责"把失败的 URL 追加到 failed.txt"，不关心流程

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::models::JobResult;

/// 失败记录服务
///
/// 每行一个失败任务：`seq<TAB>分类<TAB>URL<TAB>原因`，便于重新提交
pub struct FailureWriter {
    path: PathBuf,
}

impl FailureWriter {
    pub fn new() -> Self {
        Self::with_path("failed.txt")
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加失败记录，返回写入条数（成功的结果会被忽略）
    pub fn append<'a>(&self, results: impl IntoIterator<Item = &'a JobResult>) -> Result<usize> {
        let lines: Vec<String> = results
            .into_iter()
            .filter_map(|result| {
                let error = result.error()?;
                Some(format!(
                    "{}\t{}\t{}\t{}\n",
                    result.seq,
                    error.kind,
                    result.url,
                    error.message.replace(['\n', '\t'], " ")
                ))
            })
            .collect();

        if lines.is_empty() {
            return Ok(0);
        }

        debug!("写入 {} 条失败记录到 {}", lines.len(), self.path.display());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("无法打开失败记录文件: {}", self.path.display()))?;

        for line in &lines {
            file.write_all(line.as_bytes())?;
        }
        Ok(lines.len())
    }
}

impl Default for FailureWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JobError;
    use crate::models::{ExpansionJob, ExtractedContent};
    use std::time::Duration;

    #[test]
    fn only_failures_are_appended() {
        let path = std::env::temp_dir().join(format!("strongbird-failed-{}.txt", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let writer = FailureWriter::with_path(&path);

        let ok_job = ExpansionJob::new(0, 0, 0, "https://a.com/1");
        let bad_job = ExpansionJob::new(1, 0, 1, "https://a.com/2");
        let results = vec![
            JobResult::success(
                &ok_job,
                ExtractedContent {
                    url: ok_job.url().into(),
                    final_url: None,
                    blocks: Vec::new(),
                    metadata: None,
                    math_count: 0,
                },
                Duration::ZERO,
            ),
            JobResult::failure(&bad_job, JobError::timeout("slow\npage"), Duration::ZERO),
        ];

        assert_eq!(writer.append(&results).unwrap(), 1);
        assert_eq!(writer.append(&results).unwrap(), 1);
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(
            written,
            "1\ttimeout\thttps://a.com/2\tslow page\n1\ttimeout\thttps://a.com/2\tslow page\n"
        );
    }
}
